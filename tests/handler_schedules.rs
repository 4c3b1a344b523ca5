mod common;

use axum::http::StatusCode;
use common::{create_test_beneficiary, create_test_schedule, make_server, next_week, today};
use serde_json::{Value, json};
use sqlx::PgPool;

fn monday_morning() -> Value {
    json!({
        "day_of_week": 1,
        "start_time": "09:00:00",
        "end_time": "12:00:00",
        "slot_minutes": 20,
        "capacity": 3,
        "valid_from": today()
    })
}

#[sqlx::test]
async fn test_create_schedule_defaults_active(pool: PgPool) {
    let server = make_server(pool);

    let response = server.post("/api/schedules").json(&monday_morning()).await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["day_of_week"], 1);
    assert_eq!(json["is_active"], true);
    assert_eq!(json["slot_minutes"], 20);
}

#[sqlx::test]
async fn test_invalid_schedules_are_bad_request(pool: PgPool) {
    let server = make_server(pool);

    let mut bad_day = monday_morning();
    bad_day["day_of_week"] = json!(8);
    server
        .post("/api/schedules")
        .json(&bad_day)
        .await
        .assert_status_bad_request();

    let mut inverted = monday_morning();
    inverted["end_time"] = json!("08:00:00");
    server
        .post("/api/schedules")
        .json(&inverted)
        .await
        .assert_status_bad_request();

    let mut too_short = monday_morning();
    too_short["end_time"] = json!("09:10:00");
    server
        .post("/api/schedules")
        .json(&too_short)
        .await
        .assert_status_bad_request();
}

#[sqlx::test]
async fn test_overlapping_window_is_conflict(pool: PgPool) {
    let server = make_server(pool);
    server
        .post("/api/schedules")
        .json(&monday_morning())
        .await
        .assert_status(StatusCode::CREATED);

    let mut overlapping = monday_morning();
    overlapping["start_time"] = json!("11:00:00");
    overlapping["end_time"] = json!("13:00:00");
    server
        .post("/api/schedules")
        .json(&overlapping)
        .await
        .assert_status(StatusCode::CONFLICT);

    let mut adjacent = monday_morning();
    adjacent["start_time"] = json!("12:00:00");
    adjacent["end_time"] = json!("14:00:00");
    server
        .post("/api/schedules")
        .json(&adjacent)
        .await
        .assert_status(StatusCode::CREATED);
}

#[sqlx::test]
async fn test_delete_with_upcoming_appointment_is_rejected(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Booked", "BK-0001").await;
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let server = make_server(pool);

    server
        .post("/api/appointments")
        .json(&json!({
            "beneficiary_id": beneficiary,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "09:00:00"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete(&format!("/api/schedules/{schedule}"))
        .await
        .assert_status_bad_request();
}

#[sqlx::test]
async fn test_search_by_day(pool: PgPool) {
    let server = make_server(pool);
    server.post("/api/schedules").json(&monday_morning()).await;
    let mut friday = monday_morning();
    friday["day_of_week"] = json!(5);
    server.post("/api/schedules").json(&friday).await;

    let response = server
        .post("/api/schedules/search")
        .json(&json!({
            "criteria": [{ "field": "day_of_week", "operator": "eq", "value": 5 }],
            "scopes": ["active", "current"]
        }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["pagination"]["total_items"], 1);
    assert_eq!(json["items"][0]["day_of_week"], 5);
}

#[sqlx::test]
async fn test_get_missing_schedule_is_not_found(pool: PgPool) {
    let server = make_server(pool);

    server
        .get("/api/schedules/424242")
        .await
        .assert_status_not_found();
}
