mod common;

use axum::http::StatusCode;
use chrono::Datelike;
use common::{create_test_beneficiary, create_test_schedule, make_server, next_week};
use serde_json::{Value, json};
use sqlx::PgPool;

#[sqlx::test]
async fn test_book_appointment_success(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Jane Doe", "JD-0001").await;
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let server = make_server(pool);

    let response = server
        .post("/api/appointments")
        .json(&json!({
            "beneficiary_id": beneficiary,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "09:30:00",
            "notes": "first visit"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<Value>();
    assert_eq!(
        json["appointment_number"],
        format!("APT-{}-000001", next_week().year())
    );
    assert_eq!(json["status"], "scheduled");
    assert_eq!(json["start_time"], "09:30:00");
    assert_eq!(json["end_time"], "10:00:00");
    assert_eq!(json["row_version"], 0);
}

#[sqlx::test]
async fn test_book_off_grid_start_is_bad_request(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Jane Doe", "JD-0002").await;
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let server = make_server(pool);

    let response = server
        .post("/api/appointments")
        .json(&json!({
            "beneficiary_id": beneficiary,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "09:10:00"
        }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[sqlx::test]
async fn test_book_unknown_beneficiary_is_not_found(pool: PgPool) {
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let server = make_server(pool);

    let response = server
        .post("/api/appointments")
        .json(&json!({
            "beneficiary_id": 9999,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "09:00:00"
        }))
        .await;

    response.assert_status_not_found();
}

#[sqlx::test]
async fn test_availability_reflects_bookings(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Jane Doe", "JD-0003").await;
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let server = make_server(pool);

    let before = server
        .get("/api/appointments/availability")
        .add_query_param("date", next_week())
        .await;
    before.assert_status_ok();
    let slots = before.json::<Value>()["slots"].as_array().unwrap().len();
    assert_eq!(slots, 6);

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

    let after = server
        .get("/api/appointments/availability")
        .add_query_param("date", next_week())
        .await;
    let json = after.json::<Value>();
    let slots = json["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 6);
    assert_eq!(slots[0]["start_time"], "09:00:00");
    assert_eq!(slots[0]["booked"], 1);
    assert_eq!(slots[0]["remaining"], 0);
    assert_eq!(slots[1]["start_time"], "09:30:00");
    assert_eq!(slots[1]["remaining"], 1);
}

#[sqlx::test]
async fn test_availability_empty_on_holiday(pool: PgPool) {
    create_test_schedule(&pool, next_week(), 1).await;
    common::create_test_holiday(&pool, "Closed", next_week(), next_week()).await;
    let server = make_server(pool);

    let response = server
        .get("/api/appointments/availability")
        .add_query_param("date", next_week())
        .await;

    response.assert_status_ok();
    assert!(response.json::<Value>()["slots"].as_array().unwrap().is_empty());
}

#[sqlx::test]
async fn test_cancel_then_complete_is_conflict(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Jane Doe", "JD-0004").await;
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let server = make_server(pool);

    let booked = server
        .post("/api/appointments")
        .json(&json!({
            "beneficiary_id": beneficiary,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "10:00:00"
        }))
        .await
        .json::<Value>();
    let id = booked["id"].as_i64().unwrap();

    let cancelled = server
        .post(&format!("/api/appointments/{id}/cancel"))
        .json(&json!({ "row_version": 0, "reason": "travelling" }))
        .await;
    cancelled.assert_status_ok();
    let json = cancelled.json::<Value>();
    assert_eq!(json["status"], "cancelled");
    assert_eq!(json["cancellation_reason"], "travelling");
    assert_eq!(json["row_version"], 1);

    let completed = server
        .post(&format!("/api/appointments/{id}/complete"))
        .json(&json!({ "row_version": 1 }))
        .await;
    completed.assert_status(StatusCode::CONFLICT);

    let stale = server
        .post(&format!("/api/appointments/{id}/no-show"))
        .json(&json!({ "row_version": 0 }))
        .await;
    stale.assert_status(StatusCode::CONFLICT);
}

#[sqlx::test]
async fn test_reschedule_and_get(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Jane Doe", "JD-0005").await;
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let server = make_server(pool);

    let booked = server
        .post("/api/appointments")
        .json(&json!({
            "beneficiary_id": beneficiary,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "09:00:00"
        }))
        .await
        .json::<Value>();
    let id = booked["id"].as_i64().unwrap();

    let moved = server
        .put(&format!("/api/appointments/{id}/reschedule"))
        .json(&json!({
            "row_version": 0,
            "schedule_id": schedule,
            "appointment_date": next_week(),
            "start_time": "11:30:00"
        }))
        .await;
    moved.assert_status_ok();

    let fetched = server.get(&format!("/api/appointments/{id}")).await;
    fetched.assert_status_ok();
    let json = fetched.json::<Value>();
    assert_eq!(json["start_time"], "11:30:00");
    assert_eq!(json["appointment_number"], booked["appointment_number"]);
}

#[sqlx::test]
async fn test_search_appointments_by_status(pool: PgPool) {
    let beneficiary = create_test_beneficiary(&pool, "Jane Doe", "JD-0006").await;
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let server = make_server(pool);

    for start in ["09:00:00", "10:00:00"] {
        server
            .post("/api/appointments")
            .json(&json!({
                "beneficiary_id": beneficiary,
                "schedule_id": schedule,
                "appointment_date": next_week(),
                "start_time": start
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .post("/api/appointments/search")
        .json(&json!({
            "criteria": [
                { "field": "status", "operator": "eq", "value": "scheduled" },
                { "field": "start_time", "operator": "gte", "value": "09:30:00" }
            ]
        }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["pagination"]["total_items"], 1);
    assert_eq!(json["items"][0]["start_time"], "10:00:00");

    let invalid = server
        .post("/api/appointments/search")
        .json(&json!({
            "criteria": [{ "field": "status", "operator": "eq", "value": "lost" }]
        }))
        .await;
    invalid.assert_status_bad_request();
}
