mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{make_server, next_week};
use serde_json::{Value, json};
use sqlx::PgPool;

#[sqlx::test]
async fn test_create_single_day_holiday(pool: PgPool) {
    let server = make_server(pool);

    let response = server
        .post("/api/holidays")
        .json(&json!({ "name": " Founders Day ", "start_date": next_week() }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["name"], "Founders Day");
    assert_eq!(json["start_date"], json["end_date"]);
}

#[sqlx::test]
async fn test_end_before_start_is_bad_request(pool: PgPool) {
    let server = make_server(pool);

    let response = server
        .post("/api/holidays")
        .json(&json!({
            "name": "Backwards",
            "start_date": next_week(),
            "end_date": next_week() - Duration::days(1)
        }))
        .await;

    response.assert_status_bad_request();
}

#[sqlx::test]
async fn test_overlapping_holiday_is_conflict(pool: PgPool) {
    common::create_test_holiday(
        &pool,
        "Long weekend",
        next_week(),
        next_week() + Duration::days(2),
    )
    .await;
    let server = make_server(pool);

    let response = server
        .post("/api/holidays")
        .json(&json!({
            "name": "Overlap",
            "start_date": next_week() + Duration::days(2),
            "end_date": next_week() + Duration::days(4)
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["existing_name"],
        "Long weekend"
    );
}

#[sqlx::test]
async fn test_update_and_delete_holiday(pool: PgPool) {
    let id = common::create_test_holiday(&pool, "Draft", next_week(), next_week()).await;
    let server = make_server(pool);

    let updated = server
        .put(&format!("/api/holidays/{id}"))
        .json(&json!({
            "row_version": 0,
            "name": "Final",
            "start_date": next_week(),
            "end_date": next_week() + Duration::days(1)
        }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["name"], "Final");

    server
        .delete(&format!("/api/holidays/{id}"))
        .add_query_param("row_version", 0)
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .delete(&format!("/api/holidays/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let list = server.get("/api/holidays").await.json::<Value>();
    assert_eq!(list["pagination"]["total_items"], 0);
}

#[sqlx::test]
async fn test_search_upcoming_scope(pool: PgPool) {
    let today = common::today();
    common::create_test_holiday(&pool, "Past", today - Duration::days(10), today - Duration::days(10)).await;
    common::create_test_holiday(&pool, "Next", next_week(), next_week()).await;
    let server = make_server(pool);

    let response = server
        .post("/api/holidays/search")
        .json(&json!({ "scopes": ["upcoming"] }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["pagination"]["total_items"], 1);
    assert_eq!(json["items"][0]["name"], "Next");
}
