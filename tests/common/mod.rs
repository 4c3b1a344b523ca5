#![allow(dead_code)]

use appointment_service::api::routes::{booking_routes, routes};
use appointment_service::application::services::DEFAULT_BOOKING_HORIZON_DAYS;
use appointment_service::domain::filter::FilterLimits;
use appointment_service::domain::scheduling;
use appointment_service::state::AppState;
use axum::Router;
use axum_test::TestServer;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::new(
        Arc::new(pool),
        DEFAULT_BOOKING_HORIZON_DAYS,
        FilterLimits::default(),
    )
}

/// The `/api` tree without rate limiting.
pub fn make_server(pool: PgPool) -> TestServer {
    let app = Router::new()
        .nest("/api", routes().merge(booking_routes()))
        .with_state(create_test_state(pool));

    TestServer::new(app).unwrap()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A date one week ahead: bookable, and never "today".
pub fn next_week() -> NaiveDate {
    today() + Duration::days(7)
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub async fn create_test_beneficiary(pool: &PgPool, name: &str, national_id: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO beneficiaries (full_name, national_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(national_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Inserts a 09:00-12:00 schedule with 30-minute slots on the weekday of `date`.
pub async fn create_test_schedule(pool: &PgPool, date: NaiveDate, capacity: i32) -> i64 {
    let day = i16::from(scheduling::iso_from_weekday(date.weekday()));

    sqlx::query_scalar(
        "INSERT INTO schedules (day_of_week, start_time, end_time, slot_minutes, capacity, valid_from) \
         VALUES ($1, $2, $3, 30, $4, $5) RETURNING id",
    )
    .bind(day)
    .bind(time(9, 0))
    .bind(time(12, 0))
    .bind(capacity)
    .bind(today())
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_holiday(pool: &PgPool, name: &str, start: NaiveDate, end: NaiveDate) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO holidays (name, start_date, end_date) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn soft_delete_row(pool: &PgPool, table: &str, id: i64) {
    sqlx::query(&format!("UPDATE {table} SET is_deleted = TRUE WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}
