mod common;

use appointment_service::application::services::BookingRequest;
use appointment_service::domain::entities::{AppointmentStatus, BookedSlot, NewAppointment};
use appointment_service::domain::filter::FilterRequest;
use appointment_service::domain::repositories::AppointmentRepository;
use appointment_service::error::AppError;
use appointment_service::infrastructure::persistence::PgAppointmentRepository;
use chrono::{Datelike, NaiveTime};
use common::{create_test_beneficiary, create_test_schedule, next_week, time};
use sqlx::PgPool;
use std::sync::Arc;

fn slot(schedule_id: i64, start: NaiveTime) -> BookedSlot {
    BookedSlot {
        schedule_id,
        appointment_date: next_week(),
        start_time: start,
        end_time: start + chrono::Duration::minutes(30),
    }
}

fn new_appointment(beneficiary_id: i64, slot: BookedSlot) -> NewAppointment {
    NewAppointment {
        beneficiary_id,
        slot,
        notes: None,
    }
}

#[sqlx::test]
async fn test_book_assigns_sequential_numbers(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 5).await;
    let first = create_test_beneficiary(&pool, "First", "SEQ-0001").await;
    let second = create_test_beneficiary(&pool, "Second", "SEQ-0002").await;

    let a = repo
        .book(new_appointment(first, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    let b = repo
        .book(new_appointment(second, slot(schedule, time(9, 0))))
        .await
        .unwrap();

    let year = next_week().year();
    assert_eq!(a.appointment_number, format!("APT-{year}-000001"));
    assert_eq!(b.appointment_number, format!("APT-{year}-000002"));
    assert_eq!(a.status, AppointmentStatus::Scheduled);
    assert_eq!(a.row_version, 0);
}

#[sqlx::test]
async fn test_book_rejects_full_slot(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let first = create_test_beneficiary(&pool, "First", "CAP-0001").await;
    let second = create_test_beneficiary(&pool, "Second", "CAP-0002").await;

    repo.book(new_appointment(first, slot(schedule, time(9, 30))))
        .await
        .unwrap();
    let result = repo
        .book(new_appointment(second, slot(schedule, time(9, 30))))
        .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
    assert_eq!(
        repo.count_booked(schedule, next_week(), time(9, 30), None)
            .await
            .unwrap(),
        1
    );
}

#[sqlx::test]
async fn test_book_unknown_schedule_is_not_found(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let beneficiary = create_test_beneficiary(&pool, "Lost", "LOST-0001").await;

    let result = repo
        .book(new_appointment(beneficiary, slot(9_999, time(9, 0))))
        .await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_cancelled_booking_frees_the_seat(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let first = create_test_beneficiary(&pool, "First", "FREE-0001").await;
    let second = create_test_beneficiary(&pool, "Second", "FREE-0002").await;

    let booked = repo
        .book(new_appointment(first, slot(schedule, time(10, 0))))
        .await
        .unwrap();
    let cancelled = repo
        .update_status(
            booked.id,
            booked.row_version,
            AppointmentStatus::Cancelled,
            Some("sick".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("sick"));
    assert_eq!(cancelled.row_version, 1);

    assert!(repo
        .book(new_appointment(second, slot(schedule, time(10, 0))))
        .await
        .is_ok());
}

#[sqlx::test]
async fn test_update_status_with_stale_version_is_conflict(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let beneficiary = create_test_beneficiary(&pool, "Stale", "STALE-0001").await;

    let booked = repo
        .book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    repo.update_status(booked.id, 0, AppointmentStatus::Completed, None)
        .await
        .unwrap();

    let result = repo
        .update_status(booked.id, 0, AppointmentStatus::NoShow, None)
        .await;
    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_reschedule_keeps_number_and_moves_slot(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let beneficiary = create_test_beneficiary(&pool, "Mover", "MOVE-0001").await;

    let booked = repo
        .book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    let moved = repo
        .reschedule(booked.id, booked.row_version, slot(schedule, time(11, 0)))
        .await
        .unwrap();

    assert_eq!(moved.appointment_number, booked.appointment_number);
    assert_eq!(moved.start_time, time(11, 0));
    assert_eq!(moved.end_time, time(11, 30));
    assert_eq!(moved.row_version, 1);

    let stale = repo
        .reschedule(booked.id, 0, slot(schedule, time(10, 0)))
        .await;
    assert!(matches!(stale, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_reschedule_into_own_slot_does_not_count_itself(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 1).await;
    let beneficiary = create_test_beneficiary(&pool, "Same", "SAME-0001").await;

    let booked = repo
        .book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
        .await
        .unwrap();

    assert!(repo
        .reschedule(booked.id, 0, slot(schedule, time(9, 0)))
        .await
        .is_ok());
}

#[sqlx::test]
async fn test_slot_usage_and_overlap_queries(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 3).await;
    let first = create_test_beneficiary(&pool, "First", "USE-0001").await;
    let second = create_test_beneficiary(&pool, "Second", "USE-0002").await;

    let a = repo
        .book(new_appointment(first, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    repo.book(new_appointment(second, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    repo.book(new_appointment(second, slot(schedule, time(10, 0))))
        .await
        .unwrap();

    let mut usage = repo.booked_counts(next_week()).await.unwrap();
    usage.sort_by_key(|u| u.start_time);
    let counts: Vec<_> = usage.iter().map(|u| (u.start_time, u.booked)).collect();
    assert_eq!(counts, vec![(time(9, 0), 2), (time(10, 0), 1)]);

    assert!(repo
        .has_overlapping_booking(first, next_week(), time(9, 15), time(9, 45), None)
        .await
        .unwrap());
    assert!(!repo
        .has_overlapping_booking(first, next_week(), time(9, 30), time(10, 0), None)
        .await
        .unwrap());
    assert!(!repo
        .has_overlapping_booking(first, next_week(), time(9, 0), time(9, 30), Some(a.id))
        .await
        .unwrap());

    assert_eq!(
        repo.count_upcoming_for_beneficiary(second, common::today())
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        repo.count_upcoming_for_schedule(schedule, common::today())
            .await
            .unwrap(),
        3
    );
}

#[sqlx::test]
async fn test_count_by_status_and_search(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 5).await;
    let beneficiary = create_test_beneficiary(&pool, "Counter", "CNT-0001").await;

    let a = repo
        .book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    repo.book(new_appointment(beneficiary, slot(schedule, time(10, 0))))
        .await
        .unwrap();
    repo.update_status(a.id, 0, AppointmentStatus::Cancelled, None)
        .await
        .unwrap();

    let counts = repo.count_by_status().await.unwrap();
    assert!(counts.contains(&(AppointmentStatus::Cancelled, 1)));
    assert!(counts.contains(&(AppointmentStatus::Scheduled, 1)));

    let active = repo
        .search(&FilterRequest::page(1, 10).with_scope("active"))
        .await
        .unwrap();
    assert_eq!(active.total_items, 1);
    assert_eq!(active.items[0].start_time, time(10, 0));
}

#[sqlx::test]
async fn test_book_rejects_overlap_for_same_beneficiary(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let morning = create_test_schedule(&pool, next_week(), 5).await;
    let other = create_test_schedule(&pool, next_week(), 5).await;
    let beneficiary = create_test_beneficiary(&pool, "Twice", "TWICE-0001").await;

    repo.book(new_appointment(beneficiary, slot(morning, time(9, 0))))
        .await
        .unwrap();
    let result = repo
        .book(new_appointment(beneficiary, slot(other, time(9, 0))))
        .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_reschedule_rejects_overlap_with_other_booking(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 5).await;
    let beneficiary = create_test_beneficiary(&pool, "Busy", "BUSY-0001").await;

    repo.book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    let later = repo
        .book(new_appointment(beneficiary, slot(schedule, time(10, 0))))
        .await
        .unwrap();

    let result = repo
        .reschedule(later.id, later.row_version, slot(schedule, time(9, 0)))
        .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_book_uses_current_schedule_capacity(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let first = create_test_beneficiary(&pool, "First", "SHRINK-0001").await;
    let second = create_test_beneficiary(&pool, "Second", "SHRINK-0002").await;

    repo.book(new_appointment(first, slot(schedule, time(9, 0))))
        .await
        .unwrap();
    sqlx::query("UPDATE schedules SET capacity = 1 WHERE id = $1")
        .bind(schedule)
        .execute(&pool)
        .await
        .unwrap();

    let result = repo
        .book(new_appointment(second, slot(schedule, time(9, 0))))
        .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_book_on_deactivated_schedule_is_rejected(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let beneficiary = create_test_beneficiary(&pool, "Late", "OFF-0001").await;

    sqlx::query("UPDATE schedules SET is_active = FALSE WHERE id = $1")
        .bind(schedule)
        .execute(&pool)
        .await
        .unwrap();

    let result = repo
        .book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
}

#[sqlx::test]
async fn test_book_off_grid_slot_is_rejected(pool: PgPool) {
    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let schedule = create_test_schedule(&pool, next_week(), 2).await;
    let beneficiary = create_test_beneficiary(&pool, "Grid", "GRID-0001").await;

    let result = repo
        .book(new_appointment(beneficiary, slot(schedule, time(9, 15))))
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
}

// ─── CONCURRENCY ──────────────────────────────────────────────────────────────

#[sqlx::test]
async fn test_concurrent_bookings_never_exceed_capacity(pool: PgPool) {
    let repo = Arc::new(PgAppointmentRepository::new(Arc::new(pool.clone())));
    let schedule = create_test_schedule(&pool, next_week(), 3).await;

    let mut beneficiaries = Vec::new();
    for n in 0..8 {
        let id = create_test_beneficiary(&pool, "Racer", &format!("RACE-{n:04}")).await;
        beneficiaries.push(id);
    }

    let handles: Vec<_> = beneficiaries
        .into_iter()
        .map(|beneficiary| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                repo.book(new_appointment(beneficiary, slot(schedule, time(9, 0))))
                    .await
            })
        })
        .collect();

    let mut booked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(e) => assert!(matches!(e, AppError::Conflict { .. }), "unexpected {e:?}"),
        }
    }

    assert_eq!(booked, 3);
    assert_eq!(
        repo.count_booked(schedule, next_week(), time(9, 0), None)
            .await
            .unwrap(),
        3
    );
}

#[sqlx::test]
async fn test_concurrent_bookings_of_one_beneficiary_keep_one(pool: PgPool) {
    let repo = Arc::new(PgAppointmentRepository::new(Arc::new(pool.clone())));
    let schedule = create_test_schedule(&pool, next_week(), 50).await;
    let other = create_test_schedule(&pool, next_week(), 50).await;
    let beneficiary = create_test_beneficiary(&pool, "Eager", "EAGER-0001").await;

    let handles: Vec<_> = (0..6)
        .map(|n| {
            let repo = Arc::clone(&repo);
            let target = if n % 2 == 0 { schedule } else { other };
            tokio::spawn(async move {
                repo.book(new_appointment(beneficiary, slot(target, time(9, 0))))
                    .await
            })
        })
        .collect();

    let mut booked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(e) => assert!(matches!(e, AppError::Conflict { .. }), "unexpected {e:?}"),
        }
    }

    assert_eq!(booked, 1);
    assert!(repo
        .has_overlapping_booking(beneficiary, next_week(), time(9, 0), time(9, 30), None)
        .await
        .unwrap());
}

#[sqlx::test]
async fn test_concurrent_service_bookings_of_one_beneficiary_keep_one(pool: PgPool) {
    let state = common::create_test_state(pool.clone());
    let schedule = create_test_schedule(&pool, next_week(), 50).await;
    let beneficiary = create_test_beneficiary(&pool, "Double", "DOUBLE-0001").await;

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let service = Arc::clone(&state.appointment_service);
            tokio::spawn(async move {
                service
                    .book(BookingRequest {
                        beneficiary_id: beneficiary,
                        schedule_id: schedule,
                        appointment_date: next_week(),
                        start_time: time(10, 0),
                        notes: None,
                    })
                    .await
            })
        })
        .collect();

    let mut booked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(e) => assert!(matches!(e, AppError::Conflict { .. }), "unexpected {e:?}"),
        }
    }

    assert_eq!(booked, 1);
}
