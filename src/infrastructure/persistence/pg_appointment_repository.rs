//! PostgreSQL implementation of appointment repository.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use std::sync::Arc;

use crate::domain::entities::{
    Appointment, AppointmentStatus, BookedSlot, NewAppointment, SlotUsage,
};
use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::domain::repositories::AppointmentRepository;
use crate::domain::scheduling::{self, AppointmentNumber, TimeSlot};
use crate::error::AppError;
use crate::infrastructure::persistence::base_repository::BaseRepository;
use crate::infrastructure::persistence::specification::{
    FieldKind, FieldSpec, ScopeSpec, TableSpec,
};

pub(crate) static APPOINTMENTS: TableSpec = TableSpec {
    table: "appointments",
    columns: "id, appointment_number, beneficiary_id, schedule_id, appointment_date, start_time, \
              end_time, status, notes, cancellation_reason, row_version, created_at, updated_at",
    fields: &[
        FieldSpec {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "appointment_number",
            column: "appointment_number",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "beneficiary_id",
            column: "beneficiary_id",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "schedule_id",
            column: "schedule_id",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "appointment_date",
            column: "appointment_date",
            kind: FieldKind::Date,
        },
        FieldSpec {
            name: "start_time",
            column: "start_time",
            kind: FieldKind::Time,
        },
        FieldSpec {
            name: "status",
            column: "status",
            kind: FieldKind::Enum(&AppointmentStatus::ALL),
        },
        FieldSpec {
            name: "created_at",
            column: "created_at",
            kind: FieldKind::Timestamp,
        },
    ],
    scopes: &[
        ScopeSpec {
            name: "upcoming",
            sql: "(appointment_date >= (NOW() AT TIME ZONE 'UTC')::DATE AND status = 'scheduled')",
        },
        ScopeSpec {
            name: "today",
            sql: "appointment_date = (NOW() AT TIME ZONE 'UTC')::DATE",
        },
        ScopeSpec {
            name: "active",
            sql: "status = 'scheduled'",
        },
    ],
    default_sort: "appointment_date ASC, start_time ASC",
};

#[derive(FromRow)]
struct AppointmentRow {
    id: i64,
    appointment_number: String,
    beneficiary_id: i64,
    schedule_id: i64,
    appointment_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    row_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = AppError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.status)?;

        Ok(Appointment {
            id: row.id,
            appointment_number: row.appointment_number,
            beneficiary_id: row.beneficiary_id,
            schedule_id: row.schedule_id,
            appointment_date: row.appointment_date,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            notes: row.notes,
            cancellation_reason: row.cancellation_reason,
            row_version: row.row_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_status(value: &str) -> Result<AppointmentStatus, AppError> {
    value.parse().map_err(|reason: String| {
        AppError::internal(
            "Stored appointment has an invalid status",
            json!({ "status": value, "reason": reason }),
        )
    })
}

/// Scheduled, non-deleted appointments occupying one slot.
async fn count_in_slot<'e, E: PgExecutor<'e>>(
    executor: E,
    schedule_id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    exclude_id: Option<i64>,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM appointments
        WHERE schedule_id = $1
          AND appointment_date = $2
          AND start_time = $3
          AND status = 'scheduled'
          AND is_deleted = FALSE
          AND ($4::BIGINT IS NULL OR id <> $4)
        "#,
    )
    .bind(schedule_id)
    .bind(date)
    .bind(start_time)
    .bind(exclude_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Whether the beneficiary holds a scheduled appointment intersecting
/// `[start_time, end_time)` on `date`.
async fn overlapping_exists<'e, E: PgExecutor<'e>>(
    executor: E,
    beneficiary_id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude_id: Option<i64>,
) -> Result<bool, AppError> {
    let overlapping = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM appointments
            WHERE beneficiary_id = $1
              AND appointment_date = $2
              AND start_time < $4
              AND end_time > $3
              AND status = 'scheduled'
              AND is_deleted = FALSE
              AND ($5::BIGINT IS NULL OR id <> $5)
        )
        "#,
    )
    .bind(beneficiary_id)
    .bind(date)
    .bind(start_time)
    .bind(end_time)
    .bind(exclude_id)
    .fetch_one(executor)
    .await?;

    Ok(overlapping)
}

/// Schedule row as stored at the time of the lock.
#[derive(FromRow)]
struct LockedSchedule {
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_minutes: i32,
    capacity: i32,
    valid_from: NaiveDate,
    valid_until: Option<NaiveDate>,
    is_active: bool,
}

impl LockedSchedule {
    fn offers(&self, slot: &BookedSlot) -> bool {
        let date = slot.appointment_date;
        let wanted = TimeSlot {
            start: slot.start_time,
            end: slot.end_time,
        };

        self.is_active
            && self.day_of_week == i16::from(scheduling::iso_from_weekday(date.weekday()))
            && self.valid_from <= date
            && self.valid_until.is_none_or(|until| date <= until)
            && scheduling::generate_slots(self.start_time, self.end_time, self.slot_minutes)
                .contains(&wanted)
    }
}

async fn lock_beneficiary<'e, E: PgExecutor<'e>>(
    executor: E,
    beneficiary_id: i64,
) -> Result<(), AppError> {
    let locked = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM beneficiaries WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
    )
    .bind(beneficiary_id)
    .fetch_optional(executor)
    .await?;

    match locked {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(
            "Beneficiary not found",
            json!({ "id": beneficiary_id }),
        )),
    }
}

async fn lock_schedule<'e, E: PgExecutor<'e>>(
    executor: E,
    schedule_id: i64,
) -> Result<LockedSchedule, AppError> {
    sqlx::query_as::<_, LockedSchedule>(
        "SELECT day_of_week, start_time, end_time, slot_minutes, capacity, valid_from, \
         valid_until, is_active \
         FROM schedules WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
    )
    .bind(schedule_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::not_found("Schedule not found", json!({ "id": schedule_id })))
}

/// Re-checks every booking rule that concurrent writers can break.
///
/// Locks the beneficiary, then the schedule, always in that order. Bookings
/// of one beneficiary serialize on the first lock, bookings of one schedule
/// on the second, and the checks below read the rows as locked.
async fn guard_slot(
    conn: &mut PgConnection,
    beneficiary_id: i64,
    slot: &BookedSlot,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    lock_beneficiary(&mut *conn, beneficiary_id).await?;
    let schedule = lock_schedule(&mut *conn, slot.schedule_id).await?;

    if !schedule.offers(slot) {
        return Err(AppError::bad_request(
            "Schedule no longer offers this slot",
            json!({
                "schedule_id": slot.schedule_id,
                "date": slot.appointment_date.to_string(),
                "start_time": slot.start_time.to_string(),
            }),
        ));
    }

    if overlapping_exists(
        &mut *conn,
        beneficiary_id,
        slot.appointment_date,
        slot.start_time,
        slot.end_time,
        exclude_id,
    )
    .await?
    {
        return Err(AppError::conflict(
            "Beneficiary already has an appointment at this time",
            json!({
                "beneficiary_id": beneficiary_id,
                "date": slot.appointment_date.to_string(),
                "start_time": slot.start_time.to_string(),
            }),
        ));
    }

    let booked = count_in_slot(
        &mut *conn,
        slot.schedule_id,
        slot.appointment_date,
        slot.start_time,
        exclude_id,
    )
    .await?;
    if booked >= i64::from(schedule.capacity) {
        return Err(AppError::conflict(
            "Slot is fully booked",
            json!({
                "schedule_id": slot.schedule_id,
                "date": slot.appointment_date.to_string(),
                "start_time": slot.start_time.to_string(),
                "capacity": schedule.capacity,
                "booked": booked,
            }),
        ));
    }

    Ok(())
}

/// PostgreSQL repository for appointments.
///
/// Bookings and reschedules run in a transaction that locks the beneficiary
/// and schedule rows, re-checks the slot against them and, for bookings, takes
/// the next number from `appointment_sequences`. Capacity, the one-booking-
/// at-a-time rule and numbering stay consistent under concurrent requests.
pub struct PgAppointmentRepository {
    base: BaseRepository,
}

impl PgAppointmentRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            base: BaseRepository::new(pool, &APPOINTMENTS, "Appointment"),
        }
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.base = self.base.with_limits(limits);
        self
    }
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError> {
        self.base
            .find_by_id::<AppointmentRow>(id)
            .await?
            .map(Appointment::try_from)
            .transpose()
    }

    async fn search(&self, request: &FilterRequest) -> Result<Page<Appointment>, AppError> {
        self.base
            .search::<AppointmentRow, Appointment>(request)
            .await
    }

    async fn book(&self, new_appointment: NewAppointment) -> Result<Appointment, AppError> {
        let slot = new_appointment.slot;
        let mut tx = self.base.pool().begin().await?;

        guard_slot(&mut *tx, new_appointment.beneficiary_id, &slot, None).await?;

        let year = slot.appointment_date.year();
        let sequence = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO appointment_sequences (year, last_value)
            VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE
                SET last_value = appointment_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "INSERT INTO appointments \
             (appointment_number, beneficiary_id, schedule_id, appointment_date, start_time, end_time, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            APPOINTMENTS.columns
        );

        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(AppointmentNumber::format(year, sequence))
            .bind(new_appointment.beneficiary_id)
            .bind(slot.schedule_id)
            .bind(slot.appointment_date)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .bind(new_appointment.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn reschedule(
        &self,
        id: i64,
        expected_version: i32,
        slot: BookedSlot,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.base.pool().begin().await?;

        let beneficiary_id = sqlx::query_scalar::<_, i64>(
            "SELECT beneficiary_id FROM appointments WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| self.base.not_found(id))?;

        guard_slot(&mut *tx, beneficiary_id, &slot, Some(id)).await?;

        let sql = format!(
            "UPDATE appointments SET \
             schedule_id = $3, appointment_date = $4, start_time = $5, end_time = $6, \
             row_version = row_version + 1, updated_at = NOW() \
             WHERE id = $1 AND row_version = $2 AND is_deleted = FALSE AND status = 'scheduled' \
             RETURNING {}",
            APPOINTMENTS.columns
        );

        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(slot.schedule_id)
            .bind(slot.appointment_date)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .fetch_optional(&mut *tx)
            .await?;

        match row {
            Some(row) => {
                tx.commit().await?;
                row.try_into()
            }
            None => {
                tx.rollback().await?;
                Err(self.base.missing_or_stale(id, expected_version).await)
            }
        }
    }

    async fn update_status(
        &self,
        id: i64,
        expected_version: i32,
        status: AppointmentStatus,
        cancellation_reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let mut qb = self.base.update_builder();
        qb.push("status = ")
            .push_bind(status.as_str())
            .push(", cancellation_reason = ")
            .push_bind(cancellation_reason);

        self.base
            .finish_update::<AppointmentRow>(qb, id, expected_version)
            .await?
            .try_into()
    }

    async fn count_booked(
        &self,
        schedule_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<i64, AppError> {
        count_in_slot(self.base.pool(), schedule_id, date, start_time, exclude_id).await
    }

    async fn booked_counts(&self, date: NaiveDate) -> Result<Vec<SlotUsage>, AppError> {
        let rows = sqlx::query_as::<_, (i64, NaiveTime, i64)>(
            r#"
            SELECT schedule_id, start_time, COUNT(*)
            FROM appointments
            WHERE appointment_date = $1 AND status = 'scheduled' AND is_deleted = FALSE
            GROUP BY schedule_id, start_time
            "#,
        )
        .bind(date)
        .fetch_all(self.base.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(schedule_id, start_time, booked)| SlotUsage {
                schedule_id,
                start_time,
                booked,
            })
            .collect())
    }

    async fn has_overlapping_booking(
        &self,
        beneficiary_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<bool, AppError> {
        overlapping_exists(
            self.base.pool(),
            beneficiary_id,
            date,
            start_time,
            end_time,
            exclude_id,
        )
        .await
    }

    async fn count_upcoming_for_beneficiary(
        &self,
        beneficiary_id: i64,
        from: NaiveDate,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE beneficiary_id = $1 AND appointment_date >= $2
              AND status = 'scheduled' AND is_deleted = FALSE
            "#,
        )
        .bind(beneficiary_id)
        .bind(from)
        .fetch_one(self.base.pool())
        .await?;

        Ok(count)
    }

    async fn count_upcoming_for_schedule(
        &self,
        schedule_id: i64,
        from: NaiveDate,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE schedule_id = $1 AND appointment_date >= $2
              AND status = 'scheduled' AND is_deleted = FALSE
            "#,
        )
        .bind(schedule_id)
        .bind(from)
        .fetch_one(self.base.pool())
        .await?;

        Ok(count)
    }

    async fn count_by_status(&self) -> Result<Vec<(AppointmentStatus, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM appointments WHERE is_deleted = FALSE \
             GROUP BY status ORDER BY status",
        )
        .fetch_all(self.base.pool())
        .await?;

        rows.into_iter()
            .map(|(status, count)| Ok((parse_status(&status)?, count)))
            .collect()
    }
}
