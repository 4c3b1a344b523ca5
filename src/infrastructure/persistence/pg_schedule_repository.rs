//! PostgreSQL implementation of the schedule repositories.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Schedule, ScheduleDraft};
use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::domain::repositories::{CrudRepository, ReadRepository, ScheduleRepository};
use crate::domain::scheduling;
use crate::error::AppError;
use crate::infrastructure::persistence::base_repository::BaseRepository;
use crate::infrastructure::persistence::specification::{
    FieldKind, FieldSpec, ScopeSpec, TableSpec,
};

pub(crate) static SCHEDULES: TableSpec = TableSpec {
    table: "schedules",
    columns: "id, day_of_week, start_time, end_time, slot_minutes, capacity, valid_from, \
              valid_until, is_active, description, row_version, created_at, updated_at",
    fields: &[
        FieldSpec {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "day_of_week",
            column: "day_of_week",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "start_time",
            column: "start_time",
            kind: FieldKind::Time,
        },
        FieldSpec {
            name: "end_time",
            column: "end_time",
            kind: FieldKind::Time,
        },
        FieldSpec {
            name: "slot_minutes",
            column: "slot_minutes",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "capacity",
            column: "capacity",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "valid_from",
            column: "valid_from",
            kind: FieldKind::Date,
        },
        FieldSpec {
            name: "valid_until",
            column: "valid_until",
            kind: FieldKind::Date,
        },
        FieldSpec {
            name: "is_active",
            column: "is_active",
            kind: FieldKind::Boolean,
        },
    ],
    scopes: &[
        ScopeSpec {
            name: "active",
            sql: "is_active = TRUE",
        },
        ScopeSpec {
            name: "current",
            sql: "(valid_from <= (NOW() AT TIME ZONE 'UTC')::DATE \
                  AND (valid_until IS NULL OR valid_until >= (NOW() AT TIME ZONE 'UTC')::DATE))",
        },
    ],
    default_sort: "day_of_week ASC, start_time ASC",
};

#[derive(FromRow)]
struct ScheduleRow {
    id: i64,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_minutes: i32,
    capacity: i32,
    valid_from: NaiveDate,
    valid_until: Option<NaiveDate>,
    is_active: bool,
    description: Option<String>,
    row_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = AppError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        let day_of_week = u8::try_from(row.day_of_week)
            .ok()
            .and_then(scheduling::weekday_from_iso)
            .ok_or_else(|| {
                AppError::internal(
                    "Stored schedule has an invalid weekday",
                    json!({ "id": row.id, "day_of_week": row.day_of_week }),
                )
            })?;

        Ok(Schedule {
            id: row.id,
            day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            slot_minutes: row.slot_minutes,
            capacity: row.capacity,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            is_active: row.is_active,
            description: row.description,
            row_version: row.row_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn day_column(day: Weekday) -> i16 {
    i16::from(scheduling::iso_from_weekday(day))
}

/// PostgreSQL repository for weekly schedules.
pub struct PgScheduleRepository {
    base: BaseRepository,
}

impl PgScheduleRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            base: BaseRepository::new(pool, &SCHEDULES, "Schedule"),
        }
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.base = self.base.with_limits(limits);
        self
    }
}

#[async_trait]
impl ReadRepository<Schedule> for PgScheduleRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Schedule>, AppError> {
        self.base
            .find_by_id::<ScheduleRow>(id)
            .await?
            .map(Schedule::try_from)
            .transpose()
    }

    async fn search(&self, request: &FilterRequest) -> Result<Page<Schedule>, AppError> {
        self.base.search::<ScheduleRow, Schedule>(request).await
    }
}

#[async_trait]
impl CrudRepository<Schedule> for PgScheduleRepository {
    async fn insert(&self, draft: ScheduleDraft) -> Result<Schedule, AppError> {
        let sql = format!(
            "INSERT INTO schedules \
             (day_of_week, start_time, end_time, slot_minutes, capacity, valid_from, valid_until, is_active, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            SCHEDULES.columns
        );

        let row = sqlx::query_as::<_, ScheduleRow>(&sql)
            .bind(day_column(draft.day_of_week))
            .bind(draft.start_time)
            .bind(draft.end_time)
            .bind(draft.slot_minutes)
            .bind(draft.capacity)
            .bind(draft.valid_from)
            .bind(draft.valid_until)
            .bind(draft.is_active)
            .bind(draft.description)
            .fetch_one(self.base.pool())
            .await?;

        row.try_into()
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: ScheduleDraft,
    ) -> Result<Schedule, AppError> {
        let mut qb = self.base.update_builder();
        qb.push("day_of_week = ")
            .push_bind(day_column(draft.day_of_week))
            .push(", start_time = ")
            .push_bind(draft.start_time)
            .push(", end_time = ")
            .push_bind(draft.end_time)
            .push(", slot_minutes = ")
            .push_bind(draft.slot_minutes)
            .push(", capacity = ")
            .push_bind(draft.capacity)
            .push(", valid_from = ")
            .push_bind(draft.valid_from)
            .push(", valid_until = ")
            .push_bind(draft.valid_until)
            .push(", is_active = ")
            .push_bind(draft.is_active)
            .push(", description = ")
            .push_bind(draft.description);

        self.base
            .finish_update::<ScheduleRow>(qb, id, expected_version)
            .await?
            .try_into()
    }

    async fn soft_delete(&self, id: i64, expected_version: Option<i32>) -> Result<(), AppError> {
        self.base.soft_delete(id, expected_version).await
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn find_by_day(&self, day: Weekday) -> Result<Vec<Schedule>, AppError> {
        let sql = format!(
            "SELECT {} FROM schedules WHERE is_deleted = FALSE AND day_of_week = $1 \
             ORDER BY start_time, id",
            SCHEDULES.columns
        );

        let rows = sqlx::query_as::<_, ScheduleRow>(&sql)
            .bind(day_column(day))
            .fetch_all(self.base.pool())
            .await?;

        rows.into_iter().map(Schedule::try_from).collect()
    }
}
