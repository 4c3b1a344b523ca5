//! PostgreSQL implementation of the holiday repositories.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Holiday, HolidayDraft};
use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::domain::repositories::{CrudRepository, HolidayRepository, ReadRepository};
use crate::error::AppError;
use crate::infrastructure::persistence::base_repository::BaseRepository;
use crate::infrastructure::persistence::specification::{
    FieldKind, FieldSpec, ScopeSpec, TableSpec,
};

pub(crate) static HOLIDAYS: TableSpec = TableSpec {
    table: "holidays",
    columns: "id, name, start_date, end_date, row_version, created_at, updated_at",
    fields: &[
        FieldSpec {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "name",
            column: "name",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "start_date",
            column: "start_date",
            kind: FieldKind::Date,
        },
        FieldSpec {
            name: "end_date",
            column: "end_date",
            kind: FieldKind::Date,
        },
    ],
    scopes: &[ScopeSpec {
        name: "upcoming",
        sql: "end_date >= (NOW() AT TIME ZONE 'UTC')::DATE",
    }],
    default_sort: "start_date ASC",
};

#[derive(FromRow)]
struct HolidayRow {
    id: i64,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    row_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HolidayRow> for Holiday {
    type Error = AppError;

    fn try_from(row: HolidayRow) -> Result<Self, Self::Error> {
        Ok(Holiday {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            row_version: row.row_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL repository for the holiday calendar.
pub struct PgHolidayRepository {
    base: BaseRepository,
}

impl PgHolidayRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            base: BaseRepository::new(pool, &HOLIDAYS, "Holiday"),
        }
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.base = self.base.with_limits(limits);
        self
    }
}

#[async_trait]
impl ReadRepository<Holiday> for PgHolidayRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Holiday>, AppError> {
        self.base
            .find_by_id::<HolidayRow>(id)
            .await?
            .map(Holiday::try_from)
            .transpose()
    }

    async fn search(&self, request: &FilterRequest) -> Result<Page<Holiday>, AppError> {
        self.base.search::<HolidayRow, Holiday>(request).await
    }
}

#[async_trait]
impl CrudRepository<Holiday> for PgHolidayRepository {
    async fn insert(&self, draft: HolidayDraft) -> Result<Holiday, AppError> {
        let sql = format!(
            "INSERT INTO holidays (name, start_date, end_date) VALUES ($1, $2, $3) RETURNING {}",
            HOLIDAYS.columns
        );

        let row = sqlx::query_as::<_, HolidayRow>(&sql)
            .bind(draft.name)
            .bind(draft.start_date)
            .bind(draft.end_date)
            .fetch_one(self.base.pool())
            .await?;

        row.try_into()
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: HolidayDraft,
    ) -> Result<Holiday, AppError> {
        let mut qb = self.base.update_builder();
        qb.push("name = ")
            .push_bind(draft.name)
            .push(", start_date = ")
            .push_bind(draft.start_date)
            .push(", end_date = ")
            .push_bind(draft.end_date);

        self.base
            .finish_update::<HolidayRow>(qb, id, expected_version)
            .await?
            .try_into()
    }

    async fn soft_delete(&self, id: i64, expected_version: Option<i32>) -> Result<(), AppError> {
        self.base.soft_delete(id, expected_version).await
    }
}

#[async_trait]
impl HolidayRepository for PgHolidayRepository {
    async fn find_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Holiday>, AppError> {
        let sql = format!(
            "SELECT {} FROM holidays \
             WHERE is_deleted = FALSE AND start_date <= $2 AND end_date >= $1 \
             ORDER BY start_date, id",
            HOLIDAYS.columns
        );

        let rows = sqlx::query_as::<_, HolidayRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(self.base.pool())
            .await?;

        rows.into_iter().map(Holiday::try_from).collect()
    }
}
