//! Table-independent persistence shared by every PostgreSQL adapter.
//!
//! [`BaseRepository`] implements once what all soft-deletable, versioned tables
//! have in common: lookup by id, filtered and paged search, the versioned
//! `UPDATE` tail and soft delete. Adapters supply the table whitelist and the
//! column assignments that differ per entity.

use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::error::AppError;
use crate::infrastructure::persistence::specification::{SpecificationBuilder, TableSpec};

/// Generic CRUD plumbing over one table.
#[derive(Clone)]
pub struct BaseRepository {
    pool: Arc<PgPool>,
    spec: &'static TableSpec,
    resource: &'static str,
    limits: FilterLimits,
}

impl BaseRepository {
    pub fn new(pool: Arc<PgPool>, spec: &'static TableSpec, resource: &'static str) -> Self {
        Self {
            pool,
            spec,
            resource,
            limits: FilterLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    /// Loads a non-deleted row.
    pub async fn find_by_id<R>(&self, id: i64) -> Result<Option<R>, AppError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND is_deleted = FALSE",
            self.spec.columns, self.spec.table
        );

        let row = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row)
    }

    /// Counts and loads one page of rows matching `request`.
    ///
    /// Rows are converted with `E: TryFrom<R>` so that adapters can reject
    /// values the database should never contain.
    pub async fn search<R, E>(&self, request: &FilterRequest) -> Result<Page<E>, AppError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: TryFrom<R, Error = AppError>,
    {
        let builder = SpecificationBuilder::new(self.spec, &self.limits);
        let predicate = builder.compile(request)?;
        let order_by = builder.order_by(request)?;

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE ", self.spec.table));
        predicate.render(&mut count_qb);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(self.pool()).await?;

        if total == 0 {
            return Ok(Page::empty(request.page, request.size));
        }

        let mut page_qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE ",
            self.spec.columns, self.spec.table
        ));
        predicate.render(&mut page_qb);
        page_qb.push(" ORDER BY ").push(order_by);
        page_qb.push(" LIMIT ").push_bind(request.limit());
        page_qb.push(" OFFSET ").push_bind(request.offset());

        let rows: Vec<R> = page_qb.build_query_as().fetch_all(self.pool()).await?;
        let items = rows
            .into_iter()
            .map(E::try_from)
            .collect::<Result<Vec<E>, AppError>>()?;

        Ok(Page::new(items, request.page, request.size, total))
    }

    /// Starts `UPDATE <table> SET `; the adapter pushes its assignments and
    /// hands the builder to [`BaseRepository::finish_update`].
    pub fn update_builder(&self) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("UPDATE {} SET ", self.spec.table))
    }

    /// Appends the version bump and guard, runs the update and returns the
    /// stored row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row does not exist or is deleted.
    /// Returns [`AppError::Conflict`] if its version is not `expected_version`.
    pub async fn finish_update<R>(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
        id: i64,
        expected_version: i32,
    ) -> Result<R, AppError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        qb.push(", row_version = row_version + 1, updated_at = NOW() WHERE id = ")
            .push_bind(id)
            .push(" AND row_version = ")
            .push_bind(expected_version)
            .push(" AND is_deleted = FALSE RETURNING ")
            .push(self.spec.columns);

        let row: Option<R> = qb.build_query_as().fetch_optional(self.pool()).await?;

        match row {
            Some(row) => Ok(row),
            None => Err(self.missing_or_stale(id, expected_version).await),
        }
    }

    /// Marks a row deleted and bumps its version.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row does not exist or is already
    /// deleted.
    /// Returns [`AppError::Conflict`] if `expected_version` is given and stale.
    pub async fn soft_delete(&self, id: i64, expected_version: Option<i32>) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET is_deleted = TRUE, row_version = row_version + 1, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE AND ($2::INTEGER IS NULL OR row_version = $2)",
            self.spec.table
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(expected_version)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .missing_or_stale(id, expected_version.unwrap_or_default())
                .await);
        }

        Ok(())
    }

    /// Explains why a guarded write touched no row.
    pub async fn missing_or_stale(&self, id: i64, expected_version: i32) -> AppError {
        let sql = format!(
            "SELECT row_version FROM {} WHERE id = $1 AND is_deleted = FALSE",
            self.spec.table
        );

        match sqlx::query_scalar::<_, i32>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
        {
            Ok(Some(_)) => AppError::stale_version(self.resource, id, expected_version),
            Ok(None) => self.not_found(id),
            Err(e) => e.into(),
        }
    }

    pub fn not_found(&self, id: i64) -> AppError {
        AppError::not_found(format!("{} not found", self.resource), json!({ "id": id }))
    }
}
