//! PostgreSQL implementation of the beneficiary repositories.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Beneficiary, BeneficiaryDraft};
use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::domain::repositories::{BeneficiaryRepository, CrudRepository, ReadRepository};
use crate::error::AppError;
use crate::infrastructure::persistence::base_repository::BaseRepository;
use crate::infrastructure::persistence::specification::{FieldKind, FieldSpec, TableSpec};

pub(crate) static BENEFICIARIES: TableSpec = TableSpec {
    table: "beneficiaries",
    columns: "id, full_name, national_id, phone, email, date_of_birth, row_version, created_at, updated_at",
    fields: &[
        FieldSpec {
            name: "id",
            column: "id",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "full_name",
            column: "full_name",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "national_id",
            column: "national_id",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "phone",
            column: "phone",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "email",
            column: "email",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "date_of_birth",
            column: "date_of_birth",
            kind: FieldKind::Date,
        },
        FieldSpec {
            name: "created_at",
            column: "created_at",
            kind: FieldKind::Timestamp,
        },
    ],
    scopes: &[],
    default_sort: "full_name ASC",
};

#[derive(FromRow)]
struct BeneficiaryRow {
    id: i64,
    full_name: String,
    national_id: String,
    phone: Option<String>,
    email: Option<String>,
    date_of_birth: Option<NaiveDate>,
    row_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BeneficiaryRow> for Beneficiary {
    type Error = AppError;

    fn try_from(row: BeneficiaryRow) -> Result<Self, Self::Error> {
        Ok(Beneficiary {
            id: row.id,
            full_name: row.full_name,
            national_id: row.national_id,
            phone: row.phone,
            email: row.email,
            date_of_birth: row.date_of_birth,
            row_version: row.row_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL repository for beneficiaries.
///
/// `national_id` uniqueness among live rows is enforced by the partial index
/// `beneficiaries_national_id_key`; a race past the service check surfaces as
/// a 409 through [`AppError`]'s `sqlx::Error` conversion.
pub struct PgBeneficiaryRepository {
    base: BaseRepository,
}

impl PgBeneficiaryRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            base: BaseRepository::new(pool, &BENEFICIARIES, "Beneficiary"),
        }
    }

    pub fn with_limits(mut self, limits: FilterLimits) -> Self {
        self.base = self.base.with_limits(limits);
        self
    }
}

#[async_trait]
impl ReadRepository<Beneficiary> for PgBeneficiaryRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Beneficiary>, AppError> {
        self.base
            .find_by_id::<BeneficiaryRow>(id)
            .await?
            .map(Beneficiary::try_from)
            .transpose()
    }

    async fn search(&self, request: &FilterRequest) -> Result<Page<Beneficiary>, AppError> {
        self.base
            .search::<BeneficiaryRow, Beneficiary>(request)
            .await
    }
}

#[async_trait]
impl CrudRepository<Beneficiary> for PgBeneficiaryRepository {
    async fn insert(&self, draft: BeneficiaryDraft) -> Result<Beneficiary, AppError> {
        let sql = format!(
            "INSERT INTO beneficiaries (full_name, national_id, phone, email, date_of_birth) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            BENEFICIARIES.columns
        );

        let row = sqlx::query_as::<_, BeneficiaryRow>(&sql)
            .bind(draft.full_name)
            .bind(draft.national_id)
            .bind(draft.phone)
            .bind(draft.email)
            .bind(draft.date_of_birth)
            .fetch_one(self.base.pool())
            .await?;

        row.try_into()
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: BeneficiaryDraft,
    ) -> Result<Beneficiary, AppError> {
        let mut qb = self.base.update_builder();
        qb.push("full_name = ")
            .push_bind(draft.full_name)
            .push(", national_id = ")
            .push_bind(draft.national_id)
            .push(", phone = ")
            .push_bind(draft.phone)
            .push(", email = ")
            .push_bind(draft.email)
            .push(", date_of_birth = ")
            .push_bind(draft.date_of_birth);

        self.base
            .finish_update::<BeneficiaryRow>(qb, id, expected_version)
            .await?
            .try_into()
    }

    async fn soft_delete(&self, id: i64, expected_version: Option<i32>) -> Result<(), AppError> {
        self.base.soft_delete(id, expected_version).await
    }
}

#[async_trait]
impl BeneficiaryRepository for PgBeneficiaryRepository {
    async fn find_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<Beneficiary>, AppError> {
        let sql = format!(
            "SELECT {} FROM beneficiaries WHERE national_id = $1 AND is_deleted = FALSE",
            BENEFICIARIES.columns
        );

        sqlx::query_as::<_, BeneficiaryRow>(&sql)
            .bind(national_id)
            .fetch_optional(self.base.pool())
            .await?
            .map(Beneficiary::try_from)
            .transpose()
    }

    async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM beneficiaries WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(id)
        .fetch_one(self.base.pool())
        .await?;

        Ok(exists)
    }
}
