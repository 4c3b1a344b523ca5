//! Generic ports shared by every soft-deletable, versioned entity.

use async_trait::async_trait;

use crate::domain::filter::{FilterRequest, Page};
use crate::error::AppError;

/// An entity stored with a numeric id, a soft-delete flag and a row version.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Human-readable name used in error messages and logs.
    const NAME: &'static str;

    fn id(&self) -> i64;

    fn row_version(&self) -> i32;
}

/// A [`Resource`] clients create and replace through a draft.
pub trait Editable: Resource {
    /// Client-controlled fields, used for create and full update.
    type Draft: Clone + Send + Sync + 'static;

    /// Checks invariants that hold for the draft alone.
    ///
    /// Rules that need other rows (uniqueness, overlaps) belong in
    /// [`crate::application::services::CrudHooks`].
    fn validate_draft(draft: &Self::Draft) -> Result<(), AppError>;
}

/// Read access to non-deleted rows.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgBeneficiaryRepository`]
/// - [`crate::infrastructure::persistence::PgHolidayRepository`]
/// - [`crate::infrastructure::persistence::PgScheduleRepository`]
#[async_trait]
pub trait ReadRepository<E: Resource>: Send + Sync {
    /// Finds a row by id. Soft-deleted rows are reported as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError>;

    /// Runs a structured search over non-deleted rows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the request names unknown fields or
    /// scopes, or carries values of the wrong type.
    /// Returns [`AppError::Internal`] on database errors.
    async fn search(&self, request: &FilterRequest) -> Result<Page<E>, AppError>;
}

/// Write access with optimistic locking and soft delete.
#[async_trait]
pub trait CrudRepository<E: Editable>: ReadRepository<E> {
    /// Inserts a new row with `row_version = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] on unique constraint violations.
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, draft: E::Draft) -> Result<E, AppError>;

    /// Replaces the client fields of a row whose version is `expected_version`
    /// and increments the version.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row does not exist or is deleted.
    /// Returns [`AppError::Conflict`] if the version no longer matches.
    async fn update(&self, id: i64, expected_version: i32, draft: E::Draft)
    -> Result<E, AppError>;

    /// Marks a row deleted. When `expected_version` is given it must match.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row does not exist or is already
    /// deleted.
    /// Returns [`AppError::Conflict`] if the version no longer matches.
    async fn soft_delete(&self, id: i64, expected_version: Option<i32>) -> Result<(), AppError>;
}
