//! Generic create / read / update / delete template.
//!
//! [`CrudService`] runs the same pipeline for every editable entity and lets
//! each entity plug its own rules in through [`CrudHooks`]:
//!
//! ```text
//! create: validate_draft -> before_create -> insert -> after_save
//! update: validate_draft -> load -> version check -> before_update -> update -> after_save
//! delete: load -> version check -> before_delete -> soft_delete
//! ```

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::domain::repositories::{CrudRepository, Editable};
use crate::error::AppError;

/// Entity-specific extension points of [`CrudService`].
///
/// Every method defaults to a no-op, so an entity overrides only what it
/// needs. Hooks may rewrite the draft before it is stored.
#[async_trait]
pub trait CrudHooks<E: Editable>: Send + Sync {
    /// Runs after draft validation, before the insert.
    ///
    /// # Errors
    ///
    /// Any error aborts the create and is returned to the caller.
    async fn before_create(&self, _draft: &mut E::Draft) -> Result<(), AppError> {
        Ok(())
    }

    /// Runs after the version check, before the update.
    ///
    /// # Errors
    ///
    /// Any error aborts the update and is returned to the caller.
    async fn before_update(&self, _current: &E, _draft: &mut E::Draft) -> Result<(), AppError> {
        Ok(())
    }

    /// Runs after the version check, before the soft delete.
    ///
    /// # Errors
    ///
    /// Any error aborts the delete and is returned to the caller.
    async fn before_delete(&self, _current: &E) -> Result<(), AppError> {
        Ok(())
    }

    /// Runs once a create or update has been stored.
    async fn after_save(&self, _saved: &E) {}
}

/// CRUD pipeline shared by beneficiaries, holidays and schedules.
pub struct CrudService<E: Editable> {
    repository: Arc<dyn CrudRepository<E>>,
    hooks: Arc<dyn CrudHooks<E>>,
    limits: FilterLimits,
}

impl<E: Editable> CrudService<E> {
    /// Creates a new service.
    pub fn new(
        repository: Arc<dyn CrudRepository<E>>,
        hooks: Arc<dyn CrudHooks<E>>,
        limits: FilterLimits,
    ) -> Self {
        Self {
            repository,
            hooks,
            limits,
        }
    }

    /// Filter limits applied to [`CrudService::search`].
    pub fn limits(&self) -> &FilterLimits {
        &self.limits
    }

    /// Creates an entity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the draft is invalid.
    /// Returns [`AppError::Conflict`] if a hook or a unique constraint rejects it.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn create(&self, mut draft: E::Draft) -> Result<E, AppError> {
        E::validate_draft(&draft)?;
        self.hooks.before_create(&mut draft).await?;

        let saved = self.repository.insert(draft).await?;
        self.hooks.after_save(&saved).await;

        tracing::info!(resource = E::NAME, id = saved.id(), "Created");
        Ok(saved)
    }

    /// Loads a non-deleted entity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the entity does not exist or is deleted.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get(&self, id: i64) -> Result<E, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<E>(id))
    }

    /// Replaces the client fields of an entity at `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the draft is invalid.
    /// Returns [`AppError::NotFound`] if the entity does not exist.
    /// Returns [`AppError::Conflict`] if the version is stale or a hook rejects it.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn update(
        &self,
        id: i64,
        expected_version: i32,
        mut draft: E::Draft,
    ) -> Result<E, AppError> {
        E::validate_draft(&draft)?;

        let current = self.get(id).await?;
        if current.row_version() != expected_version {
            return Err(AppError::stale_version(E::NAME, id, expected_version));
        }

        self.hooks.before_update(&current, &mut draft).await?;

        let saved = self.repository.update(id, expected_version, draft).await?;
        self.hooks.after_save(&saved).await;

        tracing::info!(
            resource = E::NAME,
            id,
            row_version = saved.row_version(),
            "Updated"
        );
        Ok(saved)
    }

    /// Soft-deletes an entity. The version is checked only when given.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the entity does not exist or is
    /// already deleted.
    /// Returns [`AppError::Conflict`] if the version is stale.
    /// Returns [`AppError::Validation`] if a hook forbids the delete.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn delete(&self, id: i64, expected_version: Option<i32>) -> Result<(), AppError> {
        let current = self.get(id).await?;
        if let Some(expected) = expected_version
            && current.row_version() != expected
        {
            return Err(AppError::stale_version(E::NAME, id, expected));
        }

        self.hooks.before_delete(&current).await?;
        self.repository.soft_delete(id, expected_version).await?;

        tracing::info!(resource = E::NAME, id, "Deleted");
        Ok(())
    }

    /// Runs a structured search.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the request breaks the filter limits
    /// or names unknown fields.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn search(&self, request: &FilterRequest) -> Result<Page<E>, AppError> {
        request.validate(&self.limits)?;
        self.repository.search(request).await
    }
}

fn not_found<E: Editable>(id: i64) -> AppError {
    AppError::not_found(format!("{} not found", E::NAME), json!({ "id": id }))
}
