//! Generic handlers for the CRUD resources.
//!
//! Beneficiaries, holidays and schedules expose the same six endpoints; each
//! resource plugs in its DTOs and service through [`CrudEndpoint`] and the
//! router mounts `list_handler::<Beneficiary>` and friends.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use validator::Validate;

use crate::api::dto::pagination::{DeleteParams, ListResponse, PaginationParams};
use crate::api::dto::versioned::Versioned;
use crate::application::services::CrudService;
use crate::domain::filter::FilterRequest;
use crate::domain::repositories::Editable;
use crate::error::AppError;
use crate::state::AppState;

/// Binds an editable entity to its HTTP representation.
pub trait CrudEndpoint: Editable {
    /// Create / replace body.
    type Request: DeserializeOwned + Validate + Send + 'static;
    /// Response body.
    type Item: Serialize + From<Self> + Send;

    fn service(state: &AppState) -> &CrudService<Self>;

    /// Converts a validated request into a draft.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a value cannot be mapped.
    fn draft(request: Self::Request) -> Result<Self::Draft, AppError>;
}

/// Lists resources page by page.
///
/// # Endpoint
///
/// `GET /api/{resource}?page=&page_size=`
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn list_handler<E: CrudEndpoint>(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ListResponse<E::Item>>, AppError> {
    let service = E::service(&state);
    let request = params
        .to_filter_request(service.limits().max_page_size)
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let page = service.search(&request).await?;
    Ok(Json(page.into()))
}

/// Runs a structured search.
///
/// # Endpoint
///
/// `POST /api/{resource}/search` with a
/// [`FilterRequest`](crate::domain::filter::FilterRequest) body.
///
/// # Errors
///
/// Returns 400 Bad Request for unknown fields or scopes, unsupported
/// operators, malformed values or requests over the limits.
pub async fn search_handler<E: CrudEndpoint>(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<ListResponse<E::Item>>, AppError> {
    let page = E::service(&state).search(&request).await?;
    Ok(Json(page.into()))
}

/// Creates a resource.
///
/// # Endpoint
///
/// `POST /api/{resource}`
///
/// # Errors
///
/// Returns 400 if validation fails.
/// Returns 409 if the resource clashes with an existing one.
pub async fn create_handler<E: CrudEndpoint>(
    State(state): State<AppState>,
    Json(payload): Json<E::Request>,
) -> Result<(StatusCode, Json<E::Item>), AppError> {
    payload.validate()?;
    let draft = E::draft(payload)?;

    let saved = E::service(&state).create(draft).await?;
    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// Loads one resource.
///
/// # Endpoint
///
/// `GET /api/{resource}/{id}`
///
/// # Errors
///
/// Returns 404 if the resource does not exist or is deleted.
pub async fn get_handler<E: CrudEndpoint>(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<E::Item>, AppError> {
    let entity = E::service(&state).get(id).await?;
    Ok(Json(entity.into()))
}

/// Replaces a resource at the version the client read.
///
/// # Endpoint
///
/// `PUT /api/{resource}/{id}` with `row_version` next to the fields.
///
/// # Errors
///
/// Returns 400 if validation fails.
/// Returns 404 if the resource does not exist.
/// Returns 409 if `row_version` is stale or a business rule rejects the change.
pub async fn update_handler<E: CrudEndpoint>(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<Versioned<E::Request>>,
) -> Result<Json<E::Item>, AppError> {
    payload.body.validate()?;
    let draft = E::draft(payload.body)?;

    let saved = E::service(&state)
        .update(id, payload.row_version, draft)
        .await?;
    Ok(Json(saved.into()))
}

/// Soft-deletes a resource.
///
/// # Endpoint
///
/// `DELETE /api/{resource}/{id}?row_version=`
///
/// The version guard is optional.
///
/// # Errors
///
/// Returns 400 if a business rule forbids the delete.
/// Returns 404 if the resource does not exist or is already deleted.
/// Returns 409 if `row_version` is given and stale.
pub async fn delete_handler<E: CrudEndpoint>(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    E::service(&state).delete(id, params.row_version).await?;
    Ok(StatusCode::NO_CONTENT)
}
