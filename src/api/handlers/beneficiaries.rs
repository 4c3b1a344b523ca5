//! Beneficiary endpoints.

use crate::api::dto::beneficiary::{BeneficiaryItem, BeneficiaryRequest};
use crate::api::handlers::crud::CrudEndpoint;
use crate::application::services::CrudService;
use crate::domain::entities::{Beneficiary, BeneficiaryDraft};
use crate::error::AppError;
use crate::state::AppState;

impl CrudEndpoint for Beneficiary {
    type Request = BeneficiaryRequest;
    type Item = BeneficiaryItem;

    fn service(state: &AppState) -> &CrudService<Self> {
        &state.beneficiary_service
    }

    fn draft(request: BeneficiaryRequest) -> Result<BeneficiaryDraft, AppError> {
        Ok(request.into_draft())
    }
}
