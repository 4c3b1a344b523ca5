//! Holiday endpoints.

use crate::api::dto::holiday::{HolidayItem, HolidayRequest};
use crate::api::handlers::crud::CrudEndpoint;
use crate::application::services::CrudService;
use crate::domain::entities::{Holiday, HolidayDraft};
use crate::error::AppError;
use crate::state::AppState;

impl CrudEndpoint for Holiday {
    type Request = HolidayRequest;
    type Item = HolidayItem;

    fn service(state: &AppState) -> &CrudService<Self> {
        &state.holiday_service
    }

    fn draft(request: HolidayRequest) -> Result<HolidayDraft, AppError> {
        Ok(request.into_draft())
    }
}
