//! Schedule endpoints.

use crate::api::dto::schedule::{ScheduleItem, ScheduleRequest};
use crate::api::handlers::crud::CrudEndpoint;
use crate::application::services::CrudService;
use crate::domain::entities::{Schedule, ScheduleDraft};
use crate::error::AppError;
use crate::state::AppState;

impl CrudEndpoint for Schedule {
    type Request = ScheduleRequest;
    type Item = ScheduleItem;

    fn service(state: &AppState) -> &CrudService<Self> {
        &state.schedule_service
    }

    fn draft(request: ScheduleRequest) -> Result<ScheduleDraft, AppError> {
        request.into_draft()
    }
}
