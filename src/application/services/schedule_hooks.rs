//! Schedule rules plugged into [`CrudService`](super::CrudService).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::application::services::CrudHooks;
use crate::domain::entities::{Schedule, ScheduleDraft};
use crate::domain::repositories::{AppointmentRepository, ScheduleRepository};
use crate::domain::scheduling;
use crate::error::AppError;

/// Rejects overlapping schedules and protects schedules that still carry
/// upcoming appointments.
pub struct ScheduleHooks<S: ScheduleRepository, A: AppointmentRepository> {
    schedules: Arc<S>,
    appointments: Arc<A>,
}

impl<S: ScheduleRepository, A: AppointmentRepository> ScheduleHooks<S, A> {
    pub fn new(schedules: Arc<S>, appointments: Arc<A>) -> Self {
        Self {
            schedules,
            appointments,
        }
    }

    /// Two schedules overlap when they share the weekday, their time windows
    /// intersect and their validity ranges intersect.
    async fn ensure_no_overlap(
        &self,
        draft: &ScheduleDraft,
        except_id: Option<i64>,
    ) -> Result<(), AppError> {
        let clashing = self
            .schedules
            .find_by_day(draft.day_of_week)
            .await?
            .into_iter()
            .filter(|s| Some(s.id) != except_id)
            .find(|s| draft.overlaps(s));

        if let Some(existing) = clashing {
            return Err(AppError::conflict(
                "Schedule overlaps an existing schedule",
                json!({
                    "existing_id": existing.id,
                    "day_of_week": scheduling::iso_from_weekday(existing.day_of_week),
                    "start_time": existing.start_time.to_string(),
                    "end_time": existing.end_time.to_string(),
                }),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl<S: ScheduleRepository, A: AppointmentRepository> CrudHooks<Schedule> for ScheduleHooks<S, A> {
    async fn before_create(&self, draft: &mut ScheduleDraft) -> Result<(), AppError> {
        self.ensure_no_overlap(draft, None).await
    }

    async fn before_update(
        &self,
        current: &Schedule,
        draft: &mut ScheduleDraft,
    ) -> Result<(), AppError> {
        self.ensure_no_overlap(draft, Some(current.id)).await
    }

    async fn before_delete(&self, current: &Schedule) -> Result<(), AppError> {
        let today = Utc::now().date_naive();
        let upcoming = self
            .appointments
            .count_upcoming_for_schedule(current.id, today)
            .await?;

        if upcoming > 0 {
            return Err(AppError::bad_request(
                "Cannot delete schedule with upcoming appointments",
                json!({ "upcoming_appointments": upcoming }),
            ));
        }

        Ok(())
    }
}
