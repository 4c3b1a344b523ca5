//! Holiday rules plugged into [`CrudService`](super::CrudService).

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::application::services::CrudHooks;
use crate::domain::entities::{Holiday, HolidayDraft};
use crate::domain::repositories::HolidayRepository;
use crate::error::AppError;

/// Keeps holiday ranges disjoint.
pub struct HolidayHooks<H: HolidayRepository> {
    holidays: Arc<H>,
}

impl<H: HolidayRepository> HolidayHooks<H> {
    pub fn new(holidays: Arc<H>) -> Self {
        Self { holidays }
    }

    async fn ensure_no_overlap(
        &self,
        draft: &HolidayDraft,
        except_id: Option<i64>,
    ) -> Result<(), AppError> {
        let clashing = self
            .holidays
            .find_in_range(draft.start_date, draft.end_date)
            .await?
            .into_iter()
            .find(|h| Some(h.id) != except_id);

        if let Some(existing) = clashing {
            return Err(AppError::conflict(
                "Holiday overlaps an existing holiday",
                json!({
                    "existing_id": existing.id,
                    "existing_name": existing.name,
                    "start_date": existing.start_date.to_string(),
                    "end_date": existing.end_date.to_string(),
                }),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl<H: HolidayRepository> CrudHooks<Holiday> for HolidayHooks<H> {
    async fn before_create(&self, draft: &mut HolidayDraft) -> Result<(), AppError> {
        draft.name = draft.name.trim().to_string();
        self.ensure_no_overlap(draft, None).await
    }

    async fn before_update(
        &self,
        current: &Holiday,
        draft: &mut HolidayDraft,
    ) -> Result<(), AppError> {
        draft.name = draft.name.trim().to_string();
        self.ensure_no_overlap(draft, Some(current.id)).await
    }
}
