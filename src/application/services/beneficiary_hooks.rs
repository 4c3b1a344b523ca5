//! Beneficiary rules plugged into [`CrudService`](super::CrudService).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::application::services::CrudHooks;
use crate::domain::entities::{Beneficiary, BeneficiaryDraft};
use crate::domain::repositories::{AppointmentRepository, BeneficiaryRepository};
use crate::error::AppError;

/// Enforces national id uniqueness and blocks deleting beneficiaries that
/// still hold upcoming appointments.
pub struct BeneficiaryHooks<B: BeneficiaryRepository, A: AppointmentRepository> {
    beneficiaries: Arc<B>,
    appointments: Arc<A>,
}

impl<B: BeneficiaryRepository, A: AppointmentRepository> BeneficiaryHooks<B, A> {
    pub fn new(beneficiaries: Arc<B>, appointments: Arc<A>) -> Self {
        Self {
            beneficiaries,
            appointments,
        }
    }

    /// Rejects a national id already held by another beneficiary.
    async fn ensure_unique_national_id(
        &self,
        national_id: &str,
        except_id: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(existing) = self.beneficiaries.find_by_national_id(national_id).await?
            && Some(existing.id) != except_id
        {
            return Err(AppError::conflict(
                "A beneficiary with this national id already exists",
                json!({ "national_id": national_id, "existing_id": existing.id }),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<B: BeneficiaryRepository, A: AppointmentRepository> CrudHooks<Beneficiary>
    for BeneficiaryHooks<B, A>
{
    async fn before_create(&self, draft: &mut BeneficiaryDraft) -> Result<(), AppError> {
        *draft = draft.clone().normalized();
        self.ensure_unique_national_id(&draft.national_id, None)
            .await
    }

    async fn before_update(
        &self,
        current: &Beneficiary,
        draft: &mut BeneficiaryDraft,
    ) -> Result<(), AppError> {
        *draft = draft.clone().normalized();
        self.ensure_unique_national_id(&draft.national_id, Some(current.id))
            .await
    }

    async fn before_delete(&self, current: &Beneficiary) -> Result<(), AppError> {
        let today = Utc::now().date_naive();
        let upcoming = self
            .appointments
            .count_upcoming_for_beneficiary(current.id, today)
            .await?;

        if upcoming > 0 {
            return Err(AppError::bad_request(
                "Cannot delete beneficiary with upcoming appointments",
                json!({ "upcoming_appointments": upcoming }),
            ));
        }

        Ok(())
    }
}
