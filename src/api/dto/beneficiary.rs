//! DTOs for beneficiary endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Beneficiary, BeneficiaryDraft};

/// Request body for creating or replacing a beneficiary.
#[derive(Debug, Deserialize, Validate)]
pub struct BeneficiaryRequest {
    #[validate(length(min = 1, max = 200, message = "Full name must be 1 to 200 characters"))]
    pub full_name: String,

    #[validate(length(min = 4, max = 32, message = "National id must be 4 to 32 characters"))]
    pub national_id: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub date_of_birth: Option<NaiveDate>,
}

impl BeneficiaryRequest {
    pub fn into_draft(self) -> BeneficiaryDraft {
        BeneficiaryDraft {
            full_name: self.full_name,
            national_id: self.national_id,
            phone: self.phone,
            email: self.email,
            date_of_birth: self.date_of_birth,
        }
        .normalized()
    }
}

/// Beneficiary as returned by the API.
#[derive(Debug, Serialize)]
pub struct BeneficiaryItem {
    pub id: i64,
    pub full_name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub row_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Beneficiary> for BeneficiaryItem {
    fn from(b: Beneficiary) -> Self {
        Self {
            id: b.id,
            full_name: b.full_name,
            national_id: b.national_id,
            phone: b.phone,
            email: b.email,
            date_of_birth: b.date_of_birth,
            row_version: b.row_version,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_rejects_bad_email_and_blank_name() {
        let request: BeneficiaryRequest = serde_json::from_value(json!({
            "full_name": "",
            "national_id": "AB-1234",
            "email": "not-an-email"
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("national_id"));
    }

    #[test]
    fn test_into_draft_normalizes() {
        let request: BeneficiaryRequest = serde_json::from_value(json!({
            "full_name": "  Ada Lovelace ",
            "national_id": "ab-1234",
            "phone": "   ",
            "email": "Ada@Example.COM"
        }))
        .unwrap();

        let draft = request.into_draft();
        assert_eq!(draft.full_name, "Ada Lovelace");
        assert_eq!(draft.national_id, "AB-1234");
        assert_eq!(draft.phone, None);
        assert_eq!(draft.email.as_deref(), Some("ada@example.com"));
    }
}
