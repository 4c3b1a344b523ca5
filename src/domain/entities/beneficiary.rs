//! Domain entity representing a beneficiary.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use validator::ValidateEmail;

use crate::domain::repositories::{Editable, Resource};
use crate::error::AppError;

static NATIONAL_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]{4,32}$").unwrap());
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()-]{6,20}$").unwrap());

/// Longest accepted full name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// A person who can book appointments.
///
/// `national_id` is unique among non-deleted beneficiaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Beneficiary {
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

/// Client-controlled beneficiary fields, used for create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct BeneficiaryDraft {
    pub full_name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl BeneficiaryDraft {
    /// Trims text fields and drops empty optional values.
    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.national_id = self.national_id.trim().to_uppercase();
        self.phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self.email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        self
    }
}

impl Resource for Beneficiary {
    const NAME: &'static str = "Beneficiary";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_version(&self) -> i32 {
        self.row_version
    }
}

impl Editable for Beneficiary {
    type Draft = BeneficiaryDraft;

    fn validate_draft(draft: &BeneficiaryDraft) -> Result<(), AppError> {
        let mut fields = Map::new();

        let name_len = draft.full_name.trim().chars().count();
        if name_len == 0 || name_len > MAX_NAME_LEN {
            fields.insert(
                "full_name".into(),
                json!(format!("must be 1 to {MAX_NAME_LEN} characters")),
            );
        }
        if !NATIONAL_ID_REGEX.is_match(draft.national_id.trim()) {
            fields.insert(
                "national_id".into(),
                json!("must be 4 to 32 letters, digits or dashes"),
            );
        }
        if let Some(phone) = &draft.phone
            && !PHONE_REGEX.is_match(phone)
        {
            fields.insert("phone".into(), json!("invalid phone number"));
        }
        if let Some(email) = &draft.email
            && !email.validate_email()
        {
            fields.insert("email".into(), json!("invalid email address"));
        }
        if let Some(dob) = draft.date_of_birth
            && dob > Utc::now().date_naive()
        {
            fields.insert("date_of_birth".into(), json!("must not be in the future"));
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::bad_request(
                "Invalid beneficiary",
                json!({ "fields": Value::Object(fields) }),
            ))
        }
    }
}
