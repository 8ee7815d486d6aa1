//! Loan renewal form types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::book_instance::BookInstance;
use super::form::FormErrors;

/// Submitted renewal form
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenewBookRequest {
    /// Proposed due-back date (YYYY-MM-DD)
    pub renewal_date: Option<String>,
}

impl RenewBookRequest {
    /// Reads the form out of an arbitrary JSON body.
    ///
    /// Never fails: a missing or `null` date stays absent, and a value of the
    /// wrong type is kept as its JSON text so date cleaning rejects it.
    pub fn from_json(body: &Value) -> Self {
        let renewal_date = match body.get("renewal_date") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self { renewal_date }
    }
}

/// Renewal form as presented to the librarian
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalForm {
    pub book_instance: BookInstance,
    /// Pre-filled proposal, or the rejected value on redisplay
    pub renewal_date: String,
    #[schema(value_type = Object)]
    pub errors: FormErrors,
}
