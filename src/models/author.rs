//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;
use super::form::{bind_field, require_text, FormErrors};

/// Fields a client may ever write on an author
pub const EDITABLE_FIELDS: &[&str] = &["first_name", "last_name", "date_of_birth", "date_of_death"];

/// Author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First"
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Author detail page: the author plus their books
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: Author,
    pub name: String,
    pub books: Vec<BookSummary>,
}

/// Validated author fields ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct AuthorForm {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub first_name: String,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Binds an allow-list-filtered payload. On update, `current` supplies the
    /// value of every field the payload does not carry.
    pub fn bind(payload: &Map<String, Value>, current: Option<&Author>) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::default();

        let first_name = bind_field::<String>(payload, "first_name", &mut errors)
            .or_keep(current.map(|a| a.first_name.clone()));
        let last_name = bind_field::<String>(payload, "last_name", &mut errors)
            .or_keep(current.map(|a| a.last_name.clone()));
        let date_of_birth = bind_field::<NaiveDate>(payload, "date_of_birth", &mut errors)
            .or_keep(current.and_then(|a| a.date_of_birth));
        let date_of_death = bind_field::<NaiveDate>(payload, "date_of_death", &mut errors)
            .or_keep(current.and_then(|a| a.date_of_death));

        let form = Self {
            first_name: require_text(first_name, "first_name", &mut errors),
            last_name: require_text(last_name, "last_name", &mut errors),
            date_of_birth,
            date_of_death,
        };

        if let Err(e) = form.validate() {
            errors.extend_from(&e);
        }
        errors.into_result().map(|_| form)
    }
}
