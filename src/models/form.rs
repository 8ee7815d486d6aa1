//! Form plumbing shared by the record-management and renewal views

use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use validator::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name -> error messages, in the order fields were checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(IndexMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Folds derive-based length checks into the field map
    pub fn extend_from(&mut self, errors: &ValidationErrors) {
        self.fold(errors, |_| true);
    }

    /// Like [`extend_from`](Self::extend_from), but fields that already carry
    /// an error keep only that one
    pub fn extend_missing_from(&mut self, errors: &ValidationErrors) {
        let reported: Vec<String> = self.0.keys().cloned().collect();
        self.fold(errors, |field| !reported.iter().any(|r| r == field));
    }

    fn fold(&mut self, errors: &ValidationErrors, keep: impl Fn(&str) -> bool) {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        for (field, list) in fields {
            let field = field.to_string();
            if !keep(&field) {
                continue;
            }
            for error in list.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                self.add(&field, message);
            }
        }
    }

    /// `Ok(())` when no field failed
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Blank create form: the fields it accepts and their pre-filled values
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FormDescription {
    pub name: String,
    pub fields: Vec<String>,
    #[schema(value_type = Object)]
    pub initial: Map<String, Value>,
}

/// Which editable fields a create/update view accepts from the client.
///
/// `All` admits every editable field of the model, including ones added to
/// the model later. Update views use it; the exposure is intentional and
/// visible here rather than implied by a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAllowList {
    All,
    Only(&'static [&'static str]),
}

impl FieldAllowList {
    pub fn permits(&self, field: &str, editable: &[&str]) -> bool {
        if !editable.contains(&field) {
            return false;
        }
        match self {
            FieldAllowList::All => true,
            FieldAllowList::Only(fields) => fields.contains(&field),
        }
    }

    /// Permitted field names in model order
    pub fn resolve(&self, editable: &[&'static str]) -> Vec<&'static str> {
        editable
            .iter()
            .copied()
            .filter(|f| self.permits(f, editable))
            .collect()
    }

    /// Drops every key the view does not accept
    pub fn filter(&self, mut payload: Map<String, Value>, editable: &[&str]) -> Map<String, Value> {
        payload.retain(|key, _| self.permits(key, editable));
        payload
    }
}

/// Bound value of one form field
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// Not submitted; updates keep the stored value
    Absent,
    /// Submitted as null or an empty string
    Empty,
    Value(T),
}

impl<T> Field<T> {
    /// Resolves against the currently stored value
    pub fn or_keep(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Absent => current,
            Field::Empty => None,
            Field::Value(v) => Some(v),
        }
    }
}

/// Reads one field out of a filtered payload, recording a field error when the
/// value has the wrong shape.
pub fn bind_field<T: DeserializeOwned>(
    payload: &Map<String, Value>,
    name: &str,
    errors: &mut FormErrors,
) -> Field<T> {
    match payload.get(name) {
        None => Field::Absent,
        Some(Value::Null) => Field::Empty,
        Some(Value::String(s)) if s.trim().is_empty() => Field::Empty,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(v) => Field::Value(v),
            Err(_) => {
                errors.add(name, "Enter a valid value.");
                Field::Absent
            }
        },
    }
}

/// Required text field: trimmed, present, non-empty
pub fn require_text(value: Option<String>, name: &str, errors: &mut FormErrors) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.add(name, REQUIRED);
            String::new()
        }
    }
}
