//! Loan renewal workflow
//!
//! Two phases: presenting a form pre-filled with a proposed due date, and
//! validating a submitted date before writing it to the copy. Callers are
//! expected to have checked the `CanMarkReturned` capability already.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::BookInstance,
        form::{FormErrors, REQUIRED},
        renewal::{RenewBookRequest, RenewalForm},
    },
    repository::BookInstanceStore,
};

/// Proposed loan extension shown on the form
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;
/// Furthest a due date may be pushed out from today
pub const MAX_RENEWAL_WEEKS: i64 = 4;

pub const RENEWAL_IN_PAST: &str = "Invalid date - renewal in past.";
pub const RENEWAL_TOO_FAR: &str = "Invalid date - renewal more than 4 weeks ahead.";
pub const INVALID_DATE: &str = "Enter a valid date.";

const FIELD: &str = "renewal_date";
const INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Validates a submitted renewal date against `today`.
///
/// Accepts `today ..= today + 4 weeks`; both ends inclusive.
pub fn clean_renewal_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, FormErrors> {
    let mut errors = FormErrors::default();

    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        errors.add(FIELD, REQUIRED);
        return Err(errors);
    }

    let Some(date) = parse_date(raw) else {
        errors.add(FIELD, INVALID_DATE);
        return Err(errors);
    };

    if date < today {
        errors.add(FIELD, RENEWAL_IN_PAST);
        return Err(errors);
    }
    if date > today + Duration::weeks(MAX_RENEWAL_WEEKS) {
        errors.add(FIELD, RENEWAL_TOO_FAR);
        return Err(errors);
    }

    Ok(date)
}

/// Result of a renewal submission
#[derive(Debug)]
pub enum RenewalOutcome {
    /// Due date written; carries the updated copy
    Renewed(BookInstance),
    /// Nothing written; carries the form to redisplay
    Rejected(RenewalForm),
}

#[derive(Clone)]
pub struct RenewalService {
    store: Arc<dyn BookInstanceStore>,
}

impl RenewalService {
    pub fn new(store: Arc<dyn BookInstanceStore>) -> Self {
        Self { store }
    }

    /// Form for a copy, proposing today + 3 weeks regardless of its current due date
    pub async fn present(&self, id: Uuid, today: NaiveDate) -> AppResult<RenewalForm> {
        let book_instance = self.store.get_by_id(id).await?;

        Ok(RenewalForm {
            book_instance,
            renewal_date: proposed_renewal_date(today).format("%Y-%m-%d").to_string(),
            errors: FormErrors::default(),
        })
    }

    /// Validate and apply a proposed due date.
    ///
    /// Concurrent renewals of one copy are last-write-wins.
    pub async fn submit(
        &self,
        id: Uuid,
        request: &RenewBookRequest,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let book_instance = self.store.get_by_id(id).await?;
        let raw = request.renewal_date.as_deref();

        match clean_renewal_date(raw, today) {
            Ok(due_back) => {
                self.store.set_due_back(id, due_back).await?;
                tracing::info!(book_instance = %id, %due_back, "loan renewed");

                Ok(RenewalOutcome::Renewed(BookInstance {
                    due_back: Some(due_back),
                    ..book_instance
                }))
            }
            Err(errors) => {
                tracing::debug!(book_instance = %id, ?errors, "renewal rejected");

                Ok(RenewalOutcome::Rejected(RenewalForm {
                    book_instance,
                    renewal_date: raw.unwrap_or_default().to_string(),
                    errors,
                }))
            }
        }
    }
}
