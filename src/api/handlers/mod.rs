//! Per-resource request handlers.

pub mod auth;
pub mod categories;
pub mod crises;
pub mod exam_types;
pub mod exams;
pub mod hospitalizations;
pub mod medicaments;
pub mod patients;
pub mod prescription_types;
pub mod prescriptions;
pub mod treatments;

use chrono::{DateTime, Utc};

use crate::error::ApiError;

/// Shared date-range check: the end may not precede the start.
pub(crate) fn check_date_order(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ApiError::field(
                "end_date",
                "The end date must be after the start date.",
            ));
        }
    }
    Ok(())
}
