//! Shared shape of the four resource collections
//!
//! Production activities, maintenance schedules, security alerts and
//! notifications all follow the same lifecycle: a JSON input is validated
//! into a draft (create) or a patch (partial update), the store assigns the
//! id and creation time, and patches are merged field by field.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ValidationErrors;

/// Store-assigned identifier of a resource record.
pub type RecordId = i64;

pub trait Record: Clone + Serialize + Send + Sync + 'static {
    /// Raw JSON body accepted by both create and update.
    type Input: DeserializeOwned + Send + 'static;
    /// Validated creation data.
    type Draft: Send;
    /// Validated partial update.
    type Patch: Send;

    /// Singular French label, used in user-facing messages.
    const LABEL: &'static str;

    /// Validate a create body: required fields present, enumerations known.
    fn validate_new(input: Self::Input) -> Result<Self::Draft, ValidationErrors>;

    /// Validate an update body: every present field must still be valid.
    fn validate_patch(input: Self::Input) -> Result<Self::Patch, ValidationErrors>;

    fn from_draft(id: RecordId, draft: Self::Draft, created_at: DateTime<Utc>) -> Self;

    fn apply(&mut self, patch: Self::Patch);

    fn id(&self) -> RecordId;
}

/// Trimmed non-empty text for a required field.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.add(field, message);
            None
        }
    }
}

/// Like [`required_text`], but absence is fine; only an empty value fails.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<String> {
    let value = value?;
    required_text(errors, field, Some(value), message)
}

/// Parse an enumeration field if present.
pub(crate) fn optional_enum<T: std::str::FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<T> {
    let value = value?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, message);
            None
        }
    }
}

/// Parse a required enumeration field.
pub(crate) fn required_enum<T: std::str::FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    missing: &str,
    invalid: &str,
) -> Option<T> {
    if value.is_none() {
        errors.add(field, missing);
        return None;
    }
    optional_enum(errors, field, value, invalid)
}

/// Parse a timestamp field if present.
pub(crate) fn optional_instant(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    form: crate::time::DateForm,
    message: &str,
) -> Option<DateTime<Utc>> {
    let value = value?;
    let parsed = crate::time::parse_instant(&value, form);
    if parsed.is_none() {
        errors.add(field, message);
    }
    parsed
}

/// Parse a required timestamp field.
pub(crate) fn required_instant(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    form: crate::time::DateForm,
    missing: &str,
    invalid: &str,
) -> Option<DateTime<Utc>> {
    if value.is_none() {
        errors.add(field, missing);
        return None;
    }
    optional_instant(errors, field, value, form, invalid)
}
