//! Field checks shared by the request models
//!
//! Each check returns the message placed in the 422 `detail`, prefixed with
//! the field name so callers can tell which field failed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Local part, `@`, then a dotted domain with a non-numeric TLD
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .unwrap_or_else(|e| panic!("email pattern does not compile: {e}"))
});

/// Reject empty or whitespace-only values
///
/// # Errors
///
/// Returns an error message naming the field when it is blank.
pub fn require_non_empty(field_name: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name}: field must not be empty"));
    }
    Ok(())
}

/// Check that a value is a syntactically valid email address
///
/// # Errors
///
/// Returns an error message naming the field when the address is malformed.
pub fn require_email(field_name: &str, value: &str) -> Result<(), String> {
    if value.len() > 254 || !EMAIL_PATTERN.is_match(value) {
        return Err(format!("{field_name}: value is not a valid email address"));
    }
    Ok(())
}

/// Run several checks and collect every failure into one message
#[macro_export]
macro_rules! validate_fields {
    ($($check:expr),+ $(,)?) => {{
        let failures: Vec<String> = [$($check),+]
            .into_iter()
            .filter_map(Result::err)
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }};
}
