//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::controller::{EmailError, check_email};

/// Validates that an email has the `local@domain.tld` shape.
///
/// # Examples
///
/// ```ignore
/// validate_email("a@b.com")   // Ok
/// validate_email("")          // Err - required
/// validate_email("a@b")       // Err - no top-level domain
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    check_email(email).map_err(|err| {
        let code = match err {
            EmailError::Missing => "email_required",
            EmailError::Malformed => "email_format",
        };
        let mut validation = ValidationError::new(code);
        validation.message = Some(err.to_string().into());
        validation
    })
}
