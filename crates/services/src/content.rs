//! Validation shared by posts and profile comments.

use domains::{DomainError, DomainResult};

pub const MAX_BODY_CHARS: usize = 20_000;

/// Rejects blank or oversized bodies. The text itself is stored untouched.
pub fn validate_body(body: &str) -> DomainResult<()> {
    if body.trim().is_empty() {
        return Err(DomainError::invalid("body", "body must not be empty"));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(DomainError::invalid(
            "body",
            format!("body must be at most {MAX_BODY_CHARS} characters"),
        ));
    }
    Ok(())
}
