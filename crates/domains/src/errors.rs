//! # DomainError
//!
//! Centralized error handling for the forum core.
//! Every denial carries a machine-checkable reason so callers can tell a
//! banned actor apart from a non-author.

use serde::Serialize;
use thiserror::Error;

/// Why the authorization gate refused an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// `banned_until` lies in the future.
    Banned,
    /// `silenced_until` lies in the future and the action writes content.
    Silenced,
    /// Object-level write by someone who neither owns the object nor is staff.
    NotAuthor,
    /// History views and moderation administration.
    StaffOnly,
    /// Moderation target outranks (or is) the actor.
    Hierarchy,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Banned => "banned",
            Self::Silenced => "silenced",
            Self::NotAuthor => "not_author",
            Self::StaffOnly => "staff_only",
            Self::Hierarchy => "hierarchy",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary error type for all forum operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The action needs a logged-in caller.
    #[error("authentication required")]
    Unauthenticated,

    /// The gate denied the action.
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),

    /// Resource not found (e.g., thread slug, post id, username)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Validation failure (e.g., empty body, vote value out of range)
    #[error("invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    /// Unique constraint lost a race (slug, username, rating row)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Stable code used in API error bodies and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Forbidden(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// A specialized Result type for forum logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
