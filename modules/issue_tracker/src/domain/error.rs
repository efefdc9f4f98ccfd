use std::time::Duration;

use thiserror::Error;

use crate::contract::model::IssueId;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("required field(s) missing")]
    RequiredFieldsMissing,

    #[error("missing _id")]
    MissingId,

    #[error("no update field(s) sent for '{id}'")]
    NoUpdateFields { id: String },

    #[error("Issue not found: {id}")]
    NotFound { id: IssueId },

    #[error("Malformed issue id: '{raw}'")]
    MalformedId { raw: String },

    #[error("Cannot interpret '{raw}' as a value for `open`")]
    InvalidOpenFlag { raw: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Store call '{op}' did not complete within {timeout_ms} ms")]
    Timeout { op: &'static str, timeout_ms: u128 },
}

impl DomainError {
    pub fn no_update_fields(id: impl Into<String>) -> Self {
        Self::NoUpdateFields { id: id.into() }
    }

    pub fn not_found(id: IssueId) -> Self {
        Self::NotFound { id }
    }

    pub fn malformed_id(raw: impl Into<String>) -> Self {
        Self::MalformedId { raw: raw.into() }
    }

    pub fn invalid_open_flag(raw: impl Into<String>) -> Self {
        Self::InvalidOpenFlag { raw: raw.into() }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn timeout(op: &'static str, limit: Duration) -> Self {
        Self::Timeout {
            op,
            timeout_ms: limit.as_millis(),
        }
    }

    /// Input was rejected before any store call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::RequiredFieldsMissing | Self::MissingId | Self::NoUpdateFields { .. }
        )
    }

    /// The store failed or did not answer in time.
    pub fn is_store_fault(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::Timeout { .. })
    }
}
