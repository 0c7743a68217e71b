use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the roster, attendance and stop registry APIs.
///
/// Authorization skips are not errors; see [`crate::admin::Outcome`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} may only contain letters, digits, spaces, '·', '-', '(' and ')'")]
    InvalidText { field: &'static str },

    #[error("{field} must be a time in HH:MM, got {value:?}")]
    InvalidTime { field: &'static str, value: String },

    #[error("{field}: enter a time or mark it as none")]
    TimeRequired { field: &'static str },

    #[error("\"{name}\" is already registered in {class}")]
    Duplicate { name: String, class: String },

    #[error("unknown class: {0}")]
    UnknownClass(String),

    #[error("date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("confirmation declined")]
    ConfirmationDeclined,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("network failure: {message}")]
    Network { message: String },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Empty { .. }
            | StoreError::InvalidText { .. }
            | StoreError::InvalidTime { .. }
            | StoreError::TimeRequired { .. }
            | StoreError::UnknownClass(_)
            | StoreError::InvalidDate(_) => "validation_failed",
            StoreError::Duplicate { .. } => "duplicate",
            StoreError::NotFound { .. } => "not_found",
            StoreError::ConfirmationDeclined => "confirmation_declined",
            StoreError::Database(_) | StoreError::Serialization(_) => "persistence_failed",
            StoreError::Network { .. } => "network_failure",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            StoreError::Empty { field }
            | StoreError::InvalidText { field }
            | StoreError::TimeRequired { field } => Some(json!({ "field": field })),
            StoreError::InvalidTime { field, value } => {
                Some(json!({ "field": field, "value": value }))
            }
            StoreError::Duplicate { name, class } => Some(json!({ "name": name, "class": class })),
            StoreError::UnknownClass(id) => Some(json!({ "field": "classId", "value": id })),
            StoreError::InvalidDate(d) => Some(json!({ "field": "date", "value": d })),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.code(), "validation_failed" | "duplicate")
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }

    pub(crate) fn network(err: impl std::fmt::Display) -> Self {
        StoreError::Network {
            message: err.to_string(),
        }
    }
}
