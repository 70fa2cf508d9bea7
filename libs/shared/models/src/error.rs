use serde_json::{json, Value};
use thiserror::Error;

/// Errors as a calling workflow sees them. Validation failures name the offending
/// field so the form that submitted them can be re-rendered with that field marked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    ValidationError { field: Option<String>, message: String },

    #[error("Conflict: {message}")]
    Conflict { field: Option<String>, message: String },

    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationError { field: Some(field.into()), message: message.into() }
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict { field: Some(field.into()), message: message.into() }
    }

    /// Input field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::ValidationError { field, .. } | AppError::Conflict { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// The user can fix this by changing their input or simply trying again.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Unavailable(_))
    }

    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unavailable(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::ValidationError { message, .. } | AppError::Conflict { message, .. } => message.clone(),
        }
    }

    /// JSON body for whatever surface renders the error. Internal details are not echoed back.
    pub fn to_body(&self) -> Value {
        if self.is_user_facing() {
            tracing::warn!("Rejected request: {}", self);
        } else {
            tracing::error!("Error: {}", self);
        }

        let message = if self.is_user_facing() {
            self.message()
        } else {
            "Something went wrong, please try again later".to_string()
        };

        json!({
            "error": message,
            "field": self.field(),
            "retryable": self.is_retryable(),
        })
    }
}
