use thiserror::Error;

/// Errors from the local project store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No row for the requested id.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Caller passed something the store cannot accept.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
