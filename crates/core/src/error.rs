use crate::types::DbId;

/// Boxed error source carried by [`CoreError::Storage`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error while trying to {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a persistence failure with the operation that was attempted.
    pub fn storage(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            context: context.into(),
            source: source.into(),
        }
    }
}
