use shelf_db::BlobError;
use shelf_http::error::AppError;
use thiserror::Error;

/// Input failed schema or range checks. Always caller-correctable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("book '{id}' not found")]
    NotFound { id: String },

    #[error("invalid book: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The persisted catalog could not be read or does not hold a valid
    /// collection. Fatal at startup.
    #[error("catalog storage unusable: {0}")]
    Storage(String),

    /// Persisting a mutation failed; the mutation was not applied.
    #[error("failed to persist catalog")]
    Io(#[source] BlobError),
}

impl CatalogError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { .. } => AppError::not_found(err.to_string()),
            CatalogError::Validation(ValidationError { field, reason }) => AppError::validation(
                vec![serde_json::json!({ "field": field, "error": reason })],
                "book failed validation",
            ),
            CatalogError::InvalidQuery(message) => AppError::bad_request(message),
            CatalogError::Storage(_) | CatalogError::Io(_) => AppError::Internal(err.into()),
        }
    }
}
