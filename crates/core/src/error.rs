//! Request-level error taxonomy and its HTTP mapping.

use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::RepositoryError;

/// Everything a request can fail with.
///
/// Every variant maps to exactly one status code through
/// [`ApiError::status_code`], so the top-level response mapping is total.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The path does not name a known resource kind.
    #[error("Invalid resource type")]
    InvalidResource(String),
    /// The request is malformed or misses a required field.
    #[error("{0}")]
    Validation(String),
    /// A point lookup found nothing.
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// The store rejected or failed the operation.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// Anything else, including panics caught at the top level.
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - `InvalidResource`, `Validation` -> 400
    /// - `NotFound` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - `Repository`, `Unexpected` -> 500
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidResource(_) | ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::Repository(_) | ApiError::Unexpected(_) => 500,
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Result type for request handling.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_resource_maps_to_400() {
        let error = ApiError::InvalidResource("widget".to_string());
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.to_string(), "Invalid resource type");
    }

    #[test]
    fn test_validation_maps_to_400() {
        let error = ApiError::validation("TTL attribute is required");
        assert_eq!(error.status_code(), 400);
        assert!(error.is_client_error());
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(ApiError::not_found("Job not found").status_code(), 404);
    }

    #[test]
    fn test_method_not_allowed_maps_to_405() {
        assert_eq!(ApiError::MethodNotAllowed.status_code(), 405);
    }

    #[test]
    fn test_repository_error_maps_to_500() {
        let error: ApiError = RepositoryError::Throttled {
            operation: "Query",
        }
        .into();
        assert_eq!(error.status_code(), 500);
        assert!(!error.is_client_error());
        assert_eq!(error.to_string(), "Query throttled, please retry");
    }

    #[test]
    fn test_codec_error_is_a_validation_error() {
        let error: ApiError = CodecError::NotAnObject.into();
        assert_eq!(error, ApiError::Validation("Expected a JSON object".to_string()));
    }
}
