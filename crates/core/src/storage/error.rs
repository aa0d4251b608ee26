use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("{operation} throttled, please retry")]
    Throttled { operation: &'static str },
    #[error("{operation} conditional check failed for {id}")]
    ConditionalCheckFailed { operation: &'static str, id: String },
    #[error("Batch write stopped with {unprocessed} unprocessed item(s) after {written} written")]
    PartialBatch { written: usize, unprocessed: usize },
    #[error("{operation} failed ({code}): {message}")]
    Backend {
        operation: &'static str,
        code: String,
        message: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Short machine-readable code, logged alongside the failure.
    pub fn code(&self) -> &str {
        match self {
            RepositoryError::TableNotFound(_) => "ResourceNotFoundException",
            RepositoryError::Throttled { .. } => "ProvisionedThroughputExceededException",
            RepositoryError::ConditionalCheckFailed { .. } => "ConditionalCheckFailedException",
            RepositoryError::PartialBatch { .. } => "UnprocessedItems",
            RepositoryError::Backend { code, .. } => code,
            RepositoryError::ConnectionFailed(_) => "ConnectionFailed",
            RepositoryError::Serialization(_) => "Serialization",
            RepositoryError::InvalidData(_) => "InvalidData",
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_partial_batch_display() {
        let error = RepositoryError::PartialBatch {
            written: 25,
            unprocessed: 3,
        };
        assert_eq!(
            error.to_string(),
            "Batch write stopped with 3 unprocessed item(s) after 25 written"
        );
    }

    #[test]
    fn test_repository_error_backend_display_and_code() {
        let error = RepositoryError::Backend {
            operation: "Query",
            code: "ValidationException".to_string(),
            message: "bad key".to_string(),
        };
        assert_eq!(error.to_string(), "Query failed (ValidationException): bad key");
        assert_eq!(error.code(), "ValidationException");
    }

    #[test]
    fn test_repository_error_throttled_code() {
        let error = RepositoryError::Throttled {
            operation: "PutItem",
        };
        assert_eq!(error.to_string(), "PutItem throttled, please retry");
        assert_eq!(error.code(), "ProvisionedThroughputExceededException");
    }
}
