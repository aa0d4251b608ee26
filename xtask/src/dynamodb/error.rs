//! Error types for DynamoDB operations.

use purr_core::storage::RepositoryError;
use purr_core::ApiError;
use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB operations.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Table '{table_name}' not found")]
    TableNotFound { table_name: String },

    #[error("Index '{index_name}' still conflicts with another schema change on '{table_name}'")]
    IndexCreationConflict {
        table_name: String,
        index_name: String,
    },

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Timeout waiting for table to become active")]
    TableActivationTimeout,

    #[error("Invalid seed record: {0}")]
    InvalidSeed(#[from] ApiError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
