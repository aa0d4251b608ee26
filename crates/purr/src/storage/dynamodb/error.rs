//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `RepositoryError` from `purr_core::storage`,
//! logging the DynamoDB error code of every failure.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use purr_core::storage::RepositoryError;

/// Code and message of an SDK error, before it is consumed.
fn describe<E, R>(err: &SdkError<E, R>) -> (String, String)
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let code = err.code().unwrap_or("Unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(err).to_string());
    (code, message)
}

fn log(operation: &'static str, table: &str, code: &str, message: &str) {
    tracing::error!(operation, table, code, message, "DynamoDB request failed");
}

fn backend(operation: &'static str, code: String, message: String) -> RepositoryError {
    RepositoryError::Backend {
        operation,
        code,
        message,
    }
}

/// Map a BatchWriteItem SDK error to RepositoryError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
    table: &str,
) -> RepositoryError {
    const OPERATION: &str = "BatchWriteItem";
    let (code, message) = describe(&err);
    log(OPERATION, table, &code, &message);

    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => {
            RepositoryError::TableNotFound(table.to_string())
        }
        BatchWriteItemError::ProvisionedThroughputExceededException(_)
        | BatchWriteItemError::RequestLimitExceeded(_) => RepositoryError::Throttled {
            operation: OPERATION,
        },
        _ => backend(OPERATION, code, message),
    }
}

/// Map a Query SDK error to RepositoryError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table: &str,
) -> RepositoryError {
    const OPERATION: &str = "Query";
    let (code, message) = describe(&err);
    log(OPERATION, table, &code, &message);

    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            RepositoryError::TableNotFound(table.to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_)
        | QueryError::RequestLimitExceeded(_) => RepositoryError::Throttled {
            operation: OPERATION,
        },
        _ => backend(OPERATION, code, message),
    }
}

/// Map a GetItem SDK error to RepositoryError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
) -> RepositoryError {
    const OPERATION: &str = "GetItem";
    let (code, message) = describe(&err);
    log(OPERATION, table, &code, &message);

    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            RepositoryError::TableNotFound(table.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_)
        | GetItemError::RequestLimitExceeded(_) => RepositoryError::Throttled {
            operation: OPERATION,
        },
        _ => backend(OPERATION, code, message),
    }
}

/// Map a PutItem SDK error to RepositoryError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
    id: impl Into<String>,
) -> RepositoryError {
    const OPERATION: &str = "PutItem";
    let (code, message) = describe(&err);
    log(OPERATION, table, &code, &message);

    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => {
            RepositoryError::ConditionalCheckFailed {
                operation: OPERATION,
                id: id.into(),
            }
        }
        PutItemError::ResourceNotFoundException(_) => {
            RepositoryError::TableNotFound(table.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_)
        | PutItemError::RequestLimitExceeded(_) => RepositoryError::Throttled {
            operation: OPERATION,
        },
        _ => backend(OPERATION, code, message),
    }
}

/// Map an UpdateItem SDK error to RepositoryError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table: &str,
    id: impl Into<String>,
) -> RepositoryError {
    const OPERATION: &str = "UpdateItem";
    let (code, message) = describe(&err);
    log(OPERATION, table, &code, &message);

    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => {
            RepositoryError::ConditionalCheckFailed {
                operation: OPERATION,
                id: id.into(),
            }
        }
        UpdateItemError::ResourceNotFoundException(_) => {
            RepositoryError::TableNotFound(table.to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_)
        | UpdateItemError::RequestLimitExceeded(_) => RepositoryError::Throttled {
            operation: OPERATION,
        },
        _ => backend(OPERATION, code, message),
    }
}

/// Map a request that could not be built to RepositoryError.
pub fn map_build_error(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Serialization(err.to_string())
}
