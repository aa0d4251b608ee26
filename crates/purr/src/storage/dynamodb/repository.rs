//! DynamoDB repository implementation.
//!
//! Implements the repository traits from `purr_core::storage` using DynamoDB.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;

use purr_core::codec::Item;
use purr_core::jobs::JobUpdate;
use purr_core::query::IndexQuery;
use purr_core::storage::keys::{JOB_ID, PARTITION_KEY, SORT_KEY};
use purr_core::storage::{
    JobRepository, PartitionQuery, QueryPage, RecordRepository, RepositoryError, Result,
};

use super::conversions::{from_item, from_optional_item, to_attribute, to_item};
use super::error::{
    map_batch_write_error, map_build_error, map_get_item_error, map_put_item_error,
    map_query_error, map_update_item_error,
};
use crate::config::{Config, ConfigError};

/// Most put requests DynamoDB accepts in one BatchWriteItem call.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// DynamoDB-based repository over the records and jobs tables.
#[derive(Debug, Clone)]
pub struct DynamoDbRepository {
    client: Client,
    records_table: String,
    jobs_table: String,
}

impl DynamoDbRepository {
    pub fn new(
        client: Client,
        records_table: impl Into<String>,
        jobs_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            records_table: records_table.into(),
            jobs_table: jobs_table.into(),
        }
    }

    /// Creates a repository from configuration.
    ///
    /// Uses the AWS SDK default credential chain; `AWS_ENDPOINT_URL` points
    /// the client at DynamoDB Local.
    pub async fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        let (records_table, jobs_table) = config.tables()?;
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&sdk_config);

        tracing::info!(records_table, jobs_table, "DynamoDB repository configured");
        Ok(Self::new(client, records_table, jobs_table))
    }
}

fn string_value(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

#[async_trait]
impl RecordRepository for DynamoDbRepository {
    async fn put_records(&self, items: &[Item]) -> Result<()> {
        let mut written = 0;

        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk
                .iter()
                .map(|item| {
                    let put = PutRequest::builder()
                        .set_item(Some(to_item(item)))
                        .build()
                        .map_err(map_build_error)?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>>>()?;

            let result = self
                .client
                .batch_write_item()
                .request_items(&self.records_table, requests)
                .send()
                .await
                .map_err(|e| map_batch_write_error(e, &self.records_table))?;

            let unprocessed: usize = result
                .unprocessed_items
                .unwrap_or_default()
                .values()
                .map(Vec::len)
                .sum();
            written += chunk.len() - unprocessed;

            if unprocessed > 0 {
                tracing::error!(
                    table = %self.records_table,
                    written,
                    unprocessed,
                    "batch write left unprocessed items"
                );
                return Err(RepositoryError::PartialBatch {
                    written,
                    unprocessed,
                });
            }
        }

        tracing::debug!(table = %self.records_table, written, "batch write complete");
        Ok(())
    }

    async fn query_partition(&self, query: &PartitionQuery) -> Result<Vec<Item>> {
        let key_condition = match query.sort_prefix {
            Some(_) => "#pk = :pk AND begins_with(#sk, :sk)",
            None => "#pk = :pk",
        };

        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.records_table)
                .key_condition_expression(key_condition)
                .expression_attribute_names("#pk", PARTITION_KEY)
                .expression_attribute_values(":pk", string_value(&query.partition))
                .set_exclusive_start_key(start_key.take());

            if let Some(prefix) = &query.sort_prefix {
                request = request
                    .expression_attribute_names("#sk", SORT_KEY)
                    .expression_attribute_values(":sk", string_value(prefix));
            }

            let result = request
                .send()
                .await
                .map_err(|e| map_query_error(e, &self.records_table))?;

            for item in result.items.unwrap_or_default() {
                items.push(from_item(&item)?);
            }

            match result.last_evaluated_key.filter(|key| !key.is_empty()) {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        Ok(items)
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<QueryPage> {
        // DynamoDB rejects empty key values, so an empty prefix drops the clause.
        let key_condition = if query.sort_prefix.is_empty() {
            "#pk = :pk"
        } else {
            "#pk = :pk AND begins_with(#range, :prefix)"
        };

        let mut request = self
            .client
            .query()
            .table_name(&self.records_table)
            .index_name(query.index.name())
            .key_condition_expression(key_condition)
            .expression_attribute_names("#pk", PARTITION_KEY)
            .expression_attribute_values(":pk", string_value(&query.partition))
            .limit(i32::try_from(query.limit).unwrap_or(i32::MAX))
            .set_exclusive_start_key(query.exclusive_start_key.as_ref().map(to_item));

        if !query.sort_prefix.is_empty() {
            request = request
                .expression_attribute_names("#range", query.index.sort_attribute())
                .expression_attribute_values(":prefix", string_value(&query.sort_prefix));
        }

        if let Some(filter) = &query.filter {
            request = request
                .filter_expression("contains(#filter, :token)")
                .expression_attribute_names("#filter", &filter.attribute)
                .expression_attribute_values(":token", string_value(&filter.token));
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_query_error(e, &self.records_table))?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(from_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(QueryPage {
            items,
            last_evaluated_key: from_optional_item(result.last_evaluated_key)?,
        })
    }
}

#[async_trait]
impl JobRepository for DynamoDbRepository {
    async fn get_job(&self, id: &str) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.jobs_table)
            .key(JOB_ID, string_value(id))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, &self.jobs_table))?;

        from_optional_item(result.item)
    }

    async fn put_job(&self, job: &Item) -> Result<()> {
        let id = job
            .get(JOB_ID)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        self.client
            .put_item()
            .table_name(&self.jobs_table)
            .set_item(Some(to_item(job)))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, &self.jobs_table, id))?;

        Ok(())
    }

    async fn update_job(&self, update: &JobUpdate) -> Result<()> {
        let values = update
            .expression_attribute_values()
            .iter()
            .map(|(placeholder, value)| (placeholder.clone(), to_attribute(value)))
            .collect();

        self.client
            .update_item()
            .table_name(&self.jobs_table)
            .key(JOB_ID, string_value(&update.id))
            .update_expression(update.update_expression())
            .set_expression_attribute_names(Some(
                update.expression_attribute_names().into_iter().collect(),
            ))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &self.jobs_table, &update.id))?;

        Ok(())
    }
}
