use async_trait::async_trait;

use crate::codec::Item;
use crate::jobs::JobUpdate;
use crate::query::IndexQuery;

use super::{PartitionQuery, QueryPage, Result};

/// Repository for the keyed records table and its secondary indexes.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Writes records with batched puts.
    ///
    /// Not atomic: a failure part-way may leave earlier items written.
    async fn put_records(&self, items: &[Item]) -> Result<()>;

    /// Gets every record matching a primary-key query, following store pages.
    async fn query_partition(&self, query: &PartitionQuery) -> Result<Vec<Item>>;

    /// Runs a single round-trip against a secondary index.
    async fn query_index(&self, query: &IndexQuery) -> Result<QueryPage>;
}

/// Repository for the TTL-bounded jobs table.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Gets a job by id with a strongly consistent read.
    async fn get_job(&self, id: &str) -> Result<Option<Item>>;

    /// Writes a whole job.
    async fn put_job(&self, job: &Item) -> Result<()>;

    /// Sets exactly the attributes in `update`, leaving the rest untouched.
    async fn update_job(&self, update: &JobUpdate) -> Result<()>;
}
