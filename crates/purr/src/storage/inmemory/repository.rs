//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use purr_core::codec::{AttrValue, Item};
use purr_core::jobs::JobUpdate;
use purr_core::query::IndexQuery;
use purr_core::storage::keys::{JOB_ID, PARTITION_KEY, SORT_KEY};
use purr_core::storage::{
    JobRepository, PartitionQuery, QueryPage, RecordRepository, RepositoryError, Result,
};

/// Primary key of the records table.
type RecordKey = (String, String);

/// In-memory storage backend for tests and local development.
///
/// Records are kept ordered by (`pk`, `sk`). Index queries evaluate `Limit`
/// before the filter, as DynamoDB does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<RwLock<BTreeMap<RecordKey, Item>>>,
    jobs: Arc<RwLock<HashMap<String, Item>>>,
    operations: Arc<AtomicUsize>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations served so far.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn count_operation(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

fn string_key<'a>(item: &'a Item, name: &str) -> Result<&'a str> {
    item.get(name)
        .and_then(AttrValue::as_str)
        .ok_or_else(|| RepositoryError::InvalidData(format!("missing string key attribute {name}")))
}

fn record_key(item: &Item) -> Result<RecordKey> {
    Ok((
        string_key(item, PARTITION_KEY)?.to_string(),
        string_key(item, SORT_KEY)?.to_string(),
    ))
}

/// Position of an item within a secondary index: (range value, table key).
fn index_position(item: &Item, range_attribute: &str) -> Option<(String, String, String)> {
    Some((
        item.get(range_attribute)?.as_str()?.to_string(),
        item.get(PARTITION_KEY)?.as_str()?.to_string(),
        item.get(SORT_KEY)?.as_str()?.to_string(),
    ))
}

/// The key attributes DynamoDB returns as `LastEvaluatedKey` for an index.
fn index_key(item: &Item, range_attribute: &str) -> Item {
    [PARTITION_KEY, SORT_KEY, range_attribute]
        .into_iter()
        .filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
        .collect()
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn put_records(&self, items: &[Item]) -> Result<()> {
        self.count_operation();
        let keyed = items
            .iter()
            .map(|item| Ok((record_key(item)?, item.clone())))
            .collect::<Result<Vec<_>>>()?;

        let mut records = self.records.write().await;
        records.extend(keyed);
        Ok(())
    }

    async fn query_partition(&self, query: &PartitionQuery) -> Result<Vec<Item>> {
        self.count_operation();
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<QueryPage> {
        self.count_operation();
        let range_attribute = query.index.sort_attribute();
        let records = self.records.read().await;

        let mut candidates: Vec<((String, String, String), &Item)> = records
            .values()
            .filter(|item| query.key_matches(item))
            .filter_map(|item| Some((index_position(item, range_attribute)?, item)))
            .collect();
        candidates.sort_by(|(a, _), (b, _)| a.cmp(b));

        if let Some(start) = &query.exclusive_start_key {
            let start = index_position(start, range_attribute).ok_or_else(|| {
                RepositoryError::InvalidData("exclusive start key is not an index key".to_string())
            })?;
            candidates.retain(|(position, _)| *position > start);
        }

        let limit = (query.limit as usize).max(1);
        let evaluated = &candidates[..candidates.len().min(limit)];
        let last_evaluated_key = if evaluated.len() < candidates.len() {
            evaluated
                .last()
                .map(|(_, item)| index_key(item, range_attribute))
        } else {
            None
        };

        Ok(QueryPage {
            items: evaluated
                .iter()
                .filter(|(_, item)| query.filter_matches(item))
                .map(|(_, item)| (*item).clone())
                .collect(),
            last_evaluated_key,
        })
    }
}

#[async_trait]
impl JobRepository for InMemoryRepository {
    async fn get_job(&self, id: &str) -> Result<Option<Item>> {
        self.count_operation();
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).cloned())
    }

    async fn put_job(&self, job: &Item) -> Result<()> {
        self.count_operation();
        let id = string_key(job, JOB_ID)?.to_string();
        let mut jobs = self.jobs.write().await;
        jobs.insert(id, job.clone());
        Ok(())
    }

    async fn update_job(&self, update: &JobUpdate) -> Result<()> {
        self.count_operation();
        let mut jobs = self.jobs.write().await;
        let existing = jobs.remove(&update.id);
        jobs.insert(update.id.clone(), update.apply(existing));
        Ok(())
    }
}
