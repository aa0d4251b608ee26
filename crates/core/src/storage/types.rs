use crate::codec::{AttrValue, Item};

use super::keys::{PARTITION_KEY, SORT_KEY};

/// A primary-key query: equality on `pk`, optional `begins_with` on `sk`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionQuery {
    pub partition: String,
    pub sort_prefix: Option<String>,
}

impl PartitionQuery {
    /// Every record of a partition.
    pub fn partition(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort_prefix: None,
        }
    }

    /// Records of a partition whose sort key starts with `prefix`.
    pub fn with_sort_prefix(partition: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort_prefix: Some(prefix.into()),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        let pk_matches = item.get(PARTITION_KEY).and_then(AttrValue::as_str)
            == Some(self.partition.as_str());
        let sk_matches = match &self.sort_prefix {
            Some(prefix) => item
                .get(SORT_KEY)
                .and_then(AttrValue::as_str)
                .is_some_and(|sk| sk.starts_with(prefix.as_str())),
            None => true,
        };
        pk_matches && sk_matches
    }
}

/// One round-trip worth of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Where the next round-trip resumes; `None` when the key range is exhausted.
    pub last_evaluated_key: Option<Item>,
}
