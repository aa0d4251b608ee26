//! Composite-key queries against the secondary indexes.
//!
//! A query is an equality match on the partition, a `begins_with` match on
//! the index's range attribute and an optional containment post-filter.
//! Backends translate [`IndexQuery`] into their own request; the in-memory
//! store evaluates it with [`IndexQuery::key_matches`] and
//! [`IndexQuery::filter_matches`].

use crate::codec::{AttrValue, Item};
use crate::storage::keys::{SecondaryIndex, PARTITION_KEY, RASTER_PARTITION, WORDZ};

/// Post-filter: `contains(attribute, token)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsFilter {
    pub attribute: String,
    pub token: String,
}

impl ContainsFilter {
    /// Strings match on substring, lists on an equal string element.
    pub fn matches(&self, item: &Item) -> bool {
        match item.get(&self.attribute) {
            Some(AttrValue::String(s)) => s.contains(self.token.as_str()),
            Some(AttrValue::List(values)) => values
                .iter()
                .any(|v| v.as_str() == Some(self.token.as_str())),
            _ => false,
        }
    }
}

/// A single round-trip against a secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub index: SecondaryIndex,
    pub partition: String,
    /// `begins_with` operand; empty matches every key in the partition.
    pub sort_prefix: String,
    pub filter: Option<ContainsFilter>,
    /// Upper bound on keys evaluated in this round-trip (before filtering).
    pub limit: u32,
    pub exclusive_start_key: Option<Item>,
}

impl IndexQuery {
    /// Key condition: partition equality and range prefix.
    ///
    /// Items without the range attribute are not part of the index.
    pub fn key_matches(&self, item: &Item) -> bool {
        let pk = item.get(PARTITION_KEY).and_then(AttrValue::as_str);
        let range = item
            .get(self.index.sort_attribute())
            .and_then(AttrValue::as_str);

        match (pk, range) {
            (Some(pk), Some(range)) => {
                pk == self.partition && range.starts_with(self.sort_prefix.as_str())
            }
            _ => false,
        }
    }

    pub fn filter_matches(&self, item: &Item) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(item))
    }
}

/// Build the raster search query over the uwi index.
///
/// `wordz` is lower-cased; an empty token means no filter.
pub fn build_uwi_query(
    uwi_prefix: &str,
    wordz: Option<&str>,
    limit: u32,
    exclusive_start_key: Option<Item>,
) -> IndexQuery {
    let filter = wordz.filter(|w| !w.is_empty()).map(|w| ContainsFilter {
        attribute: WORDZ.to_string(),
        token: w.to_lowercase(),
    });

    IndexQuery {
        index: SecondaryIndex::Uwi,
        partition: RASTER_PARTITION.to_string(),
        sort_prefix: uwi_prefix.to_string(),
        filter,
        limit,
        exclusive_start_key,
    }
}
