//! Table configuration types (Functional Core - pure data).

use purr_core::storage::keys::{self, SecondaryIndex};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub gsis: Vec<GsiConfig>,
    /// Attribute DynamoDB expires items on, if any.
    pub ttl_attribute: Option<String>,
}

/// A string key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
}

impl KeyAttribute {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Global Secondary Index configuration. Every index projects all attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

impl TableConfig {
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }

    /// Key attributes of the table and its indexes, without duplicates.
    pub fn key_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let gsi_keys = self
            .gsis
            .iter()
            .flat_map(|gsi| std::iter::once(&gsi.partition_key).chain(gsi.sort_key.as_ref()));
        let keys = std::iter::once(&self.partition_key)
            .chain(self.sort_key.as_ref())
            .chain(gsi_keys);
        for key in keys {
            if !names.contains(&key.name.as_str()) {
                names.push(&key.name);
            }
        }
        names
    }
}

fn index_config(index: SecondaryIndex) -> GsiConfig {
    GsiConfig {
        name: index.name().to_string(),
        partition_key: KeyAttribute::new(keys::PARTITION_KEY),
        sort_key: Some(KeyAttribute::new(index.sort_attribute())),
    }
}

/// The records table: `pk`/`sk` plus the uwi and description indexes.
pub fn records_table_config() -> TableConfig {
    TableConfig {
        table_name: "fizz".to_string(),
        partition_key: KeyAttribute::new(keys::PARTITION_KEY),
        sort_key: Some(KeyAttribute::new(keys::SORT_KEY)),
        gsis: SecondaryIndex::ALL.into_iter().map(index_config).collect(),
        ttl_attribute: None,
    }
}

/// The jobs table: keyed by `id`, expiring on `ttl`.
pub fn jobs_table_config() -> TableConfig {
    TableConfig {
        table_name: "purr-jobs".to_string(),
        partition_key: KeyAttribute::new(keys::JOB_ID),
        sort_key: None,
        gsis: Vec::new(),
        ttl_attribute: Some(keys::JOB_TTL.to_string()),
    }
}
