//! Attribute names and partition values of the single-table layout.
//!
//! Records table: `pk` (kind) + `sk`. Jobs table: `id`, expiring on `ttl`.

pub const PARTITION_KEY: &str = "pk";
pub const SORT_KEY: &str = "sk";
pub const UWI: &str = "uwi";
pub const DESCRIPTION_LC: &str = "calib_log_description_lc";
pub const WORDZ: &str = "wordz";

pub const JOB_ID: &str = "id";
pub const JOB_TTL: &str = "ttl";

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

pub const REPO_PARTITION: &str = "REPO";
pub const RASTER_PARTITION: &str = "RASTER";
pub const VECTOR_PARTITION: &str = "VECTOR";

/// Sort key prefix every vector record carries.
pub const VECTOR_SORT_PREFIX: &str = "VECTOR#";

/// Secondary indexes over the records table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryIndex {
    /// (`pk`, `uwi`) for well lookups.
    Uwi,
    /// (`pk`, lower-cased log description) for text search.
    Description,
}

impl SecondaryIndex {
    pub const ALL: [SecondaryIndex; 2] = [SecondaryIndex::Uwi, SecondaryIndex::Description];

    pub fn name(self) -> &'static str {
        match self {
            SecondaryIndex::Uwi => "pk-uwi-index",
            SecondaryIndex::Description => "pk-calib_log_description_lc-index",
        }
    }

    /// Range attribute of the index.
    pub fn sort_attribute(self) -> &'static str {
        match self {
            SecondaryIndex::Uwi => UWI,
            SecondaryIndex::Description => DESCRIPTION_LC,
        }
    }
}
