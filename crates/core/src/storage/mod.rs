mod error;
pub mod keys;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use traits::{JobRepository, RecordRepository};
pub use types::{PartitionQuery, QueryPage};
