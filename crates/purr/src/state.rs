//! Application state shared by every request.
//!
//! Holds the injected store clients as trait objects, plus the router and
//! response builder derived from configuration.

use std::sync::Arc;

use purr_core::resource::Router;
use purr_core::response::ResponseBuilder;
use purr_core::storage::{JobRepository, RecordRepository};

use crate::config::Config;
use crate::storage::InMemoryRepository;

#[derive(Clone)]
pub struct AppState {
    /// Records table (repos, rasters, vectors).
    pub records: Arc<dyn RecordRepository>,
    /// Jobs table.
    pub jobs: Arc<dyn JobRepository>,
    pub router: Router,
    pub responses: ResponseBuilder,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordRepository>,
        jobs: Arc<dyn JobRepository>,
        config: &Config,
    ) -> Self {
        Self {
            records,
            jobs,
            router: Router::new(config.stages.iter().cloned()),
            responses: ResponseBuilder::new(config.allowed_origins.iter().cloned()),
        }
    }

    /// State backed by a single in-memory repository serving both tables.
    pub fn in_memory(repository: InMemoryRepository, config: &Config) -> Self {
        let repository = Arc::new(repository);
        Self::new(repository.clone(), repository, config)
    }

    /// State backed by DynamoDB, configured from `config`.
    #[cfg(feature = "dynamodb")]
    pub async fn dynamodb(config: &Config) -> Result<Self, crate::config::ConfigError> {
        let repository = Arc::new(crate::storage::DynamoDbRepository::from_config(config).await?);
        Ok(Self::new(repository.clone(), repository, config))
    }
}
