//! `purr-api`: the data-access Lambda behind API Gateway.

use lambda_http::Error;

use purr::config::{Config, LogFormat};
use purr::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;
    purr::telemetry::init(config.log_format.unwrap_or(LogFormat::Json));

    let state = AppState::dynamodb(&config).await?;
    tracing::info!(stages = ?config.stages, origins = ?config.allowed_origins, "purr-api starting");

    purr::lambda::run(state).await
}
