//! `purr-authorizer`: API Gateway TOKEN authorizer Lambda.

use lambda_http::lambda_runtime::{self, service_fn, LambdaEvent};
use lambda_http::Error;

use purr::config::{Config, LogFormat};
use purr_core::authorizer::{authorize, AuthorizerRequest, AuthorizerResponse};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;
    purr::telemetry::init(config.log_format.unwrap_or(LogFormat::Json));

    let stage = config.authorizer_stage.as_str();
    lambda_runtime::run(service_fn(|event: LambdaEvent<AuthorizerRequest>| async move {
        Ok::<AuthorizerResponse, Error>(authorize(&event.payload, stage))
    }))
    .await
}
