//! Job handlers over the jobs table.

use chrono::Utc;
use serde_json::json;

use purr_core::codec::decode_item;
use purr_core::error::ApiError;
use purr_core::jobs::{prepare_job, JobWrite};
use purr_core::request::ApiRequest;

use super::Reply;
use crate::state::AppState;

/// `POST /jobs`: create under a fresh id, or partially update an existing one.
pub async fn write_job(state: &AppState, request: &ApiRequest) -> Result<Reply, ApiError> {
    let body = request.json_body()?;
    let write = prepare_job(&body, Utc::now())?;

    match &write {
        JobWrite::Create { item, .. } => state.jobs.put_job(item).await?,
        JobWrite::Update(update) => state.jobs.update_job(update).await?,
    }

    tracing::info!(id = write.id(), ttl = write.ttl(), status = write.status_code(), "job written");
    Ok(Reply {
        status: write.status_code(),
        body: write.response_body(),
    })
}

/// `GET /jobs/{id}`: strongly consistent point read.
pub async fn get_job(
    state: &AppState,
    request: &ApiRequest,
    routed_id: Option<&str>,
) -> Result<Reply, ApiError> {
    let id = request
        .path_parameter("id")
        .or(routed_id)
        .ok_or_else(|| ApiError::validation("Job ID required in path parameters"))?;

    let job = state
        .jobs
        .get_job(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Reply::ok(json!({ "data": decode_item(&job) })))
}
