//! Repo, raster and vector handlers over the records table.

use chrono::Utc;
use serde_json::json;

use purr_core::codec::decode_item;
use purr_core::error::ApiError;
use purr_core::records::{list_query, prepare_records};
use purr_core::request::ApiRequest;
use purr_core::resource::ResourceKind;

use super::Reply;
use crate::state::AppState;

/// `POST /repos`, `/rasters`, `/vectors`: validate, stamp and batch-write.
pub async fn create_records(
    state: &AppState,
    kind: ResourceKind,
    request: &ApiRequest,
) -> Result<Reply, ApiError> {
    let body = request.json_body()?;
    let prepared = prepare_records(kind, &body, Utc::now())?;

    if prepared.count() > 0 {
        state.records.put_records(&prepared.items).await?;
    }

    tracing::info!(kind = %kind, count = prepared.count(), "records created");
    Ok(Reply::created(prepared.response_body()))
}

/// `GET /repos`, `/rasters`, `/vectors`: every record of the kind.
pub async fn list_records(state: &AppState, kind: ResourceKind) -> Result<Reply, ApiError> {
    let query = list_query(kind)?;
    let items = state.records.query_partition(&query).await?;

    tracing::debug!(kind = %kind, count = items.len(), "records listed");
    let data: Vec<_> = items.iter().map(decode_item).collect();
    Ok(Reply::ok(json!({ "count": data.len(), "data": data })))
}
