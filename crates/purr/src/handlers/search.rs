//! Paginated raster search.

use chrono::Utc;
use serde_json::{json, Value};

use purr_core::codec::decode_item;
use purr_core::error::ApiError;
use purr_core::records::timestamp;
use purr_core::request::ApiRequest;
use purr_core::search::{paginate, SearchRequest};

use super::Reply;
use crate::state::AppState;

/// `POST /search`: one page of rasters under the requested uwi prefixes.
pub async fn search(state: &AppState, request: &ApiRequest) -> Result<Reply, ApiError> {
    let search = SearchRequest::from_json(request.json_body()?)?;
    let page = paginate(state.records.as_ref(), &search).await?;

    let token = match &page.cursor {
        Some(cursor) => Value::String(cursor.encode()?),
        None => Value::Null,
    };

    tracing::info!(
        prefixes = search.uwis.len(),
        returned = page.items.len(),
        more = page.cursor.is_some(),
        "search page served"
    );

    let data: Vec<_> = page.items.iter().map(decode_item).collect();
    Ok(Reply::ok(json!({
        "data": data,
        "metadata": {
            "returnedCount": page.items.len(),
            "totalRequested": page.requested,
            "paginationToken": token,
            "generatedAt": timestamp(Utc::now()),
        }
    })))
}
