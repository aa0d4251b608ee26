//! Paginated search across a list of uwi prefixes.

use serde::Deserialize;
use serde_json::Value;

use crate::codec::Item;
use crate::error::ApiError;
use crate::query::build_uwi_query;
use crate::storage::RecordRepository;

use super::cursor::SearchCursor;

/// Results returned when `maxResults` is absent.
pub const DEFAULT_RESULTS: u32 = 100;
/// Hard ceiling on `maxResults`.
pub const MAX_RESULTS: u32 = 500;

/// Body of `POST /search`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub uwis: Vec<String>,
    #[serde(default)]
    pub wordz: Option<String>,
    /// Kept raw: any positive integer is accepted and clamped, including
    /// integral floats and numeric strings.
    #[serde(default)]
    pub max_results: Option<Value>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

impl SearchRequest {
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        serde_json::from_value(body)
            .map_err(|e| ApiError::validation(format!("Invalid search request: {e}")))
    }

    /// Requested page size, defaulted and clamped to [`MAX_RESULTS`].
    pub fn page_size(&self) -> Result<u32, ApiError> {
        let requested = match &self.max_results {
            None | Some(Value::Null) => return Ok(DEFAULT_RESULTS),
            Some(value) => requested_count(value)
                .ok_or_else(|| ApiError::validation("maxResults must be a positive integer"))?,
        };

        if requested == 0 {
            return Err(ApiError::validation("maxResults must be at least 1"));
        }
        Ok(requested.min(u64::from(MAX_RESULTS)) as u32)
    }

    fn token(&self) -> Option<&str> {
        self.pagination_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Non-negative integral count from a number or numeric string, saturating at `u64::MAX`.
fn requested_count(value: &Value) -> Option<u64> {
    let from_float = |f: f64| (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as u64);

    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            if n.is_i64() {
                None
            } else {
                n.as_f64().and_then(from_float)
            }
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_float))
        }
        _ => None,
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub items: Vec<Item>,
    /// Page size the request resolved to.
    pub requested: u32,
    /// Continuation, absent once every prefix is exhausted.
    pub cursor: Option<SearchCursor>,
}

/// Collect up to the requested page size of matches, prefix by prefix.
///
/// Each round-trip asks for no more than what is still missing, so a page
/// never overshoots. A cursor is returned only while keys or prefixes remain.
pub async fn paginate<R>(repo: &R, request: &SearchRequest) -> Result<SearchPage, ApiError>
where
    R: RecordRepository + ?Sized,
{
    let requested = request.page_size()?;
    let max = requested as usize;
    let prefixes = &request.uwis;
    let wordz = request.wordz.as_deref();

    let (mut idx, mut start_key) = match request.token() {
        Some(token) => SearchCursor::decode(token)?.resume_position(prefixes)?,
        None => (0, None),
    };

    let mut items: Vec<Item> = Vec::new();

    while idx < prefixes.len() {
        let prefix = prefixes[idx].as_str();

        loop {
            let remaining = (max - items.len()) as u32;
            let query = build_uwi_query(prefix, wordz, remaining, start_key.take());
            let page = repo.query_index(&query).await?;

            tracing::debug!(
                prefix,
                returned = page.items.len(),
                more = page.last_evaluated_key.is_some(),
                "search round-trip"
            );

            items.extend(page.items);
            start_key = page.last_evaluated_key;

            let Some(key) = start_key.as_ref() else {
                break;
            };
            if items.len() >= max {
                return Ok(SearchPage {
                    items,
                    requested,
                    cursor: Some(SearchCursor::new(idx, prefix, Some(key))),
                });
            }
        }

        idx += 1;
        if items.len() >= max {
            let cursor = prefixes
                .get(idx)
                .map(|next| SearchCursor::new(idx, next, None));
            return Ok(SearchPage {
                items,
                requested,
                cursor,
            });
        }
    }

    Ok(SearchPage {
        items,
        requested,
        cursor: None,
    })
}
