//! Preparation of keyed-table writes and reads.
//!
//! Pure functions: the caller supplies the clock, the shell does the I/O.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::codec::{encode_item, Item};
use crate::error::ApiError;
use crate::resource::ResourceKind;
use crate::storage::keys::{
    CREATED_AT, PARTITION_KEY, SORT_KEY, UPDATED_AT, VECTOR_PARTITION, VECTOR_SORT_PREFIX,
};
use crate::storage::PartitionQuery;

/// Records ready to be written, alongside what the caller gets echoed back.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecords {
    pub kind: ResourceKind,
    pub items: Vec<Item>,
    /// Stamped records as JSON, in request order.
    pub echo: Vec<Value>,
}

impl PreparedRecords {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Human-readable outcome for the create response.
    pub fn message(&self) -> String {
        match self.kind {
            ResourceKind::Repo => {
                let fs_path = self
                    .echo
                    .first()
                    .and_then(|item| item.get("fs_path"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                format!("Successfully created a repo: {fs_path}")
            }
            kind => format!("Successfully created {} {kind}(s)", self.count()),
        }
    }

    /// Response body: a repo echoes its single `item`, batches echo `items`.
    pub fn response_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::String(self.message()));
        body.insert(
            "resource_type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        body.insert("count".to_string(), Value::from(self.count()));

        match self.kind {
            ResourceKind::Repo => {
                let item = self.echo.first().cloned().unwrap_or(Value::Null);
                body.insert("item".to_string(), item);
            }
            _ => {
                body.insert("items".to_string(), Value::Array(self.echo.clone()));
            }
        }
        Value::Object(body)
    }
}

/// RFC 3339 UTC timestamp as stored in `created_at`/`updated_at`.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate and stamp a create request for a records-table kind.
///
/// A repo takes a single object, rasters and vectors take an array.
pub fn prepare_records(
    kind: ResourceKind,
    body: &Value,
    now: DateTime<Utc>,
) -> Result<PreparedRecords, ApiError> {
    let partition = kind
        .partition()
        .ok_or_else(|| ApiError::InvalidResource(kind.to_string()))?;

    let objects: Vec<&Map<String, Value>> = match (kind, body) {
        (ResourceKind::Repo, Value::Object(map)) => vec![map],
        (ResourceKind::Repo, _) => {
            return Err(ApiError::validation("Repo data must be a single object"));
        }
        (_, Value::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_object().ok_or_else(|| {
                    ApiError::validation(format!("Each {kind} must be a JSON object"))
                })
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(ApiError::validation("Request body must be an array")),
    };

    let stamp = Value::String(timestamp(now));
    let mut items = Vec::with_capacity(objects.len());
    let mut echo = Vec::with_capacity(objects.len());

    for object in objects {
        let mut record = object.clone();
        stamp_partition(&mut record, partition)?;
        validate_sort_key(&record, partition)?;
        record.insert(CREATED_AT.to_string(), stamp.clone());
        record.insert(UPDATED_AT.to_string(), stamp.clone());

        let record = Value::Object(record);
        items.push(encode_item(&record)?);
        echo.push(record);
    }

    Ok(PreparedRecords { kind, items, echo })
}

fn stamp_partition(record: &mut Map<String, Value>, partition: &str) -> Result<(), ApiError> {
    match record.get(PARTITION_KEY) {
        None | Some(Value::Null) => {
            record.insert(PARTITION_KEY.to_string(), Value::String(partition.to_string()));
            Ok(())
        }
        Some(Value::String(pk)) if pk == partition => Ok(()),
        Some(other) => Err(ApiError::validation(format!(
            "pk must be {partition}, got {other}"
        ))),
    }
}

fn validate_sort_key(record: &Map<String, Value>, partition: &str) -> Result<(), ApiError> {
    let sk = match record.get(SORT_KEY) {
        Some(Value::String(sk)) if !sk.is_empty() => sk,
        _ => return Err(ApiError::validation("sk must be a non-empty string")),
    };

    if partition == VECTOR_PARTITION && !sk.starts_with(VECTOR_SORT_PREFIX) {
        return Err(ApiError::validation(format!(
            "Vector sk must start with {VECTOR_SORT_PREFIX}"
        )));
    }
    Ok(())
}

/// Primary-key query listing every record of a kind.
pub fn list_query(kind: ResourceKind) -> Result<PartitionQuery, ApiError> {
    match kind {
        ResourceKind::Vector => Ok(PartitionQuery::with_sort_prefix(
            VECTOR_PARTITION,
            VECTOR_SORT_PREFIX,
        )),
        kind => kind
            .partition()
            .map(PartitionQuery::partition)
            .ok_or(ApiError::MethodNotAllowed),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::codec::AttrValue;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_repo_is_stamped() {
        let body = json!({"sk": "repos/alpha", "fs_path": "/data/alpha", "well_count": 3});
        let prepared = prepare_records(ResourceKind::Repo, &body, now()).unwrap();

        assert_eq!(prepared.count(), 1);
        let item = &prepared.items[0];
        assert_eq!(item.get("pk"), Some(&AttrValue::from("REPO")));
        assert_eq!(
            item.get("created_at"),
            Some(&AttrValue::from("2024-05-01T12:00:00.000Z"))
        );
        assert_eq!(item.get("created_at"), item.get("updated_at"));
        assert_eq!(item.get("well_count"), Some(&AttrValue::from(3_i64)));
        assert_eq!(prepared.message(), "Successfully created a repo: /data/alpha");
    }

    #[test]
    fn test_repo_response_echoes_single_item() {
        let body = json!({"sk": "repos/alpha", "fs_path": "/data/alpha"});
        let prepared = prepare_records(ResourceKind::Repo, &body, now()).unwrap();
        let response = prepared.response_body();

        assert_eq!(response["resource_type"], "repo");
        assert_eq!(response["count"], 1);
        assert_eq!(response["item"]["pk"], "REPO");
        assert!(response.get("items").is_none());
    }

    #[test]
    fn test_caller_timestamps_are_overwritten() {
        let body = json!({"sk": "repos/a", "created_at": "1999-01-01"});
        let prepared = prepare_records(ResourceKind::Repo, &body, now()).unwrap();
        assert_eq!(prepared.echo[0]["created_at"], "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_repo_requires_object() {
        let err = prepare_records(ResourceKind::Repo, &json!([{"sk": "a"}]), now()).unwrap_err();
        assert_eq!(err, ApiError::validation("Repo data must be a single object"));
    }

    #[test]
    fn test_rasters_require_array() {
        let err = prepare_records(ResourceKind::Raster, &json!({"sk": "a"}), now()).unwrap_err();
        assert_eq!(err, ApiError::validation("Request body must be an array"));

        let err = prepare_records(ResourceKind::Raster, &json!([1, 2]), now()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_raster_batch() {
        let body = json!([
            {"sk": "rasters/a.tif", "uwi": "42-501-20130", "depth": 1.5},
            {"sk": "rasters/b.tif", "uwi": "42-501-20131", "depth": 2.0}
        ]);
        let prepared = prepare_records(ResourceKind::Raster, &body, now()).unwrap();

        assert_eq!(prepared.count(), 2);
        assert_eq!(prepared.message(), "Successfully created 2 raster(s)");
        assert!(prepared
            .items
            .iter()
            .all(|item| item.get("pk") == Some(&AttrValue::from("RASTER"))));
        assert_eq!(prepared.response_body()["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_batch_is_allowed() {
        let prepared = prepare_records(ResourceKind::Raster, &json!([]), now()).unwrap();
        assert_eq!(prepared.count(), 0);
        assert_eq!(prepared.message(), "Successfully created 0 raster(s)");
    }

    #[test]
    fn test_conflicting_pk_is_rejected() {
        let body = json!([{"pk": "REPO", "sk": "rasters/a.tif"}]);
        let err = prepare_records(ResourceKind::Raster, &body, now()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let matching = json!([{"pk": "RASTER", "sk": "rasters/a.tif"}]);
        assert!(prepare_records(ResourceKind::Raster, &matching, now()).is_ok());
    }

    #[test]
    fn test_sort_key_is_required() {
        for body in [json!([{}]), json!([{"sk": ""}]), json!([{"sk": 7}])] {
            let err = prepare_records(ResourceKind::Raster, &body, now()).unwrap_err();
            assert_eq!(err, ApiError::validation("sk must be a non-empty string"));
        }
    }

    #[test]
    fn test_vector_sort_key_prefix() {
        let ok = json!([{"sk": "VECTOR#shapes/a.shp"}]);
        assert!(prepare_records(ResourceKind::Vector, &ok, now()).is_ok());

        let bad = json!([{"sk": "shapes/a.shp"}]);
        let err = prepare_records(ResourceKind::Vector, &bad, now()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_search_and_job_are_not_records() {
        let err = prepare_records(ResourceKind::Job, &json!({}), now()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResource(_)));
    }

    #[test]
    fn test_list_queries() {
        assert_eq!(
            list_query(ResourceKind::Repo).unwrap(),
            PartitionQuery::partition("REPO")
        );
        assert_eq!(
            list_query(ResourceKind::Vector).unwrap(),
            PartitionQuery::with_sort_prefix("VECTOR", "VECTOR#")
        );
        assert_eq!(list_query(ResourceKind::Search), Err(ApiError::MethodNotAllowed));
    }
}
