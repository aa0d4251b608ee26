//! Job create-or-update preparation.
//!
//! A body carrying a non-empty string `id` is a partial update of that job;
//! anything else creates a new job under a freshly minted id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::codec::{encode, encode_item, AttrValue, Item};
use crate::error::ApiError;
use crate::records::timestamp;
use crate::storage::keys::{CREATED_AT, JOB_ID, JOB_TTL, UPDATED_AT};

/// What a job POST resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum JobWrite {
    Create { id: String, ttl: i64, item: Item },
    Update(JobUpdate),
}

impl JobWrite {
    pub fn id(&self) -> &str {
        match self {
            JobWrite::Create { id, .. } => id,
            JobWrite::Update(update) => &update.id,
        }
    }

    pub fn ttl(&self) -> i64 {
        match self {
            JobWrite::Create { ttl, .. } => *ttl,
            JobWrite::Update(update) => update.ttl,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            JobWrite::Create { .. } => 201,
            JobWrite::Update(_) => 200,
        }
    }

    pub fn response_body(&self) -> Value {
        let message = match self {
            JobWrite::Create { .. } => "Job created successfully",
            JobWrite::Update(_) => "Job updated successfully",
        };
        json!({"message": message, "id": self.id(), "ttl": self.ttl()})
    }
}

/// A partial update: SET exactly `attributes` on the job `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub id: String,
    pub ttl: i64,
    /// Never contains `id` or `created_at`.
    pub attributes: Item,
}

impl JobUpdate {
    /// `SET #f0 = :v0, #f1 = :v1, ...` in attribute order.
    pub fn update_expression(&self) -> String {
        let assignments: Vec<String> = (0..self.attributes.len())
            .map(|i| format!("#f{i} = :v{i}"))
            .collect();
        format!("SET {}", assignments.join(", "))
    }

    pub fn expression_attribute_names(&self) -> BTreeMap<String, String> {
        self.attributes
            .keys()
            .enumerate()
            .map(|(i, name)| (format!("#f{i}"), name.clone()))
            .collect()
    }

    pub fn expression_attribute_values(&self) -> BTreeMap<String, AttrValue> {
        self.attributes
            .values()
            .enumerate()
            .map(|(i, value)| (format!(":v{i}"), value.clone()))
            .collect()
    }

    /// Upsert semantics: merge onto `existing`, or start from the bare key.
    pub fn apply(&self, existing: Option<Item>) -> Item {
        let mut job = existing.unwrap_or_else(|| {
            Item::from([(JOB_ID.to_string(), AttrValue::from(self.id.as_str()))])
        });
        job.extend(self.attributes.clone());
        job
    }
}

/// Validate a job POST body and resolve it to a create or an update.
///
/// `ttl` is checked first so an invalid body never reaches the store.
pub fn prepare_job(body: &Value, now: DateTime<Utc>) -> Result<JobWrite, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::validation("Job data must be a single object"))?;

    let ttl = parse_ttl(object)?;
    let stamp = Value::String(timestamp(now));

    match existing_id(object)? {
        Some(id) => {
            let mut attributes = Item::new();
            for (name, value) in object {
                if name == JOB_ID || name == CREATED_AT {
                    continue;
                }
                attributes.insert(name.clone(), encode(value)?);
            }
            attributes.insert(UPDATED_AT.to_string(), encode(&stamp)?);

            Ok(JobWrite::Update(JobUpdate {
                id: id.to_string(),
                ttl,
                attributes,
            }))
        }
        None => {
            let id = Uuid::new_v4().to_string();
            let mut job = object.clone();
            job.insert(JOB_ID.to_string(), Value::String(id.clone()));
            job.insert(CREATED_AT.to_string(), stamp.clone());
            job.insert(UPDATED_AT.to_string(), stamp);

            let item = encode_item(&Value::Object(job))?;
            Ok(JobWrite::Create { id, ttl, item })
        }
    }
}

fn parse_ttl(object: &Map<String, Value>) -> Result<i64, ApiError> {
    match object.get(JOB_TTL) {
        None | Some(Value::Null) => Err(ApiError::validation("TTL attribute is required")),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| ApiError::validation("TTL must be an integer number of seconds")),
    }
}

fn existing_id(object: &Map<String, Value>) -> Result<Option<&str>, ApiError> {
    match object.get(JOB_ID) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if id.is_empty() => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(_) => Err(ApiError::validation("Job id must be a string")),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_mints_uuid() {
        let write = prepare_job(&json!({"ttl": 1_700_000_000, "status": "queued"}), now()).unwrap();

        let JobWrite::Create { id, ttl, item } = &write else {
            panic!("expected a create, got {write:?}");
        };
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(*ttl, 1_700_000_000);
        assert_eq!(item.get("id"), Some(&AttrValue::from(id.as_str())));
        assert_eq!(item.get("status"), Some(&AttrValue::from("queued")));
        assert!(item.contains_key("created_at"));

        assert_eq!(write.status_code(), 201);
        assert_eq!(write.response_body()["message"], "Job created successfully");
        assert_eq!(write.response_body()["ttl"], 1_700_000_000);
    }

    #[test]
    fn test_empty_id_creates() {
        let write = prepare_job(&json!({"id": "", "ttl": 1}), now()).unwrap();
        assert!(matches!(write, JobWrite::Create { .. }));
        assert_ne!(write.id(), "");
    }

    #[test]
    fn test_id_means_update() {
        let body = json!({"id": "job-1", "ttl": 99, "status": "done", "created_at": "x"});
        let write = prepare_job(&body, now()).unwrap();

        let JobWrite::Update(update) = &write else {
            panic!("expected an update, got {write:?}");
        };
        assert_eq!(update.id, "job-1");
        assert!(!update.attributes.contains_key("id"));
        assert!(!update.attributes.contains_key("created_at"));
        assert_eq!(
            update.attributes.keys().collect::<Vec<_>>(),
            vec!["status", "ttl", "updated_at"]
        );

        assert_eq!(write.status_code(), 200);
        assert_eq!(
            write.response_body(),
            json!({"message": "Job updated successfully", "id": "job-1", "ttl": 99})
        );
    }

    #[test]
    fn test_update_expression_uses_placeholders() {
        let body = json!({"id": "job-1", "ttl": 5, "status": "done"});
        let write = prepare_job(&body, now()).unwrap();
        let JobWrite::Update(update) = write else {
            panic!("expected an update");
        };

        assert_eq!(
            update.update_expression(),
            "SET #f0 = :v0, #f1 = :v1, #f2 = :v2"
        );
        let names = update.expression_attribute_names();
        assert_eq!(names["#f0"], "status");
        assert_eq!(names["#f1"], "ttl");
        assert_eq!(names["#f2"], "updated_at");
        assert!(!names.values().any(|name| name == "id"));

        let values = update.expression_attribute_values();
        assert_eq!(values[":v0"], AttrValue::from("done"));
        assert_eq!(values[":v1"], AttrValue::from(5_i64));
    }

    #[test]
    fn test_apply_merges_supplied_attributes_only() {
        let existing = Item::from([
            ("id".to_string(), AttrValue::from("job-1")),
            ("status".to_string(), AttrValue::from("queued")),
            ("owner".to_string(), AttrValue::from("ops")),
        ]);
        let body = json!({"id": "job-1", "ttl": 5, "status": "done"});
        let write = prepare_job(&body, now()).unwrap();
        let JobWrite::Update(update) = write else {
            panic!("expected an update");
        };

        let merged = update.apply(Some(existing));
        assert_eq!(merged["status"], AttrValue::from("done"));
        assert_eq!(merged["owner"], AttrValue::from("ops"));

        let upserted = update.apply(None);
        assert_eq!(upserted["id"], AttrValue::from("job-1"));
        assert_eq!(upserted["status"], AttrValue::from("done"));
    }

    #[test]
    fn test_ttl_is_required() {
        let err = prepare_job(&json!({"status": "queued"}), now()).unwrap_err();
        assert_eq!(err, ApiError::validation("TTL attribute is required"));

        let err = prepare_job(&json!({"id": "job-1"}), now()).unwrap_err();
        assert_eq!(err, ApiError::validation("TTL attribute is required"));
    }

    #[test]
    fn test_ttl_must_be_integral() {
        for ttl in [json!("soon"), json!(1.5), json!(true)] {
            let err = prepare_job(&json!({ "ttl": ttl.clone() }), now()).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{ttl}");
        }
    }

    #[test]
    fn test_body_must_be_object() {
        let err = prepare_job(&json!([{"ttl": 1}]), now()).unwrap_err();
        assert_eq!(err, ApiError::validation("Job data must be a single object"));
    }

    #[test]
    fn test_non_string_id_is_rejected() {
        let err = prepare_job(&json!({"id": 7, "ttl": 1}), now()).unwrap_err();
        assert_eq!(err, ApiError::validation("Job id must be a string"));
    }
}
