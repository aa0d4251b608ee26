//! Opaque continuation token for paginated search.
//!
//! On the wire the token is base64 of a JSON object:
//! `{"v": 1, "prefix_idx": 1, "uwi_prefix": "B", "last_evaluated_key": {...}}`.
//! Unknown fields are ignored so later versions can add fields.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::codec::{decode_item, encode_item, Item};
use crate::error::ApiError;

pub const CURSOR_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("pagination token is not valid base64")]
    Encoding,
    #[error("pagination token is malformed")]
    Malformed,
    #[error("pagination token version {0} is not supported")]
    UnsupportedVersion(u32),
    #[error("pagination token does not match the requested prefixes")]
    PrefixMismatch,
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        ApiError::Validation(format!("Invalid pagination token: {err}"))
    }
}

/// Position within a multi-prefix search: which prefix, and where in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCursor {
    #[serde(rename = "v")]
    pub version: u32,
    pub prefix_idx: usize,
    /// The prefix at `prefix_idx` when the token was minted.
    pub uwi_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Map<String, Value>>,
}

impl SearchCursor {
    pub fn new(prefix_idx: usize, uwi_prefix: &str, last_evaluated_key: Option<&Item>) -> Self {
        let last_evaluated_key = last_evaluated_key.and_then(|key| match decode_item(key) {
            Value::Object(map) => Some(map),
            _ => None,
        });

        Self {
            version: CURSOR_VERSION,
            prefix_idx,
            uwi_prefix: uwi_prefix.to_string(),
            last_evaluated_key,
        }
    }

    pub fn encode(&self) -> Result<String, ApiError> {
        let json = serde_json::to_vec(self).map_err(|e| ApiError::Unexpected(e.to_string()))?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = general_purpose::STANDARD
            .decode(token.trim())
            .map_err(|_| CursorError::Encoding)?;
        let cursor: SearchCursor =
            serde_json::from_slice(&bytes).map_err(|_| CursorError::Malformed)?;

        if cursor.version != CURSOR_VERSION {
            return Err(CursorError::UnsupportedVersion(cursor.version));
        }
        Ok(cursor)
    }

    /// Where to resume within `prefixes`: the prefix index and start key.
    ///
    /// Fails when the prefix list changed under the token.
    pub fn resume_position(
        &self,
        prefixes: &[String],
    ) -> Result<(usize, Option<Item>), CursorError> {
        match prefixes.get(self.prefix_idx) {
            Some(prefix) if *prefix == self.uwi_prefix => {}
            _ => return Err(CursorError::PrefixMismatch),
        }

        let start_key = self
            .last_evaluated_key
            .as_ref()
            .map(|map| encode_item(&Value::Object(map.clone())))
            .transpose()
            .map_err(|_| CursorError::Malformed)?;

        Ok((self.prefix_idx, start_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AttrValue;

    fn key() -> Item {
        Item::from([
            ("pk".to_string(), AttrValue::from("RASTER")),
            ("sk".to_string(), AttrValue::from("rasters/a.tif")),
            ("uwi".to_string(), AttrValue::from("42-501-20130")),
        ])
    }

    fn prefixes() -> Vec<String> {
        vec!["42-501".to_string(), "42-502".to_string()]
    }

    #[test]
    fn test_token_resumes_at_same_position() {
        let token = SearchCursor::new(1, "42-502", Some(&key())).encode().unwrap();
        let cursor = SearchCursor::decode(&token).unwrap();

        let (idx, start_key) = cursor.resume_position(&prefixes()).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(start_key, Some(key()));
    }

    #[test]
    fn test_token_without_key_starts_prefix_from_beginning() {
        let token = SearchCursor::new(1, "42-502", None).encode().unwrap();
        let (idx, start_key) = SearchCursor::decode(&token)
            .unwrap()
            .resume_position(&prefixes())
            .unwrap();
        assert_eq!(idx, 1);
        assert_eq!(start_key, None);
    }

    #[test]
    fn test_wire_shape() {
        let token = SearchCursor::new(0, "42-501", None).encode().unwrap();
        let bytes = general_purpose::STANDARD.decode(token).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({"v": 1, "prefix_idx": 0, "uwi_prefix": "42-501"}));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(SearchCursor::decode("%%%"), Err(CursorError::Encoding));

        let not_json = general_purpose::STANDARD.encode("hello");
        assert_eq!(SearchCursor::decode(&not_json), Err(CursorError::Malformed));
    }

    #[test]
    fn test_rejects_foreign_token_shape() {
        // A token in the old unversioned shape.
        let legacy = general_purpose::STANDARD
            .encode(r#"{"last_evaluated_key": null, "uwi_prefix": "42"}"#);
        assert_eq!(SearchCursor::decode(&legacy), Err(CursorError::Malformed));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let future = general_purpose::STANDARD
            .encode(r#"{"v": 9, "prefix_idx": 0, "uwi_prefix": "42"}"#);
        assert_eq!(
            SearchCursor::decode(&future),
            Err(CursorError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let extended = general_purpose::STANDARD
            .encode(r#"{"v": 1, "prefix_idx": 0, "uwi_prefix": "42-501", "issued_at": 1}"#);
        assert!(SearchCursor::decode(&extended).is_ok());
    }

    #[test]
    fn test_prefix_mismatch() {
        let cursor = SearchCursor::new(1, "42-999", None);
        assert_eq!(
            cursor.resume_position(&prefixes()),
            Err(CursorError::PrefixMismatch)
        );

        let out_of_range = SearchCursor::new(5, "42-501", None);
        assert_eq!(
            out_of_range.resume_position(&prefixes()),
            Err(CursorError::PrefixMismatch)
        );
    }

    #[test]
    fn test_cursor_error_is_validation() {
        let error: ApiError = CursorError::Malformed.into();
        assert_eq!(error.status_code(), 400);
    }
}
