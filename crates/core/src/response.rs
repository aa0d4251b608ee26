//! Uniform response envelope with origin-restricted CORS.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;

pub const ALLOW_HEADERS: &str = "Content-Type,Authorization,X-Api-Key,token";
pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";

/// Origin always allowed, for the site's local dev server.
pub const LOCAL_ORIGIN: &str = "http://localhost:3000";

/// The `{statusCode, headers, body}` envelope every endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Response payload: JSON to encode, or text passed through unmodified.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

/// Builds envelopes, echoing the request origin only when allow-listed.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    allowed_origins: BTreeSet<String>,
}

impl ResponseBuilder {
    pub fn new<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
        }
    }

    /// `Access-Control-Allow-Origin` value for a request origin.
    pub fn cors_origin<'a>(&self, origin: Option<&'a str>) -> &'a str {
        match origin {
            Some(origin) if self.allowed_origins.contains(origin) => origin,
            _ => "",
        }
    }

    pub fn build(
        &self,
        origin: Option<&str>,
        status_code: u16,
        body: impl Into<Body>,
    ) -> ApiResponse {
        let body = match body.into() {
            Body::Text(text) => text,
            Body::Json(value) => value.to_string(),
        };

        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            (
                "Access-Control-Allow-Origin".to_string(),
                self.cors_origin(origin).to_string(),
            ),
            (
                "Access-Control-Allow-Headers".to_string(),
                ALLOW_HEADERS.to_string(),
            ),
            (
                "Access-Control-Allow-Methods".to_string(),
                ALLOW_METHODS.to_string(),
            ),
            (
                "Access-Control-Allow-Credentials".to_string(),
                "true".to_string(),
            ),
        ]);

        ApiResponse {
            status_code,
            headers,
            body,
        }
    }

    /// `{"error": ...}` with the error's status code.
    pub fn error(&self, origin: Option<&str>, error: &ApiError) -> ApiResponse {
        self.build(
            origin,
            error.status_code(),
            json!({ "error": error.to_string() }),
        )
    }
}
