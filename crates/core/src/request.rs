//! The HTTP-shaped inbound event, independent of the hosting adapter.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    /// Header names are stored lower-cased.
    pub headers: HashMap<String, String>,
    pub path_parameters: HashMap<String, String>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_path_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn origin(&self) -> Option<&str> {
        self.header("origin")
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Parses the body as JSON; an absent body is malformed too.
    pub fn json_body(&self) -> Result<Value, ApiError> {
        let body = self.body.as_deref().unwrap_or_default();
        serde_json::from_str(body).map_err(|_| ApiError::validation("Invalid JSON format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_are_case_insensitive() {
        let request =
            ApiRequest::new("GET", "/repos").with_header("Origin", "http://localhost:3000");
        assert_eq!(request.origin(), Some("http://localhost:3000"));
        assert_eq!(request.header("ORIGIN"), Some("http://localhost:3000"));
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::new("POST", "/jobs").with_json(&json!({"ttl": 3600}));
        assert_eq!(request.json_body().unwrap(), json!({"ttl": 3600}));
    }

    #[test]
    fn test_malformed_or_missing_body_is_validation_error() {
        let request = ApiRequest::new("POST", "/jobs").with_body("{not json");
        assert_eq!(
            request.json_body(),
            Err(ApiError::Validation("Invalid JSON format".to_string()))
        );
        assert!(ApiRequest::new("POST", "/jobs").json_body().is_err());
    }

    #[test]
    fn test_empty_path_parameter_is_absent() {
        let request = ApiRequest::new("GET", "/jobs/").with_path_parameter("id", "");
        assert_eq!(request.path_parameter("id"), None);
    }
}
