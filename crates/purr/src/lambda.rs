//! AWS Lambda adapter for API Gateway proxy events.

use lambda_http::{service_fn, Body, Error, Request, RequestExt, Response};

use purr_core::request::ApiRequest;
use purr_core::response::ApiResponse;

use crate::app::handle;
use crate::state::AppState;

/// Convert a proxy event into the adapter-neutral request.
pub fn to_api_request(event: &Request) -> ApiRequest {
    let mut request = ApiRequest::new(event.method().as_str(), event.uri().path());

    for (name, value) in event.headers() {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    for (name, value) in event.path_parameters().iter() {
        request = request.with_path_parameter(name, value);
    }

    let body = event.body().as_ref();
    if !body.is_empty() {
        request = request.with_body(String::from_utf8_lossy(body));
    }
    request
}

/// Convert an envelope into the Lambda HTTP response.
pub fn to_lambda_response(response: ApiResponse) -> Result<Response<Body>, Error> {
    let mut builder = Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }
    Ok(builder.body(Body::Text(response.body))?)
}

/// Serve API Gateway events until the runtime shuts down.
pub async fn run(state: AppState) -> Result<(), Error> {
    lambda_http::run(service_fn(move |event: Request| {
        let state = state.clone();
        async move {
            let request = to_api_request(&event);
            tracing::debug!(method = %request.method, path = %request.path, "event received");
            to_lambda_response(handle(&state, request).await)
        }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lambda_http::http;
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::storage::InMemoryRepository;

    #[test]
    fn test_to_api_request() {
        let event = http::Request::builder()
            .method("POST")
            .uri("https://api.example.com/prod/jobs")
            .header("Origin", "http://localhost:3000")
            .body(Body::Text(r#"{"ttl": 1}"#.to_string()))
            .unwrap()
            .with_path_parameters(HashMap::from([("id".to_string(), "job-1".to_string())]));

        let request = to_api_request(&event);
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/prod/jobs");
        assert_eq!(request.origin(), Some("http://localhost:3000"));
        assert_eq!(request.path_parameter("id"), Some("job-1"));
        assert_eq!(request.json_body().unwrap(), json!({"ttl": 1}));
    }

    #[test]
    fn test_empty_body_is_absent() {
        let event = http::Request::builder()
            .uri("/repos")
            .body(Body::Empty)
            .unwrap();
        assert_eq!(to_api_request(&event).body, None);
    }

    #[tokio::test]
    async fn test_round_trip_through_the_dispatcher() {
        let state = AppState::in_memory(InMemoryRepository::new(), &Config::default());
        let event = http::Request::builder()
            .method("GET")
            .uri("/prod/repos")
            .body(Body::Empty)
            .unwrap();

        let response = to_lambda_response(handle(&state, to_api_request(&event)).await).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "application/json");
        let Body::Text(body) = response.body() else {
            panic!("expected a text body");
        };
        assert_eq!(serde_json::from_str::<serde_json::Value>(body).unwrap()["count"], 0);
    }
}
