//! Request dispatch: route, run the handler, wrap the outcome.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use purr_core::error::ApiError;
use purr_core::request::ApiRequest;
use purr_core::resource::{Method, ResourceKind};
use purr_core::response::ApiResponse;

use crate::handlers::{jobs, records, search, Reply};
use crate::state::AppState;

/// Handle one request end to end. Never fails: every error, including a
/// panic inside a handler, becomes an error envelope.
pub async fn handle(state: &AppState, request: ApiRequest) -> ApiResponse {
    let origin = request.origin();
    let outcome = AssertUnwindSafe(dispatch(state, &request))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(reply)) => state.responses.build(origin, reply.status, reply.body),
        Ok(Err(error)) => {
            if error.is_client_error() {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    status = error.status_code(),
                    error = %error,
                    "request rejected"
                );
            } else {
                tracing::error!(
                    method = %request.method,
                    path = %request.path,
                    error = %error,
                    "request failed"
                );
            }
            state.responses.error(origin, &error)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(
                method = %request.method,
                path = %request.path,
                panic = %message,
                "handler panicked"
            );
            state.responses.error(origin, &ApiError::Unexpected(message))
        }
    }
}

async fn dispatch(state: &AppState, request: &ApiRequest) -> Result<Reply, ApiError> {
    let route = state.router.route(&request.method, &request.path)?;

    match (route.kind, route.method) {
        (ResourceKind::Repo | ResourceKind::Raster | ResourceKind::Vector, Method::Post) => {
            records::create_records(state, route.kind, request).await
        }
        (ResourceKind::Repo | ResourceKind::Raster | ResourceKind::Vector, Method::Get) => {
            records::list_records(state, route.kind).await
        }
        (ResourceKind::Search, Method::Post) => search::search(state, request).await,
        (ResourceKind::Search, Method::Get) => Err(ApiError::MethodNotAllowed),
        (ResourceKind::Job, Method::Post) => jobs::write_job(state, request).await,
        (ResourceKind::Job, Method::Get) => {
            jobs::get_job(state, request, route.id.as_deref()).await
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unexpected panic".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use purr_core::codec::Item;
    use purr_core::query::IndexQuery;
    use purr_core::storage::{PartitionQuery, QueryPage, RecordRepository, Result};

    use super::*;
    use crate::config::Config;
    use crate::storage::InMemoryRepository;

    const SITE: &str = "https://purr.example.com";

    fn config() -> Config {
        Config {
            allowed_origins: vec!["http://localhost:3000".to_string(), SITE.to_string()],
            ..Config::default()
        }
    }

    fn setup() -> (AppState, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        (AppState::in_memory(repo.clone(), &config()), repo)
    }

    async fn call(state: &AppState, request: ApiRequest) -> (u16, Value) {
        let response = handle(state, request).await;
        (response.status_code, response.json().unwrap())
    }

    fn post(path: &str, body: Value) -> ApiRequest {
        ApiRequest::new("POST", path).with_json(&body)
    }

    fn rasters(prefix: &str, count: usize) -> Value {
        Value::Array(
            (0..count)
                .map(|i| {
                    json!({
                        "sk": format!("rasters/{prefix}/{i:04}.tif"),
                        "uwi": format!("{prefix}-{i:04}"),
                        "wordz": "gamma",
                    })
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_invalid_resource_never_touches_the_store() {
        let (state, repo) = setup();

        let (status, body) = call(&state, ApiRequest::new("GET", "/prod/widgets")).await;

        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "Invalid resource type"}));
        assert_eq!(repo.operation_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_verbs() {
        let (state, _) = setup();

        let (status, body) = call(&state, ApiRequest::new("DELETE", "/repos")).await;
        assert_eq!(status, 405);
        assert_eq!(body["error"], "Method not allowed");

        let (status, _) = call(&state, ApiRequest::new("GET", "/search")).await;
        assert_eq!(status, 405);
    }

    #[tokio::test]
    async fn test_create_and_list_repo() {
        let (state, _) = setup();
        let repo = json!({"sk": "repos/alpha", "fs_path": "/data/alpha", "depth": 2.0});

        let (status, body) = call(&state, post("/prod/repos", repo)).await;
        assert_eq!(status, 201);
        assert_eq!(body["message"], "Successfully created a repo: /data/alpha");
        assert_eq!(body["resource_type"], "repo");
        assert_eq!(body["count"], 1);
        assert_eq!(body["item"]["pk"], "REPO");

        let (status, first) = call(&state, ApiRequest::new("GET", "/prod/repos")).await;
        assert_eq!(status, 200);
        assert_eq!(first["count"], 1);
        assert_eq!(first["data"][0]["depth"], json!(2));

        let (_, second) = call(&state, ApiRequest::new("GET", "/prod/repos")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_create_rasters_requires_array() {
        let (state, repo) = setup();

        let (status, body) = call(&state, post("/rasters", json!({"sk": "a"}))).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Request body must be an array");
        assert_eq!(repo.operation_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (state, _) = setup();
        let request = ApiRequest::new("POST", "/repos").with_body("{not json");

        let (status, body) = call(&state, request).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Invalid JSON format");
    }

    #[tokio::test]
    async fn test_vectors_list_by_sort_prefix() {
        let (state, _) = setup();
        let vectors = json!([
            {"sk": "VECTOR#shapes/a.shp"},
            {"sk": "VECTOR#shapes/b.shp"}
        ]);

        let (status, body) = call(&state, post("/vectors", vectors)).await;
        assert_eq!(status, 201);
        assert_eq!(body["message"], "Successfully created 2 vector(s)");

        let (_, listed) = call(&state, ApiRequest::new("GET", "/vectors")).await;
        assert_eq!(listed["count"], 2);
    }

    #[tokio::test]
    async fn test_search_pages_through_every_prefix() {
        let (state, _) = setup();
        call(&state, post("/rasters", rasters("A", 150))).await;
        call(&state, post("/rasters", rasters("B", 150))).await;

        let mut seen = HashSet::new();
        let mut token = Value::Null;
        let mut sizes = Vec::new();

        loop {
            let body = json!({"uwis": ["A", "B"], "maxResults": 100, "paginationToken": token});
            let (status, page) = call(&state, post("/prod/search", body)).await;
            assert_eq!(status, 200);

            let data = page["data"].as_array().unwrap();
            sizes.push(data.len());
            for item in data {
                assert!(seen.insert(item["uwi"].as_str().unwrap().to_string()));
            }

            assert_eq!(page["metadata"]["returnedCount"], data.len());
            assert_eq!(page["metadata"]["totalRequested"], 100);
            token = page["metadata"]["paginationToken"].clone();
            if token.is_null() {
                break;
            }
        }

        assert_eq!(sizes, vec![100, 100, 100]);
        assert_eq!(seen.len(), 300);
    }

    #[tokio::test]
    async fn test_search_with_foreign_token() {
        let (state, _) = setup();
        let body = json!({"uwis": ["A"], "paginationToken": "bm90LWEtY3Vyc29y"});

        let (status, page) = call(&state, post("/search", body)).await;
        assert_eq!(status, 400);
        assert!(page["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid pagination token"));
    }

    #[tokio::test]
    async fn test_search_clamps_oversized_max_results() {
        let (state, _) = setup();
        call(&state, post("/rasters", rasters("A", 3))).await;

        let body = json!({"uwis": ["A"], "maxResults": 5_000_000_000_u64});
        let (status, page) = call(&state, post("/search", body)).await;
        assert_eq!(status, 200);
        assert_eq!(page["metadata"]["totalRequested"], 500);
        assert_eq!(page["metadata"]["returnedCount"], 3);

        let body = json!({"uwis": ["A"], "maxResults": 2.0});
        let (status, page) = call(&state, post("/search", body)).await;
        assert_eq!(status, 200);
        assert_eq!(page["metadata"]["returnedCount"], 2);
    }

    #[tokio::test]
    async fn test_search_without_prefixes_is_empty() {
        let (state, _) = setup();
        call(&state, post("/rasters", rasters("A", 3))).await;

        let (status, page) = call(&state, post("/search", json!({}))).await;
        assert_eq!(status, 200);
        assert_eq!(page["data"], json!([]));
        assert_eq!(page["metadata"]["paginationToken"], Value::Null);
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let (state, _) = setup();

        let (status, created) = call(
            &state,
            post("/jobs", json!({"ttl": 1_700_000_000, "status": "queued", "owner": "ops"})),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(created["message"], "Job created successfully");
        let id = created["id"].as_str().unwrap().to_string();

        let update = json!({"id": id, "ttl": 1_700_000_000, "status": "done"});
        let (status, updated) = call(&state, post("/jobs", update)).await;
        assert_eq!(status, 200);
        assert_eq!(
            updated,
            json!({"message": "Job updated successfully", "id": id, "ttl": 1_700_000_000})
        );

        let request = ApiRequest::new("GET", format!("/prod/jobs/{id}"));
        let (status, fetched) = call(&state, request).await;
        assert_eq!(status, 200);
        assert_eq!(fetched["data"]["status"], "done");
        assert_eq!(fetched["data"]["owner"], "ops");
        assert_eq!(fetched["data"]["ttl"], 1_700_000_000);
    }

    #[tokio::test]
    async fn test_job_without_ttl_is_rejected_before_any_write() {
        let (state, repo) = setup();

        let (status, body) = call(&state, post("/jobs", json!({"status": "queued"}))).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "TTL attribute is required");
        assert_eq!(repo.operation_count(), 0);

        let (_, created) = call(&state, post("/jobs", json!({"ttl": 1_700_000_000}))).await;
        let id = created["id"].as_str().unwrap().to_string();
        let writes = repo.operation_count();

        let update = json!({"id": id, "status": "done"});
        let (status, body) = call(&state, post("/jobs", update)).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "TTL attribute is required");
        assert_eq!(repo.operation_count(), writes);
    }

    #[tokio::test]
    async fn test_missing_job_is_404() {
        let (state, _) = setup();

        let request = ApiRequest::new("GET", "/jobs/nope").with_path_parameter("id", "nope");
        let (status, body) = call(&state, request).await;
        assert_eq!(status, 404);
        assert_eq!(body, json!({"error": "Job not found"}));
    }

    #[tokio::test]
    async fn test_job_get_requires_id() {
        let (state, _) = setup();
        let (status, body) = call(&state, ApiRequest::new("GET", "/jobs")).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Job ID required in path parameters");
    }

    #[tokio::test]
    async fn test_cors_echoes_only_allowed_origins() {
        let (state, _) = setup();

        let allowed = ApiRequest::new("GET", "/repos").with_header("Origin", SITE);
        let response = handle(&state, allowed).await;
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some(SITE));
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        let foreign =
            ApiRequest::new("GET", "/widgets").with_header("Origin", "https://evil.example");
        let response = handle(&state, foreign).await;
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some(""));
        assert_eq!(response.header("Access-Control-Allow-Credentials"), Some("true"));
    }

    struct PanickingRepository;

    #[async_trait]
    impl RecordRepository for PanickingRepository {
        async fn put_records(&self, _items: &[Item]) -> Result<()> {
            panic!("disk on fire")
        }

        async fn query_partition(&self, _query: &PartitionQuery) -> Result<Vec<Item>> {
            panic!("disk on fire")
        }

        async fn query_index(&self, _query: &IndexQuery) -> Result<QueryPage> {
            panic!("disk on fire")
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let state = AppState::new(
            Arc::new(PanickingRepository),
            Arc::new(InMemoryRepository::new()),
            &config(),
        );

        let (status, body) = call(&state, ApiRequest::new("GET", "/repos")).await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({"error": "disk on fire"}));
    }
}
