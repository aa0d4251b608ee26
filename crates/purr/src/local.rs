//! Local development server: every HTTP request runs through the same
//! dispatcher the Lambda adapter uses.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use purr_core::request::ApiRequest;
use purr_core::response::ApiResponse;

use crate::app::handle;
use crate::state::AppState;

/// Create the dev server router. All paths fall through to the dispatcher.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut request = ApiRequest::new(method.as_str(), uri.path());
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    if !body.is_empty() {
        request = request.with_body(body);
    }

    // API Gateway answers preflights in the deployed stack.
    let response = if method == Method::OPTIONS {
        state
            .responses
            .build(request.origin(), 204, String::new())
    } else {
        handle(&state, request).await
    };

    into_http_response(response)
}

fn into_http_response(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, Body::from(response.body)).into_response();

    for (name, value) in response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping unrepresentable header"),
        }
    }
    http
}
