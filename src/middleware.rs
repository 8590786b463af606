use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info, warn};
use uuid::Uuid;

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request context information for logging and tracing
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub uri: String,
    pub user_agent: Option<String>,
    pub start_time: Instant,
}

impl RequestContext {
    /// Create request context, reusing the caller's request ID when present
    pub fn new(request_id: String, method: Method, uri: Uri, headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self {
            request_id,
            method: method.to_string(),
            uri: uri.to_string(),
            user_agent,
            start_time: Instant::now(),
        }
    }

    /// Get elapsed time since request start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

/// Logging middleware that adds a request ID and structured completion logs
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    // Extract or generate request ID
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let context = RequestContext::new(
        request_id.clone(),
        request.method().clone(),
        request.uri().clone(),
        request.headers(),
    );

    // Add request ID to headers for downstream processing
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    // Create tracing span with request context
    let span = tracing::info_span!(
        "http_request",
        request_id = %context.request_id,
        method = %context.method,
        uri = %context.uri,
        user_agent = context.user_agent.as_deref().unwrap_or("unknown")
    );

    // Process the request inside the span
    let mut response = next.run(request).instrument(span).await;

    let duration_ms = context.elapsed().as_millis() as u64;

    // Add request ID to response headers
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    let status = response.status();

    // Log request completion
    if status.is_success() {
        info!(
            request_id = %context.request_id,
            method = %context.method,
            uri = %context.uri,
            status = %status.as_u16(),
            duration_ms = duration_ms,
            "Request completed successfully"
        );
    } else {
        warn!(
            request_id = %context.request_id,
            method = %context.method,
            uri = %context.uri,
            status = %status.as_u16(),
            duration_ms = duration_ms,
            "Request completed with error status"
        );
    }

    response
}
