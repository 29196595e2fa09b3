//! Control API handlers: Set, Get, Done, clear, status, health.

use crate::control_api::types::*;
use crate::matcher::{AssertionSet, AssertionsConfig, Matcher};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{info, warn};

/// PUT /assertions - Install a new assertion set
pub async fn handle_set<B>(req: Request<B>, matcher: Arc<Matcher>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let config: AssertionsConfig = match serde_json::from_slice(&body) {
        Ok(c) => c,
        Err(e) => {
            warn!("Rejected assertions payload: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid assertions JSON: {e}"),
            );
        }
    };

    match AssertionSet::from_config(config) {
        Ok(set) => {
            matcher.configure(set);
            no_content()
        }
        Err(e) => {
            warn!("Rejected assertions payload: {}", e);
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

/// GET /assertions - The active assertion set, 404 if none
pub fn handle_get(matcher: Arc<Matcher>) -> Response<Full<Bytes>> {
    match matcher.peek() {
        Some(config) => json_response(StatusCode::OK, &config),
        None => error_response(StatusCode::NOT_FOUND, "No assertions configured"),
    }
}

/// POST /done - Verification report; resets the matcher
pub fn handle_done(matcher: Arc<Matcher>) -> Response<Full<Bytes>> {
    let report = matcher.finish();
    if !report.success {
        info!("Verification failed for at least one assertion");
    }
    json_response(StatusCode::OK, &report)
}

/// DELETE /assertions - Reset without a report
pub fn handle_clear(matcher: Arc<Matcher>) -> Response<Full<Bytes>> {
    matcher.clear();
    no_content()
}

/// GET /status - Whether configured and matched counts so far
pub fn handle_status(matcher: Arc<Matcher>) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &matcher.status())
}

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}
