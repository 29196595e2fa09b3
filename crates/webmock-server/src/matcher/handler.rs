//! Request handling for the mock plane.
//!
//! Every inbound request has its body drained exactly once, is matched
//! against the active assertions, and receives either the canned response of
//! the first matching assertion or a bare 404.

use super::assertion::MockResponse;
use super::core::Matcher;
use super::request::IncomingRequest;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

/// Handle a request to the mock plane
pub async fn handle_mock_request<B>(
    req: Request<B>,
    matcher: Arc<Matcher>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();

    // Drain the body up front so the connection is released on every path
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(
                "Failed to read body of {} {}: {}",
                parts.method,
                parts.uri.path(),
                e
            );
            return Ok(plain_response(
                StatusCode::BAD_REQUEST,
                "failed to read request body",
            ));
        }
    };

    let request = IncomingRequest::from_parts(&parts, body);
    let response = match matcher.match_and_respond(&request) {
        Some(mock) => into_response(mock),
        None => plain_response(StatusCode::NOT_FOUND, Bytes::new()),
    };
    Ok(response)
}

/// Convert a canned response into a hyper response
pub fn into_response(mock: MockResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(mock.body));
    *response.status_mut() = mock.status;
    let headers = response.headers_mut();
    for (name, value) in mock.headers {
        headers.append(name, value);
    }
    response
}

fn plain_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
