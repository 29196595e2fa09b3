//! Route dispatch logic for the control API.

use crate::control_api::handlers;
use crate::control_api::types::{error_response, not_found};
use crate::matcher::Matcher;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Parsed control API route
#[derive(Debug, PartialEq, Eq)]
enum ControlRoute {
    /// PUT/POST/GET/DELETE /assertions
    Assertions,
    /// POST /done
    Done,
    /// GET /status
    Status,
    /// GET /health
    Health,
}

impl ControlRoute {
    fn parse(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/assertions" => Some(ControlRoute::Assertions),
            "/done" => Some(ControlRoute::Done),
            "/status" => Some(ControlRoute::Status),
            "/health" => Some(ControlRoute::Health),
            _ => None,
        }
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    matcher: Arc<Matcher>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Control API: {} {}", method, path);

    let Some(route) = ControlRoute::parse(&path) else {
        return Ok(not_found());
    };

    let response = match (&method, route) {
        (&Method::PUT | &Method::POST, ControlRoute::Assertions) => {
            handlers::handle_set(req, matcher).await
        }
        (&Method::GET, ControlRoute::Assertions) => handlers::handle_get(matcher),
        (&Method::DELETE, ControlRoute::Assertions) => handlers::handle_clear(matcher),
        (&Method::POST, ControlRoute::Done) => handlers::handle_done(matcher),
        (&Method::GET, ControlRoute::Status) => handlers::handle_status(matcher),
        (&Method::GET, ControlRoute::Health) => handlers::handle_health(),
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    };
    Ok(response)
}
