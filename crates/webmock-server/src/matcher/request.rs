//! Transport-neutral view of an inbound request.
//!
//! The HTTP front end drains the body once and hands the matcher an
//! `IncomingRequest`; every assertion is evaluated against the same value.

use super::types::{MatchRequest, ValueMap};
use bytes::Bytes;
use hyper::http::request::Parts;
use hyper::{HeaderMap, Uri};
use std::collections::HashMap;

/// A request ready for matching.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// Host as sent by the client (`Host` header, or URI authority), port included
    pub host: String,
    pub method: String,
    /// Percent-decoded path
    pub path: String,
    /// Path exactly as it appeared on the request line
    pub raw_path: String,
    /// Header values keyed by lowercase name
    pub headers: ValueMap,
    /// Decoded query parameters
    pub query: ValueMap,
    pub body: Bytes,
}

impl IncomingRequest {
    /// Build from the head of a hyper request and its fully collected body
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let mut headers = collect_headers(&parts.headers);
        // Host is reported on its own, not as a header
        let host = headers
            .remove("host")
            .and_then(|values| values.into_iter().next())
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_default();

        let mut request = Self::from_uri(parts.method.as_str(), &parts.uri);
        request.host = host;
        request.headers = headers;
        request.body = body;
        request
    }

    /// Build a request with only method, path and query populated
    pub fn from_uri(method: &str, uri: &Uri) -> Self {
        let raw_path = uri.path().to_string();
        let path = urlencoding::decode(&raw_path)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw_path.clone());

        Self {
            host: uri
                .authority()
                .map(|a| a.as_str().to_string())
                .unwrap_or_default(),
            method: method.to_string(),
            path,
            raw_path,
            headers: HashMap::new(),
            query: uri.query().map(parse_query_values).unwrap_or_default(),
            body: Bytes::new(),
        }
    }

    /// Add a header value (name is normalised to lowercase)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Header values for a name, compared case-insensitively
    pub fn header_values(&self, name: &str) -> Option<&Vec<String>> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    /// Summary kept in the report (body excluded, header names canonicalised)
    pub fn summary(&self) -> MatchRequest {
        MatchRequest {
            host: self.host.clone(),
            method: self.method.clone(),
            path: self.path.clone(),
            headers: self
                .headers
                .iter()
                .map(|(name, values)| (canonical_header_name(name), values.clone()))
                .collect(),
            parameters: self.query.clone(),
        }
    }
}

fn collect_headers(headers: &HeaderMap) -> ValueMap {
    let mut map: ValueMap = HashMap::new();
    for (name, value) in headers.iter() {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Parse a query string into a multi-valued map.
///
/// `+` decodes to a space and pairs that fail percent-decoding are skipped.
/// A key without `=` maps to an empty value.
pub fn parse_query_values(query: &str) -> ValueMap {
    let mut params: ValueMap = HashMap::new();
    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let (Some(key), Some(value)) = (decode_component(key), decode_component(value)) else {
            continue;
        };
        params.entry(key).or_default().push(value);
    }
    params
}

fn decode_component(component: &str) -> Option<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

/// Convert a lowercase header name to `Title-Case` (e.g. `content-type` -> `Content-Type`)
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}
