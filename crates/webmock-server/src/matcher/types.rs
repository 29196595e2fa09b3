//! Type definitions for the assertion engine.
//!
//! This module contains the configuration payloads accepted by the control API,
//! the report returned when a run is finished, and the error enums used by the
//! matcher.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multi-valued string map used for headers, query parameters and response headers.
pub type ValueMap = HashMap<String, Vec<String>>;

// ============================================================================
// Configuration Types
// ============================================================================

/// One expected HTTP interaction as it travels over the control API.
///
/// Every field is optional on the wire; missing fields take their zero value,
/// so a predicate is only evaluated when its `match*` flag is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssertionConfig {
    pub host: String,
    pub method: String,
    pub path: String,
    pub headers: ValueMap,
    pub parameters: ValueMap,
    /// Expected request body, base64 on the wire
    #[serde(with = "base64_bytes")]
    pub body: Vec<u8>,

    pub match_host: bool,
    pub match_method: bool,
    pub match_path: bool,
    pub match_headers: bool,
    pub match_parameters: bool,
    pub match_body: bool,

    pub at_least: u64,
    pub at_most: u64,

    /// 0 means "use 200"
    pub return_status_code: u32,
    pub return_headers: ValueMap,
    #[serde(with = "base64_bytes")]
    pub return_body: Vec<u8>,
}

/// The payload installed by `Set` and returned by `Get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionsConfig {
    pub assertions: Vec<AssertionConfig>,
}

// ============================================================================
// Report Types
// ============================================================================

/// Summary of a request recorded against an assertion. The body is never kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// Host as sent by the client, port included
    pub host: String,
    pub method: String,
    pub path: String,
    pub headers: ValueMap,
    pub parameters: ValueMap,
}

/// Outcome for a single assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    pub success: bool,
    pub matched_count: usize,
    pub assertion: AssertionConfig,
    pub match_requests: Vec<MatchRequest>,
}

/// Report produced by `Done`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub success: bool,
    pub assertion_results: Vec<AssertionResult>,
}

/// Snapshot of the matcher for `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherStatus {
    pub configured: bool,
    pub match_counts: Vec<usize>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Rejected configuration payload. Nothing is installed when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("assertion {index}: invalid return status code {code}")]
    InvalidStatusCode { index: usize, code: u32 },
    #[error("assertion {index}: invalid return header name {name:?}")]
    InvalidHeaderName { index: usize, name: String },
    #[error("assertion {index}: invalid value {value:?} for return header {name:?}")]
    InvalidHeaderValue {
        index: usize,
        name: String,
        value: String,
    },
}

/// Reason an assertion did not apply to a request.
///
/// A mismatch is not a fault; it only tells the matcher to try the next assertion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("host mismatched: expected {expected:?}, got {actual:?}")]
    Host { expected: String, actual: String },
    #[error("method mismatched: expected {expected}, got {actual}")]
    Method { expected: String, actual: String },
    #[error("path mismatched: expected {expected:?}, got {actual:?}")]
    Path { expected: String, actual: String },
    #[error("{field} mismatched: {key:?} is expected but not present")]
    MissingKey { field: &'static str, key: String },
    #[error("{field} mismatched: {key:?} does not contain expected value {value:?}")]
    MissingValue {
        field: &'static str,
        key: String,
        value: String,
    },
    #[error("body mismatched: expected {expected} bytes, got {actual} bytes")]
    Body { expected: usize, actual: usize },
}

/// Serde adapter mapping `Vec<u8>` to a base64 string (protobuf JSON style).
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| serde::de::Error::custom(format!("invalid base64: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}
