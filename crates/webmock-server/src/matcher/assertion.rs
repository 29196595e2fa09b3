//! A single expected HTTP interaction.
//!
//! An `Assertion` is built from an [`AssertionConfig`] and never changes
//! afterwards. It answers two questions: does a request satisfy its
//! predicates, and what response should be sent when it does.

use super::request::IncomingRequest;
use super::types::{AssertionConfig, ConfigError, MatchError, ValueMap};
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;

/// Canned response produced by a matching assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: StatusCode,
    /// Every (name, value) pair is appended, so repeated names are kept
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
}

/// Validated, immutable assertion
#[derive(Debug, Clone)]
pub struct Assertion {
    config: AssertionConfig,
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl Assertion {
    /// Validate a configuration entry. `index` is its position, used in error messages.
    pub fn from_config(index: usize, config: AssertionConfig) -> Result<Self, ConfigError> {
        let status = match config.return_status_code {
            0 => StatusCode::OK,
            code => u16::try_from(code)
                .ok()
                .and_then(|c| StatusCode::from_u16(c).ok())
                // 1xx cannot be sent as a final response
                .filter(|status| !status.is_informational())
                .ok_or(ConfigError::InvalidStatusCode { index, code })?,
        };

        let mut headers = Vec::new();
        for (name, values) in &config.return_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ConfigError::InvalidHeaderName {
                    index,
                    name: name.clone(),
                }
            })?;
            for value in values {
                let header_value = HeaderValue::from_str(value).map_err(|_| {
                    ConfigError::InvalidHeaderValue {
                        index,
                        name: name.clone(),
                        value: value.clone(),
                    }
                })?;
                headers.push((header_name.clone(), header_value));
            }
        }

        let body = Bytes::from(config.return_body.clone());

        Ok(Self {
            config,
            status,
            headers,
            body,
        })
    }

    /// The configuration this assertion was built from, unchanged
    pub fn to_config(&self) -> AssertionConfig {
        self.config.clone()
    }

    pub fn at_least(&self) -> u64 {
        self.config.at_least
    }

    pub fn at_most(&self) -> u64 {
        self.config.at_most
    }

    /// Whether `count` matches fall inside `[atLeast, atMost]`
    pub fn count_satisfied(&self, count: usize) -> bool {
        let count = count as u64;
        self.at_least() <= count && count <= self.at_most()
    }

    /// Compare the host portion of `host_with_port` (split on the first `:`)
    pub fn match_host(&self, host_with_port: &str) -> Result<(), MatchError> {
        if !self.config.match_host {
            return Ok(());
        }
        let host = host_with_port
            .split_once(':')
            .map_or(host_with_port, |(host, _)| host);
        if self.config.host != host {
            return Err(MatchError::Host {
                expected: self.config.host.clone(),
                actual: host.to_string(),
            });
        }
        Ok(())
    }

    pub fn match_method(&self, method: &str) -> Result<(), MatchError> {
        if !self.config.match_method {
            return Ok(());
        }
        let expected = self.config.method.to_uppercase();
        let actual = method.to_uppercase();
        if expected != actual {
            return Err(MatchError::Method { expected, actual });
        }
        Ok(())
    }

    /// Succeeds if the expected path equals either the decoded or the raw form
    pub fn match_path(&self, path: &str, raw_path: &str) -> Result<(), MatchError> {
        if !self.config.match_path || self.config.path == path || self.config.path == raw_path {
            return Ok(());
        }
        Err(MatchError::Path {
            expected: self.config.path.clone(),
            actual: path.to_string(),
        })
    }

    /// Header names compare case-insensitively, values exactly
    pub fn match_headers(&self, request: &IncomingRequest) -> Result<(), MatchError> {
        if !self.config.match_headers {
            return Ok(());
        }
        match_key_values("headers", &self.config.headers, |key| {
            request.header_values(key)
        })
    }

    pub fn match_parameters(&self, parameters: &ValueMap) -> Result<(), MatchError> {
        if !self.config.match_parameters {
            return Ok(());
        }
        match_key_values("parameters", &self.config.parameters, |key| {
            parameters.get(key)
        })
    }

    pub fn match_body(&self, body: &[u8]) -> Result<(), MatchError> {
        if self.config.match_body && self.config.body.as_slice() != body {
            return Err(MatchError::Body {
                expected: self.config.body.len(),
                actual: body.len(),
            });
        }
        Ok(())
    }

    /// Evaluate every enabled predicate, stopping at the first mismatch
    pub fn matches(&self, request: &IncomingRequest) -> Result<(), MatchError> {
        self.match_host(&request.host)?;
        self.match_method(&request.method)?;
        self.match_path(&request.path, &request.raw_path)?;
        self.match_headers(request)?;
        self.match_parameters(&request.query)?;
        self.match_body(&request.body)
    }

    /// Response to send when this assertion matches
    pub fn respond(&self) -> MockResponse {
        MockResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Subset-of-values check: every expected key must exist and every expected
/// value for it must appear among the actual values. Extra actual values and
/// ordering are ignored.
fn match_key_values<'a, F>(
    field: &'static str,
    expected: &ValueMap,
    lookup: F,
) -> Result<(), MatchError>
where
    F: Fn(&str) -> Option<&'a Vec<String>>,
{
    for (key, expected_values) in expected {
        let Some(actual_values) = lookup(key) else {
            return Err(MatchError::MissingKey {
                field,
                key: key.clone(),
            });
        };
        if let Some(missing) = expected_values
            .iter()
            .find(|value| !actual_values.contains(value))
        {
            return Err(MatchError::MissingValue {
                field,
                key: key.clone(),
                value: missing.clone(),
            });
        }
    }
    Ok(())
}
