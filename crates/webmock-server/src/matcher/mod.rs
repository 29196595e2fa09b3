//! Assertion matching and verification engine.
//!
//! This module provides:
//! - `Assertion`: one expected HTTP interaction (predicates, count range, canned response)
//! - `AssertionSet`: the ordered set installed by `Set`
//! - `Matcher`: the stateful engine that matches requests and builds the report
//!
//! ## Module Structure
//!
//! - `types`: wire payloads, report types and errors
//! - `request`: transport-neutral view of an inbound request
//! - `assertion`: predicate evaluation and response synthesis
//! - `assertion_set`: atomic construction of the active set
//! - `core`: the `Matcher` itself
//! - `handler`: HTTP handler for the mock plane

mod assertion;
mod assertion_set;
mod core;
mod handler;
mod request;
mod types;

#[cfg(test)]
mod tests;

pub use assertion::{Assertion, MockResponse};
pub use assertion_set::AssertionSet;
pub use self::core::Matcher;
pub use handler::{handle_mock_request, into_response};
pub use request::{canonical_header_name, parse_query_values, IncomingRequest};
pub use types::{
    AssertionConfig, AssertionResult, AssertionsConfig, ConfigError, MatchError, MatchRequest,
    MatcherStatus, ValueMap, VerificationReport,
};
