//! Tests for the matcher engine.
//!
//! This module covers:
//! - Matcher lifecycle (configure, peek, finish, clear)
//! - First-match-wins ordering
//! - Count range verification
//! - Concurrent request recording

use super::*;
use hyper::{StatusCode, Uri};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn install(matcher: &Matcher, assertions: Vec<AssertionConfig>) {
    let set = AssertionSet::from_config(AssertionsConfig { assertions }).unwrap();
    matcher.configure(set);
}

fn request(method: &str, uri: &'static str) -> IncomingRequest {
    IncomingRequest::from_uri(method, &Uri::from_static(uri)).with_host("localhost:12204")
}

fn get_x_once() -> AssertionConfig {
    AssertionConfig {
        method: "GET".to_string(),
        match_method: true,
        path: "/x".to_string(),
        match_path: true,
        at_least: 1,
        at_most: 1,
        return_body: b"ok".to_vec(),
        ..Default::default()
    }
}

#[test]
fn test_finish_without_configure() {
    let matcher = Matcher::new();
    let report = matcher.finish();
    assert!(report.success);
    assert!(report.assertion_results.is_empty());

    // Still empty and successful the second time
    let report = matcher.finish();
    assert!(report.success);
    assert!(report.assertion_results.is_empty());
}

#[test]
fn test_peek_unconfigured_is_absent() {
    let matcher = Matcher::new();
    assert!(matcher.peek().is_none());
    assert!(!matcher.is_configured());
}

#[test]
fn test_peek_round_trip() {
    let matcher = Matcher::new();
    let config = AssertionsConfig {
        assertions: vec![
            get_x_once(),
            AssertionConfig {
                headers: HashMap::from([(
                    "Content-Type".to_string(),
                    vec!["text/plain".to_string()],
                )]),
                match_headers: true,
                parameters: HashMap::from([("limit".to_string(), vec!["20".to_string()])]),
                match_parameters: true,
                body: vec![1, 2, 3],
                at_most: 5,
                return_status_code: 201,
                ..Default::default()
            },
        ],
    };
    matcher.configure(AssertionSet::from_config(config.clone()).unwrap());

    assert_eq!(matcher.peek(), Some(config.clone()));

    // Peeking does not disturb recorded matches
    matcher.match_and_respond(&request("GET", "/x"));
    assert_eq!(matcher.peek(), Some(config));
    assert_eq!(matcher.status().match_counts, vec![1, 0]);
}

#[test]
fn test_end_to_end_single_match() {
    let matcher = Matcher::new();
    install(&matcher, vec![get_x_once()]);

    let response = matcher.match_and_respond(&request("GET", "/x")).unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"ok");

    let report = matcher.finish();
    assert!(report.success);
    assert_eq!(report.assertion_results.len(), 1);
    let result = &report.assertion_results[0];
    assert!(result.success);
    assert_eq!(result.matched_count, 1);
    assert_eq!(result.assertion, get_x_once());
    assert_eq!(
        result.match_requests,
        vec![MatchRequest {
            host: "localhost:12204".to_string(),
            method: "GET".to_string(),
            path: "/x".to_string(),
            headers: HashMap::new(),
            parameters: HashMap::new(),
        }]
    );

    // Finish resets
    assert!(matcher.peek().is_none());
}

#[test]
fn test_end_to_end_miss() {
    let matcher = Matcher::new();
    install(&matcher, vec![get_x_once()]);

    let report = matcher.finish();
    assert!(!report.success);
    assert!(!report.assertion_results[0].success);
    assert_eq!(report.assertion_results[0].matched_count, 0);
}

#[test]
fn test_end_to_end_no_match() {
    let matcher = Matcher::new();
    install(
        &matcher,
        vec![AssertionConfig {
            path: "/a".to_string(),
            match_path: true,
            ..Default::default()
        }],
    );

    assert!(matcher.match_and_respond(&request("GET", "/b")).is_none());
    let report = matcher.finish();
    assert_eq!(report.assertion_results[0].matched_count, 0);
    assert!(report.assertion_results[0].match_requests.is_empty());
}

#[test]
fn test_unconfigured_never_matches() {
    let matcher = Matcher::new();
    assert!(matcher.match_and_respond(&request("GET", "/x")).is_none());
}

#[test]
fn test_first_match_wins_in_configuration_order() {
    let matcher = Matcher::new();
    let catch_all = |body: &[u8]| AssertionConfig {
        at_most: 10,
        return_body: body.to_vec(),
        ..Default::default()
    };
    install(
        &matcher,
        vec![catch_all(b"first"), catch_all(b"second"), catch_all(b"third")],
    );

    for _ in 0..5 {
        let response = matcher.match_and_respond(&request("GET", "/any")).unwrap();
        assert_eq!(&response.body[..], b"first");
    }
    assert_eq!(matcher.status().match_counts, vec![5, 0, 0]);
}

#[test]
fn test_later_assertion_used_when_earlier_does_not_match() {
    let matcher = Matcher::new();
    install(
        &matcher,
        vec![
            AssertionConfig {
                method: "POST".to_string(),
                match_method: true,
                return_status_code: 201,
                ..Default::default()
            },
            AssertionConfig {
                return_status_code: 202,
                ..Default::default()
            },
        ],
    );

    let response = matcher.match_and_respond(&request("GET", "/")).unwrap();
    assert_eq!(response.status, StatusCode::ACCEPTED);
    let response = matcher.match_and_respond(&request("post", "/")).unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
}

#[test]
fn test_report_lists_assertions_in_configuration_order() {
    let matcher = Matcher::new();
    let paths = ["/c", "/a", "/b", "/d"];
    install(
        &matcher,
        paths
            .iter()
            .map(|p| AssertionConfig {
                path: p.to_string(),
                match_path: true,
                ..Default::default()
            })
            .collect(),
    );

    let report = matcher.finish();
    let listed: Vec<&str> = report
        .assertion_results
        .iter()
        .map(|r| r.assertion.path.as_str())
        .collect();
    assert_eq!(listed, paths);
}

#[test]
fn test_reconfigure_discards_recorded_matches() {
    let matcher = Matcher::new();
    install(&matcher, vec![get_x_once()]);
    for _ in 0..3 {
        matcher.match_and_respond(&request("GET", "/x"));
    }
    assert_eq!(matcher.status().match_counts, vec![3]);

    install(&matcher, vec![get_x_once(), get_x_once()]);
    let report = matcher.finish();
    assert_eq!(report.assertion_results.len(), 2);
    for result in &report.assertion_results {
        assert_eq!(result.matched_count, 0);
        assert!(result.match_requests.is_empty());
    }
}

#[test]
fn test_clear_resets_without_report() {
    let matcher = Matcher::new();
    install(&matcher, vec![get_x_once()]);
    matcher.match_and_respond(&request("GET", "/x"));

    matcher.clear();
    assert!(!matcher.is_configured());
    assert_eq!(matcher.status(), MatcherStatus::default());
    assert!(matcher.finish().assertion_results.is_empty());
}

#[test]
fn test_match_requests_preserve_arrival_order() {
    let matcher = Matcher::new();
    install(
        &matcher,
        vec![AssertionConfig {
            at_most: 3,
            ..Default::default()
        }],
    );
    matcher.match_and_respond(&request("GET", "/one"));
    matcher.match_and_respond(&request("PUT", "/two"));
    matcher.match_and_respond(&request("DELETE", "/three?x=1"));

    let report = matcher.finish();
    let seen: Vec<(&str, &str)> = report.assertion_results[0]
        .match_requests
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![("GET", "/one"), ("PUT", "/two"), ("DELETE", "/three")]
    );
    assert!(report.success);
}

#[test]
fn test_overall_success_is_conjunction() {
    let matcher = Matcher::new();
    install(
        &matcher,
        vec![
            get_x_once(),
            AssertionConfig {
                path: "/y".to_string(),
                match_path: true,
                at_least: 1,
                at_most: 1,
                ..Default::default()
            },
        ],
    );
    matcher.match_and_respond(&request("GET", "/x"));

    let report = matcher.finish();
    assert!(!report.success);
    assert!(report.assertion_results[0].success);
    assert!(!report.assertion_results[1].success);
}

#[test]
fn test_concurrent_requests_are_all_recorded() {
    let matcher = Arc::new(Matcher::new());
    install(
        &matcher,
        vec![AssertionConfig {
            at_least: 400,
            at_most: 400,
            ..Default::default()
        }],
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let matcher = Arc::clone(&matcher);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    assert!(matcher.match_and_respond(&request("GET", "/load")).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let report = matcher.finish();
    assert!(report.success);
    assert_eq!(report.assertion_results[0].matched_count, 400);
}

proptest! {
    #[test]
    fn prop_count_range_enforced(at_least in 0u64..20, span in 0u64..20, hits in 0usize..50) {
        let at_most = at_least + span;
        let matcher = Matcher::new();
        install(&matcher, vec![AssertionConfig {
            at_least,
            at_most,
            ..Default::default()
        }]);
        for _ in 0..hits {
            matcher.match_and_respond(&request("GET", "/"));
        }

        let report = matcher.finish();
        let expected = at_least <= hits as u64 && hits as u64 <= at_most;
        prop_assert_eq!(report.assertion_results[0].matched_count, hits);
        prop_assert_eq!(report.assertion_results[0].success, expected);
        prop_assert_eq!(report.success, expected);
    }
}
