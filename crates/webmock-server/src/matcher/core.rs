//! The stateful matching engine.
//!
//! The `Matcher` owns the active assertion set and the requests recorded
//! against each assertion. Every operation runs inside one critical section
//! guarded by a single mutex; no I/O happens while it is held.

use super::assertion::{Assertion, MockResponse};
use super::assertion_set::AssertionSet;
use super::request::IncomingRequest;
use super::types::{
    AssertionResult, AssertionsConfig, MatchRequest, MatcherStatus, VerificationReport,
};
use parking_lot::Mutex;
use tracing::{debug, info, trace, Level};

/// Upper bound for the capacity pre-allocated from `atLeast`
const MAX_PREALLOCATED_MATCHES: u64 = 1024;

/// One installed assertion with the requests it has matched so far
#[derive(Debug)]
struct Entry {
    assertion: Assertion,
    matches: Vec<MatchRequest>,
}

/// Assertion engine shared by the mock plane and the control API
#[derive(Debug, Default)]
pub struct Matcher {
    /// `None` while unconfigured
    state: Mutex<Option<Vec<Entry>>>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new set, discarding the previous one and everything it recorded
    pub fn configure(&self, set: AssertionSet) {
        let entries: Vec<Entry> = set
            .into_inner()
            .into_iter()
            .map(|assertion| {
                let capacity = assertion.at_least().min(MAX_PREALLOCATED_MATCHES) as usize;
                Entry {
                    assertion,
                    matches: Vec::with_capacity(capacity),
                }
            })
            .collect();

        let count = entries.len();
        *self.state.lock() = Some(entries);
        info!("Installed {} assertion(s)", count);
    }

    /// The active configuration, or `None` if nothing is installed
    pub fn peek(&self) -> Option<AssertionsConfig> {
        let state = self.state.lock();
        let entries = (*state).as_ref()?;
        Some(AssertionsConfig {
            assertions: entries.iter().map(|e| e.assertion.to_config()).collect(),
        })
    }

    /// Find the first assertion (in configuration order) matching `request`,
    /// record the request against it and return its response.
    ///
    /// Returns `None` when nothing matches or nothing is configured.
    pub fn match_and_respond(&self, request: &IncomingRequest) -> Option<MockResponse> {
        let record_skips = tracing::enabled!(Level::TRACE);
        let mut skipped = Vec::new();

        // `None` when unconfigured, `Some(None)` when nothing matched
        let mut state = self.state.lock();
        let outcome = (*state).as_mut().map(|entries| {
            entries.iter_mut().enumerate().find_map(|(index, entry)| {
                match entry.assertion.matches(request) {
                    Ok(()) => {
                        entry.matches.push(request.summary());
                        Some((index, entry.matches.len(), entry.assertion.respond()))
                    }
                    Err(reason) => {
                        if record_skips {
                            skipped.push((index, reason));
                        }
                        None
                    }
                }
            })
        });
        drop(state);

        for (index, reason) in &skipped {
            trace!("Assertion {} skipped: {}", index, reason);
        }

        match outcome {
            None => {
                debug!(
                    "No assertions configured, {} {} unmatched",
                    request.method, request.path
                );
                None
            }
            Some(None) => {
                debug!("{} {} matched no assertion", request.method, request.path);
                None
            }
            Some(Some((index, count, response))) => {
                debug!(
                    "{} {} matched assertion {} ({} match(es))",
                    request.method, request.path, index, count
                );
                Some(response)
            }
        }
    }

    /// Produce the verification report and reset to the unconfigured state
    pub fn finish(&self) -> VerificationReport {
        let entries = self.state.lock().take().unwrap_or_default();

        let assertion_results: Vec<AssertionResult> = entries
            .into_iter()
            .map(|entry| {
                let matched_count = entry.matches.len();
                AssertionResult {
                    success: entry.assertion.count_satisfied(matched_count),
                    matched_count,
                    assertion: entry.assertion.to_config(),
                    match_requests: entry.matches,
                }
            })
            .collect();

        let success = assertion_results.iter().all(|r| r.success);
        info!(
            "Finished run: {} assertion(s), success={}",
            assertion_results.len(),
            success
        );

        VerificationReport {
            success,
            assertion_results,
        }
    }

    /// Drop the active set without producing a report
    pub fn clear(&self) {
        *self.state.lock() = None;
        info!("Cleared assertions");
    }

    /// Matched counts per assertion, in configuration order
    pub fn status(&self) -> MatcherStatus {
        match &*self.state.lock() {
            Some(entries) => MatcherStatus {
                configured: true,
                match_counts: entries.iter().map(|e| e.matches.len()).collect(),
            },
            None => MatcherStatus::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.state.lock().is_some()
    }
}
