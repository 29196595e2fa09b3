//! Control API for driving the matcher.
//!
//! This module provides a JSON-over-HTTP API for:
//! - Installing a new assertion set (`PUT /assertions`)
//! - Reading back the active set (`GET /assertions`)
//! - Finishing a run and collecting the verification report (`POST /done`)
//! - Clearing without a report, status and health checks
//!
//! The API listens on a configurable port (default: 12203).

mod handlers;
mod router;
mod server;
mod types;

pub use router::route_request;
pub use server::ControlApiServer;
