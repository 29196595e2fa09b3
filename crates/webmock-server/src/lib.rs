//! Programmable HTTP mock server.
//!
//! A test harness installs expected interactions through the control API,
//! the mock plane answers requests from the first matching assertion while
//! recording each match, and `Done` returns a pass/fail report per assertion.

pub mod config;
pub mod control_api;
pub mod matcher;
pub mod server;

pub use control_api::ControlApiServer;
pub use matcher::Matcher;
pub use server::MockServer;
