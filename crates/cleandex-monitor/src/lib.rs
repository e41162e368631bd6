//! API monitoring for Cleandex.
//!
//! Probes a list of HTTP endpoints concurrently and scores each one on
//! availability, latency and response format.

pub mod checker;
pub mod models;
pub mod scoring;
pub mod validate;

pub use checker::Monitor;
pub use models::{
    AuthConfig, AuthType, EndpointResult, EndpointStatus, MonitorReport, MonitorRequest, MonitorResults,
    MonitorStats,
};
pub use validate::{is_valid_url, validate_request};
