//! cleandex-web: HTTP API for Cleandex.
//! Provides:
//!   - Dataset analysis from CSV uploads and JSON dataframes
//!   - Report download and listing
//!   - API monitoring runs
//!   - Health check and a live event stream

pub mod error;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;
