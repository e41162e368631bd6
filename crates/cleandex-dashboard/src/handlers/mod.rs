//! HTTP handlers for all dashboard pages.

pub mod analyze;
pub mod history;
pub mod monitor;
