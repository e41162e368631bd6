//! HTTP handlers for all API routes.

pub mod analysis;
pub mod monitor;
pub mod reports;
pub mod system;
