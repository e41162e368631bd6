//! cleandex-common: Shared types, errors, and scoring math used across all Cleandex crates.

pub mod error;
pub mod reliability;
pub mod settings;

// Re-export commonly used types
pub use error::{CleandexError, Result};
pub use reliability::{compute_index, DimensionScores, Grade, QualityCounts, ReliabilityIndex};
pub use settings::{MonitorSettings, ProfileThresholds, ReliabilityWeights};
