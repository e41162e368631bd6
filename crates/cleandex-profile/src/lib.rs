//! Dataset profiling for Cleandex.
//!
//! Turns tabular input into a [`DatasetProfile`]: per-column statistics,
//! data-quality alerts and a reliability index, then renders and stores it
//! as an HTML report.
//!
//! # Example
//!
//! ```rust,no_run
//! use cleandex_profile::{Dataset, Profiler, ReportRenderer, ReportStore, ReportSummary};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dataset = Dataset::from_csv(b"id,city\n1,Lisbon\n2,\n")?;
//!     let profile = Profiler::default().profile(&dataset);
//!     println!("reliability: {} ({})", profile.reliability.index, profile.reliability.grade);
//!
//!     let html = ReportRenderer::new()?.render("cities.csv", &profile)?;
//!     let store = ReportStore::open("reports").await?;
//!     store.save("cities.csv", &html, &ReportSummary::from_profile("cities.csv", &profile)).await?;
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod dataset;
pub mod profile;
pub mod report;
pub mod stats;
pub mod storage;

pub use alerts::{Alert, AlertKind};
pub use dataset::{Dataset, Value};
pub use profile::{ColumnKind, ColumnProfile, DatasetProfile, Profiler};
pub use report::{ReportRenderer, ReportSummary};
pub use storage::{sanitize_name, ReportEntry, ReportStore, StoredReport};
