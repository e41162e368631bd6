//! cleandex-dashboard: browser front end for the Cleandex API.
//!
//! Server-rendered pages for dataset analysis, API monitoring and report
//! history. All API access goes through [`backend::CleandexBackend`].

pub mod backend;
pub mod handlers;
pub mod html;
pub mod router;
pub mod state;
