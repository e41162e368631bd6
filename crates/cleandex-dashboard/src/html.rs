//! Page templates.
//!
//! Every page extends `layout.html`. Templates are compiled into the binary
//! and `.html` names are auto-escaped, so handlers pass raw values.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("nav.html", include_str!("../templates/nav.html")),
    ("style.css", include_str!("../templates/style.css")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("message.html", include_str!("../templates/message.html")),
    ("analyze.html", include_str!("../templates/analyze.html")),
    ("monitor_form.html", include_str!("../templates/monitor_form.html")),
    ("monitor_results.html", include_str!("../templates/monitor_results.html")),
    ("history.html", include_str!("../templates/history.html")),
];

/// Compiled dashboard templates.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Render `name` as the response body. A template failure answers 500.
    pub fn respond<S: Serialize>(&self, status: StatusCode, name: &str, ctx: S) -> Response {
        match self.render(name, ctx) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!(template = name, error = %e, "page render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }

    pub fn page<S: Serialize>(&self, name: &str, ctx: S) -> Response {
        self.respond(StatusCode::OK, name, ctx)
    }

    /// A single alert box under an optional heading.
    pub fn message(&self, status: StatusCode, title: &str, active: &str, kind: &str, message: &str) -> Response {
        self.respond(
            status,
            "message.html",
            minijinja::context! { title, active, heading => title, kind, message },
        )
    }
}
