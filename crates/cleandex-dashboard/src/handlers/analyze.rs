//! Analysis page: CSV upload and JSON API source.

use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use cleandex_monitor::is_valid_url;

use crate::backend::{AnalysisOutcome, BackendError};
use crate::state::SharedState;

const DEFAULT_FILE_NAME: &str = "arquivo.csv";

#[derive(Debug, Deserialize)]
pub struct ApiSourceForm {
    pub url: String,
}

/// Analysis result as shown on the page.
#[derive(Debug, Serialize)]
struct OutcomeView {
    mensagem: String,
    index: String,
    grade: String,
    grade_label: &'static str,
    completeness: String,
    uniqueness: String,
    consistency: String,
    validity: String,
    download: String,
}

impl From<AnalysisOutcome> for OutcomeView {
    fn from(outcome: AnalysisOutcome) -> Self {
        let r = &outcome.reliability;
        let pct = |v: f64| format!("{:.1}", v * 100.0);
        Self {
            index: format!("{:.1}", r.index),
            grade: r.grade.to_string(),
            grade_label: r.grade.label(),
            completeness: pct(r.dimensions.completeness),
            uniqueness: pct(r.dimensions.uniqueness),
            consistency: pct(r.dimensions.consistency),
            validity: pct(r.dimensions.validity),
            mensagem: outcome.mensagem,
            download: outcome.relatorio,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct AnalyzePage {
    title: &'static str,
    active: &'static str,
    error: Option<String>,
    outcome: Option<OutcomeView>,
    url: String,
}

impl AnalyzePage {
    fn new(url: &str) -> Self {
        Self { title: "Data Analysis", active: "analyze", url: url.to_string(), ..Default::default() }
    }

    fn error(url: &str, msg: String) -> Self {
        Self { error: Some(msg), ..Self::new(url) }
    }

    fn result(url: &str, result: Result<AnalysisOutcome, BackendError>) -> Self {
        match result {
            Ok(outcome) => Self { outcome: Some(outcome.into()), ..Self::new(url) },
            Err(e) => Self::error(url, e.to_string()),
        }
    }
}

pub async fn analyze_page(State(state): State<SharedState>) -> Response {
    state.pages.page("analyze.html", AnalyzePage::new(""))
}

/// POST /analyze/csv: forwards the uploaded file to the API.
pub async fn analyze_csv(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    let upload = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let name = field
                    .file_name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => break Ok((name, bytes.to_vec())),
                    Err(e) => break Err(e.body_text()),
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break Err("Selecione um arquivo CSV".to_string()),
            Err(e) => break Err(e.body_text()),
        }
    };

    let view = match upload {
        Ok((name, bytes)) if bytes.is_empty() => AnalyzePage::error("", format!("{name} is empty")),
        Ok((name, bytes)) => {
            info!(file = %name, bytes = bytes.len(), "forwarding upload");
            AnalyzePage::result("", state.backend.analyze_csv(&name, bytes).await)
        }
        Err(msg) => AnalyzePage::error("", msg),
    };
    state.pages.page("analyze.html", view)
}

/// POST /analyze/api: fetches a JSON source and analyzes it as a dataframe.
pub async fn analyze_api(State(state): State<SharedState>, Form(form): Form<ApiSourceForm>) -> Response {
    let url = form.url.trim().to_string();
    if !is_valid_url(&url) {
        return state.pages.page("analyze.html", AnalyzePage::error(&url, format!("Invalid URL: {url}")));
    }

    let data = match fetch_json(&state, &url).await {
        Ok(data) => data,
        Err(msg) => {
            warn!(%url, error = %msg, "source fetch failed");
            let view = AnalyzePage::error(&url, format!("Erro ao acessar a API: {msg}"));
            return state.pages.page("analyze.html", view);
        }
    };

    let result = state.backend.analyze_dataframe(&as_dataframe(data)).await;
    state.pages.page("analyze.html", AnalyzePage::result(&url, result))
}

async fn fetch_json(state: &SharedState, url: &str) -> Result<Value, String> {
    let resp = state.http.get(url).send().await.map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status().as_u16()));
    }
    resp.json::<Value>().await.map_err(|e| e.to_string())
}

/// Column objects and record arrays pass through; any other object becomes one record.
pub fn as_dataframe(data: Value) -> Value {
    match data {
        Value::Object(map) if !map.is_empty() && map.values().all(Value::is_array) => Value::Object(map),
        Value::Object(map) => Value::Array(vec![Value::Object(map)]),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_dataframe_shapes() {
        let records = json!([{"a": 1}]);
        assert_eq!(as_dataframe(records.clone()), records);

        let columns = json!({"a": [1, 2], "b": [3, 4]});
        assert_eq!(as_dataframe(columns.clone()), columns);

        let single = json!({"id": 1, "value": "x"});
        assert_eq!(as_dataframe(single.clone()), json!([single]));
    }
}
