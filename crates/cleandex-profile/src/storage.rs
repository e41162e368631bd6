//! Report store: HTML reports and JSON sidecars in one directory.
//!
//! Layout: `relatorio_<name>.html` and `relatorio_<name>.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use cleandex_common::error::{CleandexError, Result};
use cleandex_common::reliability::Grade;

use crate::report::ReportSummary;

const FILE_PREFIX: &str = "relatorio_";
const HTML_EXT: &str = "html";
const JSON_EXT: &str = "json";

/// Everything but RFC 3986 unreserved characters gets percent-encoded.
const NOT_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Where a saved report can be downloaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub name: String,
    pub download: String,
}

/// One row of the report listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub download: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub index: Option<f64>,
    pub grade: Option<Grade>,
    pub title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Open the store, creating the directory when missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), "report store ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download path for a report name, percent-encoded as one path segment.
    pub fn download_link(name: &str) -> String {
        format!("/baixar/{}", utf8_percent_encode(name, NOT_UNRESERVED))
    }

    /// `Content-Disposition` for a report download: an ASCII `filename` plus
    /// the RFC 5987 `filename*` carrying the exact UTF-8 name.
    pub fn attachment_disposition(name: &str) -> String {
        let file = format!("{FILE_PREFIX}{name}.{HTML_EXT}");
        let fallback: String = file
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(&file, NOT_UNRESERVED)
        )
    }

    pub fn html_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{name}.{HTML_EXT}"))
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{name}.{JSON_EXT}"))
    }

    /// Write the HTML report and its summary sidecar. Existing files are replaced.
    #[instrument(skip(self, html, summary))]
    pub async fn save(&self, name: &str, html: &str, summary: &ReportSummary) -> Result<StoredReport> {
        let name = sanitize_name(name)?;
        tokio::fs::write(self.html_path(&name), html).await?;
        tokio::fs::write(self.json_path(&name), serde_json::to_vec_pretty(summary)?).await?;
        info!(report = %name, index = summary.reliability.index, "report saved");
        Ok(StoredReport { download: Self::download_link(&name), name })
    }

    /// Reserve a unix-seconds name, suffixed `_1`, `_2`, … while taken.
    ///
    /// The name is claimed by creating its empty HTML file with `create_new`,
    /// so concurrent callers never get the same name. [`save`](Self::save)
    /// fills the file in; [`release`](Self::release) drops an unused claim.
    pub async fn reserve_timestamp_name(&self) -> Result<String> {
        let base = Utc::now().timestamp().to_string();
        let mut n = 0;
        loop {
            let candidate = if n == 0 { base.clone() } else { format!("{base}_{n}") };
            let claim = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.html_path(&candidate))
                .await;
            match claim {
                Ok(_) => {
                    debug!(report = %candidate, "reserved report name");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove a reserved name that was never saved. Saved reports are kept.
    pub async fn release(&self, name: &str) -> Result<()> {
        let path = self.html_path(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() == 0 => {
                tokio::fs::remove_file(&path).await?;
                debug!(report = %name, "released report name");
            }
            _ => {}
        }
        Ok(())
    }

    /// Path of an existing report. Names that need sanitizing never match.
    pub async fn locate(&self, name: &str) -> Result<PathBuf> {
        let not_found = || CleandexError::ReportNotFound(name.to_string());
        let clean = sanitize_name(name).map_err(|_| not_found())?;
        if clean != name {
            warn!(requested = %name, "rejected unsafe report name");
            return Err(not_found());
        }
        let path = self.html_path(&clean);
        // Empty files are reservations still being profiled
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() > 0 => Ok(path),
            _ => Err(not_found()),
        }
    }

    /// Stored summary of a report.
    pub async fn summary(&self, name: &str) -> Result<ReportSummary> {
        self.locate(name).await?;
        let bytes = tokio::fs::read(self.json_path(name))
            .await
            .map_err(|_| CleandexError::ReportNotFound(name.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All stored reports, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ReportEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_prefix(FILE_PREFIX))
                .and_then(|f| f.strip_suffix(".html"))
            else {
                continue;
            };

            let meta = entry.metadata().await?;
            if meta.len() == 0 {
                continue;
            }
            let summary: Option<ReportSummary> = match tokio::fs::read(self.json_path(name)).await {
                Ok(bytes) => serde_json::from_slice(&bytes).ok(),
                Err(_) => None,
            };
            let created_at = summary
                .as_ref()
                .map(|s| s.generated_at)
                .or_else(|| meta.modified().ok().map(DateTime::<Utc>::from));

            entries.push(ReportEntry {
                name: name.to_string(),
                download: Self::download_link(name),
                created_at,
                size_bytes: meta.len(),
                index: summary.as_ref().map(|s| s.reliability.index),
                grade: summary.as_ref().map(|s| s.reliability.grade),
                title: summary.map(|s| s.title),
            });
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        debug!(n = entries.len(), "listed reports");
        Ok(entries)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}

/// Make a report name safe to use inside the store directory and as a URL
/// path segment.
pub fn sanitize_name(raw: &str) -> Result<String> {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | '#' | '?' | '%' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    while name.contains("..") {
        name = name.replace("..", ".");
    }
    if name.is_empty() || name == "." {
        return Err(CleandexError::Validation(format!("invalid report name: '{raw}'")));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::profile::Profiler;

    fn summary(title: &str) -> ReportSummary {
        let p = Profiler::default().profile(&Dataset::from_csv(b"a\n1\n2\n").unwrap());
        ReportSummary::from_profile(title, &p)
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("my data.csv").unwrap(), "my_data.csv");
        assert_eq!(sanitize_name("a/b\\c").unwrap(), "a_b_c");
        assert_eq!(sanitize_name("../../etc/passwd").unwrap(), "._._etc_passwd");
        assert!(sanitize_name("  ").is_err());
        assert!(sanitize_name("..").is_err());
    }

    #[test]
    fn test_sanitize_name_strips_url_delimiters() {
        assert_eq!(sanitize_name("q#1.csv").unwrap(), "q_1.csv");
        assert_eq!(sanitize_name("a?b=1%20.csv").unwrap(), "a_b=1_20.csv");
        assert_eq!(sanitize_name("say \"hi\".csv").unwrap(), "say__hi_.csv");
    }

    #[test]
    fn test_download_link_encodes_segment() {
        assert_eq!(ReportStore::download_link("sales_q1.csv"), "/baixar/sales_q1.csv");
        assert_eq!(ReportStore::download_link("preços.csv"), "/baixar/pre%C3%A7os.csv");
    }

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            ReportStore::attachment_disposition("messy.csv"),
            "attachment; filename=\"relatorio_messy.csv.html\"; filename*=UTF-8''relatorio_messy.csv.html"
        );
        assert_eq!(
            ReportStore::attachment_disposition("preços.csv"),
            "attachment; filename=\"relatorio_pre_os.csv.html\"; filename*=UTF-8''relatorio_pre%C3%A7os.csv.html"
        );
    }

    #[tokio::test]
    async fn test_save_and_locate() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path().join("reports")).await.unwrap();

        let stored = store.save("sales q1.csv", "<html></html>", &summary("sales")).await.unwrap();
        assert_eq!(stored.name, "sales_q1.csv");
        assert_eq!(stored.download, "/baixar/sales_q1.csv");
        assert!(dir.path().join("reports/relatorio_sales_q1.csv.html").is_file());
        assert!(dir.path().join("reports/relatorio_sales_q1.csv.json").is_file());

        assert!(store.locate("sales_q1.csv").await.is_ok());
        assert!(matches!(store.locate("missing").await, Err(CleandexError::ReportNotFound(_))));
        assert!(matches!(store.locate("../sales_q1.csv").await, Err(CleandexError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_reserved_names_are_never_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).await.unwrap();
        let first = store.reserve_timestamp_name().await.unwrap();
        // Unsaved reservations still hold their name
        let second = store.reserve_timestamp_name().await.unwrap();
        assert_ne!(first, second);
        store.save(&first, "x", &summary("a")).await.unwrap();
        let third = store.reserve_timestamp_name().await.unwrap();
        assert_ne!(third, first);
        assert_ne!(third, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).await.unwrap();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.reserve_timestamp_name().await.unwrap() })
            })
            .collect();
        let mut names = std::collections::HashSet::new();
        for h in handles {
            names.insert(h.await.unwrap());
        }
        assert_eq!(names.len(), 16);
    }

    #[tokio::test]
    async fn test_pending_reservation_is_hidden_and_releasable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).await.unwrap();
        let name = store.reserve_timestamp_name().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(store.locate(&name).await, Err(CleandexError::ReportNotFound(_))));

        store.release(&name).await.unwrap();
        assert!(!store.html_path(&name).exists());

        store.save("kept", "x", &summary("k")).await.unwrap();
        store.release("kept").await.unwrap();
        assert!(store.locate("kept").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path()).await.unwrap();
        store.save("one", "x", &summary("first")).await.unwrap();
        store.save("two", "y", &summary("second")).await.unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "z").unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|e| e.index == Some(100.0)));
        assert_eq!(store.count().await.unwrap(), 2);

        let s = store.summary("two").await.unwrap();
        assert_eq!(s.title, "second");
    }
}
