//! Headless-browser PDF renderer.
//!
//! Writes a minimal HTML rendition of the record to a scratch directory and
//! asks a Chromium-compatible binary to print it to PDF. The child process is
//! bounded by a hard timeout; `kill_on_drop` reaps it if we give up waiting.
//! Document layout is intentionally bare, only the plumbing matters here.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use admitdoc_records::{AdmissionRecord, RecordStore};

use crate::error::RenderError;
use crate::Renderer;

/// Configuration for [`BrowserRenderer`].
#[derive(Debug, Clone)]
pub struct BrowserRendererConfig {
    /// Path or name of the headless browser binary.
    pub browser_path: String,
    /// Extra flags appended before the print arguments.
    pub extra_args: Vec<String>,
    /// Hard ceiling on one render, including browser startup.
    pub render_timeout: Duration,
}

impl Default for BrowserRendererConfig {
    fn default() -> Self {
        Self {
            browser_path: "chromium".to_string(),
            extra_args: Vec::new(),
            render_timeout: Duration::from_secs(60),
        }
    }
}

/// Renders admission records to PDF through a headless browser.
pub struct BrowserRenderer {
    records: Arc<dyn RecordStore>,
    config: BrowserRendererConfig,
}

impl BrowserRenderer {
    pub fn new(records: Arc<dyn RecordStore>, config: BrowserRendererConfig) -> Self {
        Self { records, config }
    }
}

#[async_trait::async_trait]
impl Renderer for BrowserRenderer {
    async fn render(&self, id: Uuid) -> Result<Bytes, RenderError> {
        let record = self
            .records
            .get(id)
            .await
            .map_err(|e| RenderError::Store(e.to_string()))?
            .ok_or(RenderError::RecordNotFound(id))?;

        let scratch = tempfile::tempdir()?;
        let page_path = scratch.path().join("document.html");
        let pdf_path = scratch.path().join("document.pdf");

        tokio::fs::write(&page_path, render_html(&record)).await?;

        let mut cmd = Command::new(&self.config.browser_path);
        cmd.args(&self.config.extra_args)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", page_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(record_id = %id, browser = %self.config.browser_path, "launching browser for render");

        let output = tokio::time::timeout(self.config.render_timeout, cmd.output())
            .await
            .map_err(|_| RenderError::Timeout {
                seconds: self.config.render_timeout.as_secs(),
            })?
            .map_err(|e| {
                RenderError::Browser(format!(
                    "failed to launch {}: {e}",
                    self.config.browser_path
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(record_id = %id, status = ?output.status.code(), "browser exited with failure");
            return Err(RenderError::Browser(format!(
                "browser exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&pdf_path)
            .await
            .map_err(|_| RenderError::EmptyOutput)?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        debug!(record_id = %id, bytes = bytes.len(), "browser render produced artifact");
        Ok(Bytes::from(bytes))
    }
}

/// Minimal HTML rendition of a record. Layout fidelity is out of scope; the
/// page only has to carry the record data into the print pipeline.
fn render_html(record: &AdmissionRecord) -> String {
    let mut extra_rows = String::new();
    if let Some(fields) = record.fields.as_object() {
        for (key, value) in fields {
            extra_rows.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                escape_html(key),
                escape_html(&value.to_string())
            ));
        }
    }

    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset=\"utf-8\"><title>Admission {id}</title></head>\
         <body><h1>Admission record</h1>\
         <table>\
         <tr><th>Applicant</th><td>{name}</td></tr>\
         <tr><th>Program</th><td>{program}</td></tr>\
         <tr><th>Submitted</th><td>{created}</td></tr>\
         {extra_rows}\
         </table></body></html>",
        id = record.id,
        name = escape_html(&record.applicant_name),
        program = escape_html(&record.program),
        created = record.created_at.to_rfc3339(),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
