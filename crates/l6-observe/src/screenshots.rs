//! Timestamped screenshot capture.
//!
//! Captures are best-effort: a failing screenshot is logged and swallowed so
//! it can never change the outcome of a run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use cdp_adapter::BrowserPage;
use chrono::Local;
use tracing::{debug, warn};

use crate::errors::ObserveError;
use crate::observer::TransitionObserver;

/// Writes `<timestamp>_<seq>_<label>.png` files into one directory.
#[derive(Debug)]
pub struct ScreenshotSink {
    dir: PathBuf,
    seq: AtomicU32,
}

impl ScreenshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU32::new(0),
        }
    }

    /// Create the output directory up front so the first capture can't race it.
    pub async fn prepare(&self) -> Result<(), ObserveError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ObserveError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of sequence slots handed out so far
    pub fn taken(&self) -> u32 {
        self.seq.load(Ordering::SeqCst)
    }

    fn next_path(&self, label: &str) -> PathBuf {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.dir
            .join(format!("{}_{:03}_{}.png", stamp, seq, sanitize_label(label)))
    }

    /// Capture the page; `None` when the screenshot could not be taken or written.
    pub async fn capture(&self, page: &dyn BrowserPage, label: &str) -> Option<PathBuf> {
        let path = self.next_path(label);
        let bytes = match page.screenshot().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(label, error = %err, "screenshot capture failed");
                return None;
            }
        };
        if let Err(err) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %err, "screenshot directory unavailable");
            return None;
        }
        match tokio::fs::write(&path, bytes).await {
            Ok(()) => {
                debug!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "screenshot write failed");
                None
            }
        }
    }
}

#[async_trait]
impl TransitionObserver for ScreenshotSink {
    async fn on_transition(&self, page: &dyn BrowserPage, label: &str) {
        self.capture(page, label).await;
    }
}

/// Lowercase alphanumerics and underscores only.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "step".to_string()
    } else {
        trimmed.to_string()
    }
}
