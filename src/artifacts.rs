//! Screenshot artifacts captured at fixed workflow checkpoints.

use crate::browser::Browser;
use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Points in the run where the browser is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Checkpoint {
    InitialLoad,
    SearchBefore,
    SearchAfter,
    Purchase,
}

impl Checkpoint {
    /// File name the capture is stored under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Checkpoint::InitialLoad => "01-initial-load.png",
            Checkpoint::SearchBefore => "02-search-before.png",
            Checkpoint::SearchAfter => "03-search-after.png",
            Checkpoint::Purchase => "04-purchase.png",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::InitialLoad => write!(f, "initial load"),
            Checkpoint::SearchBefore => write!(f, "search (before)"),
            Checkpoint::SearchAfter => write!(f, "search (after)"),
            Checkpoint::Purchase => write!(f, "purchase"),
        }
    }
}

/// A capture that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub checkpoint: Checkpoint,
    pub path: PathBuf,
}

/// Writes screenshots into one directory and remembers what it wrote.
#[derive(Debug)]
pub struct ArtifactRecorder {
    dir: PathBuf,
    captured: Vec<Artifact>,
}

impl ArtifactRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), captured: Vec::new() }
    }

    /// Captures the active browsing context under `name`.
    pub async fn capture(
        &mut self,
        browser: &(impl Browser + ?Sized),
        checkpoint: Checkpoint,
        name: &str,
    ) -> ShopResult<PathBuf> {
        let image =
            browser.screenshot().await.map_err(|e| ShopError::interaction("screenshot", e))?;

        let path = self.dir.join(name);
        let io_error = |source| ShopError::Io { path: path.clone(), source };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
        tokio::fs::write(&path, &image).await.map_err(io_error)?;

        self.captured.push(Artifact { checkpoint, path: path.clone() });
        Ok(path)
    }

    /// Captures a checkpoint, logging instead of failing.
    pub async fn record(
        &mut self,
        browser: &(impl Browser + ?Sized),
        checkpoint: Checkpoint,
    ) -> Option<PathBuf> {
        match self.capture(browser, checkpoint, checkpoint.file_name()).await {
            Ok(path) => {
                info!("Captured {} screenshot: {}", checkpoint, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not capture {} screenshot: {}", checkpoint, e);
                None
            }
        }
    }

    pub fn captured(&self) -> &[Artifact] {
        &self.captured
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.captured
    }
}
