//! # nocturne-journal
//!
//! Append-only per-night transcript files. Each night's agent responses
//! land in `{dir}/{night_date}.log`: a header naming the date and session
//! when the night opens, then one timestamped block per response.

use chrono::NaiveDate;
use nocturne_core::error::{NocturneError, Result};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writer for the nightly transcript files.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The transcript file for a given night.
    pub fn night_path(&self, night: NaiveDate) -> PathBuf {
        self.dir.join(format!("{night}.log"))
    }

    /// Append one agent response to the night's transcript.
    ///
    /// `opening_session` carries the session identity on the night's first
    /// entry and puts the night header above the block. The directory is
    /// created on demand.
    pub async fn append(
        &self,
        night: NaiveDate,
        time_label: &str,
        text: &str,
        opening_session: Option<&str>,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            NocturneError::Journal(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        let mut block = String::new();
        if let Some(session) = opening_session {
            block.push_str(&format!("=== Night of {night} ===\nSession: {session}\n\n"));
        }
        block.push_str(&format!("--- {time_label} ---\n{}\n\n", text.trim()));

        let path = self.night_path(night);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                NocturneError::Journal(format!("failed to open {}: {e}", path.display()))
            })?;
        file.write_all(block.as_bytes()).await.map_err(|e| {
            NocturneError::Journal(format!("failed to write {}: {e}", path.display()))
        })?;
        file.flush().await.map_err(|e| {
            NocturneError::Journal(format!("failed to flush {}: {e}", path.display()))
        })?;

        debug!("journal: appended {} bytes to {}", block.len(), path.display());
        Ok(())
    }
}
