//! # Snapshot
//!
//! The persisted leaderboard. One JSON file, fully replaced on every successful run.
//!
//! ## Format
//!
//! ```json
//! {
//!   "leaderboard": [
//!     { "rank": 1, "avatar_url": "...", "login": "...", "url": "...",
//!       "score": 130, "pr_urls": ["..."], "no_of_prs": 13 }
//!   ],
//!   "success": true,
//!   "updatedAt": 1700000000000,
//!   "generated": true,
//!   "updatedTimestring": "11/14/2023, 10:13:20 PM"
//! }
//! ```
//!
//! ## Consistency
//! - Writes go to a temp file in the same directory, then get renamed over the target
//! - Readers see either the old file or the new one, never a partial write
//! - Reads never fail: a missing or corrupt file reads as the default snapshot
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_PATH: &str = "org_leaderboard.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Snapshot io error: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace snapshot: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub avatar_url: String,
    pub login: String,
    pub url: String,
    pub score: u32,
    pub pr_urls: Vec<String>,
    pub no_of_prs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub leaderboard: Vec<RankedEntry>,
    pub success: bool,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
    pub generated: bool,
    #[serde(
        rename = "updatedTimestring",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_timestring: Option<String>,
}

impl Default for LeaderboardSnapshot {
    fn default() -> Self {
        Self {
            leaderboard: Vec::new(),
            success: true,
            updated_at: None,
            generated: false,
            updated_timestring: None,
        }
    }
}

impl LeaderboardSnapshot {
    /// Snapshot of a completed run.
    pub fn generated(leaderboard: Vec<RankedEntry>, updated_at: i64, timestring: String) -> Self {
        Self {
            leaderboard,
            success: true,
            updated_at: Some(updated_at),
            generated: true,
            updated_timestring: Some(timestring),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_read(&self) -> Result<LeaderboardSnapshot, StoreError> {
        let data = fs::read(&self.path)?;

        Ok(serde_json::from_slice(&data)?)
    }

    /// File contents as written, if they are valid JSON.
    pub fn read_raw(&self) -> Option<Vec<u8>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!("No snapshot at {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_slice::<serde::de::IgnoredAny>(&data) {
            Ok(_) => Some(data),
            Err(e) => {
                warn!("Unreadable snapshot at {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Current snapshot, or the default one if the file is missing or unreadable.
    pub fn read(&self) -> LeaderboardSnapshot {
        self.try_read().unwrap_or_else(|e| {
            match &e {
                StoreError::Io(io) if io.kind() == io::ErrorKind::NotFound => {
                    debug!("No snapshot at {}, serving default", self.path.display());
                }
                _ => warn!("Unreadable snapshot at {}: {e}", self.path.display()),
            }

            LeaderboardSnapshot::default()
        })
    }

    pub fn write(&self, snapshot: &LeaderboardSnapshot) -> Result<(), StoreError> {
        let mut temp = NamedTempFile::new_in(temp_dir(&self.path))?;
        serde_json::to_writer_pretty(&mut temp, snapshot)?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        Ok(())
    }

    /// Overwrites whatever a previous deployment left behind with the default snapshot.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.write(&LeaderboardSnapshot::default())
    }
}

/// Temp files go next to the target so the final rename stays on one filesystem.
fn temp_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
