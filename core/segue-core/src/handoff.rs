//! Cross-page handoff of the pending scroll target.
//!
//! The value written by the page being left and read by the page being entered.
//! It must survive a full navigation but not outlive the browsing session. At
//! most one payload exists at a time; writing a new one replaces the old.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "scroll_target": "testimonials",
//!   "stored_at": "2026-10-17T09:30:00Z"
//! }
//! ```
//!
//! # Defensive Reads
//!
//! A missing, empty, corrupt, wrong-version or expired file reads as "nothing
//! pending". Expired and unreadable files are removed so they cannot surface on
//! an unrelated later page.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Result, SegueError};

pub const PAYLOAD_VERSION: u32 = 1;

/// The single value handed from one page to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPayload {
    pub version: u32,
    pub scroll_target: String,
    pub stored_at: DateTime<Utc>,
}

impl NavigationPayload {
    pub fn scroll_to(target: impl Into<String>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            scroll_target: target.into(),
            stored_at: Utc::now(),
        }
    }
}

pub trait HandoffStore {
    fn load(&self) -> Result<Option<NavigationPayload>>;
    /// Replaces whatever is pending.
    fn save(&mut self, payload: &NavigationPayload) -> Result<()>;
    fn clear(&mut self) -> Result<()>;

    /// Reads the pending scroll target, treating read failures as "nothing pending".
    fn pending_scroll_target(&self) -> Option<String> {
        match self.load() {
            Ok(payload) => payload.map(|payload| payload.scroll_target),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read pending scroll target");
                None
            }
        }
    }
}

/// In-memory handoff; survives navigations for as long as the owning host lives.
#[derive(Debug, Default)]
pub struct MemoryHandoff {
    payload: Option<NavigationPayload>,
}

impl MemoryHandoff {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HandoffStore for MemoryHandoff {
    fn load(&self) -> Result<Option<NavigationPayload>> {
        Ok(self.payload.clone())
    }

    fn save(&mut self, payload: &NavigationPayload) -> Result<()> {
        self.payload = Some(payload.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.payload = None;
        Ok(())
    }
}

/// JSON-file handoff, for hosts where each page load is a fresh process.
#[derive(Debug)]
pub struct FileHandoff {
    path: PathBuf,
    max_age: ChronoDuration,
}

impl FileHandoff {
    pub fn new(path: &Path, max_age_secs: i64) -> Self {
        Self {
            path: path.to_path_buf(),
            max_age: ChronoDuration::seconds(max_age_secs),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_at(&self, now: DateTime<Utc>) -> Result<Option<NavigationPayload>> {
        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SegueError::Handoff {
                    context: "read pending scroll target".to_string(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let payload = match serde_json::from_str::<NavigationPayload>(&content) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Discarding corrupt handoff file"
                );
                self.remove_file()?;
                return Ok(None);
            }
        };

        if payload.version != PAYLOAD_VERSION {
            tracing::warn!(
                version = payload.version,
                expected = PAYLOAD_VERSION,
                "Discarding handoff with unsupported version"
            );
            self.remove_file()?;
            return Ok(None);
        }

        if now.signed_duration_since(payload.stored_at) > self.max_age {
            tracing::warn!(
                target_id = %payload.scroll_target,
                stored_at = %payload.stored_at.to_rfc3339(),
                "Discarding expired scroll target"
            );
            self.remove_file()?;
            return Ok(None);
        }

        Ok(Some(payload))
    }

    fn remove_file(&self) -> Result<()> {
        match fs_err::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SegueError::Handoff {
                context: "remove handoff file".to_string(),
                source,
            }),
        }
    }
}

impl HandoffStore for FileHandoff {
    fn load(&self) -> Result<Option<NavigationPayload>> {
        self.load_at(Utc::now())
    }

    fn save(&mut self, payload: &NavigationPayload) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs_err::create_dir_all(parent).map_err(|source| SegueError::Handoff {
            context: "create handoff directory".to_string(),
            source,
        })?;

        let content =
            serde_json::to_string_pretty(payload).map_err(|source| SegueError::HandoffJson {
                context: "serialize payload".to_string(),
                source,
            })?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(|source| SegueError::Handoff {
            context: "create temp file".to_string(),
            source,
        })?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|source| SegueError::Handoff {
                context: "write temp file".to_string(),
                source,
            })?;
        temp_file
            .persist(&self.path)
            .map_err(|err| SegueError::Handoff {
                context: "persist handoff file".to_string(),
                source: err.error,
            })?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.remove_file()
    }
}
