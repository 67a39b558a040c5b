//! Error types for segue-core operations.
//!
//! Cosmetic failures (a scroll target that never renders, a pending target
//! overwritten by a newer click, a re-entrant transition) are not errors: they
//! are logged and recorded in the timeline. Only infrastructure problems land here.

use std::path::PathBuf;

/// All errors that can occur in segue-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SegueError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid timing configuration: {0}")]
    InvalidConfig(String),

    #[error("Home directory not found")]
    HomeDirNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Handoff Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Handoff I/O error: {context}: {source}")]
    Handoff {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Handoff JSON error: {context}: {source}")]
    HandoffJson {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Host Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Navigation to {path} failed: {details}")]
    Navigation { path: String, details: String },

    #[error("Site map malformed: {0}")]
    SiteMap(String),
}

/// Convenience type alias for Results using SegueError.
pub type Result<T> = std::result::Result<T, SegueError>;
