//! Timing configuration for the transition protocol.
//!
//! Every section is optional in the TOML file; missing keys fall back to the
//! defaults below. The timings form a contract between components, so a loaded
//! config is always passed through [`SegueConfig::validate`].
//!
//! ```toml
//! [navigation]
//! cover_delay_ms = 400
//! overlap = "supersede"
//!
//! [overlay]
//! minimum_hold_ms = 700
//! scroll_hold_ms = 1200
//!
//! [restore]
//! max_attempts = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SegueError};
use crate::retry::RetryPolicy;

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".segue/segue.toml";
const DEFAULT_HANDOFF_RELATIVE_PATH: &str = ".segue/pending-scroll.json";

/// What a click does while another transition is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// The newer click cancels the older transition's pending work and restarts the hold.
    #[default]
    Supersede,
    /// Flags are overwritten and both navigations fire under one cover.
    Coalesce,
    /// Clicks are dropped until the current transition ends.
    Ignore,
}

impl OverlapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlapPolicy::Supersede => "supersede",
            OverlapPolicy::Coalesce => "coalesce",
            OverlapPolicy::Ignore => "ignore",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Delay between the click and the route change; the cover must be mostly up by then.
    #[serde(default = "default_cover_delay_ms")]
    pub cover_delay_ms: u64,
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            cover_delay_ms: default_cover_delay_ms(),
            overlap: OverlapPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_cover_animation_ms")]
    pub cover_animation_ms: u64,
    /// The lower panel trails the upper one by this much.
    #[serde(default = "default_panel_stagger_ms")]
    pub panel_stagger_ms: u64,
    #[serde(default = "default_minimum_hold_ms")]
    pub minimum_hold_ms: u64,
    /// Measured from transition start; only applies while a scroll target is pending.
    /// A page that mounts late extends the hold until the restorer finishes.
    #[serde(default = "default_scroll_hold_ms")]
    pub scroll_hold_ms: u64,
    #[serde(default = "default_reveal_animation_ms")]
    pub reveal_animation_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            cover_animation_ms: default_cover_animation_ms(),
            panel_stagger_ms: default_panel_stagger_ms(),
            minimum_hold_ms: default_minimum_hold_ms(),
            scroll_hold_ms: default_scroll_hold_ms(),
            reveal_animation_ms: default_reveal_animation_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Added to the computed element offset on the native scroll path.
    #[serde(default)]
    pub y_offset: f64,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            max_attempts: default_max_attempts(),
            y_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// File used by the file-backed handoff; defaults to `~/.segue/pending-scroll.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Payloads older than this belong to an earlier session and are discarded.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_age_secs: default_max_age_secs(),
        }
    }
}

impl HandoffConfig {
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => {
                let home = dirs::home_dir().ok_or(SegueError::HomeDirNotFound)?;
                Ok(home.join(DEFAULT_HANDOFF_RELATIVE_PATH))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SegueConfig {
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
    #[serde(default)]
    pub handoff: HandoffConfig,
}

impl SegueConfig {
    pub fn cover_delay(&self) -> Duration {
        Duration::from_millis(self.navigation.cover_delay_ms)
    }

    pub fn minimum_hold(&self) -> Duration {
        Duration::from_millis(self.overlay.minimum_hold_ms)
    }

    pub fn scroll_hold(&self) -> Duration {
        Duration::from_millis(self.overlay.scroll_hold_ms)
    }

    pub fn reveal_animation(&self) -> Duration {
        Duration::from_millis(self.overlay.reveal_animation_ms)
    }

    pub fn restore_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.restore.max_attempts,
            Duration::from_millis(self.restore.retry_interval_ms),
        )
    }

    /// Latest point, measured from the click, at which the restorer can still be
    /// scrolling when the page mounts instantly. Load latency adds to this.
    pub fn restore_worst_case(&self) -> Duration {
        self.cover_delay()
            + Duration::from_millis(self.restore.initial_delay_ms)
            + self.restore_policy().worst_case_span()
    }

    /// Checks the timing contracts between trigger, overlay and restorer.
    pub fn validate(&self) -> Result<()> {
        if self.navigation.cover_delay_ms >= self.overlay.minimum_hold_ms {
            return Err(SegueError::InvalidConfig(format!(
                "cover_delay_ms ({}) must be less than minimum_hold_ms ({})",
                self.navigation.cover_delay_ms, self.overlay.minimum_hold_ms
            )));
        }
        let cover_settled = self.overlay.cover_animation_ms + self.overlay.panel_stagger_ms;
        if cover_settled > self.overlay.minimum_hold_ms {
            return Err(SegueError::InvalidConfig(format!(
                "cover_animation_ms + panel_stagger_ms ({}) must not exceed minimum_hold_ms ({})",
                cover_settled, self.overlay.minimum_hold_ms
            )));
        }
        if self.restore.max_attempts == 0 {
            return Err(SegueError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let worst_case = self.restore_worst_case();
        if self.scroll_hold() <= worst_case {
            return Err(SegueError::InvalidConfig(format!(
                "scroll_hold_ms ({}) must exceed the restorer worst case ({} ms)",
                self.overlay.scroll_hold_ms,
                worst_case.as_millis()
            )));
        }
        if self.handoff.max_age_secs <= 0 {
            return Err(SegueError::InvalidConfig(
                "max_age_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_cover_delay_ms() -> u64 {
    400
}

fn default_cover_animation_ms() -> u64 {
    600
}

fn default_panel_stagger_ms() -> u64 {
    75
}

fn default_minimum_hold_ms() -> u64 {
    700
}

fn default_scroll_hold_ms() -> u64 {
    1200
}

fn default_reveal_animation_ms() -> u64 {
    700
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_retry_interval_ms() -> u64 {
    50
}

fn default_max_attempts() -> u32 {
    5
}

fn default_max_age_secs() -> i64 {
    30 * 60
}

fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(SegueError::HomeDirNotFound)?;
    Ok(home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Loads and validates the config; a missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<SegueConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config file; using defaults");
        return Ok(SegueConfig::default());
    }

    let content =
        fs_err::read_to_string(&config_path).map_err(|source| SegueError::ConfigRead {
            path: config_path.clone(),
            source,
        })?;
    let config =
        toml::from_str::<SegueConfig>(&content).map_err(|err| SegueError::ConfigMalformed {
            path: config_path.clone(),
            details: err.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_timing_contracts() {
        let config = SegueConfig::default();
        config.validate().expect("defaults valid");
        assert!(config.cover_delay() < config.minimum_hold());
        assert!(config.restore_worst_case() < config.scroll_hold());
        assert_eq!(config.navigation.overlap, OverlapPolicy::Supersede);
    }

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.navigation.cover_delay_ms, 400);
        assert_eq!(config.restore.max_attempts, 5);
    }

    #[test]
    fn load_config_parses_partial_sections() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("segue.toml");
        fs_err::write(
            &path,
            r#"
[navigation]
cover_delay_ms = 300
overlap = "coalesce"

[overlay]
minimum_hold_ms = 800
scroll_hold_ms = 1800

[restore]
retry_interval_ms = 100
max_attempts = 8
y_offset = -64.0

[handoff]
path = "/tmp/segue-handoff.json"
"#,
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.navigation.cover_delay_ms, 300);
        assert_eq!(config.navigation.overlap, OverlapPolicy::Coalesce);
        assert_eq!(config.overlay.minimum_hold_ms, 800);
        assert_eq!(config.overlay.cover_animation_ms, 600);
        assert_eq!(config.restore.max_attempts, 8);
        assert!((config.restore.y_offset + 64.0).abs() < f64::EPSILON);
        assert_eq!(
            config.handoff.resolved_path().expect("path"),
            PathBuf::from("/tmp/segue-handoff.json")
        );
    }

    #[test]
    fn load_config_reports_malformed_toml() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("segue.toml");
        fs_err::write(&path, "[navigation\ncover_delay_ms = ").expect("write config");

        let err = load_config(Some(&path)).expect_err("malformed");
        assert!(matches!(err, SegueError::ConfigMalformed { .. }));
    }

    #[test]
    fn validate_rejects_cover_delay_after_hold() {
        let mut config = SegueConfig::default();
        config.navigation.cover_delay_ms = 700;
        assert!(matches!(
            config.validate(),
            Err(SegueError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_scroll_hold_inside_restore_window() {
        let mut config = SegueConfig::default();
        config.restore.max_attempts = 10;
        config.restore.retry_interval_ms = 100;
        let err = config.validate().expect_err("scroll hold too short");
        assert!(err.to_string().contains("scroll_hold_ms"));
    }

    #[test]
    fn validate_rejects_cover_outlasting_hold() {
        let mut config = SegueConfig::default();
        config.overlay.cover_animation_ms = 700;
        let err = config.validate().expect_err("cover too slow");
        assert!(err.to_string().contains("panel_stagger_ms"));
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = SegueConfig::default();
        config.restore.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
