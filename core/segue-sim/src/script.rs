//! Navigation scripts: a starting page, timed clicks, and a report of what happened.

use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use segue_core::{
    load_config, Activation, ClickGesture, FileHandoff, HeadlessHost, OverlapPolicy,
    Orchestrator, SegueConfig, SiteMap, TimelineEvent, TransitionState,
};

use crate::error::{Result, SimError};

/// Virtual time a script may take before it is reported as unsettled.
const SETTLE_LIMIT: Duration = Duration::from_secs(30);

/// A click on `destination` at `at` (parsed from `dest[@ms]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub destination: String,
    pub at: Duration,
}

impl FromStr for Click {
    type Err = SimError;

    fn from_str(value: &str) -> Result<Self> {
        let (destination, at) = match value.rsplit_once('@') {
            Some((destination, at)) => {
                let millis = at.parse::<u64>().map_err(|_| SimError::InvalidClick {
                    value: value.to_string(),
                    details: format!("'{at}' is not a millisecond offset"),
                })?;
                (destination, Duration::from_millis(millis))
            }
            None => (value, Duration::ZERO),
        };
        if destination.is_empty() {
            return Err(SimError::InvalidClick {
                value: value.to_string(),
                details: "destination is empty".to_string(),
            });
        }
        Ok(Self {
            destination: destination.to_string(),
            at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    pub from: String,
    pub clicks: Vec<Click>,
    pub site: SiteMap,
    pub config: SegueConfig,
    pub load_latency: Duration,
    pub smooth_scroll: bool,
    /// Route the pending scroll target through the configured handoff file.
    pub handoff_file: bool,
}

impl Script {
    pub fn new(from: &str, clicks: Vec<Click>) -> Self {
        Self {
            from: from.to_string(),
            clicks,
            site: SiteMap::portfolio(),
            config: SegueConfig::default(),
            load_latency: Duration::from_millis(50),
            smooth_scroll: false,
            handoff_file: false,
        }
    }

    /// One of the four reference scenarios on the portfolio site.
    pub fn scenario(name: ScenarioName) -> Self {
        let click = |destination: &str, at_ms: u64| Click {
            destination: destination.to_string(),
            at: Duration::from_millis(at_ms),
        };
        match name {
            ScenarioName::A => Self::new("/", vec![click("/#contact", 0)]),
            ScenarioName::B => {
                let mut script = Self::new("/about", vec![click("/", 0)]);
                script.load_latency = Duration::from_millis(2_000);
                script
            }
            ScenarioName::C => Self::new("/", vec![click("/work#testimonials", 0)]),
            ScenarioName::D => {
                let mut script =
                    Self::new("/", vec![click("/about", 0), click("/#contact", 30)]);
                script.config.navigation.overlap = OverlapPolicy::Coalesce;
                script
            }
        }
    }

    pub fn run(&self) -> Result<Report> {
        let mut host = HeadlessHost::new(self.site.clone()).with_load_latency(self.load_latency);
        if self.smooth_scroll {
            host = host.with_smooth_scroll();
        }
        if self.handoff_file {
            let path = self.config.handoff.resolved_path()?;
            tracing::debug!(path = %path.display(), "Using file handoff");
            host = host.with_handoff(Box::new(FileHandoff::new(
                &path,
                self.config.handoff.max_age_secs,
            )));
        }

        let mut clicks = self.clicks.clone();
        clicks.sort_by_key(|click| click.at);

        let mut orchestrator = Orchestrator::new(self.config.clone(), host, &self.from);
        let mut activations = Vec::with_capacity(clicks.len());
        for click in &clicks {
            orchestrator.advance_to(click.at)?;
            let activation = orchestrator.activate(&click.destination, ClickGesture::PLAIN);
            activations.push(ActivationSummary::new(click, &activation));
        }
        let settled = orchestrator.run_until_settled(SETTLE_LIMIT)?;
        if !settled {
            tracing::warn!(
                limit_ms = SETTLE_LIMIT.as_millis() as u64,
                "Script did not settle"
            );
        }

        let host = orchestrator.host();
        Ok(Report {
            settled,
            final_path: orchestrator.current_path().to_string(),
            final_state: orchestrator.state(),
            scroll_y: host.scroll_y(),
            navigations: host.navigations().to_vec(),
            pending_scroll_target: host.pending_scroll_target(),
            activations,
            timeline: orchestrator.timeline().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioName {
    /// Same-page section link: "/" -> "/#contact".
    A,
    /// Cross-page link on a slow load: "/about" -> "/".
    B,
    /// Section that never renders: "/" -> "/work#testimonials".
    C,
    /// Double click, coalesced: "/about" then "/#contact" 30ms later.
    D,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivationSummary {
    pub destination: String,
    pub at_ms: u64,
    pub outcome: &'static str,
}

impl ActivationSummary {
    fn new(click: &Click, activation: &Activation) -> Self {
        Self {
            destination: click.destination.clone(),
            at_ms: click.at.as_millis() as u64,
            outcome: match activation {
                Activation::Scheduled(_) => "scheduled",
                Activation::PassThrough => "pass_through",
                Activation::Ignored => "ignored",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub settled: bool,
    pub final_path: String,
    pub final_state: TransitionState,
    pub scroll_y: f64,
    pub navigations: Vec<String>,
    pub pending_scroll_target: Option<String>,
    pub activations: Vec<ActivationSummary>,
    pub timeline: Vec<TimelineEvent>,
}

impl Report {
    pub fn render_text(&self) -> String {
        let mut lines: Vec<String> = self.timeline.iter().map(ToString::to_string).collect();
        lines.push(String::new());
        lines.push(format!(
            "settled: {}  path: {}  scroll_y: {}",
            self.settled, self.final_path, self.scroll_y
        ));
        lines.push(format!("navigations: {}", self.navigations.join(", ")));
        if let Some(target) = &self.pending_scroll_target {
            lines.push(format!("pending scroll target: #{target}"));
        }
        lines.join("\n")
    }
}

/// Loads a config file, or the default location when `path` is `None`.
pub fn config_from(path: Option<&PathBuf>) -> Result<SegueConfig> {
    Ok(load_config(path.map(PathBuf::as_path))?)
}
