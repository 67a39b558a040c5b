//! Scheduled protocol events and the recorded timeline of a run.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::overlay::OverlayPhase;
use crate::scheduler::TransitionToken;

/// Payload of every timer the orchestrator schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// Deferred route change after the cover delay.
    Navigate { path: String },
    /// The host finished loading the page for `path`.
    PageLoaded { path: String },
    CoverComplete,
    MinimumHoldElapsed,
    ScrollHoldElapsed,
    RestoreAttempt,
}

/// A milestone worth showing to whoever is debugging a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineKind {
    TransitionStarted {
        token: TransitionToken,
        destination: String,
        requires_content_wait: bool,
    },
    TransitionSuperseded {
        previous: TransitionToken,
        by: TransitionToken,
        cancelled_timers: usize,
    },
    TransitionIgnored {
        destination: String,
    },
    PassedThrough {
        destination: String,
    },
    NavigationFired {
        path: String,
    },
    PageMounted {
        path: String,
    },
    PhaseChanged {
        phase: OverlayPhase,
    },
    TransitionEnded,
    ScrollRestored {
        target: String,
        attempts: u32,
    },
    ScrollAbandoned {
        target: String,
        attempts: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: TimelineKind,
}

impl TimelineEvent {
    pub fn new(at: Duration, kind: TimelineKind) -> Self {
        Self {
            at_ms: u64::try_from(at.as_millis()).unwrap_or(u64::MAX),
            kind,
        }
    }
}

impl fmt::Display for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6} ms  ", self.at_ms)?;
        match &self.kind {
            TimelineKind::TransitionStarted {
                token,
                destination,
                requires_content_wait,
            } => write!(
                f,
                "transition {token} started -> {destination} (wait_for_content={requires_content_wait})"
            ),
            TimelineKind::TransitionSuperseded {
                previous,
                by,
                cancelled_timers,
            } => write!(
                f,
                "transition {previous} superseded by {by} ({cancelled_timers} timers cancelled)"
            ),
            TimelineKind::TransitionIgnored { destination } => {
                write!(f, "click on {destination} ignored (transition in flight)")
            }
            TimelineKind::PassedThrough { destination } => {
                write!(f, "click on {destination} passed through")
            }
            TimelineKind::NavigationFired { path } => write!(f, "navigate {path}"),
            TimelineKind::PageMounted { path } => write!(f, "page {path} mounted"),
            TimelineKind::PhaseChanged { phase } => write!(f, "overlay {}", phase.as_str()),
            TimelineKind::TransitionEnded => write!(f, "transition ended"),
            TimelineKind::ScrollRestored { target, attempts } => {
                write!(f, "scrolled to #{target} (attempt {attempts})")
            }
            TimelineKind::ScrollAbandoned { target, attempts } => {
                write!(f, "gave up on #{target} after {attempts} attempts")
            }
        }
    }
}
