//! Resolves the pending scroll target once a new page has mounted.
//!
//! The target section may still be rendering, so lookups go through a bounded
//! retry. Whatever happens, the pending target is cleared once the attempt
//! finishes: a target that never resolved must not be picked up by a later,
//! unrelated page.

use std::time::Duration;

use crate::config::SegueConfig;
use crate::host::{Host, ScrollOptions, ScrollTarget};
use crate::retry::{RetryPolicy, RetryState, RetryStep};
use crate::scheduler::{Scheduler, TransitionToken};
use crate::timeline::ProtocolEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Restored {
        target: String,
        attempts: u32,
        /// Offset used on the native path; `None` when the smooth-scroll engine scrolled.
        offset: Option<f64>,
    },
    Abandoned {
        target: String,
        attempts: u32,
    },
}

#[derive(Debug)]
struct ActiveRestore {
    token: TransitionToken,
    target: String,
    retry: RetryState,
}

#[derive(Debug)]
pub struct ScrollRestorer {
    initial_delay: Duration,
    policy: RetryPolicy,
    y_offset: f64,
    active: Option<ActiveRestore>,
}

impl ScrollRestorer {
    pub fn from_config(config: &SegueConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.restore.initial_delay_ms),
            policy: config.restore_policy(),
            y_offset: config.restore.y_offset,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_target(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.target.as_str())
    }

    /// Starts resolving the pending target for a freshly mounted page.
    ///
    /// Returns false when nothing is pending. A restore still running for the
    /// previous page is dropped; its timers belong to the caller's old token.
    pub fn on_mount(
        &mut self,
        token: TransitionToken,
        host: &mut dyn Host,
        scheduler: &mut Scheduler<ProtocolEvent>,
    ) -> bool {
        if let Some(previous) = self.active.take() {
            tracing::debug!(target_id = %previous.target, "Dropping restore for previous page");
        }

        let Some(target) = host.handoff().pending_scroll_target() else {
            return false;
        };

        // Never inherit the previous page's scroll position.
        reset_to_top(host);

        tracing::debug!(
            target_id = %target,
            delay_ms = self.initial_delay.as_millis() as u64,
            "Scheduling scroll restore"
        );
        scheduler.schedule(token, self.initial_delay, ProtocolEvent::RestoreAttempt);
        self.active = Some(ActiveRestore {
            token,
            target,
            retry: RetryState::new(self.policy),
        });
        true
    }

    /// Runs one lookup. Returns the outcome once the restore is finished.
    pub fn attempt(
        &mut self,
        host: &mut dyn Host,
        scheduler: &mut Scheduler<ProtocolEvent>,
    ) -> Option<RestoreOutcome> {
        let active = self.active.as_mut()?;
        let element = host.document().find_element(&active.target);

        match active.retry.record(element.is_some()) {
            RetryStep::RetryAfter(delay) => {
                tracing::debug!(
                    target_id = %active.target,
                    attempt = active.retry.attempts(),
                    "Scroll target not rendered yet"
                );
                scheduler.schedule(active.token, delay, ProtocolEvent::RestoreAttempt);
                None
            }
            RetryStep::Done => {
                let active = self.active.take()?;
                let offset = if let Some(engine) = host.scroll_engine() {
                    engine.resize();
                    engine.scroll_to(
                        &ScrollTarget::Element(active.target.clone()),
                        ScrollOptions::INSTANT,
                    );
                    None
                } else {
                    element.map(|element| {
                        let document = host.document();
                        let y = element.top + document.scroll_offset() + self.y_offset;
                        document.scroll_to_offset(y);
                        y
                    })
                };
                release(host, &active.target);
                tracing::info!(
                    target_id = %active.target,
                    attempts = active.retry.attempts(),
                    "Scroll restored"
                );
                Some(RestoreOutcome::Restored {
                    target: active.target,
                    attempts: active.retry.attempts(),
                    offset,
                })
            }
            RetryStep::Exhausted => {
                let active = self.active.take()?;
                release(host, &active.target);
                tracing::warn!(
                    target_id = %active.target,
                    attempts = active.retry.attempts(),
                    "Scroll target never rendered; giving up"
                );
                Some(RestoreOutcome::Abandoned {
                    target: active.target,
                    attempts: active.retry.attempts(),
                })
            }
        }
    }
}

fn reset_to_top(host: &mut dyn Host) {
    match host.scroll_engine() {
        Some(engine) => engine.scroll_to(&ScrollTarget::Offset(0.0), ScrollOptions::INSTANT),
        None => host.document().scroll_to_offset(0.0),
    }
}

/// Clears the pending target unless a newer click already replaced it.
fn release(host: &mut dyn Host, target: &str) {
    let handoff = host.handoff();
    match handoff.pending_scroll_target() {
        Some(pending) if pending == target => {
            if let Err(err) = handoff.clear() {
                tracing::warn!(error = %err, "Failed to clear pending scroll target");
            }
        }
        Some(newer) => {
            tracing::debug!(target_id = %newer, "Pending target replaced mid-restore; keeping it");
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::NavigationPayload;
    use crate::headless::{HeadlessHost, ScrollRecord, SiteMap};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn mounted(path: &str, host: HeadlessHost) -> HeadlessHost {
        let mut host = host;
        host.page_mounted(path, Duration::ZERO);
        host
    }

    fn with_target(target: &str, host: HeadlessHost) -> HeadlessHost {
        let mut host = host;
        host.handoff()
            .save(&NavigationPayload::scroll_to(target))
            .unwrap();
        host
    }

    /// Fires restore attempts until the restorer reports an outcome.
    fn drive(
        restorer: &mut ScrollRestorer,
        host: &mut HeadlessHost,
        scheduler: &mut Scheduler<ProtocolEvent>,
    ) -> (Duration, Option<RestoreOutcome>) {
        while let Some(fired) = scheduler.pop_due(Duration::from_secs(10)) {
            host.clock(fired.at);
            if let Some(outcome) = restorer.attempt(host, scheduler) {
                return (fired.at, Some(outcome));
            }
        }
        (scheduler.now(), None)
    }

    #[test]
    fn no_pending_target_is_a_no_op() {
        let mut host = mounted("/", HeadlessHost::new(SiteMap::portfolio()));
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&SegueConfig::default());
        let token = scheduler.mint_token();

        assert!(!restorer.on_mount(token, &mut host, &mut scheduler));
        assert_eq!(scheduler.pending(), 0);
        assert!(host.scrolls().is_empty());
    }

    #[test]
    fn scrolls_natively_after_initial_delay() {
        let host = with_target("contact", HeadlessHost::new(SiteMap::portfolio()));
        let mut host = mounted("/", host);
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&SegueConfig::default());
        let token = scheduler.mint_token();

        assert!(restorer.on_mount(token, &mut host, &mut scheduler));
        assert_eq!(restorer.active_target(), Some("contact"));

        let (at, outcome) = drive(&mut restorer, &mut host, &mut scheduler);
        assert_eq!(at, ms(500));
        assert_eq!(
            outcome,
            Some(RestoreOutcome::Restored {
                target: "contact".to_string(),
                attempts: 1,
                offset: Some(3800.0),
            })
        );
        assert_eq!(host.scroll_y(), 3800.0);
        assert_eq!(host.pending_scroll_target(), None);
        assert!(!restorer.is_active());
    }

    #[test]
    fn smooth_scroll_engine_is_resized_then_jumps() {
        let host = with_target("experiences", HeadlessHost::new(SiteMap::portfolio()).with_smooth_scroll());
        let mut host = mounted("/about", host);
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&SegueConfig::default());
        let token = scheduler.mint_token();

        restorer.on_mount(token, &mut host, &mut scheduler);
        let (_, outcome) = drive(&mut restorer, &mut host, &mut scheduler);

        assert!(matches!(
            outcome,
            Some(RestoreOutcome::Restored { offset: None, .. })
        ));
        assert_eq!(
            host.scrolls(),
            [
                ScrollRecord::EngineOffset {
                    y: 0.0,
                    immediate: true
                },
                ScrollRecord::EngineResize,
                ScrollRecord::EngineElement {
                    id: "experiences".to_string(),
                    immediate: true
                },
            ]
        );
        assert_eq!(host.scroll_y(), 1000.0);
    }

    #[test]
    fn y_offset_shifts_native_scroll() {
        let host = with_target("services", HeadlessHost::new(SiteMap::portfolio()));
        let mut host = mounted("/", host);
        let mut config = SegueConfig::default();
        config.restore.y_offset = -80.0;
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&config);
        let token = scheduler.mint_token();

        restorer.on_mount(token, &mut host, &mut scheduler);
        drive(&mut restorer, &mut host, &mut scheduler);
        assert_eq!(host.scroll_y(), 820.0);
    }

    #[test]
    fn gives_up_and_clears_after_bounded_retries() {
        let host = with_target("testimonials", HeadlessHost::new(SiteMap::portfolio()));
        let mut host = mounted("/work", host);
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&SegueConfig::default());
        let token = scheduler.mint_token();

        restorer.on_mount(token, &mut host, &mut scheduler);
        let (at, outcome) = drive(&mut restorer, &mut host, &mut scheduler);

        assert_eq!(at, ms(500 + 4 * 50));
        assert_eq!(
            outcome,
            Some(RestoreOutcome::Abandoned {
                target: "testimonials".to_string(),
                attempts: 5,
            })
        );
        assert_eq!(host.pending_scroll_target(), None);
        assert_eq!(host.scroll_y(), 0.0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn finds_section_that_renders_late() {
        let host = with_target("skills", HeadlessHost::new(SiteMap::portfolio()));
        let mut host = mounted("/about", host);
        let mut config = SegueConfig::default();
        config.restore.initial_delay_ms = 0;
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&config);
        let token = scheduler.mint_token();

        restorer.on_mount(token, &mut host, &mut scheduler);
        let (at, outcome) = drive(&mut restorer, &mut host, &mut scheduler);

        assert_eq!(at, ms(100));
        assert!(matches!(
            outcome,
            Some(RestoreOutcome::Restored { attempts: 3, .. })
        ));
    }

    #[test]
    fn newer_target_survives_release() {
        let host = with_target("contact", HeadlessHost::new(SiteMap::portfolio()));
        let mut host = mounted("/", host);
        let mut scheduler = Scheduler::new();
        let mut restorer = ScrollRestorer::from_config(&SegueConfig::default());
        let token = scheduler.mint_token();

        restorer.on_mount(token, &mut host, &mut scheduler);
        host.handoff()
            .save(&NavigationPayload::scroll_to("skills"))
            .unwrap();
        drive(&mut restorer, &mut host, &mut scheduler);

        assert_eq!(host.pending_scroll_target().as_deref(), Some("skills"));
    }
}
