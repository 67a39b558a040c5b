//! Wires trigger, overlay and restorer to a host and drives them on one clock.
//!
//! The orchestrator owns every piece of mutable protocol state: the transition
//! store, the scheduler, and the current route. Hosts feed it clicks and page
//! mounts and advance time; it answers with router calls, scrolls and a
//! timeline of what happened.
//!
//! # Overlapping transitions
//!
//! A click while a transition is in flight is resolved by [`OverlapPolicy`]:
//! `supersede` cancels the older transition's timers (its pending navigation
//! included) and restarts the hold under a new token; `coalesce` rewrites the
//! flags and lets both navigations fire; `ignore` drops the click.
//!
//! A navigation the router has already performed is not part of any transition:
//! its page load is scheduled under its own token, so superseding the click that
//! caused it never discards the mount.
//!
//! # Scroll hold
//!
//! While a scroll target is pending the cover stays up for at least the scroll
//! hold, and beyond it until the restorer has finished with the target. A slow
//! page load therefore delays the reveal rather than letting the scroll jump
//! show.

use std::time::Duration;

use crate::config::{OverlapPolicy, SegueConfig};
use crate::error::Result;
use crate::host::{Host, NavigationOutcome};
use crate::overlay::{OverlayContext, OverlayPhase, OverlayTimings, PanelOffsets, TransitionOverlay};
use crate::restorer::{RestoreOutcome, ScrollRestorer};
use crate::scheduler::{FiredTimer, Scheduler, TransitionToken};
use crate::state::{TransitionState, TransitionStore};
use crate::timeline::{ProtocolEvent, TimelineEvent, TimelineKind};
use crate::trigger::{Activation, ClickGesture, NavigationTrigger};

pub struct Orchestrator<H: Host> {
    config: SegueConfig,
    host: H,
    store: TransitionStore,
    scheduler: Scheduler<ProtocolEvent>,
    trigger: NavigationTrigger,
    overlay: TransitionOverlay,
    restorer: ScrollRestorer,
    current_path: String,
    transition_token: Option<TransitionToken>,
    mount_token: Option<TransitionToken>,
    timeline: Vec<TimelineEvent>,
}

impl<H: Host> Orchestrator<H> {
    /// Boots on `initial_path`; a target left by a previous page load is restored right away.
    pub fn new(config: SegueConfig, host: H, initial_path: &str) -> Self {
        let store = TransitionStore::new();
        let overlay =
            TransitionOverlay::new(OverlayTimings::from_config(&config), &store, initial_path);
        let mut orchestrator = Self {
            trigger: NavigationTrigger::new(config.cover_delay()),
            restorer: ScrollRestorer::from_config(&config),
            config,
            host,
            store,
            scheduler: Scheduler::new(),
            overlay,
            current_path: initial_path.to_string(),
            transition_token: None,
            mount_token: None,
            timeline: Vec::new(),
        };
        orchestrator.page_mounted(initial_path);
        orchestrator
    }

    pub fn config(&self) -> &SegueConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn state(&self) -> TransitionState {
        self.store.snapshot()
    }

    pub fn phase(&self) -> OverlayPhase {
        self.overlay.phase()
    }

    pub fn panels(&self) -> PanelOffsets {
        self.overlay.panels(self.now())
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.timeline
    }

    /// Handles a click on a link to `destination`.
    pub fn activate(&mut self, destination: &str, gesture: ClickGesture) -> Activation {
        if !NavigationTrigger::intercepts(destination, gesture) {
            self.record(TimelineKind::PassedThrough {
                destination: destination.to_string(),
            });
            return Activation::PassThrough;
        }

        let in_flight = self.store.is_transitioning();
        if in_flight && self.config.navigation.overlap == OverlapPolicy::Ignore {
            tracing::info!(destination, "Click ignored; transition in flight");
            self.record(TimelineKind::TransitionIgnored {
                destination: destination.to_string(),
            });
            return Activation::Ignored;
        }

        let token = self.scheduler.mint_token();
        let superseded = match (in_flight, self.config.navigation.overlap) {
            (true, OverlapPolicy::Supersede) => self.transition_token,
            _ => None,
        };
        if let Some(previous) = superseded {
            let cancelled = self.scheduler.cancel_token(previous);
            tracing::info!(%previous, by = %token, cancelled, "Transition superseded");
            self.record(TimelineKind::TransitionSuperseded {
                previous,
                by: token,
                cancelled_timers: cancelled,
            });
        }

        let intent = self.trigger.activate(
            destination,
            &self.current_path,
            token,
            &mut self.store,
            self.host.handoff(),
            &mut self.scheduler,
        );
        self.transition_token = Some(token);
        self.record(TimelineKind::TransitionStarted {
            token,
            destination: destination.to_string(),
            requires_content_wait: intent.requires_content_wait,
        });

        let now = self.scheduler.now();
        let mut ctx = OverlayContext {
            now,
            current_path: &self.current_path,
            store: &mut self.store,
            handoff: self.host.handoff(),
            scheduler: &mut self.scheduler,
        };
        if superseded.is_some() {
            self.overlay.restart(token, &mut ctx);
        } else {
            self.overlay.sync(Some(token), &mut ctx);
        }
        self.collect_phase_changes();

        Activation::Scheduled(intent)
    }

    /// Reports that the page for `path` has mounted (every navigation is a fresh page).
    pub fn page_mounted(&mut self, path: &str) {
        let now = self.scheduler.now();
        self.current_path = path.to_string();
        self.host.page_mounted(path, now);
        self.record(TimelineKind::PageMounted {
            path: path.to_string(),
        });
        tracing::debug!(path, "Page mounted");

        if let Some(previous) = self.mount_token.take() {
            self.scheduler.cancel_token(previous);
        }
        let token = self.scheduler.mint_token();
        if self.restorer.on_mount(token, &mut self.host, &mut self.scheduler) {
            self.mount_token = Some(token);
        }

        let mut ctx = OverlayContext {
            now,
            current_path: &self.current_path,
            store: &mut self.store,
            handoff: self.host.handoff(),
            scheduler: &mut self.scheduler,
        };
        self.overlay.on_route_changed(&mut ctx);
        self.collect_phase_changes();
    }

    /// Fires every timer due at or before `at`, then moves the clock to `at`.
    ///
    /// Router failures are returned as-is; the timers after the failing one stay queued.
    pub fn advance_to(&mut self, at: Duration) -> Result<()> {
        while let Some(fired) = self.scheduler.pop_due(at) {
            self.dispatch(fired)?;
        }
        self.scheduler.advance_clock(at);
        self.host.clock(at);
        Ok(())
    }

    pub fn advance_by(&mut self, delta: Duration) -> Result<()> {
        self.advance_to(self.now() + delta)
    }

    /// Runs until no timers remain, or until `limit` of virtual time has passed.
    ///
    /// Returns true if everything settled within the limit.
    pub fn run_until_settled(&mut self, limit: Duration) -> Result<bool> {
        let deadline = self.now() + limit;
        while let Some(due) = self.scheduler.next_due() {
            if due > deadline {
                self.advance_to(deadline)?;
                return Ok(false);
            }
            self.advance_to(due)?;
        }
        Ok(!self.store.is_transitioning())
    }

    fn dispatch(&mut self, fired: FiredTimer<ProtocolEvent>) -> Result<()> {
        self.host.clock(fired.at);
        match fired.event {
            ProtocolEvent::Navigate { path } => {
                tracing::info!(path = %path, token = %fired.token, "Navigating");
                self.record(TimelineKind::NavigationFired { path: path.clone() });
                match self.host.router().navigate(&path)? {
                    NavigationOutcome::MountsAfter(latency) => {
                        let load = self.scheduler.mint_token();
                        self.scheduler
                            .schedule(load, latency, ProtocolEvent::PageLoaded { path });
                    }
                    NavigationOutcome::Deferred => {}
                }
            }
            ProtocolEvent::PageLoaded { path } => self.page_mounted(&path),
            ProtocolEvent::RestoreAttempt => {
                if let Some(outcome) = self.restorer.attempt(&mut self.host, &mut self.scheduler) {
                    self.mount_token = None;
                    self.record(match outcome {
                        RestoreOutcome::Restored {
                            target, attempts, ..
                        } => TimelineKind::ScrollRestored { target, attempts },
                        RestoreOutcome::Abandoned { target, attempts } => {
                            TimelineKind::ScrollAbandoned { target, attempts }
                        }
                    });
                    let mut ctx = OverlayContext {
                        now: fired.at,
                        current_path: &self.current_path,
                        store: &mut self.store,
                        handoff: self.host.handoff(),
                        scheduler: &mut self.scheduler,
                    };
                    self.overlay.on_restore_finished(&mut ctx);
                }
            }
            event @ (ProtocolEvent::CoverComplete
            | ProtocolEvent::MinimumHoldElapsed
            | ProtocolEvent::ScrollHoldElapsed) => {
                let mut ctx = OverlayContext {
                    now: fired.at,
                    current_path: &self.current_path,
                    store: &mut self.store,
                    handoff: self.host.handoff(),
                    scheduler: &mut self.scheduler,
                };
                self.overlay.on_timer(&event, &mut ctx);
            }
        }
        self.collect_phase_changes();
        Ok(())
    }

    fn collect_phase_changes(&mut self) {
        for (at, phase) in self.overlay.drain_changes() {
            self.timeline.push(TimelineEvent::new(
                at,
                TimelineKind::PhaseChanged { phase },
            ));
            if phase == OverlayPhase::Idle {
                self.transition_token = None;
                self.timeline
                    .push(TimelineEvent::new(at, TimelineKind::TransitionEnded));
            }
        }
    }

    fn record(&mut self, kind: TimelineKind) {
        self.timeline
            .push(TimelineEvent::new(self.scheduler.now(), kind));
    }
}
