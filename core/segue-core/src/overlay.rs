//! Two-panel cover/reveal overlay and the decision of when a transition may end.
//!
//! Content readiness cannot be observed directly; the overlay infers it from the
//! route path changing away from the path it last settled on. Three signals are
//! reconciled before the reveal:
//!
//! 1. the minimum hold has elapsed (always required),
//! 2. the route changed, when the transition asked to wait for content,
//! 3. no scroll target is pending, or the scroll hold has elapsed and the
//!    restorer has finished with the target.
//!
//! ```text
//! Idle -> Covering -> MinimumHold -> AwaitingContent -> Revealing -> Idle
//! ```
//!
//! Timers are scheduled under the transition's token; superseding a transition
//! cancels them in one call and [`TransitionOverlay::restart`] reschedules.

use serde::Serialize;
use std::time::Duration;

use crate::config::SegueConfig;
use crate::handoff::HandoffStore;
use crate::path::same_route;
use crate::scheduler::{Scheduler, TransitionToken};
use crate::state::{Subscription, TransitionState, TransitionStore};
use crate::timeline::ProtocolEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPhase {
    Idle,
    Covering,
    MinimumHold,
    AwaitingContent,
    Revealing,
}

impl OverlayPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayPhase::Idle => "idle",
            OverlayPhase::Covering => "covering",
            OverlayPhase::MinimumHold => "minimum_hold",
            OverlayPhase::AwaitingContent => "awaiting_content",
            OverlayPhase::Revealing => "revealing",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OverlayTimings {
    pub cover_animation: Duration,
    pub panel_stagger: Duration,
    pub minimum_hold: Duration,
    pub scroll_hold: Duration,
    pub reveal_animation: Duration,
}

impl OverlayTimings {
    pub fn from_config(config: &SegueConfig) -> Self {
        Self {
            cover_animation: Duration::from_millis(config.overlay.cover_animation_ms),
            panel_stagger: Duration::from_millis(config.overlay.panel_stagger_ms),
            minimum_hold: config.minimum_hold(),
            scroll_hold: config.scroll_hold(),
            reveal_animation: config.reveal_animation(),
        }
    }

    /// Both panels are in place once the trailing panel finishes.
    fn cover_settled(&self) -> Duration {
        self.cover_animation + self.panel_stagger
    }
}

/// Vertical panel positions as viewport fractions: `0.0` covers, `-1.0`/`1.0` are off-screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelOffsets {
    pub top: f64,
    pub bottom: f64,
}

impl PanelOffsets {
    pub const HIDDEN: PanelOffsets = PanelOffsets {
        top: -1.0,
        bottom: 1.0,
    };

    pub fn covers_viewport(&self) -> bool {
        self.top == 0.0 && self.bottom == 0.0
    }
}

/// What the overlay needs from its surroundings while handling one signal.
pub struct OverlayContext<'a> {
    pub now: Duration,
    pub current_path: &'a str,
    pub store: &'a mut TransitionStore,
    pub handoff: &'a dyn HandoffStore,
    pub scheduler: &'a mut Scheduler<ProtocolEvent>,
}

#[derive(Debug)]
pub struct TransitionOverlay {
    timings: OverlayTimings,
    phase: OverlayPhase,
    subscription: Subscription,
    last_settled_path: String,
    minimum_hold_elapsed: bool,
    scroll_hold_elapsed: bool,
    token: Option<TransitionToken>,
    started_at: Duration,
    cover_started_at: Duration,
    uncover_started_at: Option<Duration>,
    changes: Vec<(Duration, OverlayPhase)>,
}

impl TransitionOverlay {
    pub fn new(timings: OverlayTimings, store: &TransitionStore, current_path: &str) -> Self {
        Self {
            timings,
            phase: OverlayPhase::Idle,
            subscription: store.subscribe(),
            last_settled_path: current_path.to_string(),
            minimum_hold_elapsed: false,
            scroll_hold_elapsed: false,
            token: None,
            started_at: Duration::ZERO,
            cover_started_at: Duration::ZERO,
            uncover_started_at: None,
            changes: Vec::new(),
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn token(&self) -> Option<TransitionToken> {
        self.token
    }

    pub fn last_settled_path(&self) -> &str {
        &self.last_settled_path
    }

    pub fn minimum_hold_elapsed(&self) -> bool {
        self.minimum_hold_elapsed
    }

    /// Phase changes since the last drain, oldest first.
    pub fn drain_changes(&mut self) -> Vec<(Duration, OverlayPhase)> {
        std::mem::take(&mut self.changes)
    }

    /// Reacts to transition-state changes made by anyone else.
    pub fn sync(&mut self, token: Option<TransitionToken>, ctx: &mut OverlayContext<'_>) {
        let Some(state) = self.subscription.poll(ctx.store) else {
            return;
        };
        match (self.phase, state) {
            (OverlayPhase::Idle, TransitionState { is_transitioning: true, .. }) => {
                if let Some(token) = token {
                    self.begin(token, ctx);
                }
            }
            (phase, TransitionState { is_transitioning: false, .. }) if phase != OverlayPhase::Idle => {
                tracing::debug!(phase = phase.as_str(), "Transition ended externally");
                self.settle(ctx);
            }
            // Flags rewritten mid-flight; they are read again at decision time.
            _ => {}
        }
    }

    /// Takes over an in-flight cover under a new token. The caller has already
    /// cancelled the previous token's timers.
    pub fn restart(&mut self, token: TransitionToken, ctx: &mut OverlayContext<'_>) {
        self.subscription.poll(ctx.store);
        if self.phase == OverlayPhase::Idle {
            self.begin(token, ctx);
            return;
        }

        self.token = Some(token);
        self.started_at = ctx.now;
        self.minimum_hold_elapsed = false;
        self.scroll_hold_elapsed = false;
        self.last_settled_path = ctx.current_path.to_string();

        let cover_settled_at = self.cover_started_at + self.timings.cover_settled();
        if ctx.now < cover_settled_at {
            ctx.scheduler
                .schedule_at(token, cover_settled_at, ProtocolEvent::CoverComplete);
            self.enter(OverlayPhase::Covering, ctx.now);
        } else {
            self.enter(OverlayPhase::MinimumHold, ctx.now);
        }
        ctx.scheduler.schedule(
            token,
            self.timings.minimum_hold,
            ProtocolEvent::MinimumHoldElapsed,
        );
    }

    /// Handles one of the overlay's own timers.
    pub fn on_timer(&mut self, event: &ProtocolEvent, ctx: &mut OverlayContext<'_>) {
        match event {
            ProtocolEvent::CoverComplete if self.phase == OverlayPhase::Covering => {
                self.enter(OverlayPhase::MinimumHold, ctx.now);
                if self.minimum_hold_elapsed {
                    self.await_content(ctx);
                }
            }
            ProtocolEvent::MinimumHoldElapsed => {
                self.minimum_hold_elapsed = true;
                if self.phase == OverlayPhase::MinimumHold {
                    self.await_content(ctx);
                }
            }
            ProtocolEvent::ScrollHoldElapsed if self.phase == OverlayPhase::Revealing => {
                self.scroll_hold_elapsed = true;
                match ctx.handoff.pending_scroll_target() {
                    Some(target) => {
                        tracing::debug!(target_id = %target, "Scroll hold elapsed; restore still running");
                    }
                    None => self.settle(ctx),
                }
            }
            _ => {}
        }
    }

    /// The restorer is done with the pending target, found or not.
    pub fn on_restore_finished(&mut self, ctx: &mut OverlayContext<'_>) {
        if self.phase == OverlayPhase::Revealing && self.scroll_hold_elapsed {
            self.settle(ctx);
        }
    }

    /// Re-evaluates content readiness after the route changed.
    pub fn on_route_changed(&mut self, ctx: &mut OverlayContext<'_>) {
        if self.phase == OverlayPhase::AwaitingContent {
            self.check_content(ctx);
        }
    }

    /// Panel positions at `now`, for renderers.
    pub fn panels(&self, now: Duration) -> PanelOffsets {
        let progress = |since: Duration, delay: Duration, span: Duration| -> f64 {
            let elapsed = now.saturating_sub(since).saturating_sub(delay);
            if span.is_zero() {
                return 1.0;
            }
            (elapsed.as_secs_f64() / span.as_secs_f64()).min(1.0)
        };

        match self.phase {
            OverlayPhase::Covering => {
                let top = progress(self.cover_started_at, Duration::ZERO, self.timings.cover_animation);
                let bottom = progress(
                    self.cover_started_at,
                    self.timings.panel_stagger,
                    self.timings.cover_animation,
                );
                PanelOffsets {
                    top: top - 1.0,
                    bottom: 1.0 - bottom,
                }
            }
            OverlayPhase::Idle => match self.uncover_started_at {
                Some(since) => {
                    let top = progress(since, Duration::ZERO, self.timings.reveal_animation);
                    let bottom =
                        progress(since, self.timings.panel_stagger, self.timings.reveal_animation);
                    PanelOffsets {
                        top: -top,
                        bottom,
                    }
                }
                None => PanelOffsets::HIDDEN,
            },
            _ => PanelOffsets {
                top: 0.0,
                bottom: 0.0,
            },
        }
    }

    fn begin(&mut self, token: TransitionToken, ctx: &mut OverlayContext<'_>) {
        self.token = Some(token);
        self.started_at = ctx.now;
        self.cover_started_at = ctx.now;
        self.uncover_started_at = None;
        self.minimum_hold_elapsed = false;
        self.scroll_hold_elapsed = false;
        self.enter(OverlayPhase::Covering, ctx.now);

        ctx.scheduler.schedule(
            token,
            self.timings.cover_settled(),
            ProtocolEvent::CoverComplete,
        );
        ctx.scheduler.schedule(
            token,
            self.timings.minimum_hold,
            ProtocolEvent::MinimumHoldElapsed,
        );
    }

    fn await_content(&mut self, ctx: &mut OverlayContext<'_>) {
        self.enter(OverlayPhase::AwaitingContent, ctx.now);
        self.check_content(ctx);
    }

    fn check_content(&mut self, ctx: &mut OverlayContext<'_>) {
        if ctx.store.should_wait_for_content()
            && same_route(ctx.current_path, &self.last_settled_path)
        {
            tracing::debug!(
                path = ctx.current_path,
                "Waiting for route change before reveal"
            );
            return;
        }
        self.reveal(ctx);
    }

    fn reveal(&mut self, ctx: &mut OverlayContext<'_>) {
        self.enter(OverlayPhase::Revealing, ctx.now);

        if let Some(target) = ctx.handoff.pending_scroll_target() {
            let release_at = self.started_at + self.timings.scroll_hold;
            if ctx.now < release_at {
                tracing::debug!(
                    target_id = %target,
                    hold_ms = (release_at - ctx.now).as_millis() as u64,
                    "Holding cover for pending scroll"
                );
                if let Some(token) = self.token {
                    ctx.scheduler
                        .schedule_at(token, release_at, ProtocolEvent::ScrollHoldElapsed);
                    return;
                }
            }
            // Past the hold already: the cover stays until the restorer reports back.
            self.scroll_hold_elapsed = true;
            tracing::debug!(target_id = %target, "Holding cover until scroll restore finishes");
            return;
        }
        self.settle(ctx);
    }

    /// Ends the transition and returns to Idle.
    fn settle(&mut self, ctx: &mut OverlayContext<'_>) {
        if let Some(token) = self.token.take() {
            ctx.scheduler.cancel_token(token);
        }
        ctx.store.end_transition();
        self.subscription.poll(ctx.store);

        self.last_settled_path = ctx.current_path.to_string();
        self.minimum_hold_elapsed = false;
        self.scroll_hold_elapsed = false;
        self.uncover_started_at = Some(ctx.now);
        self.enter(OverlayPhase::Idle, ctx.now);
        tracing::info!(path = ctx.current_path, "Transition ended");
    }

    fn enter(&mut self, phase: OverlayPhase, now: Duration) {
        if self.phase != phase {
            tracing::debug!(from = self.phase.as_str(), to = phase.as_str(), "Overlay phase");
            self.phase = phase;
            self.changes.push((now, phase));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::{MemoryHandoff, NavigationPayload};

    struct Rig {
        store: TransitionStore,
        handoff: MemoryHandoff,
        scheduler: Scheduler<ProtocolEvent>,
        overlay: TransitionOverlay,
        path: String,
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    impl Rig {
        fn new(path: &str) -> Self {
            let store = TransitionStore::new();
            let overlay = TransitionOverlay::new(
                OverlayTimings::from_config(&SegueConfig::default()),
                &store,
                path,
            );
            Self {
                store,
                handoff: MemoryHandoff::new(),
                scheduler: Scheduler::new(),
                overlay,
                path: path.to_string(),
            }
        }

        fn start(&mut self, wait: bool) -> TransitionToken {
            let token = self.scheduler.mint_token();
            self.store.start_transition(wait);
            let mut ctx = OverlayContext {
                now: self.scheduler.now(),
                current_path: &self.path,
                store: &mut self.store,
                handoff: &self.handoff,
                scheduler: &mut self.scheduler,
            };
            self.overlay.sync(Some(token), &mut ctx);
            token
        }

        fn advance(&mut self, until: u64) {
            while let Some(fired) = self.scheduler.pop_due(ms(until)) {
                let mut ctx = OverlayContext {
                    now: fired.at,
                    current_path: &self.path,
                    store: &mut self.store,
                    handoff: &self.handoff,
                    scheduler: &mut self.scheduler,
                };
                self.overlay.on_timer(&fired.event, &mut ctx);
            }
            self.scheduler.advance_clock(ms(until));
        }

        fn route(&mut self, path: &str) {
            self.path = path.to_string();
            let mut ctx = OverlayContext {
                now: self.scheduler.now(),
                current_path: &self.path,
                store: &mut self.store,
                handoff: &self.handoff,
                scheduler: &mut self.scheduler,
            };
            self.overlay.on_route_changed(&mut ctx);
        }

        fn restore_finished(&mut self) {
            let mut ctx = OverlayContext {
                now: self.scheduler.now(),
                current_path: &self.path,
                store: &mut self.store,
                handoff: &self.handoff,
                scheduler: &mut self.scheduler,
            };
            self.overlay.on_restore_finished(&mut ctx);
        }
    }

    #[test]
    fn covers_then_reveals_after_minimum_hold_without_wait() {
        let mut rig = Rig::new("/");
        rig.start(false);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Covering);

        rig.advance(699);
        assert!(rig.store.is_transitioning());

        rig.advance(700);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
        assert_eq!(rig.store.snapshot(), TransitionState::IDLE);
    }

    #[test]
    fn waits_for_route_change_when_requested() {
        let mut rig = Rig::new("/about");
        rig.start(true);
        rig.advance(5_000);
        assert_eq!(rig.overlay.phase(), OverlayPhase::AwaitingContent);
        assert!(rig.store.is_transitioning());

        rig.route("/");
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
        assert_eq!(rig.overlay.last_settled_path(), "/");
    }

    #[test]
    fn early_route_change_still_honors_minimum_hold() {
        let mut rig = Rig::new("/about");
        rig.start(true);
        rig.advance(680);
        rig.route("/");
        assert_eq!(rig.overlay.phase(), OverlayPhase::MinimumHold);

        rig.advance(700);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
    }

    #[test]
    fn trailing_slash_route_is_not_a_change() {
        let mut rig = Rig::new("/about");
        rig.start(true);
        rig.advance(800);
        rig.route("/about/");
        assert_eq!(rig.overlay.phase(), OverlayPhase::AwaitingContent);
    }

    #[test]
    fn pending_scroll_extends_the_cover() {
        let mut rig = Rig::new("/");
        rig.handoff
            .save(&NavigationPayload::scroll_to("contact"))
            .unwrap();
        rig.start(false);

        rig.advance(700);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Revealing);
        assert!(rig.overlay.panels(ms(900)).covers_viewport());

        rig.advance(1_199);
        assert!(rig.store.is_transitioning());
        rig.handoff.clear().unwrap();
        rig.advance(1_200);
        assert!(!rig.store.is_transitioning());
    }

    #[test]
    fn cover_outlasts_scroll_hold_until_restore_finishes() {
        let mut rig = Rig::new("/");
        rig.handoff
            .save(&NavigationPayload::scroll_to("skills"))
            .unwrap();
        rig.start(true);

        rig.advance(5_000);
        assert_eq!(rig.overlay.phase(), OverlayPhase::AwaitingContent);

        rig.route("/about");
        assert_eq!(rig.overlay.phase(), OverlayPhase::Revealing);
        assert!(rig.store.is_transitioning());

        rig.handoff.clear().unwrap();
        rig.restore_finished();
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
        assert!(!rig.store.is_transitioning());
    }

    #[test]
    fn scroll_hold_waits_while_target_is_pending() {
        let mut rig = Rig::new("/");
        rig.handoff
            .save(&NavigationPayload::scroll_to("contact"))
            .unwrap();
        rig.start(false);

        rig.advance(1_500);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Revealing);
        assert!(rig.overlay.panels(ms(1_500)).covers_viewport());

        rig.restore_finished();
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
    }

    #[test]
    fn restore_finishing_early_does_not_cut_the_hold_short() {
        let mut rig = Rig::new("/");
        rig.handoff
            .save(&NavigationPayload::scroll_to("contact"))
            .unwrap();
        rig.start(false);
        rig.advance(900);

        rig.handoff.clear().unwrap();
        rig.restore_finished();
        assert_eq!(rig.overlay.phase(), OverlayPhase::Revealing);

        rig.advance(1_200);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
    }

    #[test]
    fn external_end_returns_to_idle() {
        let mut rig = Rig::new("/");
        let token = rig.start(false);
        rig.store.end_transition();
        let mut ctx = OverlayContext {
            now: ms(100),
            current_path: "/",
            store: &mut rig.store,
            handoff: &rig.handoff,
            scheduler: &mut rig.scheduler,
        };
        rig.overlay.sync(Some(token), &mut ctx);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
        assert_eq!(rig.scheduler.pending_for(token), 0);
    }

    #[test]
    fn phase_changes_are_recorded_in_order() {
        let mut rig = Rig::new("/");
        rig.start(false);
        rig.advance(1_000);
        let phases: Vec<_> = rig
            .overlay
            .drain_changes()
            .into_iter()
            .map(|(_, phase)| phase)
            .collect();
        assert_eq!(
            phases,
            vec![
                OverlayPhase::Covering,
                OverlayPhase::MinimumHold,
                OverlayPhase::AwaitingContent,
                OverlayPhase::Revealing,
                OverlayPhase::Idle,
            ]
        );
        assert!(rig.overlay.drain_changes().is_empty());
    }

    #[test]
    fn panels_slide_in_and_out() {
        let mut rig = Rig::new("/");
        assert_eq!(rig.overlay.panels(ms(0)), PanelOffsets::HIDDEN);
        rig.start(false);

        let halfway = rig.overlay.panels(ms(300));
        assert!((halfway.top + 0.5).abs() < 1e-9);
        assert!(halfway.bottom > 0.5);

        rig.advance(700);
        assert_eq!(rig.overlay.phase(), OverlayPhase::Idle);
        assert_eq!(rig.overlay.panels(ms(2_000)), PanelOffsets::HIDDEN);
    }
}
