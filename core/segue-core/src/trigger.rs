//! Turns a click on an internal link into a coordinated, delayed navigation.

use std::time::Duration;

use crate::handoff::{HandoffStore, NavigationPayload};
use crate::path::{is_external, NavigationIntent};
use crate::scheduler::{Scheduler, TransitionToken};
use crate::state::TransitionStore;
use crate::timeline::ProtocolEvent;

/// Modifier state of the click that triggered the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickGesture {
    /// Ctrl, Meta or Shift held: the user wants a new tab or window.
    pub modifier: bool,
    pub middle_button: bool,
}

impl ClickGesture {
    pub const PLAIN: ClickGesture = ClickGesture {
        modifier: false,
        middle_button: false,
    };

    pub fn opens_elsewhere(&self) -> bool {
        self.modifier || self.middle_button
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The click was intercepted and a navigation is scheduled.
    Scheduled(NavigationIntent),
    /// Left to the browser's default behavior; no state touched.
    PassThrough,
    /// Dropped because another transition is in flight.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct NavigationTrigger {
    cover_delay: Duration,
}

impl NavigationTrigger {
    pub fn new(cover_delay: Duration) -> Self {
        Self { cover_delay }
    }

    pub fn cover_delay(&self) -> Duration {
        self.cover_delay
    }

    /// Whether this click belongs to the orchestrator at all.
    pub fn intercepts(destination: &str, gesture: ClickGesture) -> bool {
        !gesture.opens_elsewhere() && !is_external(destination)
    }

    /// Records the scroll target, starts the transition and schedules the route change.
    ///
    /// A handoff write failure only costs the scroll restoration, so it is logged
    /// and the navigation proceeds.
    pub fn activate(
        &self,
        destination: &str,
        current_path: &str,
        token: TransitionToken,
        state: &mut TransitionStore,
        handoff: &mut dyn HandoffStore,
        scheduler: &mut Scheduler<ProtocolEvent>,
    ) -> NavigationIntent {
        let intent = NavigationIntent::derive(destination, current_path);

        if let Some(fragment) = intent.target_fragment.as_deref() {
            if let Err(err) = handoff.save(&NavigationPayload::scroll_to(fragment)) {
                tracing::warn!(error = %err, target_id = fragment, "Failed to store pending scroll target");
            }
        }

        state.start_transition(intent.requires_content_wait);
        scheduler.schedule(
            token,
            self.cover_delay,
            ProtocolEvent::Navigate {
                path: intent.target_path.clone(),
            },
        );

        tracing::info!(
            %token,
            destination,
            path = %intent.target_path,
            wait_for_content = intent.requires_content_wait,
            "Transition started"
        );
        intent
    }
}
