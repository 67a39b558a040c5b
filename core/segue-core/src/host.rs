//! The page environment the orchestrator runs in.
//!
//! A browser build implements these over the real router, DOM and smooth-scroll
//! library; [`crate::headless::HeadlessHost`] implements them over an in-memory
//! site map for tests and the simulator.

use std::time::Duration;

use crate::error::Result;
use crate::handoff::HandoffStore;

/// How a route change completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The new page mounts after `after`; the orchestrator schedules the mount itself.
    MountsAfter(Duration),
    /// The host reports the mount later through `Orchestrator::page_mounted`.
    Deferred,
}

pub trait Router {
    fn navigate(&mut self, path: &str) -> Result<NavigationOutcome>;
}

/// Bounding box of an element relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBox {
    pub top: f64,
    pub height: f64,
}

pub trait Document {
    fn find_element(&self, id: &str) -> Option<ElementBox>;
    fn scroll_offset(&self) -> f64;
    /// Jumps without animation.
    fn scroll_to_offset(&mut self, y: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    Element(String),
    Offset(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOptions {
    /// Skip the easing animation.
    pub immediate: bool,
    /// Scroll even if the engine is currently locked or stopped.
    pub force: bool,
}

impl ScrollOptions {
    pub const INSTANT: ScrollOptions = ScrollOptions {
        immediate: true,
        force: true,
    };
}

/// A smooth-scroll engine that owns the page's scroll position when present.
pub trait ScrollEngine {
    /// Re-measures the scrollable content.
    fn resize(&mut self);
    fn scroll_to(&mut self, target: &ScrollTarget, options: ScrollOptions);
}

/// Everything the orchestrator needs from its environment.
pub trait Host {
    fn router(&mut self) -> &mut dyn Router;
    fn document(&mut self) -> &mut dyn Document;
    fn scroll_engine(&mut self) -> Option<&mut dyn ScrollEngine>;
    fn handoff(&mut self) -> &mut dyn HandoffStore;

    /// Called with the virtual time before every dispatched event.
    fn clock(&mut self, _now: Duration) {}

    /// Called when a new page has mounted.
    fn page_mounted(&mut self, _path: &str, _at: Duration) {}
}
