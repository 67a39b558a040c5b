//! # segue-core
//!
//! Cross-page transition orchestration: a cover/reveal overlay that masks page
//! loads, a link trigger that defers the route change until the cover is up,
//! and a scroll restorer that lands the new page on the requested section.
//!
//! ## Design Principles
//!
//! - **Single-threaded**: One clock, one scheduler, no locks. Hosts drive time.
//! - **No globals**: Transition state is an injectable store; every orchestrator owns its own.
//! - **Cosmetic failures stay quiet**: A section that never renders or a click
//!   that overwrites a pending target is logged, never surfaced.
//! - **Host-agnostic**: Router, DOM, smooth scroll and session storage are traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use segue_core::{ClickGesture, HeadlessHost, Orchestrator, SegueConfig, SiteMap};
//! use std::time::Duration;
//!
//! let host = HeadlessHost::new(SiteMap::portfolio());
//! let mut orchestrator = Orchestrator::new(SegueConfig::default(), host, "/");
//! orchestrator.activate("/about#skills", ClickGesture::PLAIN);
//! orchestrator.run_until_settled(Duration::from_secs(5))?;
//! ```

pub mod config;
pub mod error;
pub mod handoff;
pub mod headless;
pub mod host;
pub mod orchestrator;
pub mod overlay;
pub mod path;
pub mod restorer;
pub mod retry;
pub mod scheduler;
pub mod state;
pub mod timeline;
pub mod trigger;

pub use config::{load_config, OverlapPolicy, SegueConfig};
pub use error::{Result, SegueError};
pub use handoff::{FileHandoff, HandoffStore, MemoryHandoff, NavigationPayload};
pub use headless::{HeadlessHost, PageLayout, ScrollRecord, SectionLayout, SiteMap};
pub use host::{Document, ElementBox, Host, NavigationOutcome, Router, ScrollEngine};
pub use orchestrator::Orchestrator;
pub use overlay::{OverlayPhase, PanelOffsets};
pub use path::NavigationIntent;
pub use state::{TransitionState, TransitionStore};
pub use timeline::{TimelineEvent, TimelineKind};
pub use trigger::{Activation, ClickGesture};
