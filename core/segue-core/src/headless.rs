//! Deterministic in-memory host for tests and the simulator.
//!
//! A [`SiteMap`] lists pages and their sections. Every navigation is an
//! independent page load: the page mounts after the configured load latency and
//! each section becomes findable once its own render delay has passed since
//! mount. Sections marked `renders = false` never appear (a malformed id).
//!
//! ```json
//! {
//!   "pages": [
//!     { "path": "/", "sections": [{ "id": "contact", "top": 3200.0 }] },
//!     { "path": "/work", "sections": [{ "id": "testimonials", "top": 1800.0, "render_delay_ms": 650 }] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SegueError};
use crate::handoff::{HandoffStore, MemoryHandoff};
use crate::host::{
    Document, ElementBox, Host, NavigationOutcome, Router, ScrollEngine, ScrollOptions,
    ScrollTarget,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: String,
    /// Distance from the top of the document.
    pub top: f64,
    #[serde(default = "default_section_height")]
    pub height: f64,
    #[serde(default)]
    pub render_delay_ms: u64,
    #[serde(default = "default_renders")]
    pub renders: bool,
}

fn default_section_height() -> f64 {
    800.0
}

fn default_renders() -> bool {
    true
}

impl SectionLayout {
    pub fn new(id: &str, top: f64) -> Self {
        Self {
            id: id.to_string(),
            top,
            height: default_section_height(),
            render_delay_ms: 0,
            renders: true,
        }
    }

    pub fn rendering_after(mut self, delay_ms: u64) -> Self {
        self.render_delay_ms = delay_ms;
        self
    }

    pub fn never_rendered(mut self) -> Self {
        self.renders = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub path: String,
    #[serde(default)]
    pub sections: Vec<SectionLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SiteMap {
    pub pages: Vec<PageLayout>,
}

impl SiteMap {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .map_err(|err| SegueError::SiteMap(format!("{}: {}", path.display(), err)))?;
        serde_json::from_str(&content)
            .map_err(|err| SegueError::SiteMap(format!("{}: {}", path.display(), err)))
    }

    /// Looks up a page, ignoring a trailing slash.
    pub fn page(&self, path: &str) -> Option<&PageLayout> {
        self.pages
            .iter()
            .find(|page| crate::path::same_route(&page.path, path))
    }

    /// The portfolio layout the protocol was designed around.
    pub fn portfolio() -> Self {
        Self {
            pages: vec![
                PageLayout {
                    path: "/".to_string(),
                    sections: vec![
                        SectionLayout::new("hero", 0.0),
                        SectionLayout::new("services", 900.0),
                        SectionLayout::new("work", 1900.0).rendering_after(120),
                        SectionLayout::new("testimonials", 2900.0).rendering_after(200),
                        SectionLayout::new("contact", 3800.0),
                    ],
                },
                PageLayout {
                    path: "/about".to_string(),
                    sections: vec![
                        SectionLayout::new("story", 0.0),
                        SectionLayout::new("experiences", 1000.0),
                        SectionLayout::new("skills", 2100.0).rendering_after(80),
                    ],
                },
                PageLayout {
                    path: "/work".to_string(),
                    sections: vec![
                        SectionLayout::new("projects", 0.0),
                        SectionLayout::new("testimonials", 1800.0).never_rendered(),
                    ],
                },
            ],
        }
    }
}

/// A scroll the page performed, in call order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollRecord {
    Native { y: f64 },
    EngineResize,
    EngineElement { id: String, immediate: bool },
    EngineOffset { y: f64, immediate: bool },
}

pub struct HeadlessHost {
    site: SiteMap,
    load_latency: Duration,
    handoff: Box<dyn HandoffStore>,
    smooth_scroll: bool,
    failing_paths: Vec<String>,
    now: Duration,
    page: Option<String>,
    mounted_at: Duration,
    scroll_y: f64,
    navigations: Vec<String>,
    scrolls: Vec<ScrollRecord>,
}

impl HeadlessHost {
    pub fn new(site: SiteMap) -> Self {
        Self {
            site,
            load_latency: Duration::from_millis(50),
            handoff: Box::new(MemoryHandoff::new()),
            smooth_scroll: false,
            failing_paths: Vec::new(),
            now: Duration::ZERO,
            page: None,
            mounted_at: Duration::ZERO,
            scroll_y: 0.0,
            navigations: Vec::new(),
            scrolls: Vec::new(),
        }
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    pub fn with_handoff(mut self, handoff: Box<dyn HandoffStore>) -> Self {
        self.handoff = handoff;
        self
    }

    /// Routes scrolling through a smooth-scroll engine instead of the native scroll.
    pub fn with_smooth_scroll(mut self) -> Self {
        self.smooth_scroll = true;
        self
    }

    /// Makes the router reject navigations to `path`.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.push(path.to_string());
        self
    }

    pub fn site(&self) -> &SiteMap {
        &self.site
    }

    pub fn current_page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn scrolls(&self) -> &[ScrollRecord] {
        &self.scrolls
    }

    pub fn pending_scroll_target(&self) -> Option<String> {
        self.handoff.pending_scroll_target()
    }

    fn rendered_section(&self, id: &str) -> Option<&SectionLayout> {
        let page = self.site.page(self.page.as_deref()?)?;
        page.sections.iter().find(|section| {
            section.id == id
                && section.renders
                && self.now >= self.mounted_at + Duration::from_millis(section.render_delay_ms)
        })
    }
}

impl Router for HeadlessHost {
    fn navigate(&mut self, path: &str) -> Result<NavigationOutcome> {
        if self.failing_paths.iter().any(|failing| failing == path) {
            return Err(SegueError::Navigation {
                path: path.to_string(),
                details: "router rejected the route".to_string(),
            });
        }
        self.navigations.push(path.to_string());
        Ok(NavigationOutcome::MountsAfter(self.load_latency))
    }
}

impl Document for HeadlessHost {
    fn find_element(&self, id: &str) -> Option<ElementBox> {
        self.rendered_section(id).map(|section| ElementBox {
            top: section.top - self.scroll_y,
            height: section.height,
        })
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to_offset(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
        self.scrolls.push(ScrollRecord::Native { y: self.scroll_y });
    }
}

impl ScrollEngine for HeadlessHost {
    fn resize(&mut self) {
        self.scrolls.push(ScrollRecord::EngineResize);
    }

    fn scroll_to(&mut self, target: &ScrollTarget, options: ScrollOptions) {
        match target {
            ScrollTarget::Element(id) => {
                if let Some(top) = self.rendered_section(id).map(|section| section.top) {
                    self.scroll_y = top;
                }
                self.scrolls.push(ScrollRecord::EngineElement {
                    id: id.clone(),
                    immediate: options.immediate,
                });
            }
            ScrollTarget::Offset(y) => {
                self.scroll_y = y.max(0.0);
                self.scrolls.push(ScrollRecord::EngineOffset {
                    y: self.scroll_y,
                    immediate: options.immediate,
                });
            }
        }
    }
}

impl Host for HeadlessHost {
    fn router(&mut self) -> &mut dyn Router {
        self
    }

    fn document(&mut self) -> &mut dyn Document {
        self
    }

    fn scroll_engine(&mut self) -> Option<&mut dyn ScrollEngine> {
        if self.smooth_scroll {
            Some(self as &mut dyn ScrollEngine)
        } else {
            None
        }
    }

    fn handoff(&mut self) -> &mut dyn HandoffStore {
        self.handoff.as_mut()
    }

    fn clock(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn page_mounted(&mut self, path: &str, at: Duration) {
        self.page = Some(path.to_string());
        self.mounted_at = at;
        self.now = self.now.max(at);
        self.scroll_y = 0.0;
    }
}
