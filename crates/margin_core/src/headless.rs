//! In-memory rendering surface.
//!
//! [`HeadlessSurface`] stands in for an embedded browser: it keeps the last
//! navigated document, discovers its anchors, models a scrollable content
//! height and optionally mirrors every document to a file that an external
//! browser can display.

use crate::orchestrator::{Generation, LoadNotifier};
use crate::surface::{Anchor, ClickHandler, Navigation, RenderSurface, SurfaceError};
use crate::zoom::BASELINE_DPI;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use url::Url;

/// Height of one document line, in pixels.
pub const DEFAULT_LINE_HEIGHT: f64 = 20.0;

static ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*"([^"]*)""#).expect("Invalid ANCHOR_HREF regex pattern")
});

static BASE_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<base\s[^>]*?href\s*=\s*"([^"]*)""#).expect("Invalid BASE_HREF regex pattern")
});

/// An anchor discovered in a headless document.
pub struct HeadlessAnchor {
    href: String,
    scheme: String,
    path: String,
    title: Option<String>,
    handlers: Vec<ClickHandler>,
}

impl std::fmt::Debug for HeadlessAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessAnchor")
            .field("href", &self.href)
            .field("scheme", &self.scheme)
            .field("path", &self.path)
            .field("title", &self.title)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl HeadlessAnchor {
    fn new(href: &str, base: Option<&str>) -> Self {
        let (scheme, path) = resolve_href(href, base);
        Self {
            href: href.to_string(),
            scheme,
            path,
            title: None,
            handlers: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Whether a click handler is attached.
    pub fn is_bound(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Run the click handlers; any of them may prevent the navigation.
    pub fn click(&mut self) -> Navigation {
        let mut navigation = Navigation::Allow;
        for handler in &mut self.handlers {
            if handler() == Navigation::Prevent {
                navigation = Navigation::Prevent;
            }
        }
        navigation
    }
}

impl Anchor for HeadlessAnchor {
    fn href(&self) -> &str {
        &self.href
    }

    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn on_click(&mut self, handler: ClickHandler) {
        self.handlers.push(handler);
    }
}

/// A rendering surface without a display.
#[derive(Debug)]
pub struct HeadlessSurface {
    document: Option<String>,
    anchors: Vec<HeadlessAnchor>,
    notifier: Option<LoadNotifier>,
    pending: Option<Generation>,
    auto_complete: bool,
    line_height: f64,
    content_height: f64,
    scroll_offset: f64,
    zoom_percent: Option<u32>,
    dpi: f64,
    output: Option<PathBuf>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    /// A surface that completes every load as soon as it navigates.
    pub fn new() -> Self {
        Self {
            document: None,
            anchors: Vec::new(),
            notifier: None,
            pending: None,
            auto_complete: true,
            line_height: DEFAULT_LINE_HEIGHT,
            content_height: 0.0,
            scroll_offset: 0.0,
            zoom_percent: None,
            dpi: BASELINE_DPI,
            output: None,
        }
    }

    /// Hold loads until [`complete_load`](Self::complete_load) is called.
    pub fn manual_loads(mut self) -> Self {
        self.auto_complete = false;
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height.max(0.0);
        self
    }

    /// Report `dpi` as the display DPI.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    /// Write every navigated document to `path`.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Finish the pending load, returning its generation.
    pub fn complete_load(&mut self) -> Option<Generation> {
        let generation = self.pending.take()?;
        if let Some(notifier) = &self.notifier {
            notifier.notify(generation);
        }
        Some(generation)
    }

    /// The displayed document.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn anchor_list(&self) -> &[HeadlessAnchor] {
        &self.anchors
    }

    /// Click the anchor at `index`, `None` if there is no such anchor.
    pub fn click(&mut self, index: usize) -> Option<Navigation> {
        self.anchors.get_mut(index).map(HeadlessAnchor::click)
    }

    /// Zoom last applied, if any.
    pub fn zoom_percent(&self) -> Option<u32> {
        self.zoom_percent
    }
}

impl RenderSurface for HeadlessSurface {
    type Anchor = HeadlessAnchor;

    fn navigate(&mut self, html: &str, generation: Generation) -> Result<(), SurfaceError> {
        if let Some(output) = &self.output {
            std::fs::write(output, html)?;
        }

        let base = BASE_HREF
            .captures(html)
            .map(|caps| unescape_attr(&caps[1]));
        self.anchors = ANCHOR_HREF
            .captures_iter(html)
            .map(|caps| HeadlessAnchor::new(&unescape_attr(&caps[1]), base.as_deref()))
            .collect();

        self.content_height = html.lines().count() as f64 * self.line_height;
        self.scroll_offset = 0.0;
        self.document = Some(html.to_string());

        if self.auto_complete {
            self.pending = None;
            if let Some(notifier) = &self.notifier {
                notifier.notify(generation);
            }
        } else {
            self.pending = Some(generation);
        }

        Ok(())
    }

    fn on_load_complete(&mut self, notifier: LoadNotifier) {
        self.notifier = Some(notifier);
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset.clamp(0.0, self.content_height.max(0.0));
    }

    fn content_height(&self) -> f64 {
        self.content_height
    }

    fn set_zoom_percent(&mut self, percent: u32) -> Result<(), SurfaceError> {
        self.zoom_percent = Some(percent);
        Ok(())
    }

    fn anchors(&mut self) -> Vec<&mut HeadlessAnchor> {
        self.anchors.iter_mut().collect()
    }

    fn display_dpi(&self) -> f64 {
        self.dpi
    }

    fn release(&mut self) {
        self.document = None;
        self.anchors.clear();
        self.notifier = None;
        self.pending = None;
    }
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Resolve `href` against the document base into `(scheme, path)`.
///
/// Fragment-only links stay inside the document and resolve to `about`, as
/// do hrefs that can not be resolved at all. The path stays percent-encoded.
fn resolve_href(href: &str, base: Option<&str>) -> (String, String) {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return ("about".to_string(), "blank".to_string());
    }

    let resolved = match base.and_then(|base| Url::parse(base).ok()) {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };

    match resolved {
        Ok(url) => (url.scheme().to_string(), url.path().to_string()),
        Err(err) => {
            tracing::debug!(%href, %err, "Unresolvable link");
            ("about".to_string(), href.to_string())
        }
    }
}
