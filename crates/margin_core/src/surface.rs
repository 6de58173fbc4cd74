//! The rendering surface abstraction.
//!
//! A [`RenderSurface`] is whatever displays the composed HTML document: an
//! embedded web view in a GUI host, or [`HeadlessSurface`](crate::HeadlessSurface)
//! for the command line and tests. The engine never touches the surface's
//! internals, only the capabilities listed here.

use crate::orchestrator::{Generation, LoadNotifier};
use crate::zoom::BASELINE_DPI;

/// Error type for rendering surface operations.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// The platform offers no way to change the zoom level.
    #[error("zoom is not supported by this surface")]
    ZoomUnavailable,

    /// I/O error while persisting the document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the surface should do after a click handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Follow the link as usual.
    Allow,
    /// Stay on the current document.
    Prevent,
}

/// Click handler bound to an anchor.
pub type ClickHandler = Box<dyn FnMut() -> Navigation>;

/// An anchor element of the displayed document.
pub trait Anchor {
    /// The raw `href` attribute.
    fn href(&self) -> &str;

    /// URL scheme of the resolved href, without the trailing colon (e.g. `file`).
    fn scheme(&self) -> &str;

    /// Path component of the resolved href, possibly percent-encoded.
    fn path(&self) -> &str;

    /// Set the advisory tooltip.
    fn set_title(&mut self, title: &str);

    /// Attach a click handler.
    fn on_click(&mut self, handler: ClickHandler);
}

/// Capabilities the engine needs from the rendering surface.
pub trait RenderSurface {
    type Anchor: Anchor;

    /// Replace the displayed document with `html`.
    ///
    /// Once loaded, the surface must report `generation` through the notifier
    /// registered with [`on_load_complete`](Self::on_load_complete). A newer
    /// navigation supersedes any load still in flight.
    fn navigate(&mut self, html: &str, generation: Generation) -> Result<(), SurfaceError>;

    /// Register where load-complete events are delivered.
    fn on_load_complete(&mut self, notifier: LoadNotifier);

    /// Current vertical scroll offset of the displayed document.
    fn scroll_offset(&self) -> f64;

    fn set_scroll_offset(&mut self, offset: f64);

    /// Height of the displayed document's content.
    fn content_height(&self) -> f64;

    /// Apply a zoom level, in percent.
    fn set_zoom_percent(&mut self, percent: u32) -> Result<(), SurfaceError>;

    /// Anchors of the displayed document.
    fn anchors(&mut self) -> Vec<&mut Self::Anchor>;

    /// Horizontal DPI of the display hosting the surface.
    fn display_dpi(&self) -> f64 {
        BASELINE_DPI
    }

    /// Release the resources held by the surface.
    fn release(&mut self) {}
}
