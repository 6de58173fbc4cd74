//! Core library for the live markdown preview.
//!
//! Every content update fully replaces the document shown by the rendering
//! surface, which throws away the scroll position, the zoom level and every
//! click handler bound to the old document. This crate sequences a render
//! cycle so that all three survive the swap.
//!
//! # Modules
//!
//! - [`zoom`] - DPI to discrete zoom percentage
//! - [`template`] - Static HTML shell composed once per source file
//! - [`position`] - Scroll offset <-> percentage tracking
//! - [`links`] - Local-file link interception
//! - [`orchestrator`] - The render cycle state machine
//! - [`render`] - Markdown to HTML conversion
//! - [`surface`] - The rendering surface abstraction
//! - [`headless`] - In-memory rendering surface
//! - [`watcher`] - Source file watching

pub mod error;
pub mod headless;
pub mod links;
pub mod orchestrator;
pub mod position;
pub mod render;
pub mod session;
pub mod surface;
pub mod template;
pub mod watcher;
pub mod zoom;

// Re-export commonly used types at crate root
pub use error::PreviewError;
pub use headless::{HeadlessAnchor, HeadlessSurface};
pub use links::{BrokenLink, LinkBinding, LinkInterceptor, LinkReport};
pub use orchestrator::{Generation, LoadNotifier, LoadOutcome, Phase, PreviewState, RenderOrchestrator};
pub use position::PositionTracker;
pub use render::{Converter, Extensions, MarkdownConverter, RenderError};
pub use session::{PreviewHost, RenderSession};
pub use surface::{Anchor, ClickHandler, Navigation, RenderSurface, SurfaceError};
pub use template::TemplateShell;
pub use watcher::{Backend, SourceWatcher, WatchError, WatchEvent, WatcherConfig};
pub use zoom::{zoom_percent, BASELINE_DPI};
