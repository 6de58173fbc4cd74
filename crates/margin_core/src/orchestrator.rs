//! The render cycle.
//!
//! ```text
//! Idle -> Capturing -> Converting -> Composing -> Navigating -> AwaitingLoad
//!   ^                                                               |
//!   +------------------------- Applying <------ load-complete ------+
//! ```
//!
//! A new update may start while a load is still pending. Its navigation
//! supersedes the pending one, and every navigation carries a [`Generation`]
//! so that the load-complete event of a superseded navigation is ignored.

use crate::error::PreviewError;
use crate::links::{LinkBinding, LinkInterceptor, LinkReport};
use crate::position::{clamp_height, PositionTracker};
use crate::render::Converter;
use crate::session::{PreviewHost, RenderSession};
use crate::surface::{RenderSurface, SurfaceError};
use crate::zoom::{zoom_percent, NO_ZOOM};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Tag of one navigation, increasing with every document replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle given to the surface to report finished loads.
#[derive(Debug, Clone)]
pub struct LoadNotifier {
    tx: mpsc::UnboundedSender<Generation>,
}

impl LoadNotifier {
    /// Report that the document navigated with `generation` has loaded.
    ///
    /// Returns `false` if the orchestrator is gone.
    pub fn notify(&self, generation: Generation) -> bool {
        self.tx.send(generation).is_ok()
    }
}

/// Where the orchestrator is in the render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Converting,
    Composing,
    Navigating,
    AwaitingLoad(Generation),
    Applying,
}

/// Mutable preview state, owned by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewState {
    position: PositionTracker,
    content_height: f64,
    zoom_percent: u32,
}

impl PreviewState {
    fn new(zoom_percent: u32) -> Self {
        Self {
            position: PositionTracker::new(),
            content_height: 1.0,
            zoom_percent,
        }
    }

    /// Last known relative scroll position, in `[0, 100]`.
    pub fn scroll_percentage(&self) -> f64 {
        self.position.percentage()
    }

    /// Last known content height, at least 1.
    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    /// Zoom computed at session start.
    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }
}

/// Result of delivering a load-complete event.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The event matched the pending navigation and the document was set up.
    Applied {
        generation: Generation,
        zoom_applied: bool,
        scroll_offset: f64,
        links: LinkReport,
    },
    /// The event belongs to a superseded navigation, or nothing was pending.
    Stale {
        generation: Generation,
        pending: Option<Generation>,
    },
}

/// Drives render cycles for one session against one surface.
pub struct RenderOrchestrator<S, C> {
    session: RenderSession,
    surface: S,
    converter: C,
    interceptor: LinkInterceptor,
    state: PreviewState,
    phase: Phase,
    generation: Generation,
    has_document: bool,
    bindings: Vec<LinkBinding>,
    load_rx: mpsc::UnboundedReceiver<Generation>,
}

impl<S, C> RenderOrchestrator<S, C>
where
    S: RenderSurface,
    C: Converter,
{
    /// Start a preview session, computing the zoom from the surface's DPI.
    pub fn new(session: RenderSession, surface: S, converter: C, host: Arc<dyn PreviewHost>) -> Self {
        Self::with_interceptor(session, surface, converter, LinkInterceptor::new(host), None)
    }

    /// Start a preview session.
    ///
    /// `dpi_override`, when set, replaces the DPI reported by the surface.
    pub fn with_interceptor(
        session: RenderSession,
        mut surface: S,
        converter: C,
        interceptor: LinkInterceptor,
        dpi_override: Option<f64>,
    ) -> Self {
        let dpi = dpi_override.unwrap_or_else(|| surface.display_dpi());
        let zoom_percent = zoom_percent(dpi);

        let (tx, load_rx) = mpsc::unbounded_channel();
        surface.on_load_complete(LoadNotifier { tx });

        tracing::info!(
            source = %session.source().display(),
            dpi,
            zoom_percent,
            "Started preview session"
        );

        Self {
            session,
            surface,
            converter,
            interceptor,
            state: PreviewState::new(zoom_percent),
            phase: Phase::Idle,
            generation: Generation::default(),
            has_document: false,
            bindings: Vec::new(),
            load_rx,
        }
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Generation of the most recent navigation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Local-file links bound in the displayed document.
    pub fn bindings(&self) -> &[LinkBinding] {
        &self.bindings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn transition(&mut self, phase: Phase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "Render phase");
        self.phase = phase;
    }

    /// Render `source` and navigate the surface to the new document.
    ///
    /// On failure nothing is navigated: the displayed document stays and a
    /// load that was pending before the call is still awaited.
    pub fn update(&mut self, source: &str) -> Result<Generation, PreviewError> {
        let pending = match self.phase {
            Phase::AwaitingLoad(generation) => Some(generation),
            _ => None,
        };
        let fallback = pending.map_or(Phase::Idle, Phase::AwaitingLoad);

        if let Some(generation) = pending {
            tracing::debug!(%generation, "Superseding pending navigation");
        }

        self.transition(Phase::Capturing);
        // A half-loaded document has no meaningful offset, keep the last capture.
        if self.has_document && pending.is_none() {
            let offset = self.surface.scroll_offset();
            let height = self.surface.content_height();
            self.state.content_height = clamp_height(height);
            let percentage = self.state.position.capture(offset, height);
            tracing::debug!(offset, height, percentage, "Captured scroll position");
        }

        self.transition(Phase::Converting);
        let body = match self.converter.to_html(source, self.session.extensions()) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(?err, "Conversion failed, keeping the displayed document");
                self.transition(fallback);
                return Err(err.into());
            }
        };

        self.transition(Phase::Composing);
        let document = self.session.shell().compose(&body);

        self.transition(Phase::Navigating);
        let generation = self.generation.next();
        if let Err(err) = self.surface.navigate(&document, generation) {
            tracing::warn!(?err, %generation, "Navigation failed");
            self.transition(fallback);
            return Err(err.into());
        }
        self.generation = generation;
        self.bindings.clear();

        tracing::debug!(%generation, bytes = document.len(), "Navigated to new document");
        self.transition(Phase::AwaitingLoad(generation));

        Ok(generation)
    }

    /// Finish the cycle of `generation`: zoom, scroll position, then links.
    ///
    /// Events for any other generation are ignored.
    pub fn load_complete(&mut self, generation: Generation) -> LoadOutcome {
        match self.phase {
            Phase::AwaitingLoad(pending) if pending == generation => {}
            Phase::AwaitingLoad(pending) => {
                tracing::debug!(%generation, %pending, "Ignoring load of superseded navigation");
                return LoadOutcome::Stale {
                    generation,
                    pending: Some(pending),
                };
            }
            phase => {
                tracing::warn!(%generation, ?phase, "Ignoring unexpected load-complete event");
                return LoadOutcome::Stale {
                    generation,
                    pending: None,
                };
            }
        }

        self.transition(Phase::Applying);

        let zoom_applied = self.apply_zoom();

        let height = self.surface.content_height();
        self.state.content_height = clamp_height(height);
        let scroll_offset = self.state.position.restore(height);
        self.surface.set_scroll_offset(scroll_offset);

        let links = self.interceptor.scan(self.surface.anchors());
        self.bindings = links.bound.clone();
        self.has_document = true;

        tracing::debug!(
            %generation,
            zoom_applied,
            scroll_offset,
            bound = links.bound.len(),
            broken = links.broken.len(),
            "Applied loaded document"
        );
        self.transition(Phase::Idle);

        LoadOutcome::Applied {
            generation,
            zoom_applied,
            scroll_offset,
            links,
        }
    }

    fn apply_zoom(&mut self) -> bool {
        let zoom_percent = self.state.zoom_percent;
        if zoom_percent == NO_ZOOM {
            return false;
        }

        match self.surface.set_zoom_percent(zoom_percent) {
            Ok(()) => true,
            Err(SurfaceError::ZoomUnavailable) => {
                tracing::debug!(zoom_percent, "Zoom unavailable, rendering at 100%");
                false
            }
            Err(err) => {
                tracing::warn!(?err, zoom_percent, "Failed to apply zoom");
                false
            }
        }
    }

    /// Wait for the surface to report a load and apply it.
    ///
    /// Returns `None` once the surface dropped its notifier.
    pub async fn next_load_complete(&mut self) -> Option<LoadOutcome> {
        let generation = self.load_rx.recv().await?;
        Some(self.load_complete(generation))
    }

    /// Apply every load reported so far without waiting.
    pub fn process_pending_loads(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(generation) = self.load_rx.try_recv() {
            outcomes.push(self.load_complete(generation));
        }
        outcomes
    }

    /// End the session and release the surface.
    pub fn dispose(mut self) {
        self.load_rx.close();
        self.bindings.clear();
        self.surface.release();
        tracing::info!(source = %self.session.source().display(), "Disposed preview session");
    }
}
