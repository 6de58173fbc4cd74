use margin_core::links::BROKEN_LINK_TITLE;
use margin_core::{
    Anchor, Extensions, HeadlessSurface, LoadOutcome, MarkdownConverter, Navigation, Phase,
    PreviewHost, RenderOrchestrator, RenderSession, RenderSurface,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingHost {
    opened: Mutex<Vec<PathBuf>>,
}

impl PreviewHost for RecordingHost {
    fn open_file_in_preview_tab(&self, path: &Path) {
        self.opened.lock().unwrap().push(path.to_path_buf());
    }
}

fn notes(paragraphs: usize) -> String {
    let mut source = String::from(
        "# Notes\n\n[other](other.md)\n\n[missing](missing.md)\n\n[web](https://example.com)\n\n",
    );
    for i in 0..paragraphs {
        source.push_str(&format!("Paragraph {i}\n\n"));
    }
    source
}

fn start(
    dir: &Path,
    surface: HeadlessSurface,
) -> (RenderOrchestrator<HeadlessSurface, MarkdownConverter>, Arc<RecordingHost>) {
    let session =
        RenderSession::with_asset_dir(dir.join("notes.md"), dir, Extensions::default()).unwrap();
    let host = Arc::new(RecordingHost::default());
    let orchestrator = RenderOrchestrator::new(
        session,
        surface,
        MarkdownConverter,
        Arc::clone(&host) as Arc<dyn PreviewHost>,
    );
    (orchestrator, host)
}

#[test]
fn test_full_cycle_zoom_and_links() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("other.md"), "# Other").unwrap();

    let surface = HeadlessSurface::new().with_dpi(144.0).with_line_height(10.0);
    let (mut orchestrator, host) = start(dir.path(), surface);
    assert_eq!(orchestrator.state().zoom_percent(), 225);

    let generation = orchestrator.update(&notes(10)).unwrap();
    let outcomes = orchestrator.process_pending_loads();
    assert_eq!(outcomes.len(), 1);

    let LoadOutcome::Applied {
        generation: applied,
        zoom_applied,
        links,
        ..
    } = &outcomes[0]
    else {
        panic!("expected an applied load, got {:?}", outcomes[0]);
    };
    assert_eq!(*applied, generation);
    assert!(*zoom_applied);
    assert_eq!(orchestrator.surface().zoom_percent(), Some(225));
    assert_eq!(orchestrator.phase(), Phase::Idle);

    assert_eq!(links.bound.len(), 1);
    assert_eq!(links.bound[0].path, dir.path().join("other.md"));
    assert_eq!(links.broken.len(), 1);
    assert_eq!(links.skipped, 1);

    let document = orchestrator.surface().document().unwrap();
    assert!(document.contains(r#"<h1 id="notes">Notes</h1>"#));
    assert!(document.contains("margin/highlight.css"));

    let surface = orchestrator.surface_mut();
    let other = surface
        .anchor_list()
        .iter()
        .position(|anchor| anchor.href() == "other.md")
        .unwrap();
    let missing = surface
        .anchor_list()
        .iter()
        .position(|anchor| anchor.href() == "missing.md")
        .unwrap();
    let web = surface
        .anchor_list()
        .iter()
        .position(|anchor| anchor.href() == "https://example.com")
        .unwrap();

    assert_eq!(surface.click(other), Some(Navigation::Prevent));
    assert_eq!(surface.click(web), Some(Navigation::Allow));
    assert_eq!(surface.anchor_list()[missing].title(), Some(BROKEN_LINK_TITLE));
    assert!(!surface.anchor_list()[missing].is_bound());

    assert_eq!(
        *host.opened.lock().unwrap(),
        vec![dir.path().join("other.md")]
    );
}

#[test]
fn test_scroll_position_survives_rerender() {
    let dir = tempfile::tempdir().unwrap();
    let (mut orchestrator, _host) = start(dir.path(), HeadlessSurface::new());

    orchestrator.update(&notes(20)).unwrap();
    orchestrator.process_pending_loads();

    let height = orchestrator.surface().content_height();
    orchestrator.surface_mut().set_scroll_offset(height / 2.0);

    orchestrator.update(&notes(80)).unwrap();
    orchestrator.process_pending_loads();

    let new_height = orchestrator.surface().content_height();
    assert!(new_height > height);
    let ratio = orchestrator.surface().scroll_offset() / new_height;
    assert!((ratio - 0.5).abs() < 1e-6, "ratio = {ratio}");
    assert!((orchestrator.state().scroll_percentage() - 50.0).abs() < 1e-6);
}

#[test]
fn test_superseded_load_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let surface = HeadlessSurface::new().manual_loads();
    let (mut orchestrator, _host) = start(dir.path(), surface);

    let first = orchestrator.update(&notes(1)).unwrap();
    let second = orchestrator.update(&notes(2)).unwrap();
    assert!(second > first);

    assert_eq!(
        orchestrator.load_complete(first),
        LoadOutcome::Stale {
            generation: first,
            pending: Some(second),
        }
    );
    assert_eq!(orchestrator.phase(), Phase::AwaitingLoad(second));

    assert_eq!(orchestrator.surface_mut().complete_load(), Some(second));
    let outcomes = orchestrator.process_pending_loads();
    assert!(matches!(
        outcomes.as_slice(),
        [LoadOutcome::Applied { generation, .. }] if *generation == second
    ));
    assert!(orchestrator.surface().document().unwrap().contains("Paragraph 1"));
}

#[test]
fn test_dispose_releases_surface() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("preview.html");
    let surface = HeadlessSurface::new().with_output(&output);
    let (mut orchestrator, _host) = start(dir.path(), surface);

    orchestrator.update("hello").unwrap();
    orchestrator.process_pending_loads();
    orchestrator.dispose();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("<p>hello</p>"));
}

#[test]
fn test_links_resolve_in_directories_with_reserved_characters() {
    let root = tempfile::tempdir().unwrap();

    for name in ["x%41y", "a#b", "my notes"] {
        let dir = root.path().join(name);
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("other.md"), "# Other").unwrap();

        let (mut orchestrator, host) = start(&dir, HeadlessSurface::new());
        orchestrator.update("[other](other.md)").unwrap();
        let outcomes = orchestrator.process_pending_loads();

        let [LoadOutcome::Applied { links, .. }] = outcomes.as_slice() else {
            panic!("expected one applied load in {name}, got {outcomes:?}");
        };
        assert!(links.broken.is_empty(), "{name}: {:?}", links.broken);
        assert_eq!(links.bound.len(), 1, "{name}");
        assert_eq!(links.bound[0].path, dir.join("other.md"));

        assert_eq!(orchestrator.surface_mut().click(0), Some(Navigation::Prevent));
        assert_eq!(*host.opened.lock().unwrap(), vec![dir.join("other.md")]);
    }
}
