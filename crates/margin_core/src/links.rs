//! Local-file link interception.
//!
//! Following a `file:` link inside the surface would navigate the preview away
//! from the document. Instead, every such anchor gets a click handler that
//! asks the host to open the target in a preview tab. Bindings die with the
//! document, so the scan runs again after each load.

use crate::session::PreviewHost;
use crate::surface::{Anchor, Navigation};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

/// Scheme of the anchors rerouted to the host.
pub const FILE_SCHEME: &str = "file";

/// Tooltip set on anchors whose target is missing.
pub const BROKEN_LINK_TITLE: &str = "The file does not exist";

/// A local-file anchor whose clicks are routed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBinding {
    pub href: String,
    pub path: PathBuf,
}

/// A local-file anchor pointing at a missing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub href: String,
    pub path: PathBuf,
}

/// Outcome of one scan over the anchors of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub bound: Vec<LinkBinding>,
    pub broken: Vec<BrokenLink>,
    /// Anchors left to the surface's default navigation.
    pub skipped: usize,
}

impl LinkReport {
    /// Total number of anchors visited.
    pub fn visited(&self) -> usize {
        self.bound.len() + self.broken.len() + self.skipped
    }
}

/// Scans anchors and binds the local-file ones to the host.
#[derive(Clone)]
pub struct LinkInterceptor {
    host: Arc<dyn PreviewHost>,
    file_exists: fn(&Path) -> bool,
}

impl std::fmt::Debug for LinkInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkInterceptor").finish_non_exhaustive()
    }
}

impl LinkInterceptor {
    pub fn new(host: Arc<dyn PreviewHost>) -> Self {
        Self {
            host,
            file_exists: Path::is_file,
        }
    }

    /// Use `file_exists` instead of the filesystem to check link targets.
    pub fn with_file_exists(mut self, file_exists: fn(&Path) -> bool) -> Self {
        self.file_exists = file_exists;
        self
    }

    /// Visit every anchor, binding the local-file ones whose target exists.
    ///
    /// A missing target only marks that anchor, the scan goes on.
    pub fn scan<'a, A, I>(&self, anchors: I) -> LinkReport
    where
        A: Anchor + 'a,
        I: IntoIterator<Item = &'a mut A>,
    {
        let mut report = LinkReport::default();

        for anchor in anchors {
            if !anchor.scheme().eq_ignore_ascii_case(FILE_SCHEME) {
                report.skipped += 1;
                continue;
            }

            let href = anchor.href().to_string();
            let path = resolve_file_path(anchor.path());

            if !(self.file_exists)(&path) {
                tracing::debug!(%href, path = %path.display(), "Link target does not exist");
                anchor.set_title(BROKEN_LINK_TITLE);
                report.broken.push(BrokenLink { href, path });
                continue;
            }

            let host = Arc::clone(&self.host);
            let target = path.clone();
            anchor.on_click(Box::new(move || {
                host.open_file_in_preview_tab(&target);
                Navigation::Prevent
            }));

            report.bound.push(LinkBinding { href, path });
        }

        tracing::debug!(
            bound = report.bound.len(),
            broken = report.broken.len(),
            skipped = report.skipped,
            "Scanned document links"
        );

        report
    }
}

/// Turn the path of a `file:` URL into a platform path.
///
/// The path is percent-decoded, the slash in front of a drive letter is
/// dropped and separators are normalized.
///
/// # Example
///
/// ```
/// use margin_core::links::resolve_file_path;
///
/// let path = resolve_file_path("/C:/docs/my%20notes.md");
/// assert!(path.starts_with("C:"));
/// assert_eq!(path.file_name().unwrap(), "my notes.md");
/// ```
pub fn resolve_file_path(url_path: &str) -> PathBuf {
    let decoded = percent_decode_str(url_path).decode_utf8_lossy();

    let trimmed = match decoded.strip_prefix('/') {
        Some(rest) if has_drive_prefix(rest) => rest,
        _ => decoded.as_ref(),
    };

    PathBuf::from(trimmed.replace('/', &MAIN_SEPARATOR.to_string()))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ClickHandler;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        opened: Mutex<Vec<PathBuf>>,
    }

    impl PreviewHost for RecordingHost {
        fn open_file_in_preview_tab(&self, path: &Path) {
            self.opened.lock().unwrap().push(path.to_path_buf());
        }
    }

    struct FakeAnchor {
        href: String,
        scheme: String,
        path: String,
        title: Option<String>,
        handlers: Vec<ClickHandler>,
    }

    impl FakeAnchor {
        fn new(scheme: &str, path: &str) -> Self {
            Self {
                href: format!("{scheme}://{path}"),
                scheme: scheme.to_string(),
                path: path.to_string(),
                title: None,
                handlers: Vec::new(),
            }
        }

        fn click(&mut self) -> Navigation {
            self.handlers
                .iter_mut()
                .map(|handler| handler())
                .fold(Navigation::Allow, |acc, nav| {
                    if nav == Navigation::Prevent {
                        nav
                    } else {
                        acc
                    }
                })
        }
    }

    impl Anchor for FakeAnchor {
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

    fn url_path(path: &Path) -> String {
        let path = path.to_string_lossy().replace('\\', "/");
        if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        }
    }

    #[test]
    fn test_missing_file_does_not_stop_scan() {
        let dir = tempfile::tempdir().unwrap();
        let file_a = dir.path().join("a.md");
        let file_b = dir.path().join("b.md");
        let file_c = dir.path().join("c.md");
        std::fs::write(&file_a, "# A").unwrap();
        std::fs::write(&file_c, "# C").unwrap();

        let mut anchors = vec![
            FakeAnchor::new("file", &url_path(&file_a)),
            FakeAnchor::new("file", &url_path(&file_b)),
            FakeAnchor::new("file", &url_path(&file_c)),
        ];

        let host = Arc::new(RecordingHost::default());
        let report = LinkInterceptor::new(host.clone()).scan(anchors.iter_mut());

        assert_eq!(report.visited(), 3);
        assert_eq!(report.bound.len(), 2);
        assert_eq!(report.broken.len(), 1);

        assert_eq!(anchors[0].handlers.len(), 1);
        assert!(anchors[0].title.is_none());
        assert!(anchors[1].handlers.is_empty());
        assert_eq!(anchors[1].title.as_deref(), Some(BROKEN_LINK_TITLE));
        assert_eq!(anchors[2].handlers.len(), 1);
        assert!(anchors[2].title.is_none());
    }

    #[test]
    fn test_click_opens_file_in_host() {
        let mut anchors = vec![FakeAnchor::new("file", "/notes/todo.md")];
        let host = Arc::new(RecordingHost::default());
        let interceptor = LinkInterceptor::new(host.clone()).with_file_exists(|_| true);

        interceptor.scan(anchors.iter_mut());
        assert!(host.opened.lock().unwrap().is_empty());

        assert_eq!(anchors[0].click(), Navigation::Prevent);
        assert_eq!(
            *host.opened.lock().unwrap(),
            vec![resolve_file_path("/notes/todo.md")]
        );
    }

    #[test]
    fn test_non_file_anchors_are_left_alone() {
        let mut anchors = vec![
            FakeAnchor::new("http", "/index.html"),
            FakeAnchor::new("https", "/docs"),
            FakeAnchor::new("mailto", "someone@example.com"),
        ];
        let host = Arc::new(RecordingHost::default());
        let report = LinkInterceptor::new(host)
            .with_file_exists(|_| true)
            .scan(anchors.iter_mut());

        assert_eq!(report.skipped, 3);
        assert!(report.bound.is_empty());
        assert!(anchors.iter().all(|a| a.handlers.is_empty() && a.title.is_none()));
        assert_eq!(anchors[0].click(), Navigation::Allow);
    }

    #[test]
    fn test_scheme_match_is_case_insensitive() {
        let mut anchors = vec![FakeAnchor::new("FILE", "/x.md")];
        let report = LinkInterceptor::new(Arc::new(RecordingHost::default()))
            .with_file_exists(|_| true)
            .scan(anchors.iter_mut());
        assert_eq!(report.bound.len(), 1);
    }

    #[test]
    fn test_resolve_file_path() {
        let sep = MAIN_SEPARATOR;
        assert_eq!(
            resolve_file_path("/C:/docs/readme.md"),
            PathBuf::from(format!("C:{sep}docs{sep}readme.md"))
        );
        assert_eq!(
            resolve_file_path("/home/user/a%20b.md"),
            PathBuf::from(format!("{sep}home{sep}user{sep}a b.md"))
        );
        assert_eq!(resolve_file_path("/d:"), PathBuf::from("d:"));
    }

    #[test]
    fn test_resolve_file_path_decodes_reserved_characters() {
        let sep = MAIN_SEPARATOR;
        assert_eq!(
            resolve_file_path("/tmp/a%23b/x%2541y.md"),
            PathBuf::from(format!("{sep}tmp{sep}a#b{sep}x%41y.md"))
        );
    }

    #[test]
    fn test_has_drive_prefix() {
        assert!(has_drive_prefix("C:/x"));
        assert!(has_drive_prefix("c:"));
        assert!(!has_drive_prefix("home/x"));
        assert!(!has_drive_prefix("ab:/x"));
    }
}
