//! The static HTML shell around rendered content.
//!
//! The shell only depends on the source file's directory and on the install
//! location, so it is composed once per session and split around the content
//! placeholder. Each render then only concatenates.

use std::path::{Path, PathBuf};
use url::Url;

/// HTML shell with placeholders for the base href, the assets and the content.
pub const SHELL_TEMPLATE: &str = include_str!("../assets/shell.html");

const CONTENT_PLACEHOLDER: &str = "{{content}}";

/// Stylesheet location relative to the asset directory.
pub const DEFAULT_STYLESHEET: &str = "margin/highlight.css";

/// Syntax highlighting script location relative to the asset directory.
pub const DEFAULT_SCRIPT: &str = "margin/prism.js";

/// The composed shell of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateShell {
    base_href: String,
    stylesheet: PathBuf,
    script: PathBuf,
    head: String,
    tail: String,
}

impl TemplateShell {
    /// Compose the shell for a source file living in `source_dir`.
    ///
    /// Missing asset files are not an error, the surface simply fails to
    /// load them.
    pub fn new(source_dir: &Path, stylesheet: PathBuf, script: PathBuf) -> Self {
        for asset in [&stylesheet, &script] {
            if !asset.exists() {
                tracing::debug!(path = %asset.display(), "Preview asset not found");
            }
        }

        let base_href = base_href(source_dir);
        let shell = SHELL_TEMPLATE
            .replace("{{base_href}}", &escape_attr(&base_href))
            .replace("{{stylesheet}}", &escape_attr(&stylesheet.to_string_lossy()))
            .replace("{{script}}", &escape_attr(&script.to_string_lossy()));

        let (head, tail) = shell
            .split_once(CONTENT_PLACEHOLDER)
            .map(|(head, tail)| (head.to_string(), tail.to_string()))
            .unwrap_or_else(|| (shell.clone(), String::new()));

        Self {
            base_href,
            stylesheet,
            script,
            head,
            tail,
        }
    }

    /// Compose the shell with assets looked up under `asset_dir`.
    pub fn with_asset_dir(source_dir: &Path, asset_dir: &Path) -> Self {
        Self::new(
            source_dir,
            asset_dir.join(DEFAULT_STYLESHEET),
            asset_dir.join(DEFAULT_SCRIPT),
        )
    }

    pub fn base_href(&self) -> &str {
        &self.base_href
    }

    pub fn stylesheet(&self) -> &Path {
        &self.stylesheet
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Build the full document around the rendered `body`.
    pub fn compose(&self, body: &str) -> String {
        let mut document = String::with_capacity(self.head.len() + body.len() + self.tail.len());
        document.push_str(&self.head);
        document.push_str(body);
        document.push_str(&self.tail);
        document
    }
}

/// `file:///` URL of `dir`, percent-encoded and with a trailing slash.
///
/// A relative `dir` is taken relative to the current directory.
///
/// # Example
///
/// ```
/// use margin_core::template::base_href;
/// use std::path::Path;
///
/// assert_eq!(base_href(Path::new("/home/user/notes")), "file:///home/user/notes/");
/// assert_eq!(base_href(Path::new("/home/a#b")), "file:///home/a%23b/");
/// ```
pub fn base_href(dir: &Path) -> String {
    let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    Url::from_directory_path(&dir)
        .map(String::from)
        .unwrap_or_else(|()| "file:///".to_string())
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
