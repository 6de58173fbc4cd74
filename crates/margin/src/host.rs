use margin_core::PreviewHost;
use std::path::Path;

/// Host of the command line preview, which has no tabs to open.
///
/// Requests to open a linked file are printed instead.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl PreviewHost for ConsoleHost {
    fn open_file_in_preview_tab(&self, path: &Path) {
        tracing::info!(path = %path.display(), "Open linked file");
        println!("open {}", path.display());
    }
}
