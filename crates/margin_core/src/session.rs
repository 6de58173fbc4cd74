use crate::error::PreviewError;
use crate::render::Extensions;
use crate::template::{TemplateShell, DEFAULT_SCRIPT, DEFAULT_STYLESHEET};
use std::path::{Path, PathBuf};

/// The application embedding the preview.
pub trait PreviewHost {
    /// Open `path` in a preview tab of the host.
    fn open_file_in_preview_tab(&self, path: &Path);
}

/// Immutable per-file state of a preview.
#[derive(Debug, Clone)]
pub struct RenderSession {
    source: PathBuf,
    shell: TemplateShell,
    extensions: Extensions,
}

impl RenderSession {
    /// Create a session whose assets live next to the running executable.
    pub fn new(source: impl Into<PathBuf>, extensions: Extensions) -> Result<Self, PreviewError> {
        let install_dir = install_dir()?;
        Self::with_asset_dir(source, &install_dir, extensions)
    }

    /// Create a session with the default asset layout under `asset_dir`.
    pub fn with_asset_dir(
        source: impl Into<PathBuf>,
        asset_dir: &Path,
        extensions: Extensions,
    ) -> Result<Self, PreviewError> {
        Self::with_assets(
            source,
            asset_dir.join(DEFAULT_STYLESHEET),
            asset_dir.join(DEFAULT_SCRIPT),
            extensions,
        )
    }

    /// Create a session with explicit stylesheet and script paths.
    pub fn with_assets(
        source: impl Into<PathBuf>,
        stylesheet: PathBuf,
        script: PathBuf,
        extensions: Extensions,
    ) -> Result<Self, PreviewError> {
        let source = source.into();
        // The base href needs an absolute source directory.
        let source = std::path::absolute(&source)
            .map_err(|_| PreviewError::InvalidSource(source.clone()))?;
        let source_dir = source
            .parent()
            .ok_or_else(|| PreviewError::InvalidSource(source.clone()))?;
        let shell = TemplateShell::new(source_dir, stylesheet, script);

        tracing::info!(
            source = %source.display(),
            base_href = shell.base_href(),
            "Created render session"
        );

        Ok(Self {
            source,
            shell,
            extensions,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn shell(&self) -> &TemplateShell {
        &self.shell
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

/// Directory of the running executable.
pub fn install_dir() -> Result<PathBuf, PreviewError> {
    let exe = std::env::current_exe().map_err(PreviewError::InstallDir)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        PreviewError::InstallDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "executable has no parent directory",
        ))
    })
}
