use crate::render::RenderError;
use crate::surface::SurfaceError;
use std::path::PathBuf;

/// Error type for preview sessions and render cycles.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The converter failed, the displayed document was left untouched.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The rendering surface rejected an operation.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// The source path has no parent directory to use as base href.
    #[error("invalid source file: {}", .0.display())]
    InvalidSource(PathBuf),

    /// The location of the running executable could not be determined.
    #[error("failed to locate install directory: {0}")]
    InstallDir(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_error_display() {
        let err = PreviewError::InvalidSource(PathBuf::from("/"));
        assert_eq!(err.to_string(), "invalid source file: /");

        let err: PreviewError = RenderError::Other("boom".to_string()).into();
        assert_eq!(err.to_string(), "Render error: boom");

        let err: PreviewError = SurfaceError::ZoomUnavailable.into();
        assert!(err.to_string().contains("zoom"));
    }
}
