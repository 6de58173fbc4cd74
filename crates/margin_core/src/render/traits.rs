//! The converter interface.
//!
//! The engine treats text to HTML conversion as opaque: anything implementing
//! [`Converter`] can feed the preview.

use super::Extensions;

/// Error type for conversion.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The converter rejected the source.
    #[error("Render error: {0}")]
    Other(String),
}

/// Converts source text to an HTML fragment.
pub trait Converter {
    /// Render `source` with the given extension set.
    ///
    /// Returns the body fragment only, the surrounding document is built by
    /// [`TemplateShell`](crate::TemplateShell).
    fn to_html(&self, source: &str, extensions: &Extensions) -> Result<String, RenderError>;
}

impl<F> Converter for F
where
    F: Fn(&str, &Extensions) -> Result<String, RenderError>,
{
    fn to_html(&self, source: &str, extensions: &Extensions) -> Result<String, RenderError> {
        self(source, extensions)
    }
}
