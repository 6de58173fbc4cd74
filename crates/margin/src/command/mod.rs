pub mod render;
pub mod watch;
pub mod zoom;

use crate::host::ConsoleHost;
use anyhow::{Context, Result};
use clap::Parser;
use dirs::Dirs;
use margin_config::Config;
use margin_core::{
    HeadlessSurface, LoadOutcome, MarkdownConverter, RenderOrchestrator, RenderSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type Preview = RenderOrchestrator<HeadlessSurface, MarkdownConverter>;

/// Options shared by the commands that render a file.
#[derive(Parser, Debug, Clone)]
pub struct PreviewArgs {
    /// Write the preview document to this file.
    ///
    /// Defaults to `<stem>.html` in the data directory.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Display DPI used to compute the zoom, overrides the config.
    #[clap(long)]
    pub dpi: Option<f64>,
}

impl PreviewArgs {
    fn output_path(&self, source: &Path) -> Result<PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        let stem = source
            .file_stem()
            .with_context(|| format!("no file name in {}", source.display()))?;
        let data_dir = Dirs::data_dir().context("failed to create the data directory")?;
        Ok(data_dir.join(format!("{}.html", stem.to_string_lossy())))
    }
}

/// Open a preview session of `source` on a headless surface.
pub fn start_preview(source: &Path, args: &PreviewArgs, config: &Config) -> Result<(Preview, PathBuf)> {
    let source = source
        .canonicalize()
        .with_context(|| format!("failed to open {}", source.display()))?;
    let output = args.output_path(&source)?;

    let preview = &config.preview;
    let install_dir = margin_core::session::install_dir()?;
    let (stylesheet, script) = preview.asset_paths(&install_dir);
    let session =
        RenderSession::with_assets(source, stylesheet, script, preview.extensions.clone())?;

    let dpi = args.dpi.or(preview.dpi);
    let surface = HeadlessSurface::new()
        .with_line_height(preview.line_height)
        .with_output(&output);

    let orchestrator = RenderOrchestrator::with_interceptor(
        session,
        surface,
        MarkdownConverter,
        margin_core::LinkInterceptor::new(Arc::new(ConsoleHost)),
        dpi,
    );

    Ok((orchestrator, output))
}

/// Read the current source text of the session.
pub fn read_source(preview: &Preview) -> Result<String> {
    let source = preview.session().source();
    std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source.display()))
}

pub fn print_outcome(outcome: &LoadOutcome, output: &Path) {
    match outcome {
        LoadOutcome::Applied {
            generation,
            zoom_applied,
            scroll_offset,
            links,
        } => {
            println!(
                "rendered {generation} to {} (zoom applied: {zoom_applied}, scroll offset: {scroll_offset:.0})",
                output.display()
            );
            for link in &links.bound {
                println!("  link   {} -> {}", link.href, link.path.display());
            }
            for link in &links.broken {
                println!("  broken {} -> {}", link.href, link.path.display());
            }
        }
        LoadOutcome::Stale { generation, .. } => {
            tracing::debug!(%generation, "Skipped stale load");
        }
    }
}
