use super::{print_outcome, read_source, start_preview, PreviewArgs};
use anyhow::Result;
use clap::Parser;
use margin_config::Config;
use std::path::PathBuf;

/// Renders a markdown file once.
#[derive(Parser, Debug, Clone)]
pub struct Render {
    /// Markdown file to render.
    pub file: PathBuf,

    #[clap(flatten)]
    pub preview: PreviewArgs,
}

impl Render {
    pub fn run(&self, config: &Config) -> Result<()> {
        let (mut preview, output) = start_preview(&self.file, &self.preview, config)?;

        let source = read_source(&preview)?;
        preview.update(&source)?;

        for outcome in preview.process_pending_loads() {
            print_outcome(&outcome, &output);
        }

        preview.dispose();

        Ok(())
    }
}
