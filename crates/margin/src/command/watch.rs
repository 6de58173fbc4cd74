use super::{print_outcome, read_source, start_preview, PreviewArgs};
use anyhow::Result;
use clap::Parser;
use margin_config::Config;
use margin_core::{SourceWatcher, WatchEvent};
use std::path::PathBuf;

/// Keeps the preview of a markdown file up to date until interrupted.
#[derive(Parser, Debug, Clone)]
pub struct Watch {
    /// Markdown file to watch.
    pub file: PathBuf,

    #[clap(flatten)]
    pub preview: PreviewArgs,
}

impl Watch {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let (mut preview, output) = start_preview(&self.file, &self.preview, config)?;
        let mut watcher =
            SourceWatcher::new(preview.session().source(), config.watch.watcher_config())?;

        preview.update(&read_source(&preview)?)?;
        println!("watching {}, press Ctrl-C to stop", watcher.path().display());

        loop {
            tokio::select! {
                event = watcher.changed() => match event {
                    Some(WatchEvent::Modified(path)) => {
                        tracing::debug!(path = %path.display(), "Source changed");
                        // A failed cycle keeps the displayed document, the next save retries.
                        if let Err(err) = read_source(&preview).and_then(|source| {
                            preview.update(&source).map_err(Into::into)
                        }) {
                            tracing::warn!(?err, "Failed to refresh the preview");
                            eprintln!("error: {err:#}");
                        }
                    }
                    Some(WatchEvent::Removed(path)) => {
                        tracing::warn!(path = %path.display(), "Source removed, waiting for it to come back");
                    }
                    None => break,
                },
                Some(outcome) = preview.next_load_complete() => {
                    print_outcome(&outcome, &output);
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::debug!("Interrupted");
                    break;
                }
            }
        }

        preview.dispose();

        Ok(())
    }
}
