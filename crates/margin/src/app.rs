use crate::command;
use anyhow::{anyhow, Result};
use clap::Parser;
use margin_config::Config;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Log files larger than this are removed on startup.
const MAX_LOG_FILE_SIZE: u64 = 8 * 1024 * 1024;

#[derive(Parser, Debug)]
pub enum RunCmd {
    /// Render a markdown file once and write the preview document.
    #[clap(name = "render")]
    Render(command::render::Render),
    /// Re-render the preview on every change of a markdown file.
    #[clap(name = "watch")]
    Watch(command::watch::Watch),
    /// Print the preview zoom used for a display DPI.
    #[clap(name = "zoom")]
    Zoom(command::zoom::Zoom),
}

/// Global arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Enable the logging system.
    #[clap(long, global = true)]
    pub log: Option<PathBuf>,

    /// Specify the path of the config file.
    #[clap(long, global = true)]
    pub config_file: Option<PathBuf>,
}

impl RunCmd {
    pub async fn run(self, args: Args) -> Result<()> {
        let (config, config_err) = margin_config::load_config_on_startup(args.config_file.clone());

        let _guard = init_logging(&args, config)?;

        if let Some(err) = config_err {
            tracing::warn!(%err, "Unusable config file, using the defaults");
            eprintln!("warning: config file ignored: {err}");
        }
        if let Some(path) = margin_config::config_file() {
            tracing::debug!(path = %path.display(), "Using config file");
        }

        match self {
            Self::Render(render) => render.run(config),
            Self::Watch(watch) => watch.run(config).await,
            Self::Zoom(zoom) => zoom.run(),
        }
    }
}

/// Install the global subscriber.
///
/// Logs go to a file when one is given by `--log`, `MARGIN_LOG_PATH` or the
/// config, and to stderr otherwise. The returned guard flushes the file
/// writer on drop.
fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let maybe_log = if let Some(log_path) = args.log.clone() {
        Some(log_path)
    } else if let Ok(log_path) = std::env::var("MARGIN_LOG_PATH").map(PathBuf::from) {
        Some(log_path)
    } else {
        config.log.log_file.as_ref().map(PathBuf::from)
    };

    let Some(log_path) = maybe_log else {
        let env_filter = EnvFilter::from_default_env()
            .add_directive("margin=info".parse()?)
            .add_directive("margin_core=info".parse()?);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!("failed to install the log subscriber: {err}"))?;
        return Ok(None);
    };

    if let Ok(metadata) = std::fs::metadata(&log_path) {
        if log_path.is_file() && metadata.len() > MAX_LOG_FILE_SIZE {
            std::fs::remove_file(&log_path)?;
        }
    }

    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {log_path:?}"))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| anyhow!("{log_path:?} has no parent"))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let max_level = config
        .log
        .max_level
        .parse()
        .unwrap_or(tracing::Level::DEBUG);

    let env_filter = if config.log.log_target.is_empty() {
        EnvFilter::default().add_directive(LevelFilter::from_level(max_level).into())
    } else {
        EnvFilter::try_new(&config.log.log_target)?
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_ansi(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(Some(guard))
}
