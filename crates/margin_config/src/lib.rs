use dirs::Dirs;
use margin_core::template::{DEFAULT_SCRIPT, DEFAULT_STYLESHEET};
use margin_core::{Extensions, WatcherConfig};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<ConfigInner> = OnceCell::new();

#[derive(Debug)]
struct ConfigInner {
    config: Config,
    file_path: Option<PathBuf>,
}

/// Why the config file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

pub struct LoadedConfig {
    pub config: Config,
    pub file_path: Option<PathBuf>,
    pub maybe_error: Option<ConfigError>,
}

/// Read the config file, falling back to the defaults.
///
/// A missing file is not an error. An unreadable or malformed one is
/// reported in [`LoadedConfig::maybe_error`] and the defaults are used.
pub fn load_config(specified_config_file: Option<PathBuf>) -> LoadedConfig {
    // Linux: ~/.config/margin/config.toml
    // macOS: ~/Library/Application\ Support/org.margin.Margin/config.toml
    // Windows: ~\AppData\Roaming\margin\Margin\config\config.toml
    let file_path = specified_config_file.or_else(Dirs::config_file);

    let (config, maybe_error) = match file_path.as_deref().map(read_config) {
        Some(Ok(config)) => (config, None),
        Some(Err(err)) => (Config::default(), Some(err)),
        None => (Config::default(), None),
    };

    LoadedConfig {
        config,
        file_path,
        maybe_error,
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(toml::from_str(&contents)?)
}

/// Initialize the global [`Config`].
///
/// Only the first call loads anything, later calls return the config
/// already in place.
pub fn load_config_on_startup(
    specified_config_file: Option<PathBuf>,
) -> (&'static Config, Option<ConfigError>) {
    let mut startup_error = None;

    let inner = CONFIG.get_or_init(|| {
        let LoadedConfig {
            config,
            file_path,
            maybe_error,
        } = load_config(specified_config_file);
        startup_error = maybe_error;
        ConfigInner { config, file_path }
    });

    if let Some(path) = &inner.file_path {
        tracing::debug!(path = %path.display(), "Config file");
    }

    (&inner.config, startup_error)
}

/// The global [`Config`], the defaults if none was loaded.
pub fn config() -> &'static Config {
    &CONFIG
        .get_or_init(|| ConfigInner {
            config: Config::default(),
            file_path: None,
        })
        .config
}

pub fn config_file() -> Option<&'static Path> {
    CONFIG.get().and_then(|inner| inner.file_path.as_deref())
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LogConfig {
    /// Specify the log file path.
    ///
    /// This path must be an absolute path.
    pub log_file: Option<String>,

    /// Specify the max log level.
    pub max_level: String,

    /// Specify the log target to enable more detailed logging.
    ///
    /// ```toml
    /// [log]
    /// log-target = "margin_core::orchestrator=trace"
    /// ```
    pub log_target: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            max_level: "debug".into(),
            log_target: "".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Use this DPI instead of the one reported by the display.
    pub dpi: Option<f64>,

    /// Directory the asset paths are relative to.
    ///
    /// Defaults to the directory of the executable.
    pub asset_dir: Option<PathBuf>,

    /// Stylesheet of the preview.
    pub stylesheet: PathBuf,

    /// Syntax highlighting script of the preview.
    pub script: PathBuf,

    /// Pixels per line of the headless preview.
    pub line_height: f64,

    /// Markdown extensions.
    pub extensions: Extensions,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            dpi: None,
            asset_dir: None,
            stylesheet: DEFAULT_STYLESHEET.into(),
            script: DEFAULT_SCRIPT.into(),
            line_height: 20.0,
            extensions: Extensions::default(),
        }
    }
}

impl PreviewConfig {
    /// Stylesheet and script paths, relative ones resolved against the
    /// asset directory or `install_dir` when none is configured.
    pub fn asset_paths(&self, install_dir: &Path) -> (PathBuf, PathBuf) {
        let asset_dir = self.asset_dir.as_deref().unwrap_or(install_dir);
        (asset_dir.join(&self.stylesheet), asset_dir.join(&self.script))
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Polling interval when native file notifications are unavailable.
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

impl WatchConfig {
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            poll_interval_ms: self.poll_interval_ms,
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Log configuration.
    pub log: LogConfig,

    /// Preview configuration.
    pub preview: PreviewConfig,

    /// Source watching configuration.
    pub watch: WatchConfig,
}
