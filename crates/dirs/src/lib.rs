use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

pub struct Dirs;

impl Dirs {
    /// Project directory for Margin.
    ///
    /// Returns `None` when no valid home directory can be found.
    pub fn project() -> Option<&'static ProjectDirs> {
        static CELL: OnceLock<Option<ProjectDirs>> = OnceLock::new();

        CELL.get_or_init(|| ProjectDirs::from("org", "margin", "Margin"))
            .as_ref()
    }

    /// Default location of `config.toml`.
    ///
    /// Linux: ~/.config/margin/config.toml
    /// macOS: ~/Library/Application Support/org.margin.Margin/config.toml
    /// Windows: ~\AppData\Roaming\margin\Margin\config\config.toml
    pub fn config_file() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Data directory for Margin, created on demand.
    pub fn data_dir() -> std::io::Result<PathBuf> {
        let dirs = Self::project().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory found")
        })?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.to_path_buf())
    }
}
