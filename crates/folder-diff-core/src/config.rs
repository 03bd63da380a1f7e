use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

/// Settings shared by every action. CLI flags are applied on top.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Reinforce size matches with a CRC-32 comparison.
    pub checksum: bool,
    /// Apply `checksum` to the rename/move search as well.
    pub strict_renames: bool,
    /// Follow symbolic links while walking a folder.
    pub follow_links: bool,
    /// Report scan progress every this many discovered files.
    pub progress_interval: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            checksum: false,
            strict_renames: false,
            follow_links: false,
            progress_interval: 100,
        }
    }
}

/// Defaults, then an optional `FolderDiff.toml`, then `FOLDER_DIFF_*`
/// environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_from("FolderDiff")
}

pub fn load_from(name: &str) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let builder = Config::builder()
        .set_default("checksum", defaults.checksum)?
        .set_default("strict_renames", defaults.strict_renames)?
        .set_default("follow_links", defaults.follow_links)?
        .set_default("progress_interval", defaults.progress_interval as i64)?
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(Environment::with_prefix("FOLDER_DIFF").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
