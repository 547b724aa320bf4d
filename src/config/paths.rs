//! On-disk locations used by the daemon.
//!
//! Everything derives from a home directory (`$HOME/.router-control` by
//! default) unless overridden in `[paths]`.

use std::path::PathBuf;

use crate::config::loader::ConfigError;
use crate::config::schema::PathsConfig;

pub const HOME_DIR_NAME: &str = ".router-control";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SETTINGS_FILE_NAME: &str = "daemon.toml";
pub const PLUGINS_DIR_NAME: &str = "plugins";
pub const PID_FILE_NAME: &str = ".router-control.pid";
pub const REFERENCE_COUNT_FILE_NAME: &str = "router-control-reference-count.txt";

/// Resolved locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocations {
    pub home_dir: PathBuf,
    pub config_file: PathBuf,
    pub backup_dir: PathBuf,
    pub plugins_dir: PathBuf,
    pub pid_file: PathBuf,
    pub reference_count_file: PathBuf,
}

impl ConfigLocations {
    /// Apply `paths` overrides on top of the defaults.
    pub fn resolve(paths: &PathsConfig) -> Result<Self, ConfigError> {
        let home_dir = match &paths.home_dir {
            Some(dir) => dir.clone(),
            None => default_home_dir()?,
        };

        Ok(Self {
            config_file: paths
                .config_file
                .clone()
                .unwrap_or_else(|| home_dir.join(CONFIG_FILE_NAME)),
            backup_dir: paths.backup_dir.clone().unwrap_or_else(|| home_dir.clone()),
            plugins_dir: paths
                .plugins_dir
                .clone()
                .unwrap_or_else(|| home_dir.join(PLUGINS_DIR_NAME)),
            pid_file: paths
                .pid_file
                .clone()
                .unwrap_or_else(|| home_dir.join(PID_FILE_NAME)),
            reference_count_file: std::env::temp_dir().join(REFERENCE_COUNT_FILE_NAME),
            home_dir,
        })
    }
}

/// `$HOME/.router-control`.
pub fn default_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(HOME_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// Default location of the daemon settings file.
pub fn default_settings_file() -> Result<PathBuf, ConfigError> {
    Ok(default_home_dir()?.join(SETTINGS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_derived_from_home_dir() {
        let paths = PathsConfig {
            home_dir: Some(PathBuf::from("/srv/rc")),
            ..PathsConfig::default()
        };
        let locations = ConfigLocations::resolve(&paths).unwrap();

        assert_eq!(locations.config_file, Path::new("/srv/rc/config.json"));
        assert_eq!(locations.backup_dir, Path::new("/srv/rc"));
        assert_eq!(locations.plugins_dir, Path::new("/srv/rc/plugins"));
        assert_eq!(locations.pid_file, Path::new("/srv/rc/.router-control.pid"));
        assert!(locations.reference_count_file.ends_with(REFERENCE_COUNT_FILE_NAME));
    }

    #[test]
    fn test_overrides_win() {
        let paths = PathsConfig {
            home_dir: Some(PathBuf::from("/srv/rc")),
            config_file: Some(PathBuf::from("/etc/rc/custom.json")),
            backup_dir: Some(PathBuf::from("/var/backups/rc")),
            ..PathsConfig::default()
        };
        let locations = ConfigLocations::resolve(&paths).unwrap();

        assert_eq!(locations.config_file, Path::new("/etc/rc/custom.json"));
        assert_eq!(locations.backup_dir, Path::new("/var/backups/rc"));
    }
}
