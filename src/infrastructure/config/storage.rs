use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};
use super::preferences::Preferences;
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_FILE_NAME: &str = "state.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Reads and writes the files under the platform config directory.
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Create a new `StorageManager`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::ConfigDirNotFound)?;

        Ok(Self { config_dir })
    }

    #[must_use]
    pub fn with_dir(path: PathBuf) -> Self {
        Self { config_dir: path }
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            info!(path = ?self.config_dir, "Creating configuration directory");
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Loads the configuration, writing a default file when none exists.
    ///
    /// A malformed file is left untouched and defaults are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the default cannot be written.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        self.ensure_config_dir()?;
        let config_path = path_override.map_or_else(
            || self.config_dir.join(CONFIG_FILE_NAME),
            Path::to_path_buf,
        );

        if !config_path.exists() {
            info!(path = ?config_path, "Config file not found, creating default");
            let default_config = AppConfig::default();
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            Self::save_to_file(&config_path, &default_config)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        match toml::from_str::<AppConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(error = %e, "Failed to parse config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read.
    pub fn load_preferences(&self) -> Result<Preferences, ConfigError> {
        let state_path = self.config_dir.join(STATE_FILE_NAME);

        if !state_path.exists() {
            return Ok(Preferences::default());
        }

        let content = fs::read_to_string(&state_path)?;
        match toml::from_str::<Preferences>(&content) {
            Ok(preferences) => Ok(preferences),
            Err(e) => {
                warn!(error = %e, "Failed to parse state file, resetting preferences");
                Ok(Preferences::default())
            }
        }
    }

    /// Writes preferences atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), ConfigError> {
        self.ensure_config_dir()?;
        let state_path = self.config_dir.join(STATE_FILE_NAME);
        Self::save_to_file(&state_path, preferences)?;
        debug!("Preferences saved");
        Ok(())
    }

    fn save_to_file<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(data)?;

        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid path"))?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Location;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_config_dir_creates_directory() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bazaar");
        let manager = StorageManager::with_dir(config_path.clone());

        assert!(!config_path.exists());
        manager.ensure_config_dir().unwrap();
        assert!(config_path.exists());
    }

    #[test]
    fn test_load_config_creates_default_if_missing() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());

        let config = manager.load_config(None).unwrap();
        assert!(config.api.realtime);

        let config_file = dir.path().join(CONFIG_FILE_NAME);
        assert!(config_file.exists());
        let reparsed: AppConfig =
            toml::from_str(&fs::read_to_string(config_file).unwrap()).unwrap();
        assert_eq!(reparsed.api.base_url, config.api.base_url);
    }

    #[test]
    fn test_load_config_handles_malformed_file() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());
        let config_file = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_file, "invalid_toml = [").unwrap();

        let config = manager.load_config(None).unwrap();
        assert!(config.notifications.desktop);
        let content = fs::read_to_string(&config_file).unwrap();
        assert_eq!(content, "invalid_toml = [");
    }

    #[test]
    fn test_save_and_load_preferences() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());

        let mut preferences = Preferences::default();
        preferences.location = Location::named("Lyon");
        preferences.recent_searches.add("bike");
        preferences.recent_searches.add("desk lamp");
        preferences.last_tab = Some("messages".into());

        manager.save_preferences(&preferences).unwrap();
        assert!(dir.path().join(STATE_FILE_NAME).exists());

        let loaded = manager.load_preferences().unwrap();
        assert_eq!(loaded.location.map(|l| l.name), Some("Lyon".into()));
        assert_eq!(
            loaded.recent_searches.iter().collect::<Vec<_>>(),
            vec!["desk lamp", "bike"]
        );
        assert_eq!(loaded.last_tab.as_deref(), Some("messages"));
        assert_eq!(loaded.notification_sound, None);
    }

    #[test]
    fn test_recent_searches_above_default_capacity_survive_reload() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());

        let mut preferences = Preferences::default();
        preferences.recent_searches.set_capacity(20);
        for i in 0..20 {
            preferences.recent_searches.add(&format!("term {i}"));
        }
        manager.save_preferences(&preferences).unwrap();

        let mut loaded = manager.load_preferences().unwrap();
        loaded.recent_searches.set_capacity(20);
        assert_eq!(loaded.recent_searches.len(), 20);
        assert_eq!(loaded.recent_searches.iter().next(), Some("term 19"));

        loaded.recent_searches.set_capacity(5);
        assert_eq!(
            loaded.recent_searches.iter().collect::<Vec<_>>(),
            vec!["term 19", "term 18", "term 17", "term 16", "term 15"]
        );
    }

    #[test]
    fn test_missing_state_gives_defaults() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().join("nested"));
        let preferences = manager.load_preferences().unwrap();
        assert!(preferences.recent_searches.is_empty());
    }
}
