use crate::error::{Result, SniptError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIRNAME: &str = ".snipt-web";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const SNIPPETS_FILENAME: &str = "snippets.json";

/// Get the snipt-web configuration directory
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(CONFIG_DIRNAME))
        .unwrap_or_else(|_| PathBuf::from(CONFIG_DIRNAME))
}

/// Get the path to the settings file
pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILENAME)
}

/// Get the path to the snippets file
pub fn get_snippets_file_path() -> PathBuf {
    get_config_dir().join(SNIPPETS_FILENAME)
}

/// Ensure the configuration directory and its files exist
pub fn ensure_config_dir() -> Result<PathBuf> {
    ensure_config_dir_at(&get_config_dir())
}

/// Same as [`ensure_config_dir`] for an explicit directory
pub fn ensure_config_dir_at(config_dir: &Path) -> Result<PathBuf> {
    if !config_dir.exists() {
        fs::create_dir_all(config_dir)?;
    }

    let snippets_path = config_dir.join(SNIPPETS_FILENAME);
    if !snippets_path.exists() {
        create_empty_file(&snippets_path, "snippets file")?;
    }

    let settings_path = config_dir.join(SETTINGS_FILENAME);
    if !settings_path.exists() {
        let serialized = serde_json::to_string_pretty(&Settings::default())?;
        fs::write(&settings_path, serialized)?;
        tracing::info!(path = %settings_path.display(), "created default settings file");
    }

    Ok(config_dir.to_path_buf())
}

/// Create an empty config file at the specified path
pub fn create_empty_file(path: &Path, description: &str) -> Result<()> {
    tracing::info!(path = %path.display(), "creating {}", description);
    fs::write(path, "")?;
    Ok(())
}

/// Key that arms an expansion check on keydown
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKey {
    #[default]
    Space,
    Tab,
    Enter,
}

impl TriggerKey {
    /// Whether a DOM `KeyboardEvent.key` value is this trigger
    pub fn matches_key(&self, key: &str) -> bool {
        match self {
            TriggerKey::Space => key == " " || key == "Space" || key == "Spacebar",
            TriggerKey::Tab => key == "Tab",
            TriggerKey::Enter => key == "Enter",
        }
    }
}

/// User-facing settings, persisted as JSON
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub trigger_key: TriggerKey,
    /// Run a debounced check after ordinary input, not only on the trigger key
    pub expand_on_input: bool,
    pub debounce_ms: u64,
    pub settle_ms: u64,
    pub keystroke_delay_ms: u64,
    pub rewrite_max_attempts: u32,
    pub rewrite_initial_backoff_ms: u64,
    pub rewrite_max_backoff_ms: u64,
    pub show_notifications: bool,
    pub notification_duration_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_key: TriggerKey::Space,
            expand_on_input: true,
            debounce_ms: 100,
            settle_ms: 100,
            keystroke_delay_ms: 10,
            rewrite_max_attempts: 5,
            rewrite_initial_backoff_ms: 50,
            rewrite_max_backoff_ms: 500,
            show_notifications: true,
            notification_duration_ms: 3000,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. A missing or empty file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file missing, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&get_settings_file_path())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rewrite_max_attempts == 0 {
            return Err(SniptError::InvalidConfig(
                "rewrite_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.debounce_ms == 0 {
            return Err(SniptError::InvalidConfig(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.rewrite_initial_backoff_ms > self.rewrite_max_backoff_ms {
            return Err(SniptError::InvalidConfig(format!(
                "rewrite_initial_backoff_ms ({}) exceeds rewrite_max_backoff_ms ({})",
                self.rewrite_initial_backoff_ms, self.rewrite_max_backoff_ms
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, r#"{"trigger_key":"tab","debounce_ms":250}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.trigger_key, TriggerKey::Tab);
        assert_eq!(settings.debounce_ms, 250);
        assert_eq!(settings.rewrite_max_attempts, 5);
        assert!(settings.enabled);
    }

    #[test]
    fn rejects_inverted_backoff() {
        let settings = Settings {
            rewrite_initial_backoff_ms: 800,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SniptError::InvalidConfig(_))
        ));
    }

    #[test]
    fn ensure_config_dir_creates_files() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("cfg");
        ensure_config_dir_at(&config_dir).unwrap();

        assert!(config_dir.join(SNIPPETS_FILENAME).exists());
        let settings = Settings::load(&config_dir.join(SETTINGS_FILENAME)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn trigger_key_matching() {
        assert!(TriggerKey::Space.matches_key(" "));
        assert!(!TriggerKey::Space.matches_key("Tab"));
        assert!(TriggerKey::Enter.matches_key("Enter"));
    }
}
