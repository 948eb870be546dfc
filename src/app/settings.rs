// linux-armoury - app/settings.rs
//
// Persistent user settings (settings.json). Loading merges the file over
// defaults so new keys added in later releases pick up sane values, and
// keys this build does not know are preserved across save cycles.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::platform::config::atomic_write;
use crate::util::constants;
use crate::util::error::{Result, SettingsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Switch profiles automatically when the power source changes.
    #[serde(default = "default_auto_switch")]
    pub auto_switch_enabled: bool,

    /// Profile applied when AC power is detected.
    #[serde(default = "default_ac_profile")]
    pub ac_profile: String,

    /// Profile applied when running on battery.
    #[serde(default = "default_battery_profile")]
    pub battery_profile: String,

    /// Last profile applied, restored on request.
    #[serde(default)]
    pub last_profile: Option<String>,

    /// Auto-switch poll interval in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Log level override ("error", "warn", "info", "debug", "trace").
    #[serde(default)]
    pub log_level: Option<String>,

    /// Force a specific xrandr output instead of auto-detecting.
    #[serde(default)]
    pub display_output: Option<String>,

    /// Keys written by other versions or by hand. Preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_switch_enabled: default_auto_switch(),
            ac_profile: default_ac_profile(),
            battery_profile: default_battery_profile(),
            last_profile: None,
            poll_interval_ms: default_poll_interval(),
            log_level: None,
            display_output: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn default_auto_switch() -> bool {
    false
}

fn default_ac_profile() -> String {
    "performance".to_string()
}

fn default_battery_profile() -> String {
    "battery".to_string()
}

fn default_poll_interval() -> u64 {
    constants::AUTO_SWITCH_POLL_INTERVAL_MS
}

impl Settings {
    /// Load settings from a file, merging over defaults.
    ///
    /// A missing file yields defaults. A corrupt file also yields defaults
    /// (with a warning) rather than locking the user out of the tool.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Self::default();
            }
            Err(source) => {
                let err = SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                warn!(%err, "cannot read settings, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(mut settings) => {
                settings.normalize();
                settings
            }
            Err(source) => {
                warn!(path = %path.display(), %source, "settings file is corrupt, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        atomic_write(path, &json)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Clamp out-of-range values into their valid ranges, logging each fix.
    fn normalize(&mut self) {
        if self.poll_interval_ms < constants::MIN_POLL_INTERVAL_MS {
            warn!(
                poll_interval_ms = self.poll_interval_ms,
                min = constants::MIN_POLL_INTERVAL_MS,
                "poll interval too low, clamping"
            );
            self.poll_interval_ms = constants::MIN_POLL_INTERVAL_MS;
        }
        if self.poll_interval_ms > constants::MAX_POLL_INTERVAL_MS {
            warn!(
                poll_interval_ms = self.poll_interval_ms,
                max = constants::MAX_POLL_INTERVAL_MS,
                "poll interval too high, clamping"
            );
            self.poll_interval_ms = constants::MAX_POLL_INTERVAL_MS;
        }
    }
}

/// Settings bound to their file location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    pub settings: Settings,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Settings::load(&path);
        Self { path, settings }
    }

    pub fn save(&self) -> Result<()> {
        self.settings.save(&self.path)
    }

    /// Record the profile that was just applied.
    pub fn remember_profile(&mut self, name: &str) -> Result<()> {
        self.settings.last_profile = Some(name.to_string());
        self.save()
    }

    /// Reset to defaults and persist.
    pub fn reset(&mut self) -> Result<()> {
        info!("resetting settings to defaults");
        self.settings = Settings::default();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert!(!settings.auto_switch_enabled);
        assert_eq!(settings.ac_profile, "performance");
        assert_eq!(settings.battery_profile, "battery");
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"auto_switch_enabled": true}"#).unwrap();
        let settings = Settings::load(&path);
        assert!(settings.auto_switch_enabled);
        assert_eq!(settings.ac_profile, "performance");
        assert_eq!(settings.poll_interval_ms, 2_000);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"ac_profile": "gaming", "future_feature": {"nested": 1}}"#,
        )
        .unwrap();

        let mut settings = Settings::load(&path);
        settings.battery_profile = "efficient".to_string();
        settings.save(&path).unwrap();

        let reloaded: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded["ac_profile"], "gaming");
        assert_eq!(reloaded["battery_profile"], "efficient");
        assert_eq!(reloaded["future_feature"]["nested"], 1);
    }

    #[test]
    fn test_poll_interval_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"poll_interval_ms": 10}"#).unwrap();
        assert_eq!(Settings::load(&path).poll_interval_ms, 500);

        std::fs::write(&path, r#"{"poll_interval_ms": 600000}"#).unwrap();
        assert_eq!(Settings::load(&path).poll_interval_ms, 60_000);
    }

    #[test]
    fn test_store_remember_profile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::open(&path);
        store.remember_profile("gaming").unwrap();

        let reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.settings.last_profile.as_deref(), Some("gaming"));
    }
}
