// linux-armoury - platform/config.rs
//
// Filesystem locations for settings, custom profiles, and plugin hooks.
// Resolution follows the XDG base directory spec via `directories`, with
// a working-directory fallback for odd environments (containers, tests).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::util::constants;
use crate::util::error::{ArmouryError, Result};

/// Resolved application directories. Construction creates them.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding settings.json.
    pub config_dir: PathBuf,
    /// Directory holding custom profile JSON files.
    pub profiles_dir: PathBuf,
    /// Directory holding plugin hook manifests.
    pub plugins_dir: PathBuf,
}

impl AppPaths {
    /// Resolve against the user's XDG config home
    /// (`~/.config/linux-armoury` on a normal setup).
    pub fn resolve() -> Result<Self> {
        let config_dir = match ProjectDirs::from("", "", constants::APP_ID) {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => {
                // Paths resolve before the tracing subscriber exists
                // (the log level lives in settings), so this has to go
                // straight to stderr.
                eprintln!("warning: no home directory found, using ./config");
                PathBuf::from("config")
            }
        };
        Self::at(config_dir)
    }

    /// Resolve against an explicit config directory (tests, --config-dir).
    pub fn at(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        let paths = Self {
            profiles_dir: config_dir.join(constants::PROFILES_DIR_NAME),
            plugins_dir: config_dir.join(constants::PLUGINS_DIR_NAME),
            config_dir,
        };
        paths.ensure_dirs()?;
        debug!(config_dir = %paths.config_dir.display(), "application directories ready");
        Ok(paths)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(constants::SETTINGS_FILE_NAME)
    }

    fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.profiles_dir, &self.plugins_dir] {
            create_dir_all(dir)?;
        }
        Ok(())
    }
}

fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| ArmouryError::Io {
        path: dir.to_path_buf(),
        operation: "create directory",
        source,
    })
}

/// Atomically replace a file's contents: write to a sibling temp file,
/// then rename over the target. A crash mid-write never leaves a
/// truncated settings or profile file behind.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(|source| ArmouryError::Io {
        path: tmp.clone(),
        operation: "write temp file",
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| ArmouryError::Io {
        path: path.to_path_buf(),
        operation: "rename temp file",
        source,
    })
}
