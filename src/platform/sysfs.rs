// linux-armoury - platform/sysfs.rs
//
// Typed access to the /sys trees the app reads and writes: power supplies,
// hwmon sensors, LED class devices, and DMI identity. The root directory
// is injectable so discovery logic runs against a fake tree in tests.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::core::model::DmiIdentity;
use crate::util::constants;
use crate::util::error::SysfsError;

/// Handle to a sysfs tree rooted at a directory (normally `/sys`).
#[derive(Debug, Clone)]
pub struct Sysfs {
    root: PathBuf,
}

impl Sysfs {
    /// The real system tree.
    pub fn system() -> Self {
        Self {
            root: PathBuf::from("/sys"),
        }
    }

    /// A tree rooted elsewhere, for tests.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).exists()
    }

    /// Read a node and trim the trailing newline sysfs appends.
    pub fn read_trimmed(&self, relative: impl AsRef<Path>) -> Result<String, SysfsError> {
        let path = self.path(relative);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.trim().to_string()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(SysfsError::NotFound { path })
            }
            Err(source) => Err(SysfsError::Io { path, source }),
        }
    }

    /// Read a node and parse it as an integer.
    pub fn read_u64(&self, relative: impl AsRef<Path>) -> Result<u64, SysfsError> {
        let path = self.path(relative.as_ref());
        let content = self.read_trimmed(relative)?;
        content
            .parse()
            .map_err(|_| SysfsError::Parse { path, content })
    }

    /// Write a value to a node. Most writable nodes here are root-only;
    /// permission failures are surfaced distinctly so callers can suggest
    /// pkexec.
    pub fn write(&self, relative: impl AsRef<Path>, value: &str) -> Result<(), SysfsError> {
        let path = self.path(relative);
        trace!(path = %path.display(), value, "sysfs write");
        match fs::write(&path, value) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(SysfsError::NotFound { path })
            }
            Err(source) if source.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(SysfsError::PermissionDenied { path, source })
            }
            Err(source) => Err(SysfsError::Io { path, source }),
        }
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Find the first battery under class/power_supply (BAT0, BAT1, ...).
    pub fn find_battery(&self) -> Result<PathBuf, SysfsError> {
        let supply_dir = self.path(constants::SYSFS_POWER_SUPPLY);
        for entry in sorted_entries(&supply_dir) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("BAT") {
                debug!(battery = %name, "battery found");
                return Ok(entry.path());
            }
        }
        Err(SysfsError::Unsupported { feature: "battery" })
    }

    /// Find the AC adapter under class/power_supply.
    ///
    /// Matches AC*/ADP* names first, then falls back to any supply whose
    /// `type` node reads `Mains`.
    pub fn find_ac_adapter(&self) -> Result<PathBuf, SysfsError> {
        let supply_dir = self.path(constants::SYSFS_POWER_SUPPLY);
        let entries = sorted_entries(&supply_dir);

        for entry in &entries {
            let name = entry.file_name();
            let name = name.to_string_lossy().to_string();
            if name.starts_with("AC") || name.starts_with("ADP") {
                debug!(adapter = %name, "AC adapter found");
                return Ok(entry.path());
            }
        }

        for entry in &entries {
            let type_node = entry.path().join("type");
            if let Ok(kind) = fs::read_to_string(&type_node) {
                if kind.trim() == "Mains" {
                    return Ok(entry.path());
                }
            }
        }

        Err(SysfsError::Unsupported {
            feature: "AC adapter",
        })
    }

    /// Find a hwmon device by its `name` node.
    pub fn find_hwmon(&self, wanted: &str) -> Result<PathBuf, SysfsError> {
        let hwmon_dir = self.path(constants::SYSFS_HWMON);
        for entry in sorted_entries(&hwmon_dir) {
            let name_node = entry.path().join("name");
            if let Ok(name) = fs::read_to_string(&name_node) {
                if name.trim() == wanted {
                    return Ok(entry.path());
                }
            }
        }
        Err(SysfsError::Unsupported { feature: "hwmon" })
    }

    /// Find the keyboard backlight LED device (`*::kbd_backlight`).
    pub fn find_kbd_backlight(&self) -> Result<PathBuf, SysfsError> {
        let leds_dir = self.path(constants::SYSFS_LEDS);
        let pattern = leds_dir.join(constants::KBD_BACKLIGHT_GLOB);
        let pattern = pattern.to_string_lossy();

        if let Ok(paths) = glob::glob(&pattern) {
            for path in paths.flatten() {
                return Ok(path);
            }
        }
        Err(SysfsError::Unsupported {
            feature: "keyboard backlight",
        })
    }

    /// Read the DMI identity strings. Missing nodes become `None` rather
    /// than errors; some VMs expose only a subset.
    pub fn dmi_identity(&self) -> DmiIdentity {
        let read = |node: &str| {
            self.read_trimmed(Path::new(constants::SYSFS_DMI).join(node))
                .ok()
                .filter(|s| !s.is_empty())
        };
        DmiIdentity {
            vendor: read("sys_vendor"),
            product: read("product_name"),
            version: read("product_version"),
            board: read("board_name"),
        }
    }
}

fn sorted_entries(dir: &Path) -> Vec<fs::DirEntry> {
    let mut entries: Vec<_> = match fs::read_dir(dir) {
        Ok(iter) => iter.flatten().collect(),
        Err(_) => Vec::new(),
    };
    entries.sort_by_key(|e| e.file_name());
    entries
}
