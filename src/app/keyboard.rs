// linux-armoury - app/keyboard.rs
//
// Keyboard backlight control: brightness through the LED class device,
// color and effect through asusctl aura. Both degrade independently; a
// machine without asusctl still gets brightness control.

use tracing::{debug, info};

use crate::core::model::{AuraEffect, Rgb};
use crate::platform::exec;
use crate::platform::sysfs::Sysfs;
use crate::util::constants;
use crate::util::error::{Result, SysfsError};

#[derive(Debug, Clone)]
pub struct KeyboardManager {
    sysfs: Sysfs,
    has_asusctl: bool,
}

impl KeyboardManager {
    pub fn new(sysfs: Sysfs, has_asusctl: bool) -> Self {
        Self { sysfs, has_asusctl }
    }

    /// Current backlight level (0-3).
    pub fn brightness(&self) -> Result<u32> {
        let led = self.sysfs.find_kbd_backlight()?;
        Ok(self.sysfs.read_u64(led.join("brightness"))? as u32)
    }

    /// Set the backlight level (0-3), retrying under pkexec when the
    /// direct write is denied.
    pub fn set_brightness(&self, level: u32) -> Result<()> {
        if level > constants::MAX_KBD_BRIGHTNESS {
            return Err(SysfsError::Unsupported {
                feature: "keyboard brightness above 3",
            }
            .into());
        }

        let led = self.sysfs.find_kbd_backlight()?;
        let node = led.join("brightness");
        let value = level.to_string();
        match self.sysfs.write(&node, &value) {
            Ok(()) => {}
            Err(SysfsError::PermissionDenied { path, .. }) => {
                let script = format!("echo {} > {}", value, path.display());
                exec::run_elevated("sh", &["-c", &script], constants::COMMAND_TIMEOUT_MS)?;
            }
            Err(err) => return Err(err.into()),
        }
        info!(level, "keyboard brightness set");
        Ok(())
    }

    /// Apply a static RGB color through asusctl.
    pub fn set_color(&self, color: Rgb) -> Result<()> {
        self.require_asusctl()?;
        let hex = color.to_hex();
        debug!(color = %hex, "setting keyboard color");
        exec::run_checked(
            constants::CMD_ASUSCTL,
            &["aura", "static", "-c", &hex],
            constants::COMMAND_TIMEOUT_MS,
        )?;
        info!(color = %hex, "keyboard color set");
        Ok(())
    }

    /// Apply a lighting effect through asusctl, with the color used by
    /// effects that take one.
    pub fn set_effect(&self, effect: AuraEffect, color: Rgb) -> Result<()> {
        self.require_asusctl()?;
        if effect == AuraEffect::Off {
            return self.set_brightness(0);
        }

        let mode = effect.asusctl_name();
        let hex = color.to_hex();
        exec::run_checked(
            constants::CMD_ASUSCTL,
            &["aura", mode, "-c", &hex],
            constants::COMMAND_TIMEOUT_MS,
        )?;
        info!(%effect, color = %hex, "keyboard effect set");
        Ok(())
    }

    fn require_asusctl(&self) -> Result<()> {
        if self.has_asusctl {
            Ok(())
        } else {
            Err(SysfsError::Unsupported {
                feature: "RGB control (asusctl not installed)",
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keyboard_mgr(nodes: &[(&str, &str)]) -> (TempDir, KeyboardManager) {
        let dir = TempDir::new().unwrap();
        for (relative, content) in nodes {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let mgr = KeyboardManager::new(Sysfs::at(dir.path()), false);
        (dir, mgr)
    }

    #[test]
    fn test_brightness_round_trip() {
        let (_dir, mgr) = keyboard_mgr(&[("class/leds/asus::kbd_backlight/brightness", "1\n")]);
        assert_eq!(mgr.brightness().unwrap(), 1);
        mgr.set_brightness(3).unwrap();
        assert_eq!(mgr.brightness().unwrap(), 3);
    }

    #[test]
    fn test_brightness_range_enforced() {
        let (_dir, mgr) = keyboard_mgr(&[("class/leds/asus::kbd_backlight/brightness", "1\n")]);
        assert!(mgr.set_brightness(4).is_err());
    }

    #[test]
    fn test_no_backlight_device() {
        let (_dir, mgr) = keyboard_mgr(&[]);
        assert!(mgr.brightness().is_err());
    }

    #[test]
    fn test_rgb_requires_asusctl() {
        let (_dir, mgr) = keyboard_mgr(&[]);
        let err = mgr.set_color(Rgb { r: 255, g: 0, b: 0 }).unwrap_err();
        assert!(err.to_string().contains("asusctl"));
    }
}
