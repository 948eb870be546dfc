// linux-armoury - app/battery.rs
//
// Battery state and charge limit control through sysfs. The charge limit
// node (charge_control_end_threshold) is ASUS-specific and root-only;
// writes retry under pkexec when denied.

use tracing::{debug, info};

use crate::core::model::{ChargeLimitPreset, PowerSource};
use crate::platform::exec;
use crate::platform::sysfs::Sysfs;
use crate::util::constants;
use crate::util::error::{Result, SysfsError};

#[derive(Debug, Clone)]
pub struct BatteryManager {
    sysfs: Sysfs,
}

impl BatteryManager {
    pub fn new(sysfs: Sysfs) -> Self {
        Self { sysfs }
    }

    /// Battery charge percentage.
    pub fn capacity(&self) -> Result<u8> {
        let battery = self.sysfs.find_battery()?;
        let raw = self.sysfs.read_u64(battery.join("capacity"))?;
        Ok(raw.min(100) as u8)
    }

    /// Battery status string as reported by the kernel
    /// ("Charging", "Discharging", "Full", "Not charging").
    pub fn status(&self) -> Result<String> {
        let battery = self.sysfs.find_battery()?;
        Ok(self.sysfs.read_trimmed(battery.join("status"))?)
    }

    /// Whether the machine runs on AC or battery.
    ///
    /// The AC adapter's `online` node is authoritative when present; the
    /// battery status string is the fallback.
    pub fn power_source(&self) -> Result<PowerSource> {
        if let Ok(adapter) = self.sysfs.find_ac_adapter() {
            if let Ok(online) = self.sysfs.read_u64(adapter.join("online")) {
                return Ok(if online == 1 {
                    PowerSource::Ac
                } else {
                    PowerSource::Battery
                });
            }
        }
        let status = self.status()?;
        Ok(PowerSource::from_battery_status(&status))
    }

    /// Current charge limit percentage.
    pub fn charge_limit(&self) -> Result<u8> {
        let node = self.charge_limit_node()?;
        let raw = self.sysfs.read_u64(&node)?;
        Ok(raw.min(100) as u8)
    }

    /// Set the charge limit, retrying under pkexec when the direct write
    /// is denied.
    pub fn set_charge_limit(&self, percent: u8) -> Result<()> {
        if !(constants::MIN_CHARGE_LIMIT..=constants::MAX_CHARGE_LIMIT).contains(&percent) {
            return Err(SysfsError::Unsupported {
                feature: "charge limit outside 20-100",
            }
            .into());
        }

        let node = self.charge_limit_node()?;
        let value = percent.to_string();
        match self.sysfs.write(&node, &value) {
            Ok(()) => {}
            Err(SysfsError::PermissionDenied { path, .. }) => {
                let script = format!("echo {} > {}", value, path.display());
                exec::run_elevated("sh", &["-c", &script], constants::COMMAND_TIMEOUT_MS)?;
            }
            Err(err) => return Err(err.into()),
        }
        info!(percent, "charge limit set");
        Ok(())
    }

    pub fn set_charge_preset(&self, preset: ChargeLimitPreset) -> Result<()> {
        debug!(?preset, "applying charge preset");
        self.set_charge_limit(preset.percent())
    }

    fn charge_limit_node(&self) -> Result<std::path::PathBuf> {
        let battery = self.sysfs.find_battery()?;
        let node = battery.join("charge_control_end_threshold");
        if node.exists() {
            Ok(node)
        } else {
            Err(SysfsError::Unsupported {
                feature: "charge limit control",
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn battery_mgr(nodes: &[(&str, &str)]) -> (TempDir, BatteryManager) {
        let dir = TempDir::new().unwrap();
        for (relative, content) in nodes {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let mgr = BatteryManager::new(Sysfs::at(dir.path()));
        (dir, mgr)
    }

    #[test]
    fn test_capacity_and_status() {
        let (_dir, mgr) = battery_mgr(&[
            ("class/power_supply/BAT0/capacity", "73\n"),
            ("class/power_supply/BAT0/status", "Discharging\n"),
        ]);
        assert_eq!(mgr.capacity().unwrap(), 73);
        assert_eq!(mgr.status().unwrap(), "Discharging");
    }

    #[test]
    fn test_power_source_prefers_adapter_node() {
        let (_dir, mgr) = battery_mgr(&[
            ("class/power_supply/AC0/online", "1\n"),
            ("class/power_supply/BAT0/status", "Discharging\n"),
        ]);
        assert_eq!(mgr.power_source().unwrap(), PowerSource::Ac);
    }

    #[test]
    fn test_power_source_falls_back_to_status() {
        let (_dir, mgr) = battery_mgr(&[("class/power_supply/BAT0/status", "Charging\n")]);
        assert_eq!(mgr.power_source().unwrap(), PowerSource::Ac);
    }

    #[test]
    fn test_charge_limit_round_trip() {
        let (dir, mgr) = battery_mgr(&[(
            "class/power_supply/BAT0/charge_control_end_threshold",
            "100\n",
        )]);
        mgr.set_charge_limit(80).unwrap();
        assert_eq!(mgr.charge_limit().unwrap(), 80);
        assert!(dir
            .path()
            .join(Path::new(
                "class/power_supply/BAT0/charge_control_end_threshold"
            ))
            .exists());
    }

    #[test]
    fn test_charge_limit_validation() {
        let (_dir, mgr) = battery_mgr(&[(
            "class/power_supply/BAT0/charge_control_end_threshold",
            "100\n",
        )]);
        assert!(mgr.set_charge_limit(10).is_err());
        assert!(mgr.set_charge_limit(100).is_ok());
    }

    #[test]
    fn test_charge_limit_unsupported() {
        let (_dir, mgr) = battery_mgr(&[("class/power_supply/BAT0/capacity", "50\n")]);
        assert!(mgr.charge_limit().is_err());
    }
}
