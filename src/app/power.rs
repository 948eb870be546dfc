// linux-armoury - app/power.rs
//
// Power profile application through a chain of backends: pwrcfg (the
// model-specific tool) first, then asusctl, then power-profiles-daemon,
// then the bare ACPI platform_profile node. The first backend that
// succeeds wins; failures fall through to the next with a warning.

use tracing::{debug, info, warn};

use crate::core::detect::{preferred_backend, resolve_capabilities, ProbeReport};
use crate::core::model::{FanCurve, GpuMode, HardwareCapabilities, PowerProfile, ProfileBackend};
use crate::core::parse;
use crate::core::profile::backend_target;
use crate::platform::exec;
use crate::platform::sysfs::Sysfs;
use crate::util::constants;
use crate::util::error::{ArmouryError, Result, SysfsError};

/// Probe PATH and sysfs for everything the app can drive.
pub fn probe_hardware(sysfs: &Sysfs) -> HardwareCapabilities {
    let platform_profiles = sysfs
        .read_trimmed(constants::SYSFS_PLATFORM_PROFILE_CHOICES)
        .map(|choices| {
            choices
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let report = ProbeReport {
        identity: sysfs.dmi_identity(),
        has_pwrcfg: exec::binary_available(constants::CMD_PWRCFG),
        has_asusctl: exec::binary_available(constants::CMD_ASUSCTL),
        has_supergfxctl: supergfxctl_responds(),
        has_power_profiles_daemon: exec::binary_available(constants::CMD_POWERPROFILESCTL),
        has_xrandr: exec::binary_available(constants::CMD_XRANDR),
        has_ryzenadj: exec::binary_available(constants::CMD_RYZENADJ),
        has_sensors: exec::binary_available(constants::CMD_SENSORS),
        has_platform_profile: sysfs.exists(constants::SYSFS_PLATFORM_PROFILE),
        has_charge_control: sysfs
            .find_battery()
            .map(|b| b.join("charge_control_end_threshold").exists())
            .unwrap_or(false),
        has_kbd_backlight: sysfs.find_kbd_backlight().is_ok(),
        has_asus_wmi: sysfs.exists(constants::SYSFS_ASUS_PLATFORM),
        platform_profiles,
    };

    let caps = resolve_capabilities(report);
    debug!(
        is_asus = caps.is_asus,
        model = ?caps.model_match,
        backend = ?preferred_backend(&caps),
        "hardware probe complete"
    );
    caps
}

/// supergfxctl is only a frontend for supergfxd, so a PATH hit is not
/// enough; a short version query confirms the tool actually answers.
fn supergfxctl_responds() -> bool {
    exec::run(
        constants::CMD_SUPERGFXCTL,
        &["--version"],
        constants::PROBE_TIMEOUT_MS,
    )
    .map(|output| output.success())
    .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct PowerManager {
    sysfs: Sysfs,
    caps: HardwareCapabilities,
}

impl PowerManager {
    pub fn new(sysfs: Sysfs, caps: HardwareCapabilities) -> Self {
        Self { sysfs, caps }
    }

    pub fn capabilities(&self) -> &HardwareCapabilities {
        &self.caps
    }

    /// Backends available on this machine, in preference order.
    pub fn backend_chain(&self) -> Vec<ProfileBackend> {
        let mut chain = Vec::new();
        if self.caps.has_pwrcfg {
            chain.push(ProfileBackend::Pwrcfg);
        }
        if self.caps.has_asusctl {
            chain.push(ProfileBackend::Asusctl);
        }
        if self.caps.has_power_profiles_daemon {
            chain.push(ProfileBackend::PowerProfilesDaemon);
        }
        if self.caps.has_platform_profile {
            chain.push(ProfileBackend::PlatformProfile);
        }
        chain
    }

    /// Apply a profile through the first backend that accepts it.
    ///
    /// When the winning backend is not pwrcfg (which sets power limits
    /// itself), the TDP is applied separately through ryzenadj.
    pub fn apply(&self, profile: &PowerProfile) -> Result<ProfileBackend> {
        let chain = self.backend_chain();
        if chain.is_empty() {
            return Err(SysfsError::Unsupported {
                feature: "power profile control",
            }
            .into());
        }

        let mut last_error: Option<ArmouryError> = None;
        for backend in chain {
            match self.apply_via(backend, profile) {
                Ok(()) => {
                    info!(profile = %profile.name, %backend, "profile applied");
                    if backend != ProfileBackend::Pwrcfg && self.caps.has_ryzenadj {
                        if let Err(err) = self.apply_tdp(profile.tdp_watts) {
                            warn!(%err, "profile applied but TDP adjustment failed");
                        }
                    }
                    return Ok(backend);
                }
                Err(err) => {
                    warn!(%backend, %err, "backend failed, trying next");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            SysfsError::Unsupported {
                feature: "power profile control",
            }
            .into()
        }))
    }

    fn apply_via(&self, backend: ProfileBackend, profile: &PowerProfile) -> Result<()> {
        let target = backend_target(&profile.name, backend);
        match backend {
            ProfileBackend::Pwrcfg => {
                exec::run_elevated(
                    constants::CMD_PWRCFG,
                    &[&target],
                    constants::COMMAND_TIMEOUT_MS,
                )?;
            }
            ProfileBackend::Asusctl => {
                exec::run_checked(
                    constants::CMD_ASUSCTL,
                    &["profile", "-P", &target],
                    constants::COMMAND_TIMEOUT_MS,
                )?;
            }
            ProfileBackend::PowerProfilesDaemon => {
                exec::run_checked(
                    constants::CMD_POWERPROFILESCTL,
                    &["set", &target],
                    constants::COMMAND_TIMEOUT_MS,
                )?;
            }
            ProfileBackend::PlatformProfile => {
                self.write_platform_profile(&target)?;
            }
        }
        Ok(())
    }

    /// Write the ACPI platform_profile node, retrying under pkexec when
    /// the direct write is denied.
    fn write_platform_profile(&self, target: &str) -> Result<()> {
        if !self.caps.platform_profiles.is_empty()
            && !self.caps.platform_profiles.iter().any(|p| p == target)
        {
            debug!(
                target,
                choices = ?self.caps.platform_profiles,
                "target not in platform_profile choices, writing anyway"
            );
        }

        match self.sysfs.write(constants::SYSFS_PLATFORM_PROFILE, target) {
            Ok(()) => Ok(()),
            Err(SysfsError::PermissionDenied { path, .. }) => {
                let script = format!("echo {} > {}", target, path.display());
                exec::run_elevated("sh", &["-c", &script], constants::COMMAND_TIMEOUT_MS)?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Set sustained, fast, and slow power limits through ryzenadj.
    pub fn apply_tdp(&self, watts: u32) -> Result<()> {
        let mw = (watts * 1000).to_string();
        let stapm = format!("--stapm-limit={mw}");
        let fast = format!("--fast-limit={mw}");
        let slow = format!("--slow-limit={mw}");
        exec::run_elevated(
            constants::CMD_RYZENADJ,
            &[&stapm, &fast, &slow],
            constants::COMMAND_TIMEOUT_MS,
        )?;
        info!(watts, "TDP limits applied");
        Ok(())
    }

    /// Switch the dGPU routing mode through supergfxctl. Mode changes
    /// often require a logout or reboot before they take effect; the
    /// daemon's reply says which.
    pub fn set_gpu_mode(&self, mode: GpuMode) -> Result<()> {
        if !self.caps.has_supergfxctl {
            return Err(SysfsError::Unsupported {
                feature: "GPU mode switching (supergfxctl not available)",
            }
            .into());
        }
        let output = exec::run_checked(
            constants::CMD_SUPERGFXCTL,
            &["--mode", mode.supergfxctl_name()],
            constants::COMMAND_TIMEOUT_MS,
        )?;
        let reply = output.stdout.to_lowercase();
        if reply.contains("logout") {
            info!(%mode, "GPU mode queued, takes effect after logout");
        } else if reply.contains("reboot") {
            info!(%mode, "GPU mode queued, takes effect after reboot");
        } else {
            info!(%mode, "GPU mode set");
        }
        Ok(())
    }

    /// Enable the fan curve attached to the matching asusd throttle
    /// profile.
    pub fn set_fan_curve(&self, curve: FanCurve) -> Result<()> {
        if !self.caps.has_asusctl {
            return Err(SysfsError::Unsupported {
                feature: "fan curves (asusctl not installed)",
            }
            .into());
        }
        exec::run_checked(
            constants::CMD_ASUSCTL,
            &["fan-curve", "-m", curve.asusctl_profile(), "-e", "true"],
            constants::COMMAND_TIMEOUT_MS,
        )?;
        info!(%curve, "fan curve enabled");
        Ok(())
    }

    /// Read back the current sustained TDP limit from ryzenadj.
    pub fn current_tdp(&self) -> Option<u32> {
        if !self.caps.has_ryzenadj {
            return None;
        }
        let output = exec::run_elevated(
            constants::CMD_RYZENADJ,
            &["-i"],
            constants::QUERY_TIMEOUT_MS,
        )
        .ok()?;
        parse::ryzenadj_stapm_limit(&output.stdout)
    }

    /// The active profile name as reported by the best query-capable
    /// backend, or `None` when nothing can be queried.
    pub fn current_profile(&self) -> Option<String> {
        if self.caps.has_asusctl {
            if let Ok(output) = exec::run(
                constants::CMD_ASUSCTL,
                &["profile", "-p"],
                constants::QUERY_TIMEOUT_MS,
            ) {
                if let Some(name) = parse::asusctl_active_profile(&output.stdout) {
                    return Some(name);
                }
            }
        }
        if self.caps.has_power_profiles_daemon {
            if let Ok(output) = exec::run(
                constants::CMD_POWERPROFILESCTL,
                &["get"],
                constants::QUERY_TIMEOUT_MS,
            ) {
                if let Some(name) = parse::ppd_active_profile(&output.stdout) {
                    return Some(name);
                }
            }
        }
        if self.caps.has_platform_profile {
            if let Ok(current) = self.sysfs.read_trimmed(constants::SYSFS_PLATFORM_PROFILE) {
                if !current.is_empty() {
                    return Some(current);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_sysfs_with(nodes: &[(&str, &str)]) -> (TempDir, Sysfs) {
        let dir = TempDir::new().unwrap();
        for (relative, content) in nodes {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let sysfs = Sysfs::at(dir.path());
        (dir, sysfs)
    }

    #[test]
    fn test_probe_reads_platform_profile_choices() {
        let (_dir, sysfs) = fake_sysfs_with(&[
            ("firmware/acpi/platform_profile", "balanced\n"),
            (
                "firmware/acpi/platform_profile_choices",
                "quiet balanced performance\n",
            ),
        ]);
        let caps = probe_hardware(&sysfs);
        assert!(caps.has_platform_profile);
        assert_eq!(
            caps.platform_profiles,
            vec!["quiet", "balanced", "performance"]
        );
    }

    #[test]
    fn test_backend_chain_order() {
        let (_dir, sysfs) = fake_sysfs_with(&[]);
        let caps = HardwareCapabilities {
            has_asusctl: true,
            has_platform_profile: true,
            ..Default::default()
        };
        let mgr = PowerManager::new(sysfs, caps);
        assert_eq!(
            mgr.backend_chain(),
            vec![ProfileBackend::Asusctl, ProfileBackend::PlatformProfile]
        );
    }

    #[test]
    fn test_apply_with_no_backend() {
        let (_dir, sysfs) = fake_sysfs_with(&[]);
        let mgr = PowerManager::new(sysfs, HardwareCapabilities::default());
        let profile = crate::core::profile::builtin_profiles().remove(0);
        assert!(mgr.apply(&profile).is_err());
    }

    #[test]
    fn test_gpu_and_fan_control_require_their_tools() {
        let (_dir, sysfs) = fake_sysfs_with(&[]);
        let mgr = PowerManager::new(sysfs, HardwareCapabilities::default());
        assert!(mgr.set_gpu_mode(GpuMode::Eco).is_err());
        assert!(mgr.set_fan_curve(FanCurve::Performance).is_err());
    }

    #[test]
    fn test_platform_profile_write() {
        let (dir, sysfs) = fake_sysfs_with(&[("firmware/acpi/platform_profile", "balanced\n")]);
        let caps = HardwareCapabilities {
            has_platform_profile: true,
            ..Default::default()
        };
        let mgr = PowerManager::new(sysfs, caps);
        let mut profile = crate::core::profile::builtin_profiles().remove(0);
        profile.name = "quiet".to_string();

        let backend = mgr.apply(&profile).unwrap();
        assert_eq!(backend, ProfileBackend::PlatformProfile);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("firmware/acpi/platform_profile")).unwrap(),
            "quiet"
        );
    }

    #[test]
    fn test_current_profile_from_platform_node() {
        let (_dir, sysfs) = fake_sysfs_with(&[("firmware/acpi/platform_profile", "performance\n")]);
        let caps = HardwareCapabilities {
            has_platform_profile: true,
            ..Default::default()
        };
        let mgr = PowerManager::new(sysfs, caps);
        assert_eq!(mgr.current_profile().as_deref(), Some("performance"));
    }
}
