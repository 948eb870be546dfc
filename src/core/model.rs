// linux-armoury - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no platform
// dependencies (core depends on std, serde, and chrono only).
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Power profile (the central configuration record)
// =============================================================================

/// A complete system configuration preset: power cap, display rate, GPU
/// routing, fan curve, keyboard lighting, and battery charge policy.
///
/// Either one of the built-in presets or a user-saved JSON file under the
/// profiles directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerProfile {
    /// Unique profile name (case-insensitive lookup key).
    pub name: String,

    /// CPU/GPU package power cap applied via pwrcfg or ryzenadj (watts).
    pub tdp_watts: u32,

    /// Display refresh rate to apply, or `None` to leave the panel alone.
    #[serde(default)]
    pub refresh_hz: Option<u32>,

    /// dGPU routing mode.
    #[serde(default)]
    pub gpu_mode: GpuMode,

    /// Fan curve preset label understood by asusd.
    #[serde(default)]
    pub fan_curve: FanCurve,

    /// Keyboard backlight brightness in percent (0-100).
    #[serde(default)]
    pub rgb_brightness: u8,

    /// Keyboard lighting effect.
    #[serde(default)]
    pub rgb_effect: AuraEffect,

    /// Keyboard lighting color.
    #[serde(default = "default_rgb_color")]
    pub rgb_color: Rgb,

    /// Battery charge_control_end_threshold value (20-100).
    #[serde(default = "default_battery_limit")]
    pub battery_limit: u8,

    /// Human-readable summary shown by --list.
    #[serde(default)]
    pub description: String,
}

fn default_battery_limit() -> u8 {
    100
}

fn default_rgb_color() -> Rgb {
    Rgb::WHITE
}

impl PowerProfile {
    /// One-line summary used by --list and log messages.
    pub fn summary(&self) -> String {
        match self.refresh_hz {
            Some(hz) => format!("{}W @ {}Hz - {}", self.tdp_watts, hz, self.description),
            None => format!("{}W - {}", self.tdp_watts, self.description),
        }
    }
}

/// Whether a profile shipped with the application or was saved by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Builtin,
    Custom,
}

// =============================================================================
// Hardware enums
// =============================================================================

/// dGPU routing mode (supergfxctl vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GpuMode {
    /// iGPU only, dGPU powered down.
    Eco,
    /// dGPU available on demand.
    #[default]
    Hybrid,
    /// dGPU drives the panel directly.
    Ultimate,
}

impl GpuMode {
    /// The mode name supergfxctl expects on the command line.
    pub fn supergfxctl_name(&self) -> &'static str {
        match self {
            Self::Eco => "Integrated",
            Self::Hybrid => "Hybrid",
            Self::Ultimate => "AsusMuxDgpu",
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Fan curve preset labels understood by asusd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FanCurve {
    Silent,
    Quiet,
    #[default]
    Balanced,
    Performance,
}

impl FanCurve {
    /// The asusctl fan-curve profile this preset attaches to. asusd
    /// keys curves by throttle profile and has no Silent tier, so
    /// Silent shares the Quiet curve.
    pub fn asusctl_profile(&self) -> &'static str {
        match self {
            Self::Silent | Self::Quiet => "Quiet",
            Self::Balanced => "Balanced",
            Self::Performance => "Performance",
        }
    }
}

impl fmt::Display for FanCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Keyboard aura lighting effects supported by asusctl led-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuraEffect {
    Off,
    #[default]
    Static,
    Breathe,
    Pulse,
    Rainbow,
    Strobe,
}

impl AuraEffect {
    /// The mode name asusctl expects on the command line.
    pub fn asusctl_name(&self) -> &'static str {
        match self {
            Self::Off | Self::Static => "static",
            Self::Breathe => "breathe",
            Self::Pulse => "pulse",
            Self::Rainbow => "rainbow-cycle",
            Self::Strobe => "strobe",
        }
    }
}

impl fmt::Display for AuraEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// =============================================================================
// RGB colour
// =============================================================================

/// An RGB keyboard colour with hex parse/format helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Parse a `#rrggbb` or `rrggbb` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Format as a lowercase `rrggbb` string (the form asusctl accepts).
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// =============================================================================
// Power source
// =============================================================================

/// Where the machine is currently drawing power from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSource {
    Ac,
    Battery,
}

impl PowerSource {
    /// Map a battery `status` sysfs string to a power source.
    ///
    /// "Charging", "Full", and "Not charging" all mean the adapter is
    /// plugged in; "Discharging" (and anything unknown) means battery.
    pub fn from_battery_status(status: &str) -> Self {
        match status.trim() {
            "Charging" | "Full" | "Not charging" => Self::Ac,
            _ => Self::Battery,
        }
    }
}

impl fmt::Display for PowerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ac => write!(f, "AC"),
            Self::Battery => write!(f, "Battery"),
        }
    }
}

// =============================================================================
// Charge limit presets
// =============================================================================

/// Named battery charge limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeLimitPreset {
    /// 100%: full capacity when maximum runtime matters.
    Full,
    /// 80%: the recommended daily-driver limit.
    Balanced,
    /// 60%: for machines that live on the charger.
    MaxLifespan,
}

impl ChargeLimitPreset {
    pub fn percent(self) -> u8 {
        match self {
            Self::Full => 100,
            Self::Balanced => 80,
            Self::MaxLifespan => 60,
        }
    }
}

// =============================================================================
// Profile backend
// =============================================================================

/// The mechanism used to apply a power profile, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileBackend {
    /// Model-specific pwrcfg script (GZ302-Linux-Setup), run under pkexec.
    Pwrcfg,
    /// asusctl profile command.
    Asusctl,
    /// power-profiles-daemon via powerprofilesctl.
    PowerProfilesDaemon,
    /// Direct write to /sys/firmware/acpi/platform_profile (root only).
    PlatformProfile,
}

impl fmt::Display for ProfileBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pwrcfg => write!(f, "pwrcfg"),
            Self::Asusctl => write!(f, "asusctl"),
            Self::PowerProfilesDaemon => write!(f, "power-profiles-daemon"),
            Self::PlatformProfile => write!(f, "platform_profile"),
        }
    }
}

// =============================================================================
// Status snapshot
// =============================================================================

/// A point-in-time reading of everything the status display, the monitor
/// loop, the auto-switch daemon, and hooks care about.
///
/// Every field is best-effort: `None` means the reading was unavailable on
/// this machine, not that something failed fatally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    /// CPU package temperature (celsius).
    pub cpu_temp_c: Option<f64>,

    /// GPU edge temperature (celsius).
    pub gpu_temp_c: Option<f64>,

    /// Battery charge percentage.
    pub battery_percent: Option<u8>,

    /// Current power source, if the adapter state could be read.
    pub power_source: Option<PowerSource>,

    /// Current panel refresh rate (Hz).
    pub refresh_hz: Option<u32>,

    /// Name of the active power profile as reported by the backend.
    pub active_profile: Option<String>,

    /// Current sustained TDP limit (watts), read from ryzenadj.
    pub tdp_watts: Option<u32>,

    /// True when a known game or gaming launcher process is running.
    pub gaming_active: bool,
}

// =============================================================================
// Hardware identity and capabilities
// =============================================================================

/// DMI identity strings read from /sys/class/dmi/id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DmiIdentity {
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub board: Option<String>,
}

/// What this machine supports, assembled from sysfs and PATH probes.
#[derive(Debug, Clone, Default)]
pub struct HardwareCapabilities {
    pub identity: DmiIdentity,
    pub is_asus: bool,
    /// Matched supported-model identifier, if any.
    pub model_match: Option<&'static str>,
    pub has_pwrcfg: bool,
    pub has_asusctl: bool,
    pub has_supergfxctl: bool,
    pub has_power_profiles_daemon: bool,
    pub has_xrandr: bool,
    pub has_ryzenadj: bool,
    pub has_sensors: bool,
    pub has_platform_profile: bool,
    pub has_charge_control: bool,
    pub has_kbd_backlight: bool,
    pub has_asus_wmi: bool,
    /// Choices exposed by platform_profile_choices, if present.
    pub platform_profiles: Vec<String>,
}

// =============================================================================
// Auto-switch events
// =============================================================================

/// Messages emitted by the auto-switch daemon over its mpsc channel.
#[derive(Debug, Clone)]
pub enum AutoSwitchEvent {
    /// The poll loop has started.
    Started,
    /// The power source changed and a profile was applied.
    Switched {
        source: PowerSource,
        profile: String,
    },
    /// The power source changed but applying the profile failed.
    SwitchFailed {
        source: PowerSource,
        profile: String,
        message: String,
    },
    /// The AC state could not be read this tick (last state retained).
    ReadError { message: String },
    /// The loop observed the cancel flag and exited.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_mode_and_fan_curve_command_names() {
        assert_eq!(GpuMode::Eco.supergfxctl_name(), "Integrated");
        assert_eq!(GpuMode::Hybrid.supergfxctl_name(), "Hybrid");
        assert_eq!(GpuMode::Ultimate.supergfxctl_name(), "AsusMuxDgpu");
        assert_eq!(FanCurve::Silent.asusctl_profile(), "Quiet");
        assert_eq!(FanCurve::Balanced.asusctl_profile(), "Balanced");
        assert_eq!(FanCurve::Performance.asusctl_profile(), "Performance");
    }

    #[test]
    fn test_rgb_hex_round_trip() {
        let c = Rgb::from_hex("#ff0066").unwrap();
        assert_eq!(c, Rgb { r: 255, g: 0, b: 102 });
        assert_eq!(c.to_hex(), "ff0066");

        // Without the leading hash
        assert_eq!(Rgb::from_hex("00ff00"), Some(Rgb { r: 0, g: 255, b: 0 }));
    }

    #[test]
    fn test_rgb_rejects_malformed() {
        assert!(Rgb::from_hex("").is_none());
        assert!(Rgb::from_hex("#fff").is_none());
        assert!(Rgb::from_hex("zzzzzz").is_none());
        assert!(Rgb::from_hex("#ff00661").is_none());
    }

    #[test]
    fn test_power_source_from_battery_status() {
        assert_eq!(PowerSource::from_battery_status("Charging"), PowerSource::Ac);
        assert_eq!(PowerSource::from_battery_status("Full"), PowerSource::Ac);
        assert_eq!(
            PowerSource::from_battery_status("Not charging"),
            PowerSource::Ac
        );
        assert_eq!(
            PowerSource::from_battery_status("Discharging"),
            PowerSource::Battery
        );
        // Unknown strings fail towards battery: the conservative profile.
        assert_eq!(
            PowerSource::from_battery_status("garbage"),
            PowerSource::Battery
        );
    }

    #[test]
    fn test_charge_preset_percentages() {
        assert_eq!(ChargeLimitPreset::Full.percent(), 100);
        assert_eq!(ChargeLimitPreset::Balanced.percent(), 80);
        assert_eq!(ChargeLimitPreset::MaxLifespan.percent(), 60);
    }

    #[test]
    fn test_profile_json_round_trip() {
        let profile = PowerProfile {
            name: "Custom Gaming".to_string(),
            tdp_watts: 70,
            refresh_hz: Some(180),
            gpu_mode: GpuMode::Ultimate,
            fan_curve: FanCurve::Performance,
            rgb_brightness: 100,
            rgb_effect: AuraEffect::Rainbow,
            rgb_color: Rgb { r: 255, g: 32, b: 48 },
            battery_limit: 100,
            description: "test".to_string(),
        };

        let json = serde_json::to_string_pretty(&profile).unwrap();
        let back: PowerProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_json_defaults_fill_missing_fields() {
        // Minimal document a user might write by hand.
        let json = r#"{ "name": "minimal", "tdp_watts": 25 }"#;
        let profile: PowerProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.refresh_hz, None);
        assert_eq!(profile.gpu_mode, GpuMode::Hybrid);
        assert_eq!(profile.fan_curve, FanCurve::Balanced);
        assert_eq!(profile.battery_limit, 100);
    }
}
