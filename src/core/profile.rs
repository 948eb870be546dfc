// linux-armoury - core/profile.rs
//
// Power profile definitions: the built-in preset table, JSON parsing and
// validation for user-saved profiles, and the mapping from generic profile
// names to the vocabulary each backend understands.
//
// Core layer: accepts JSON strings and returns validated records, never
// touches the filesystem. I/O is handled by app::profile_mgr.

use crate::core::model::{AuraEffect, FanCurve, GpuMode, PowerProfile, ProfileBackend, Rgb};
use crate::util::constants;
use crate::util::error::ProfileError;
use std::path::Path;

// =============================================================================
// Built-in profiles
// =============================================================================

/// The preset table, ordered from lowest to highest power draw.
///
/// TDP/refresh pairs follow the GZ302EA pwrcfg presets; the GPU, fan, and
/// lighting fields fill in sensible companions for each power tier.
pub fn builtin_profiles() -> Vec<PowerProfile> {
    vec![
        PowerProfile {
            name: "emergency".to_string(),
            tdp_watts: 10,
            refresh_hz: Some(30),
            gpu_mode: GpuMode::Eco,
            fan_curve: FanCurve::Silent,
            rgb_brightness: 0,
            rgb_effect: AuraEffect::Off,
            rgb_color: Rgb::WHITE,
            battery_limit: 80,
            description: "Critical battery preservation".to_string(),
        },
        PowerProfile {
            name: "battery".to_string(),
            tdp_watts: 18,
            refresh_hz: Some(30),
            gpu_mode: GpuMode::Eco,
            fan_curve: FanCurve::Silent,
            rgb_brightness: 0,
            rgb_effect: AuraEffect::Off,
            rgb_color: Rgb::WHITE,
            battery_limit: 80,
            description: "Maximum battery life".to_string(),
        },
        PowerProfile {
            name: "efficient".to_string(),
            tdp_watts: 30,
            refresh_hz: Some(60),
            gpu_mode: GpuMode::Hybrid,
            fan_curve: FanCurve::Quiet,
            rgb_brightness: 30,
            rgb_effect: AuraEffect::Static,
            rgb_color: Rgb::WHITE,
            battery_limit: 80,
            description: "Balanced efficiency".to_string(),
        },
        PowerProfile {
            name: "balanced".to_string(),
            tdp_watts: 40,
            refresh_hz: Some(90),
            gpu_mode: GpuMode::Hybrid,
            fan_curve: FanCurve::Balanced,
            rgb_brightness: 50,
            rgb_effect: AuraEffect::Static,
            rgb_color: Rgb::WHITE,
            battery_limit: 80,
            description: "Default balanced mode".to_string(),
        },
        PowerProfile {
            name: "performance".to_string(),
            tdp_watts: 55,
            refresh_hz: Some(120),
            gpu_mode: GpuMode::Hybrid,
            fan_curve: FanCurve::Performance,
            rgb_brightness: 80,
            rgb_effect: AuraEffect::Static,
            rgb_color: Rgb::WHITE,
            battery_limit: 100,
            description: "High performance".to_string(),
        },
        PowerProfile {
            name: "gaming".to_string(),
            tdp_watts: 70,
            refresh_hz: Some(180),
            gpu_mode: GpuMode::Ultimate,
            fan_curve: FanCurve::Performance,
            rgb_brightness: 100,
            rgb_effect: AuraEffect::Rainbow,
            rgb_color: Rgb::WHITE,
            battery_limit: 100,
            description: "Gaming optimized".to_string(),
        },
        PowerProfile {
            name: "maximum".to_string(),
            tdp_watts: 90,
            refresh_hz: Some(180),
            gpu_mode: GpuMode::Ultimate,
            fan_curve: FanCurve::Performance,
            rgb_brightness: 100,
            rgb_effect: AuraEffect::Rainbow,
            rgb_color: Rgb::WHITE,
            battery_limit: 100,
            description: "Absolute maximum".to_string(),
        },
    ]
}

// =============================================================================
// JSON parsing and validation
// =============================================================================

/// Parse a JSON string into a `PowerProfile`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_profile_json(content: &str, source_path: &Path) -> Result<PowerProfile, ProfileError> {
    serde_json::from_str(content).map_err(|e| ProfileError::JsonParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a profile against the hardware limits in `util::constants`.
///
/// Checks:
/// - name is non-empty
/// - TDP is within the model's safe range
/// - refresh rate (when set) is one the panel offers
/// - battery limit and RGB brightness are within bounds
pub fn validate(profile: &PowerProfile) -> Result<(), ProfileError> {
    if profile.name.trim().is_empty() {
        return Err(ProfileError::MissingField {
            profile: "(empty)".to_string(),
            field: "name",
        });
    }

    if !(constants::MIN_TDP_WATTS..=constants::MAX_TDP_WATTS).contains(&profile.tdp_watts) {
        return Err(ProfileError::OutOfRange {
            profile: profile.name.clone(),
            field: "tdp_watts",
            value: i64::from(profile.tdp_watts),
            min: i64::from(constants::MIN_TDP_WATTS),
            max: i64::from(constants::MAX_TDP_WATTS),
        });
    }

    if let Some(rate) = profile.refresh_hz {
        if !constants::SUPPORTED_REFRESH_RATES.contains(&rate) {
            return Err(ProfileError::UnsupportedRefreshRate {
                profile: profile.name.clone(),
                rate,
            });
        }
    }

    if !(constants::MIN_CHARGE_LIMIT..=constants::MAX_CHARGE_LIMIT).contains(&profile.battery_limit)
    {
        return Err(ProfileError::OutOfRange {
            profile: profile.name.clone(),
            field: "battery_limit",
            value: i64::from(profile.battery_limit),
            min: i64::from(constants::MIN_CHARGE_LIMIT),
            max: i64::from(constants::MAX_CHARGE_LIMIT),
        });
    }

    if profile.rgb_brightness > 100 {
        return Err(ProfileError::OutOfRange {
            profile: profile.name.clone(),
            field: "rgb_brightness",
            value: i64::from(profile.rgb_brightness),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Backend name mapping
// =============================================================================

/// Translate a generic profile name into the vocabulary a backend accepts.
///
/// pwrcfg understands the full preset names directly; asusctl and
/// power-profiles-daemon only have three tiers, so the presets collapse
/// onto their nearest tier. The platform_profile sysfs node takes the
/// generic name verbatim (the kernel validates it against its choices).
pub fn backend_target(profile_name: &str, backend: ProfileBackend) -> String {
    let lower = profile_name.to_lowercase();
    match backend {
        ProfileBackend::Pwrcfg | ProfileBackend::PlatformProfile => lower,
        ProfileBackend::Asusctl => match lower.as_str() {
            "emergency" | "silent" | "battery" | "power-saver" | "low-power" => {
                "Quiet".to_string()
            }
            "performance" | "gaming" | "turbo" | "maximum" => "Performance".to_string(),
            _ => "Balanced".to_string(),
        },
        ProfileBackend::PowerProfilesDaemon => match lower.as_str() {
            "emergency" | "silent" | "quiet" | "battery" | "low-power" => {
                "power-saver".to_string()
            }
            "performance" | "gaming" | "turbo" | "maximum" => "performance".to_string(),
            _ => "balanced".to_string(),
        },
    }
}

/// The profile names a backend can report/apply, for --list and validation.
pub fn backend_profile_names(backend: ProfileBackend) -> Vec<&'static str> {
    match backend {
        ProfileBackend::Pwrcfg => vec![
            "emergency",
            "battery",
            "efficient",
            "balanced",
            "performance",
            "gaming",
            "maximum",
        ],
        ProfileBackend::Asusctl => vec!["Quiet", "Balanced", "Performance"],
        ProfileBackend::PowerProfilesDaemon => vec!["power-saver", "balanced", "performance"],
        // The kernel publishes its own list via platform_profile_choices;
        // this is the fallback when that node is unreadable.
        ProfileBackend::PlatformProfile => vec!["balanced"],
    }
}

// =============================================================================
// Tests
// =============================================================================
