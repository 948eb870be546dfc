// linux-armoury - core/detect.rs
//
// Hardware identification logic. Pure functions over a probe report
// assembled by the platform layer, so capability resolution is testable
// without ASUS hardware.

use crate::core::model::{DmiIdentity, HardwareCapabilities, ProfileBackend};

/// Known ASUS gaming laptop families and the DMI product substrings that
/// identify them. Matching is best effort; unmatched ASUS machines still
/// get full functionality, just without a friendly model name.
const SUPPORTED_MODELS: &[(&str, &str)] = &[
    ("GA401", "ROG Zephyrus G14"),
    ("GA402", "ROG Zephyrus G14"),
    ("GA403", "ROG Zephyrus G14"),
    ("GU603", "ROG Zephyrus M16"),
    ("GU604", "ROG Zephyrus M16"),
    ("GV301", "ROG Flow X13"),
    ("GV302", "ROG Flow X13"),
    ("GZ301", "ROG Flow Z13"),
    ("G513", "ROG Strix G15"),
    ("G533", "ROG Strix Scar 15"),
    ("G713", "ROG Strix G17"),
    ("G733", "ROG Strix Scar 17"),
    ("FA506", "TUF Gaming A15"),
    ("FA507", "TUF Gaming A15"),
    ("FX506", "TUF Gaming F15"),
    ("FA706", "TUF Gaming A17"),
];

/// Raw findings from the platform probe pass. Every field is the direct
/// result of one check; interpretation happens in [`resolve_capabilities`].
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub identity: DmiIdentity,
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
    pub platform_profiles: Vec<String>,
}

/// True when the DMI vendor string identifies an ASUS machine.
pub fn is_asus_vendor(vendor: &str) -> bool {
    let lower = vendor.to_lowercase();
    lower.contains("asus") || lower.contains("asustek")
}

/// Look up the friendly model name for a DMI product string.
pub fn match_model(product: &str) -> Option<&'static str> {
    let upper = product.to_uppercase();
    SUPPORTED_MODELS
        .iter()
        .find(|(code, _)| upper.contains(code))
        .map(|(_, name)| *name)
}

/// Fold a probe report into the capability set the app layer acts on.
pub fn resolve_capabilities(report: ProbeReport) -> HardwareCapabilities {
    let is_asus = report
        .identity
        .vendor
        .as_deref()
        .map(is_asus_vendor)
        .unwrap_or(false)
        || report
            .identity
            .board
            .as_deref()
            .map(is_asus_vendor)
            .unwrap_or(false);
    let model_match = report.identity.product.as_deref().and_then(match_model);

    HardwareCapabilities {
        is_asus,
        model_match,
        has_pwrcfg: report.has_pwrcfg,
        has_asusctl: report.has_asusctl,
        has_supergfxctl: report.has_supergfxctl,
        has_power_profiles_daemon: report.has_power_profiles_daemon,
        has_xrandr: report.has_xrandr,
        has_ryzenadj: report.has_ryzenadj,
        has_sensors: report.has_sensors,
        has_platform_profile: report.has_platform_profile,
        has_charge_control: report.has_charge_control,
        has_kbd_backlight: report.has_kbd_backlight,
        has_asus_wmi: report.has_asus_wmi,
        platform_profiles: report.platform_profiles,
        identity: report.identity,
    }
}

/// Pick the best available profile backend, in fixed preference order.
///
/// `pwrcfg` is the model-specific tool and always wins when present;
/// the bare sysfs platform_profile node is the last resort.
pub fn preferred_backend(caps: &HardwareCapabilities) -> Option<ProfileBackend> {
    if caps.has_pwrcfg {
        Some(ProfileBackend::Pwrcfg)
    } else if caps.has_asusctl {
        Some(ProfileBackend::Asusctl)
    } else if caps.has_power_profiles_daemon {
        Some(ProfileBackend::PowerProfilesDaemon)
    } else if caps.has_platform_profile {
        Some(ProfileBackend::PlatformProfile)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asus_identity() -> DmiIdentity {
        DmiIdentity {
            vendor: Some("ASUSTeK COMPUTER INC.".to_string()),
            product: Some("ROG Zephyrus G14 GA402RJ_GA402RJ".to_string()),
            version: Some("1.0".to_string()),
            board: Some("GA402RJ".to_string()),
        }
    }

    #[test]
    fn test_asus_vendor_detection() {
        assert!(is_asus_vendor("ASUSTeK COMPUTER INC."));
        assert!(is_asus_vendor("ASUS"));
        assert!(!is_asus_vendor("LENOVO"));
        assert!(!is_asus_vendor(""));
    }

    #[test]
    fn test_model_matching() {
        assert_eq!(
            match_model("ROG Zephyrus G14 GA402RJ_GA402RJ"),
            Some("ROG Zephyrus G14")
        );
        assert_eq!(match_model("TUF Gaming A15 FA507RM"), Some("TUF Gaming A15"));
        assert_eq!(match_model("ThinkPad X1 Carbon"), None);
    }

    #[test]
    fn test_resolve_capabilities_asus() {
        let report = ProbeReport {
            identity: asus_identity(),
            has_asusctl: true,
            ..Default::default()
        };
        let caps = resolve_capabilities(report);
        assert!(caps.is_asus);
        assert_eq!(caps.model_match, Some("ROG Zephyrus G14"));
        assert!(caps.has_asusctl);
        assert!(!caps.has_pwrcfg);
    }

    #[test]
    fn test_resolve_capabilities_non_asus() {
        let report = ProbeReport {
            identity: DmiIdentity {
                vendor: Some("LENOVO".to_string()),
                product: Some("21CB".to_string()),
                version: Some("ThinkPad".to_string()),
                board: Some("21CB".to_string()),
            },
            ..Default::default()
        };
        let caps = resolve_capabilities(report);
        assert!(!caps.is_asus);
        assert_eq!(caps.model_match, None);
    }

    #[test]
    fn test_backend_preference_order() {
        let mut caps = resolve_capabilities(ProbeReport {
            identity: asus_identity(),
            has_pwrcfg: true,
            has_asusctl: true,
            has_power_profiles_daemon: true,
            has_platform_profile: true,
            ..Default::default()
        });
        assert_eq!(preferred_backend(&caps), Some(ProfileBackend::Pwrcfg));

        caps.has_pwrcfg = false;
        assert_eq!(preferred_backend(&caps), Some(ProfileBackend::Asusctl));

        caps.has_asusctl = false;
        assert_eq!(
            preferred_backend(&caps),
            Some(ProfileBackend::PowerProfilesDaemon)
        );

        caps.has_power_profiles_daemon = false;
        assert_eq!(
            preferred_backend(&caps),
            Some(ProfileBackend::PlatformProfile)
        );

        caps.has_platform_profile = false;
        assert_eq!(preferred_backend(&caps), None);
    }
}
