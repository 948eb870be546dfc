// linux-armoury - core/parse.rs
//
// Pure parsers for external tool output. Content in, values out: the
// platform layer captures stdout and feeds it here, so every quirk of the
// vendor tools' text formats is testable without the tools installed.

use crate::util::constants;
use regex::Regex;

// =============================================================================
// xrandr
// =============================================================================

/// Extract the primary connected output name from `xrandr --query` output.
///
/// Prefers the output flagged `connected primary`; falls back to the first
/// connected output when no primary is flagged.
pub fn xrandr_primary_output(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        if line.contains(" connected primary") {
            return line.split_whitespace().next().map(str::to_string);
        }
    }

    for line in stdout.lines() {
        if line.contains(" connected") && !line.contains("disconnected") {
            return line.split_whitespace().next().map(str::to_string);
        }
    }

    None
}

/// Extract the active resolution from `xrandr --query` output.
///
/// The current mode line is the one carrying a `*` marker.
pub fn xrandr_current_resolution(stdout: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"(\d+)x(\d+)").ok()?;
    for line in stdout.lines() {
        if line.contains('*') {
            if let Some(caps) = re.captures(line) {
                let w = caps[1].parse().ok()?;
                let h = caps[2].parse().ok()?;
                return Some((w, h));
            }
        }
    }
    None
}

/// Extract the active refresh rate (Hz, rounded to nearest) from
/// `xrandr --query`. Rounds the same way as [`xrandr_supported_rates`]
/// so 59.99 reads back as a rate the supported list contains.
pub fn xrandr_current_refresh(stdout: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+\.\d+)\*").ok()?;
    for line in stdout.lines() {
        if line.contains('*') {
            if let Some(caps) = re.captures(line) {
                let rate: f64 = caps[1].parse().ok()?;
                return Some(rate.round() as u32);
            }
        }
    }
    None
}

/// Extract every refresh rate offered for the active resolution.
///
/// Rates are rounded to the nearest integer, deduplicated, and sorted.
pub fn xrandr_supported_rates(stdout: &str) -> Vec<u32> {
    let mode_re = match Regex::new(r"^\s+(\d+)x(\d+)") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let rate_re = match Regex::new(r"(\d+\.\d+)") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    // Find the active resolution first, then collect rates from its line.
    let current = xrandr_current_resolution(stdout);

    let mut rates: Vec<u32> = Vec::new();
    for line in stdout.lines() {
        let Some(caps) = mode_re.captures(line) else {
            continue;
        };
        if let Some((w, h)) = current {
            let lw: u32 = caps[1].parse().unwrap_or(0);
            let lh: u32 = caps[2].parse().unwrap_or(0);
            if (lw, lh) != (w, h) {
                continue;
            }
        }
        for rate_caps in rate_re.captures_iter(line) {
            if let Ok(rate) = rate_caps[1].parse::<f64>() {
                let rounded = rate.round() as u32;
                // The mode line starts with "2560x1600"; skip dimension captures.
                if rounded > 0 && rounded <= 500 && !rates.contains(&rounded) {
                    rates.push(rounded);
                }
            }
        }
    }

    rates.sort_unstable();
    rates
}

// =============================================================================
// asusctl / powerprofilesctl
// =============================================================================

/// Extract the active profile name from `asusctl profile -p` output.
///
/// Expected form: `Active profile: Balanced`.
pub fn asusctl_active_profile(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        if let Some(rest) = line.split_once("Active profile:") {
            let name = rest.1.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Extract the active profile from `powerprofilesctl get` output.
///
/// The tool prints the bare profile name on a single line.
pub fn ppd_active_profile(stdout: &str) -> Option<String> {
    let name = stdout.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

// =============================================================================
// ryzenadj
// =============================================================================

/// Extract the sustained power limit (watts) from `ryzenadj -i` output.
///
/// The table row looks like `| STAPM LIMIT | 45.000 | stapm-limit |`;
/// the first number on the line is the limit in watts.
pub fn ryzenadj_stapm_limit(stdout: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+(?:\.\d+)?)").ok()?;
    for line in stdout.lines() {
        if line.contains("STAPM LIMIT") {
            if let Some(caps) = re.captures(line) {
                let watts: f64 = caps[1].parse().ok()?;
                return Some(watts.round() as u32);
            }
        }
    }
    None
}

// =============================================================================
// sensors
// =============================================================================

/// Extract the CPU package temperature from `sensors` output.
///
/// Matches the AMD `Tctl` row or any row naming the CPU.
pub fn sensors_cpu_temp(stdout: &str) -> Option<f64> {
    extract_temp(stdout, &["Tctl", "CPU"])
}

/// Extract the GPU temperature from `sensors` output.
///
/// Matches the amdgpu `edge` row or any row naming the GPU.
pub fn sensors_gpu_temp(stdout: &str) -> Option<f64> {
    extract_temp(stdout, &["edge", "GPU", "gpu"])
}

fn extract_temp(stdout: &str, markers: &[&str]) -> Option<f64> {
    let re = Regex::new(r"[+-]?(\d+\.\d+)\s*°C").ok()?;
    for line in stdout.lines() {
        if markers.iter().any(|m| line.contains(m)) {
            if let Some(caps) = re.captures(line) {
                let temp: f64 = caps[1].parse().ok()?;
                if (constants::TEMP_SANE_MIN_C..constants::TEMP_SANE_MAX_C).contains(&temp) {
                    return Some(temp);
                }
            }
        }
    }
    None
}

/// Parse a sysfs millidegree temperature reading into celsius.
///
/// Returns `None` for values outside the sane range (disconnected or
/// misreporting sensors).
pub fn millidegrees_to_celsius(raw: &str) -> Option<f64> {
    let millis: i64 = raw.trim().parse().ok()?;
    let temp = millis as f64 / 1000.0;
    if temp > constants::TEMP_SANE_MIN_C && temp < constants::TEMP_SANE_MAX_C {
        Some(temp)
    } else {
        None
    }
}

// =============================================================================
// ps
// =============================================================================

/// Parse `ps -eo comm` output into a list of process names (header skipped).
pub fn process_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when any known gaming process or launcher appears in the list.
pub fn gaming_process_running(processes: &[String]) -> bool {
    processes.iter().any(|p| {
        let lower = p.to_lowercase();
        constants::GAMING_PROCESSES
            .iter()
            .any(|g| lower.contains(g))
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const XRANDR_OUTPUT: &str = "\
Screen 0: minimum 320 x 200, current 2560 x 1600, maximum 16384 x 16384
eDP-1 connected primary 2560x1600+0+0 (normal left inverted right x axis y axis) 302mm x 189mm
   2560x1600    180.00*+  120.00    90.00    60.01    59.99    30.00
   1920x1200    180.00    60.00
   1280x800     180.00    60.00
HDMI-1 disconnected (normal left inverted right x axis y axis)
";

    #[test]
    fn test_xrandr_primary_output() {
        assert_eq!(xrandr_primary_output(XRANDR_OUTPUT).as_deref(), Some("eDP-1"));
    }

    #[test]
    fn test_xrandr_falls_back_to_first_connected() {
        let no_primary = XRANDR_OUTPUT.replace(" connected primary", " connected");
        assert_eq!(xrandr_primary_output(&no_primary).as_deref(), Some("eDP-1"));
    }

    #[test]
    fn test_xrandr_no_connected_output() {
        let out = "HDMI-1 disconnected (normal left inverted right x axis y axis)\n";
        assert_eq!(xrandr_primary_output(out), None);
    }

    #[test]
    fn test_xrandr_current_resolution() {
        assert_eq!(xrandr_current_resolution(XRANDR_OUTPUT), Some((2560, 1600)));
    }

    #[test]
    fn test_xrandr_current_refresh() {
        assert_eq!(xrandr_current_refresh(XRANDR_OUTPUT), Some(180));
    }

    #[test]
    fn test_xrandr_current_refresh_rounds_like_supported_rates() {
        let out = "eDP-1 connected primary 1920x1200+0+0\n   1920x1200     59.99*+  60.01\n";
        let current = xrandr_current_refresh(out).unwrap();
        assert_eq!(current, 60);
        assert!(xrandr_supported_rates(out).contains(&current));
    }

    #[test]
    fn test_xrandr_supported_rates_active_resolution_only() {
        let rates = xrandr_supported_rates(XRANDR_OUTPUT);
        // 59.99 and 60.01 both round to 60 and must be deduplicated;
        // 1920x1200 rates are for a different resolution and excluded.
        assert_eq!(rates, vec![30, 60, 90, 120, 180]);
    }

    #[test]
    fn test_asusctl_active_profile() {
        let out = "Active profile: Balanced\n";
        assert_eq!(asusctl_active_profile(out).as_deref(), Some("Balanced"));
        assert_eq!(asusctl_active_profile("no such line"), None);
    }

    #[test]
    fn test_ppd_active_profile() {
        assert_eq!(ppd_active_profile("power-saver\n").as_deref(), Some("power-saver"));
        assert_eq!(ppd_active_profile("   \n"), None);
    }

    #[test]
    fn test_ryzenadj_stapm_limit() {
        let out = "\
| STAPM LIMIT         |    45.000 | stapm-limit        |
| STAPM VALUE         |    12.277 | stapm-value        |
| PPT LIMIT FAST      |    53.000 | fast-limit         |
";
        assert_eq!(ryzenadj_stapm_limit(out), Some(45));
        assert_eq!(ryzenadj_stapm_limit("no table"), None);
    }

    #[test]
    fn test_sensors_cpu_temp() {
        let out = "\
k10temp-pci-00c3
Tctl:         +64.5°C
Tdie:         +54.5°C
";
        assert_eq!(sensors_cpu_temp(out), Some(64.5));
    }

    #[test]
    fn test_sensors_gpu_temp() {
        let out = "\
amdgpu-pci-0800
edge:         +51.0°C  (crit = +100.0°C, hyst = -273.1°C)
";
        assert_eq!(sensors_gpu_temp(out), Some(51.0));
    }

    #[test]
    fn test_sensors_missing_reading() {
        assert_eq!(sensors_cpu_temp("nothing relevant"), None);
        assert_eq!(sensors_gpu_temp(""), None);
    }

    #[test]
    fn test_millidegrees_to_celsius() {
        assert_eq!(millidegrees_to_celsius("64500\n"), Some(64.5));
        // Out-of-range readings are sensor noise, not data
        assert_eq!(millidegrees_to_celsius("250000"), None);
        assert_eq!(millidegrees_to_celsius("0"), None);
        assert_eq!(millidegrees_to_celsius("not a number"), None);
    }

    #[test]
    fn test_process_names_skips_header() {
        let out = "COMM\nsystemd\nsteam\nbash\n";
        let names = process_names(out);
        assert_eq!(names, vec!["systemd", "steam", "bash"]);
    }

    #[test]
    fn test_gaming_process_detection() {
        let running = vec!["systemd".to_string(), "SteamChildMonit".to_string()];
        assert!(gaming_process_running(&running));

        let idle = vec!["systemd".to_string(), "bash".to_string()];
        assert!(!gaming_process_running(&idle));
    }
}
