// linux-armoury - app/status.rs
//
// One-shot status collection. Every reading is independent and optional;
// a missing sensor or tool leaves its field empty instead of failing the
// whole snapshot.

use std::fmt::Write as _;

use tracing::debug;

use crate::app::battery::BatteryManager;
use crate::app::display::DisplayManager;
use crate::app::fans::ThermalManager;
use crate::app::power::PowerManager;
use crate::core::model::StatusSnapshot;
use crate::core::parse;
use crate::platform::exec;
use crate::util::constants;

pub struct StatusCollector {
    pub power: PowerManager,
    pub battery: BatteryManager,
    pub thermal: ThermalManager,
    pub display: DisplayManager,
}

impl StatusCollector {
    /// Gather a full snapshot. Individual read failures are logged at
    /// debug and leave the field as `None`.
    pub fn collect(&self) -> StatusSnapshot {
        let caps = self.power.capabilities();

        let battery_percent = match self.battery.capacity() {
            Ok(percent) => Some(percent),
            Err(err) => {
                debug!(%err, "battery capacity unavailable");
                None
            }
        };
        let power_source = match self.battery.power_source() {
            Ok(source) => Some(source),
            Err(err) => {
                debug!(%err, "power source unavailable");
                None
            }
        };
        let refresh_hz = if caps.has_xrandr {
            self.display.current_refresh().ok()
        } else {
            None
        };

        StatusSnapshot {
            cpu_temp_c: self.thermal.cpu_temp(),
            gpu_temp_c: self.thermal.gpu_temp(),
            battery_percent,
            power_source,
            refresh_hz,
            active_profile: self.power.current_profile(),
            tdp_watts: self.power.current_tdp(),
            gaming_active: gaming_active(),
        }
    }
}

/// True when a known game or gaming launcher process is running.
pub fn gaming_active() -> bool {
    let Ok(output) = exec::run("ps", &["-eo", "comm"], constants::QUERY_TIMEOUT_MS) else {
        return false;
    };
    let processes = parse::process_names(&output.stdout);
    parse::gaming_process_running(&processes)
}

/// Render a snapshot as the human-readable status block.
pub fn render(snapshot: &StatusSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} status", constants::APP_NAME);
    let _ = writeln!(out, "------------------------------");

    let _ = writeln!(
        out,
        "Profile:      {}",
        snapshot.active_profile.as_deref().unwrap_or("unknown")
    );
    match snapshot.power_source {
        Some(source) => {
            let _ = writeln!(out, "Power source: {source}");
        }
        None => {
            let _ = writeln!(out, "Power source: unknown");
        }
    }
    match snapshot.battery_percent {
        Some(percent) => {
            let _ = writeln!(out, "Battery:      {percent}%");
        }
        None => {
            let _ = writeln!(out, "Battery:      n/a");
        }
    }
    match snapshot.tdp_watts {
        Some(watts) => {
            let _ = writeln!(out, "TDP limit:    {watts}W");
        }
        None => {
            let _ = writeln!(out, "TDP limit:    n/a");
        }
    }
    match snapshot.refresh_hz {
        Some(rate) => {
            let _ = writeln!(out, "Refresh:      {rate}Hz");
        }
        None => {
            let _ = writeln!(out, "Refresh:      n/a");
        }
    }
    let _ = writeln!(out, "CPU temp:     {}", format_temp(snapshot.cpu_temp_c));
    let _ = writeln!(out, "GPU temp:     {}", format_temp(snapshot.gpu_temp_c));
    let _ = writeln!(
        out,
        "Gaming:       {}",
        if snapshot.gaming_active { "yes" } else { "no" }
    );
    out
}

fn format_temp(temp: Option<f64>) -> String {
    match temp {
        Some(t) => {
            let label = ThermalManager::temp_label(t);
            if label == "ok" {
                format!("{t:.1}°C")
            } else {
                format!("{t:.1}°C [{label}]")
            }
        }
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PowerSource;

    #[test]
    fn test_render_full_snapshot() {
        let snapshot = StatusSnapshot {
            cpu_temp_c: Some(64.5),
            gpu_temp_c: Some(88.0),
            battery_percent: Some(73),
            power_source: Some(PowerSource::Battery),
            refresh_hz: Some(120),
            active_profile: Some("balanced".to_string()),
            tdp_watts: Some(40),
            gaming_active: false,
        };
        let text = render(&snapshot);
        assert!(text.contains("Profile:      balanced"));
        assert!(text.contains("Battery:      73%"));
        assert!(text.contains("64.5°C"));
        assert!(text.contains("88.0°C [WARNING]"));
        assert!(text.contains("Refresh:      120Hz"));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let text = render(&StatusSnapshot::default());
        assert!(text.contains("Profile:      unknown"));
        assert!(text.contains("Battery:      n/a"));
        assert!(text.contains("CPU temp:     n/a"));
    }
}
