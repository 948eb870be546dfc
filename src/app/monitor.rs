// linux-armoury - app/monitor.rs
//
// Foreground live monitor: prints a status line every interval until
// interrupted. Ctrl+C is caught through signal-hook so the terminal is
// left with a clean "stopped" line instead of a dead prompt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::info;

use crate::app::status::StatusCollector;
use crate::core::model::StatusSnapshot;
use crate::util::constants;

/// Register a SIGINT/SIGTERM flag. The first signal sets the flag; a
/// second SIGINT kills the process the default way.
pub fn install_interrupt_flag() -> std::io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&flag))?;
    Ok(flag)
}

/// Run the monitor loop until the stop flag is set.
pub fn run(collector: &StatusCollector, stop: &AtomicBool) {
    info!(interval_ms = constants::MONITOR_INTERVAL_MS, "monitor started");
    let mut iteration: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        if iteration % constants::MONITOR_HEADER_EVERY == 0 {
            println!("{}", header_line());
        }
        let snapshot = collector.collect();
        println!("{}", status_line(&snapshot));
        iteration += 1;

        sleep_sliced(constants::MONITOR_INTERVAL_MS, stop);
    }

    println!("monitor stopped");
}

fn header_line() -> String {
    format!(
        "{:<8} {:<12} {:<7} {:>5} {:>7} {:>7} {:>6} {:>6}",
        "TIME", "PROFILE", "SOURCE", "BATT", "CPU", "GPU", "HZ", "GAME"
    )
}

fn status_line(snapshot: &StatusSnapshot) -> String {
    format!(
        "{:<8} {:<12} {:<7} {:>5} {:>7} {:>7} {:>6} {:>6}",
        Local::now().format("%H:%M:%S"),
        snapshot.active_profile.as_deref().unwrap_or("-"),
        snapshot
            .power_source
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string()),
        snapshot
            .battery_percent
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "-".to_string()),
        format_temp(snapshot.cpu_temp_c),
        format_temp(snapshot.gpu_temp_c),
        snapshot
            .refresh_hz
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string()),
        if snapshot.gaming_active { "yes" } else { "no" },
    )
}

fn format_temp(temp: Option<f64>) -> String {
    match temp {
        Some(t) if t >= constants::TEMP_WARNING_C => format!("{t:.1}C!"),
        Some(t) => format!("{t:.1}C"),
        None => "-".to_string(),
    }
}

fn sleep_sliced(total_ms: u64, stop: &AtomicBool) {
    let mut remaining = total_ms;
    while remaining > 0 && !stop.load(Ordering::Relaxed) {
        let step = remaining.min(constants::AUTO_SWITCH_CANCEL_CHECK_INTERVAL_MS);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_alignment() {
        let snapshot = StatusSnapshot {
            active_profile: Some("balanced".to_string()),
            battery_percent: Some(73),
            cpu_temp_c: Some(91.2),
            ..Default::default()
        };
        let line = status_line(&snapshot);
        assert!(line.contains("balanced"));
        assert!(line.contains("73%"));
        // Warning marker on hot readings
        assert!(line.contains("91.2C!"));
    }

    #[test]
    fn test_sleep_sliced_stops_early() {
        let stop = AtomicBool::new(true);
        let start = std::time::Instant::now();
        sleep_sliced(60_000, &stop);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
