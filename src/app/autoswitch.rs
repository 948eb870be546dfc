// linux-armoury - app/autoswitch.rs
//
// Background AC/battery auto-switching. A single worker thread polls the
// power source and applies the configured profile when it changes. The
// sleep between polls is sliced so stop() takes effect promptly, and a
// failed read retains the last observed state rather than flapping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::model::{AutoSwitchEvent, PowerSource};
use crate::util::constants;
use crate::util::error::Result;

/// What the poll loop needs to know.
#[derive(Debug, Clone)]
pub struct AutoSwitchConfig {
    pub poll_interval_ms: u64,
    pub ac_profile: String,
    pub battery_profile: String,
}

/// The profile configured for a power source.
pub fn profile_for(config: &AutoSwitchConfig, source: PowerSource) -> &str {
    match source {
        PowerSource::Ac => &config.ac_profile,
        PowerSource::Battery => &config.battery_profile,
    }
}

/// Whether a switch should fire for this reading.
///
/// The very first successful reading fires too, so enabling auto-switch
/// takes effect immediately instead of waiting for the next transition.
pub fn should_switch(last: Option<PowerSource>, current: PowerSource) -> bool {
    last != Some(current)
}

/// Handle to the background poll thread.
pub struct AutoSwitchManager {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSwitchManager {
    /// Spawn the poll loop.
    ///
    /// `read_source` reads the current power source; `apply` applies a
    /// profile by name. Both are injected so the loop is testable without
    /// hardware.
    pub fn start<R, A>(
        config: AutoSwitchConfig,
        read_source: R,
        apply: A,
        events: Sender<AutoSwitchEvent>,
    ) -> Self
    where
        R: Fn() -> Result<PowerSource> + Send + 'static,
        A: Fn(&str) -> Result<()> + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancel);
        let handle = std::thread::spawn(move || {
            run_loop(&config, &read_source, &apply, &events, &cancel_flag);
        });
        info!("auto-switch started");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        info!("auto-switch stopped");
    }
}

impl Drop for AutoSwitchManager {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// The poll loop body. Runs until the cancel flag is set.
pub fn run_loop<R, A>(
    config: &AutoSwitchConfig,
    read_source: &R,
    apply: &A,
    events: &Sender<AutoSwitchEvent>,
    cancel: &AtomicBool,
) where
    R: Fn() -> Result<PowerSource>,
    A: Fn(&str) -> Result<()>,
{
    let _ = events.send(AutoSwitchEvent::Started);
    let mut last: Option<PowerSource> = None;

    while !cancel.load(Ordering::Relaxed) {
        match read_source() {
            Ok(current) => {
                if should_switch(last, current) {
                    let profile = profile_for(config, current).to_string();
                    debug!(%current, %profile, "power source changed");
                    match apply(&profile) {
                        Ok(()) => {
                            let _ = events.send(AutoSwitchEvent::Switched {
                                source: current,
                                profile,
                            });
                        }
                        Err(err) => {
                            warn!(%err, "auto-switch profile application failed");
                            let _ = events.send(AutoSwitchEvent::SwitchFailed {
                                source: current,
                                profile,
                                message: err.to_string(),
                            });
                        }
                    }
                }
                // State advances even when apply failed; retrying every
                // tick against a broken backend would hammer pkexec.
                last = Some(current);
            }
            Err(err) => {
                debug!(%err, "power source read failed, keeping last state");
                let _ = events.send(AutoSwitchEvent::ReadError {
                    message: err.to_string(),
                });
            }
        }

        sleep_sliced(config.poll_interval_ms, cancel);
    }

    let _ = events.send(AutoSwitchEvent::Stopped);
}

/// Sleep for the poll interval in short slices, returning early when the
/// cancel flag is set.
fn sleep_sliced(total_ms: u64, cancel: &AtomicBool) {
    let slice = Duration::from_millis(constants::AUTO_SWITCH_CANCEL_CHECK_INTERVAL_MS);
    let mut remaining = total_ms;
    while remaining > 0 && !cancel.load(Ordering::Relaxed) {
        let step = remaining.min(constants::AUTO_SWITCH_CANCEL_CHECK_INTERVAL_MS);
        std::thread::sleep(slice.min(Duration::from_millis(step)));
        remaining = remaining.saturating_sub(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::util::error::SysfsError;

    fn config() -> AutoSwitchConfig {
        AutoSwitchConfig {
            poll_interval_ms: 20,
            ac_profile: "performance".to_string(),
            battery_profile: "battery".to_string(),
        }
    }

    #[test]
    fn test_should_switch() {
        assert!(should_switch(None, PowerSource::Ac));
        assert!(should_switch(Some(PowerSource::Ac), PowerSource::Battery));
        assert!(!should_switch(Some(PowerSource::Ac), PowerSource::Ac));
    }

    #[test]
    fn test_profile_for() {
        let config = config();
        assert_eq!(profile_for(&config, PowerSource::Ac), "performance");
        assert_eq!(profile_for(&config, PowerSource::Battery), "battery");
    }

    #[test]
    fn test_loop_switches_on_transition() {
        let (tx, rx) = mpsc::channel();
        let sources = Mutex::new(vec![
            PowerSource::Battery,
            PowerSource::Battery,
            PowerSource::Ac,
        ]);
        let applied: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let applied_clone = Arc::clone(&applied);

        let mut mgr = AutoSwitchManager::start(
            config(),
            move || {
                let mut sources = sources.lock().unwrap();
                Ok(if sources.len() > 1 {
                    sources.remove(0)
                } else {
                    sources[0]
                })
            },
            move |name| {
                applied_clone.lock().unwrap().push(name.to_string());
                Ok(())
            },
            tx,
        );

        // First reading fires "battery", the AC transition fires "performance"
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while applied.lock().unwrap().len() < 2 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        mgr.stop();
        assert!(!mgr.is_active());

        assert_eq!(*applied.lock().unwrap(), vec!["battery", "performance"]);

        let events: Vec<AutoSwitchEvent> = rx.try_iter().collect();
        assert!(matches!(events.first(), Some(AutoSwitchEvent::Started)));
        assert!(matches!(events.last(), Some(AutoSwitchEvent::Stopped)));
        let switches = events
            .iter()
            .filter(|e| matches!(e, AutoSwitchEvent::Switched { .. }))
            .count();
        assert_eq!(switches, 2);
    }

    #[test]
    fn test_read_error_keeps_last_state() {
        let (tx, rx) = mpsc::channel();
        let tick = Mutex::new(0u32);
        let applied: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let applied_clone = Arc::clone(&applied);

        let mut mgr = AutoSwitchManager::start(
            config(),
            move || {
                let mut tick = tick.lock().unwrap();
                *tick += 1;
                if *tick == 2 {
                    Err(SysfsError::Unsupported {
                        feature: "AC adapter",
                    }
                    .into())
                } else {
                    Ok(PowerSource::Ac)
                }
            },
            move |name| {
                applied_clone.lock().unwrap().push(name.to_string());
                Ok(())
            },
            tx,
        );

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while rx.try_iter().count() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(100));
        mgr.stop();

        // One apply for the first reading; the read error and the
        // following identical readings fire nothing.
        assert_eq!(*applied.lock().unwrap(), vec!["performance"]);
    }

    #[test]
    fn test_failed_apply_reports_event() {
        let (tx, rx) = mpsc::channel();

        let mut mgr = AutoSwitchManager::start(
            config(),
            || Ok(PowerSource::Battery),
            |_| {
                Err(SysfsError::Unsupported {
                    feature: "power profile control",
                }
                .into())
            },
            tx,
        );

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let mut saw_failure = false;
        while !saw_failure && std::time::Instant::now() < deadline {
            for event in rx.try_iter() {
                if matches!(event, AutoSwitchEvent::SwitchFailed { .. }) {
                    saw_failure = true;
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        mgr.stop();
        assert!(saw_failure);
    }

    #[test]
    fn test_stop_is_prompt() {
        let (tx, _rx) = mpsc::channel();
        let mut mgr = AutoSwitchManager::start(
            AutoSwitchConfig {
                poll_interval_ms: 60_000,
                ..config()
            },
            || Ok(PowerSource::Ac),
            |_| Ok(()),
            tx,
        );
        std::thread::sleep(Duration::from_millis(50));

        let start = std::time::Instant::now();
        mgr.stop();
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
