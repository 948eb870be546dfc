// linux-armoury - app/fans.rs
//
// Fan speeds and temperatures. Primary source is sysfs hwmon (asus for
// fans, k10temp/amdgpu for temperatures); the lm-sensors binary is the
// fallback when the hwmon nodes are absent.

use tracing::debug;

use crate::core::parse;
use crate::platform::exec;
use crate::platform::sysfs::Sysfs;
use crate::util::constants;

/// One fan reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanReading {
    pub label: String,
    pub rpm: u32,
}

#[derive(Debug, Clone)]
pub struct ThermalManager {
    sysfs: Sysfs,
    has_sensors: bool,
}

impl ThermalManager {
    pub fn new(sysfs: Sysfs, has_sensors: bool) -> Self {
        Self { sysfs, has_sensors }
    }

    /// All fans exposed by the asus hwmon device, in node order.
    pub fn fan_readings(&self) -> Vec<FanReading> {
        let mut readings = Vec::new();
        let Ok(hwmon) = self.sysfs.find_hwmon("asus") else {
            return readings;
        };

        for index in 1..=4 {
            let input = hwmon.join(format!("fan{index}_input"));
            let Ok(rpm) = self.sysfs.read_u64(&input) else {
                continue;
            };
            let label = self
                .sysfs
                .read_trimmed(hwmon.join(format!("fan{index}_label")))
                .unwrap_or_else(|_| format!("fan{index}"));
            readings.push(FanReading {
                label,
                rpm: rpm as u32,
            });
        }
        readings
    }

    /// CPU package temperature (celsius), from k10temp or lm-sensors.
    pub fn cpu_temp(&self) -> Option<f64> {
        for chip in ["k10temp", "coretemp"] {
            if let Some(temp) = self.hwmon_temp(chip) {
                return Some(temp);
            }
        }
        self.sensors_temp(parse::sensors_cpu_temp)
    }

    /// GPU edge temperature (celsius), from amdgpu or lm-sensors.
    pub fn gpu_temp(&self) -> Option<f64> {
        if let Some(temp) = self.hwmon_temp("amdgpu") {
            return Some(temp);
        }
        self.sensors_temp(parse::sensors_gpu_temp)
    }

    /// Classify a temperature against the warning thresholds.
    pub fn temp_label(temp_c: f64) -> &'static str {
        if temp_c >= constants::TEMP_CRITICAL_C {
            "CRITICAL"
        } else if temp_c >= constants::TEMP_WARNING_C {
            "WARNING"
        } else {
            "ok"
        }
    }

    fn hwmon_temp(&self, chip: &str) -> Option<f64> {
        let hwmon = self.sysfs.find_hwmon(chip).ok()?;
        let raw = self.sysfs.read_trimmed(hwmon.join("temp1_input")).ok()?;
        let temp = parse::millidegrees_to_celsius(&raw);
        if temp.is_some() {
            debug!(chip, ?temp, "temperature from hwmon");
        }
        temp
    }

    fn sensors_temp(&self, extract: fn(&str) -> Option<f64>) -> Option<f64> {
        if !self.has_sensors {
            return None;
        }
        let output =
            exec::run(constants::CMD_SENSORS, &[], constants::QUERY_TIMEOUT_MS).ok()?;
        extract(&output.stdout)
    }
}
