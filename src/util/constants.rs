// linux-armoury - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Linux Armoury";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "linux-armoury";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Power limits
// =============================================================================

/// Minimum TDP a profile may request (watts).
pub const MIN_TDP_WATTS: u32 = 10;

/// Maximum TDP a profile may request (watts).
pub const MAX_TDP_WATTS: u32 = 90;

/// Refresh rates the panel accepts (Hz).
pub const SUPPORTED_REFRESH_RATES: &[u32] = &[30, 60, 90, 120, 180];

/// Battery charge limit floor. The firmware refuses values below this.
pub const MIN_CHARGE_LIMIT: u8 = 20;

/// Battery charge limit ceiling.
pub const MAX_CHARGE_LIMIT: u8 = 100;

/// Keyboard backlight levels exposed by the asus::kbd_backlight LED node.
pub const MAX_KBD_BRIGHTNESS: u32 = 3;

// =============================================================================
// Temperature thresholds
// =============================================================================

/// CPU/GPU temperature above which the monitor flags a warning (celsius).
pub const TEMP_WARNING_C: f64 = 85.0;

/// Temperature above which the monitor flags a critical state (celsius).
pub const TEMP_CRITICAL_C: f64 = 95.0;

/// Sysfs hwmon readings outside this range are discarded as sensor noise.
pub const TEMP_SANE_MIN_C: f64 = 0.0;
pub const TEMP_SANE_MAX_C: f64 = 150.0;

// =============================================================================
// External command timeouts
// =============================================================================

/// Timeout for privileged state-changing commands (pkexec pwrcfg, xrandr).
/// Generous because pkexec may block on an authentication dialog.
pub const COMMAND_TIMEOUT_MS: u64 = 10_000;

/// Timeout for read-only probe commands (asusctl -p, sensors, ryzenadj -i).
pub const PROBE_TIMEOUT_MS: u64 = 2_000;

/// Timeout for xrandr queries.
pub const QUERY_TIMEOUT_MS: u64 = 5_000;

/// How often a running child process is checked for completion (ms).
pub const EXEC_WAIT_SLICE_MS: u64 = 50;

// =============================================================================
// Poll loops
// =============================================================================

/// How often the auto-switch daemon samples the AC adapter state (ms).
pub const AUTO_SWITCH_POLL_INTERVAL_MS: u64 = 2_000;

/// How often the cancel flag is checked within each poll sleep interval (ms).
pub const AUTO_SWITCH_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// Minimum user-configurable monitor/auto-switch interval (ms).
pub const MIN_POLL_INTERVAL_MS: u64 = 500;

/// Maximum user-configurable monitor/auto-switch interval (ms).
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Default status monitor interval (ms).
pub const MONITOR_INTERVAL_MS: u64 = 2_000;

/// The monitor prints a timestamped header line every N iterations.
pub const MONITOR_HEADER_EVERY: u64 = 10;

// =============================================================================
// Profile limits
// =============================================================================

/// Maximum number of profiles that can be loaded (built-in + custom).
pub const MAX_PROFILES: usize = 64;

/// Maximum size of a custom profile JSON file in bytes.
pub const MAX_PROFILE_FILE_SIZE: u64 = 16 * 1024; // 16 KB

// =============================================================================
// Hook (plugin) limits
// =============================================================================

/// Maximum number of command hooks loaded from the plugins directory.
pub const MAX_HOOKS: usize = 32;

/// Maximum size of a hook manifest TOML file in bytes.
pub const MAX_HOOK_FILE_SIZE: u64 = 16 * 1024; // 16 KB

/// Timeout for a hook's spawned command.
pub const HOOK_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// External commands
// =============================================================================

/// Model-specific power profile script (GZ302-Linux-Setup).
pub const CMD_PWRCFG: &str = "pwrcfg";

/// asusctl CLI from the asusd project.
pub const CMD_ASUSCTL: &str = "asusctl";

/// power-profiles-daemon CLI.
pub const CMD_POWERPROFILESCTL: &str = "powerprofilesctl";

/// dGPU mode switching daemon frontend.
pub const CMD_SUPERGFXCTL: &str = "supergfxctl";

/// X11 display configuration tool.
pub const CMD_XRANDR: &str = "xrandr";

/// PolicyKit privilege escalation wrapper.
pub const CMD_PKEXEC: &str = "pkexec";

/// AMD mobile TDP tool.
pub const CMD_RYZENADJ: &str = "ryzenadj";

/// lm-sensors CLI.
pub const CMD_SENSORS: &str = "sensors";

// =============================================================================
// Sysfs paths (relative to the sysfs root, normally /sys)
// =============================================================================

/// Power supply class directory.
pub const SYSFS_POWER_SUPPLY: &str = "class/power_supply";

/// Hwmon class directory.
pub const SYSFS_HWMON: &str = "class/hwmon";

/// LED class directory.
pub const SYSFS_LEDS: &str = "class/leds";

/// DMI identity directory.
pub const SYSFS_DMI: &str = "class/dmi/id";

/// ACPI platform profile node.
pub const SYSFS_PLATFORM_PROFILE: &str = "firmware/acpi/platform_profile";

/// ACPI platform profile choices node.
pub const SYSFS_PLATFORM_PROFILE_CHOICES: &str = "firmware/acpi/platform_profile_choices";

/// asus-nb-wmi platform device directory.
pub const SYSFS_ASUS_PLATFORM: &str = "devices/platform/asus-nb-wmi";

/// Keyboard backlight LED node glob (filename component under class/leds).
pub const KBD_BACKLIGHT_GLOB: &str = "*::kbd_backlight";

// =============================================================================
// Gaming detection
// =============================================================================

/// Process names (substring match, lowercase) that indicate a game or a
/// gaming launcher is running.
pub const GAMING_PROCESSES: &[&str] = &[
    "steam",
    "lutris",
    "heroic",
    "bottles",
    "wine",
    "proton",
    "gamemoded",
    "gamemode",
    "minecraft",
];

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// File names
// =============================================================================

/// Settings file name (stored in the platform config directory).
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Custom profiles subdirectory name.
pub const PROFILES_DIR_NAME: &str = "profiles";

/// Command hook (plugin) subdirectory name.
pub const PLUGINS_DIR_NAME: &str = "plugins";
