// linux-armoury - main.rs
//
// CLI entry point. Flags map one-to-one onto app layer operations; the
// process exits non-zero when the requested operation fails.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::mpsc;

use clap::Parser;
use tracing::{info, warn};

use linux_armoury::app::autoswitch::{AutoSwitchConfig, AutoSwitchManager};
use linux_armoury::app::battery::BatteryManager;
use linux_armoury::app::display::DisplayManager;
use linux_armoury::app::fans::ThermalManager;
use linux_armoury::app::hooks::{HookEvent, HookManager};
use linux_armoury::app::keyboard::KeyboardManager;
use linux_armoury::app::monitor;
use linux_armoury::app::power::{probe_hardware, PowerManager};
use linux_armoury::app::profile_mgr::ProfileManager;
use linux_armoury::app::settings::SettingsStore;
use linux_armoury::app::status::{self, StatusCollector};
use linux_armoury::core::model::{AutoSwitchEvent, ChargeLimitPreset, ProfileKind, Rgb};
use linux_armoury::platform::config::AppPaths;
use linux_armoury::platform::sysfs::Sysfs;
use linux_armoury::util::constants;
use linux_armoury::util::error::Result;
use linux_armoury::util::logging;

#[derive(Parser, Debug)]
#[command(
    name = constants::APP_ID,
    version = constants::APP_VERSION,
    about = "Control panel for ASUS gaming laptops: power profiles, TDP, \
             refresh rates, battery charge limits, and keyboard lighting"
)]
struct Cli {
    /// Apply a power profile by name
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Set the panel refresh rate in Hz
    #[arg(short, long, value_name = "HZ")]
    refresh: Option<u32>,

    /// Print a status snapshot
    #[arg(short, long)]
    status: bool,

    /// List available profiles
    #[arg(short, long)]
    list: bool,

    /// Print detected hardware capabilities
    #[arg(long)]
    detect: bool,

    /// Print CPU and GPU temperatures and fan speeds
    #[arg(long)]
    temperature: bool,

    /// Print battery charge, status, and charge limit
    #[arg(long)]
    battery: bool,

    /// Live status monitor (Ctrl+C to stop)
    #[arg(short, long)]
    monitor: bool,

    /// Run the AC/battery auto-switch loop in the foreground
    #[arg(long)]
    daemon: bool,

    /// Set the battery charge limit percent (20-100)
    #[arg(long, value_name = "PERCENT")]
    charge_limit: Option<u8>,

    /// Set one of the charge limit presets
    #[arg(
        long,
        value_name = "full|balanced|max-lifespan",
        conflicts_with = "charge_limit",
        value_parser = parse_charge_preset
    )]
    charge_preset: Option<ChargeLimitPreset>,

    /// Set the keyboard backlight brightness (0-3)
    #[arg(long, value_name = "LEVEL")]
    kbd_brightness: Option<u32>,

    /// Set the keyboard color as a hex string (e.g. ff2030)
    #[arg(long, value_name = "RRGGBB", value_parser = parse_rgb)]
    kbd_color: Option<Rgb>,

    /// Save the current machine state as a custom profile
    #[arg(long, value_name = "NAME")]
    save_profile: Option<String>,

    /// Import a profile JSON file into the catalogue
    #[arg(long, value_name = "FILE")]
    import_profile: Option<PathBuf>,

    /// Export a profile to a JSON file
    #[arg(long, num_args = 2, value_names = ["NAME", "FILE"])]
    export_profile: Option<Vec<String>>,

    /// Delete a custom profile
    #[arg(long, value_name = "NAME")]
    delete_profile: Option<String>,

    /// Enable or disable AC/battery auto-switching
    #[arg(long, value_name = "on|off")]
    auto_switch: Option<String>,

    /// Reset settings to defaults
    #[arg(long)]
    reset_settings: bool,

    /// Use an alternate configuration directory
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(long)]
    debug: bool,
}

fn parse_charge_preset(value: &str) -> std::result::Result<ChargeLimitPreset, String> {
    match value {
        "full" => Ok(ChargeLimitPreset::Full),
        "balanced" => Ok(ChargeLimitPreset::Balanced),
        "max-lifespan" => Ok(ChargeLimitPreset::MaxLifespan),
        other => Err(format!(
            "unknown charge preset '{other}' (full, balanced, max-lifespan)"
        )),
    }
}

fn parse_rgb(value: &str) -> std::result::Result<Rgb, String> {
    Rgb::from_hex(value).ok_or_else(|| format!("'{value}' is not a valid rrggbb color"))
}

/// Everything the command handlers need.
struct Context {
    settings: SettingsStore,
    profiles: ProfileManager,
    power: PowerManager,
    battery: BatteryManager,
    thermal: ThermalManager,
    display: DisplayManager,
    keyboard: KeyboardManager,
    hooks: HookManager,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match &cli.config_dir {
        Some(dir) => AppPaths::at(dir.clone()),
        None => AppPaths::resolve(),
    };
    let paths = match paths {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let settings = SettingsStore::open(paths.settings_file());
    logging::init(cli.debug, settings.settings.log_level.as_deref());

    let sysfs = Sysfs::system();
    let caps = probe_hardware(&sysfs);
    let mut ctx = Context {
        profiles: ProfileManager::new(&paths.profiles_dir),
        power: PowerManager::new(sysfs.clone(), caps.clone()),
        battery: BatteryManager::new(sysfs.clone()),
        thermal: ThermalManager::new(sysfs.clone(), caps.has_sensors),
        display: DisplayManager::new(settings.settings.display_output.clone()),
        keyboard: KeyboardManager::new(sysfs, caps.has_asusctl),
        hooks: HookManager::load(&paths.plugins_dir),
        settings,
    };
    ctx.hooks.dispatch(&HookEvent::Loaded);

    match run(cli, &mut ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, ctx: &mut Context) -> Result<()> {
    let mut did_something = false;

    if cli.reset_settings {
        ctx.settings.reset()?;
        println!("settings reset to defaults");
        did_something = true;
    }

    if let Some(state) = &cli.auto_switch {
        let enabled = matches!(state.as_str(), "on" | "true" | "1");
        ctx.settings.settings.auto_switch_enabled = enabled;
        ctx.settings.save()?;
        println!(
            "auto-switch {}",
            if enabled { "enabled" } else { "disabled" }
        );
        did_something = true;
    }

    if let Some(name) = &cli.save_profile {
        let profile = snapshot_profile(ctx, name);
        let path = ctx.profiles.save(&profile)?;
        println!(
            "saved current state as '{}' ({})",
            profile.name,
            path.display()
        );
        did_something = true;
    }

    if let Some(path) = &cli.import_profile {
        let profile = ctx.profiles.import(path)?;
        println!("imported profile '{}'", profile.name);
        did_something = true;
    }

    if let Some(args) = &cli.export_profile {
        let (name, file) = (&args[0], PathBuf::from(&args[1]));
        ctx.profiles.export(name, &file)?;
        println!("exported profile '{name}' to {}", file.display());
        did_something = true;
    }

    if let Some(name) = &cli.delete_profile {
        ctx.profiles.delete(name)?;
        println!("deleted profile '{name}'");
        did_something = true;
    }

    if let Some(percent) = cli.charge_limit {
        ctx.battery.set_charge_limit(percent)?;
        println!("charge limit set to {percent}%");
        did_something = true;
    }

    if let Some(preset) = cli.charge_preset {
        ctx.battery.set_charge_preset(preset)?;
        println!("charge limit set to {}%", preset.percent());
        did_something = true;
    }

    if let Some(level) = cli.kbd_brightness {
        ctx.keyboard.set_brightness(level)?;
        println!("keyboard brightness set to {level}");
        did_something = true;
    }

    if let Some(color) = cli.kbd_color {
        ctx.keyboard.set_color(color)?;
        println!("keyboard color set to #{}", color.to_hex());
        did_something = true;
    }

    if let Some(name) = &cli.profile {
        apply_profile(ctx, name)?;
        did_something = true;
    }

    if let Some(rate) = cli.refresh {
        ctx.display.set_refresh(rate)?;
        println!("refresh rate set to {rate}Hz");
        did_something = true;
    }

    if cli.list {
        print_profiles(ctx);
        did_something = true;
    }

    if cli.detect {
        print_capabilities(ctx);
        did_something = true;
    }

    if cli.temperature {
        print_temperatures(ctx);
        did_something = true;
    }

    if cli.battery {
        print_battery(ctx)?;
        did_something = true;
    }

    if cli.status {
        let collector = collector(ctx);
        let snapshot = collector.collect();
        ctx.hooks
            .dispatch(&HookEvent::StatusUpdate(snapshot.clone()));
        print!("{}", status::render(&snapshot));
        did_something = true;
    }

    if cli.monitor {
        run_monitor(ctx)?;
        did_something = true;
    }

    if cli.daemon {
        run_daemon(ctx)?;
        did_something = true;
    }

    if !did_something {
        // Mirror --status when invoked with no arguments.
        let snapshot = collector(ctx).collect();
        print!("{}", status::render(&snapshot));
    }

    Ok(())
}

/// Apply a profile end to end: power backend, refresh rate, charge limit,
/// keyboard lighting. The power backend is mandatory; the rest degrade to
/// warnings so one missing subsystem never blocks a profile change.
fn apply_profile(ctx: &mut Context, name: &str) -> Result<()> {
    let entry = ctx.profiles.get(name)?;
    let profile = entry.profile;

    let backend = ctx.power.apply(&profile)?;
    println!("profile '{}' applied via {backend}", profile.name);

    if ctx.power.capabilities().has_supergfxctl {
        if let Err(err) = ctx.power.set_gpu_mode(profile.gpu_mode) {
            warn!(%err, "GPU mode not applied");
        }
    }

    if ctx.power.capabilities().has_asusctl {
        if let Err(err) = ctx.power.set_fan_curve(profile.fan_curve) {
            warn!(%err, "fan curve not applied");
        }
    }

    if let Some(rate) = profile.refresh_hz {
        if ctx.power.capabilities().has_xrandr {
            match ctx.display.set_refresh(rate) {
                Ok(()) => println!("refresh rate set to {rate}Hz"),
                Err(err) => warn!(%err, "refresh rate not applied"),
            }
        }
    }

    if ctx.power.capabilities().has_charge_control {
        if let Err(err) = ctx.battery.set_charge_limit(profile.battery_limit) {
            warn!(%err, "charge limit not applied");
        }
    }

    if ctx.power.capabilities().has_kbd_backlight {
        let level = brightness_level(profile.rgb_brightness);
        if let Err(err) = ctx.keyboard.set_brightness(level) {
            warn!(%err, "keyboard brightness not applied");
        }
    }
    if ctx.power.capabilities().has_asusctl {
        if let Err(err) = ctx
            .keyboard
            .set_effect(profile.rgb_effect, profile.rgb_color)
        {
            warn!(%err, "keyboard effect not applied");
        }
    }

    let source = ctx.battery.power_source().ok();
    ctx.settings.remember_profile(&profile.name)?;
    ctx.hooks.dispatch(&HookEvent::ProfileChange {
        profile: profile.name.clone(),
        source,
    });
    Ok(())
}

/// Build a profile from whatever the machine currently reports. Fields
/// that cannot be read fall back to the balanced preset's values.
fn snapshot_profile(ctx: &Context, name: &str) -> linux_armoury::core::model::PowerProfile {
    let base = ctx
        .profiles
        .get("balanced")
        .map(|e| e.profile)
        .unwrap_or_else(|_| linux_armoury::core::profile::builtin_profiles().remove(3));

    let tdp = ctx
        .power
        .current_tdp()
        .unwrap_or(base.tdp_watts)
        .clamp(constants::MIN_TDP_WATTS, constants::MAX_TDP_WATTS);
    let refresh = ctx
        .display
        .current_refresh()
        .ok()
        .filter(|r| constants::SUPPORTED_REFRESH_RATES.contains(r))
        .or(base.refresh_hz);

    linux_armoury::core::model::PowerProfile {
        name: name.to_string(),
        tdp_watts: tdp,
        refresh_hz: refresh,
        battery_limit: ctx.battery.charge_limit().unwrap_or(base.battery_limit),
        description: "Saved from current machine state".to_string(),
        ..base
    }
}

/// Map the profile's percent brightness onto the 0-3 hardware levels.
fn brightness_level(percent: u8) -> u32 {
    match percent {
        0 => 0,
        1..=33 => 1,
        34..=66 => 2,
        _ => 3,
    }
}

fn collector(ctx: &Context) -> StatusCollector {
    StatusCollector {
        power: ctx.power.clone(),
        battery: ctx.battery.clone(),
        thermal: ctx.thermal.clone(),
        display: ctx.display.clone(),
    }
}

fn print_profiles(ctx: &Context) {
    println!(
        "{:<14} {:<8} {:>5} {:>7}  {}",
        "NAME", "KIND", "TDP", "REFRESH", "DESCRIPTION"
    );
    for entry in ctx.profiles.list() {
        let kind = match entry.kind {
            ProfileKind::Builtin => "builtin",
            ProfileKind::Custom => "custom",
        };
        let refresh = entry
            .profile
            .refresh_hz
            .map(|r| format!("{r}Hz"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} {:<8} {:>4}W {:>7}  {}",
            entry.profile.name, kind, entry.profile.tdp_watts, refresh, entry.profile.description
        );
    }
}

fn print_capabilities(ctx: &Context) {
    let caps = ctx.power.capabilities();
    println!("Vendor:            {}", caps.identity.vendor.as_deref().unwrap_or("unknown"));
    println!("Product:           {}", caps.identity.product.as_deref().unwrap_or("unknown"));
    println!("ASUS hardware:     {}", yes_no(caps.is_asus));
    if let Some(model) = caps.model_match {
        println!("Supported model:   {model}");
    }
    println!("pwrcfg:            {}", yes_no(caps.has_pwrcfg));
    println!("asusctl:           {}", yes_no(caps.has_asusctl));
    println!("supergfxctl:       {}", yes_no(caps.has_supergfxctl));
    println!("power-profiles:    {}", yes_no(caps.has_power_profiles_daemon));
    println!("platform_profile:  {}", yes_no(caps.has_platform_profile));
    if !caps.platform_profiles.is_empty() {
        println!("profile choices:   {}", caps.platform_profiles.join(" "));
    }
    println!("xrandr:            {}", yes_no(caps.has_xrandr));
    println!("ryzenadj:          {}", yes_no(caps.has_ryzenadj));
    println!("sensors:           {}", yes_no(caps.has_sensors));
    println!("charge control:    {}", yes_no(caps.has_charge_control));
    println!("kbd backlight:     {}", yes_no(caps.has_kbd_backlight));
    println!("asus-nb-wmi:       {}", yes_no(caps.has_asus_wmi));
    match ctx.power.backend_chain().first() {
        Some(backend) => {
            println!("active backend:    {backend}");
            let names = if *backend == linux_armoury::core::model::ProfileBackend::PlatformProfile
                && !caps.platform_profiles.is_empty()
            {
                caps.platform_profiles.iter().map(String::as_str).collect()
            } else {
                linux_armoury::core::profile::backend_profile_names(*backend)
            };
            println!("backend profiles:  {}", names.join(" "));
        }
        None => println!("active backend:    none"),
    }
}

fn print_temperatures(ctx: &Context) {
    match ctx.thermal.cpu_temp() {
        Some(temp) => println!(
            "CPU: {temp:.1}°C [{}]",
            ThermalManager::temp_label(temp)
        ),
        None => println!("CPU: n/a"),
    }
    match ctx.thermal.gpu_temp() {
        Some(temp) => println!(
            "GPU: {temp:.1}°C [{}]",
            ThermalManager::temp_label(temp)
        ),
        None => println!("GPU: n/a"),
    }
    for fan in ctx.thermal.fan_readings() {
        println!("Fan {}: {} RPM", fan.label, fan.rpm);
    }
}

fn print_battery(ctx: &Context) -> Result<()> {
    println!("Charge:  {}%", ctx.battery.capacity()?);
    println!("Status:  {}", ctx.battery.status()?);
    println!("Source:  {}", ctx.battery.power_source()?);
    match ctx.battery.charge_limit() {
        Ok(limit) => println!("Limit:   {limit}%"),
        Err(_) => println!("Limit:   not supported"),
    }
    Ok(())
}

fn run_monitor(ctx: &Context) -> Result<()> {
    let stop = monitor::install_interrupt_flag().map_err(|source| {
        linux_armoury::util::error::ArmouryError::Io {
            path: PathBuf::from("signal handler"),
            operation: "register",
            source,
        }
    })?;
    monitor::run(&collector(ctx), &stop);
    Ok(())
}

/// Foreground auto-switch loop. Runs until SIGINT/SIGTERM regardless of
/// the auto_switch_enabled setting; running the daemon is an explicit
/// request.
fn run_daemon(ctx: &mut Context) -> Result<()> {
    let stop = monitor::install_interrupt_flag().map_err(|source| {
        linux_armoury::util::error::ArmouryError::Io {
            path: PathBuf::from("signal handler"),
            operation: "register",
            source,
        }
    })?;

    let config = AutoSwitchConfig {
        poll_interval_ms: ctx.settings.settings.poll_interval_ms,
        ac_profile: ctx.settings.settings.ac_profile.clone(),
        battery_profile: ctx.settings.settings.battery_profile.clone(),
    };
    info!(
        ac = %config.ac_profile,
        battery = %config.battery_profile,
        interval_ms = config.poll_interval_ms,
        "auto-switch daemon starting"
    );

    let battery = ctx.battery.clone();
    let profiles = ctx.profiles.clone();
    let power = ctx.power.clone();
    let (tx, rx) = mpsc::channel();

    let mut manager = AutoSwitchManager::start(
        config,
        move || battery.power_source(),
        move |name| {
            let entry = profiles.get(name)?;
            power.apply(&entry.profile)?;
            Ok(())
        },
        tx,
    );

    while !stop.load(Ordering::Relaxed) {
        for event in rx.try_iter() {
            match event {
                AutoSwitchEvent::Started => println!("auto-switch running"),
                AutoSwitchEvent::Switched { source, profile } => {
                    println!("{source}: applied '{profile}'");
                    ctx.hooks.dispatch(&HookEvent::ProfileChange {
                        profile,
                        source: Some(source),
                    });
                }
                AutoSwitchEvent::SwitchFailed {
                    source,
                    profile,
                    message,
                } => {
                    eprintln!("{source}: failed to apply '{profile}': {message}");
                }
                AutoSwitchEvent::ReadError { message } => {
                    warn!(%message, "power source read failed");
                }
                AutoSwitchEvent::Stopped => {}
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(
            constants::AUTO_SWITCH_CANCEL_CHECK_INTERVAL_MS,
        ));
    }

    manager.stop();
    println!("auto-switch daemon stopped");
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_charge_preset_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["linux-armoury", "--charge-preset", "sometimes"]).is_err());
        let cli =
            Cli::try_parse_from(["linux-armoury", "--charge-preset", "max-lifespan"]).unwrap();
        assert_eq!(cli.charge_preset, Some(ChargeLimitPreset::MaxLifespan));
    }

    #[test]
    fn test_bad_kbd_color_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["linux-armoury", "--kbd-color", "zzz"]).is_err());
        let cli = Cli::try_parse_from(["linux-armoury", "--kbd-color", "ff2030"]).unwrap();
        assert_eq!(
            cli.kbd_color,
            Some(Rgb {
                r: 0xff,
                g: 0x20,
                b: 0x30
            })
        );
    }
}
