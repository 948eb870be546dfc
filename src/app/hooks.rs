// linux-armoury - app/hooks.rs
//
// Plugin callbacks. In-process plugins implement the Plugin trait;
// external plugins are TOML manifests in the plugins directory that name
// an executable to spawn on each event, with the current state passed in
// environment variables. A misbehaving hook is logged and skipped; it can
// never break profile application.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::model::{PowerSource, StatusSnapshot};
use crate::platform::exec;
use crate::util::constants;
use crate::util::error::HookError;

/// Events delivered to plugins.
#[derive(Debug, Clone)]
pub enum HookEvent {
    /// The application finished starting up.
    Loaded,
    /// A fresh status snapshot was collected.
    StatusUpdate(StatusSnapshot),
    /// A profile was applied.
    ProfileChange {
        profile: String,
        source: Option<PowerSource>,
    },
}

impl HookEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Loaded => "load",
            Self::StatusUpdate(_) => "status_update",
            Self::ProfileChange { .. } => "profile_change",
        }
    }
}

/// In-process plugin interface. Default methods are no-ops so a plugin
/// implements only the callbacks it cares about.
pub trait Plugin: Send {
    fn name(&self) -> &str;

    fn on_load(&mut self) {}

    fn on_status_update(&mut self, _snapshot: &StatusSnapshot) {}

    fn on_profile_change(&mut self, _profile: &str, _source: Option<PowerSource>) {}
}

/// External hook described by a TOML manifest:
///
/// ```toml
/// name = "notify"
/// command = "/usr/local/bin/armoury-notify"
/// events = ["profile_change"]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandHook {
    pub name: String,
    pub command: String,
    /// Events the hook subscribes to; empty means all.
    #[serde(default)]
    pub events: Vec<String>,
    /// Extra arguments passed before the event name.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandHook {
    fn parse(content: &str, path: &Path) -> Result<Self, HookError> {
        let hook: Self = toml::from_str(content).map_err(|source| HookError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;
        if hook.name.trim().is_empty() {
            return Err(HookError::MissingField {
                hook: path.display().to_string(),
                field: "name",
            });
        }
        if hook.command.trim().is_empty() {
            return Err(HookError::MissingField {
                hook: hook.name,
                field: "command",
            });
        }
        Ok(hook)
    }

    fn subscribed(&self, event: &HookEvent) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == event.name())
    }
}

/// Loads manifests and dispatches events to every registered plugin.
pub struct HookManager {
    plugins: Vec<Box<dyn Plugin>>,
    hooks: Vec<CommandHook>,
}

impl HookManager {
    /// Load hook manifests from the plugins directory. Bad manifests are
    /// skipped with a warning. Seeds a README explaining the format on
    /// first run.
    pub fn load(plugins_dir: &Path) -> Self {
        seed_readme(plugins_dir);

        let mut hooks = Vec::new();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(plugins_dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();

        if paths.len() > constants::MAX_HOOKS {
            let err = HookError::TooManyHooks {
                count: paths.len(),
                max: constants::MAX_HOOKS,
            };
            warn!(%err, "ignoring manifests beyond the limit");
            paths.truncate(constants::MAX_HOOKS);
        }

        for path in paths {
            match load_manifest(&path) {
                Ok(hook) => {
                    debug!(name = %hook.name, "hook loaded");
                    hooks.push(hook);
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping bad hook manifest");
                }
            }
        }

        if !hooks.is_empty() {
            info!(count = hooks.len(), "command hooks loaded");
        }
        Self {
            plugins: Vec::new(),
            hooks,
        }
    }

    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        debug!(name = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Deliver an event to every plugin and subscribed hook.
    pub fn dispatch(&mut self, event: &HookEvent) {
        for plugin in &mut self.plugins {
            match event {
                HookEvent::Loaded => plugin.on_load(),
                HookEvent::StatusUpdate(snapshot) => plugin.on_status_update(snapshot),
                HookEvent::ProfileChange { profile, source } => {
                    plugin.on_profile_change(profile, *source)
                }
            }
        }

        let env = event_env(event);
        for hook in &self.hooks {
            if !hook.subscribed(event) {
                continue;
            }
            run_hook(hook, event, &env);
        }
    }
}

fn run_hook(hook: &CommandHook, event: &HookEvent, env: &HashMap<&'static str, String>) {
    let mut args: Vec<&str> = hook.args.iter().map(String::as_str).collect();
    args.push(event.name());

    // Hooks inherit the environment plus the ARMOURY_* state variables.
    let env: Vec<(&str, String)> = env.iter().map(|(k, v)| (*k, v.clone())).collect();
    let result = exec::run_with_env(&hook.command, &args, &env, constants::HOOK_TIMEOUT_MS);

    match result {
        Ok(output) if output.success() => {
            debug!(name = %hook.name, event = event.name(), "hook ran");
        }
        Ok(output) => {
            warn!(
                name = %hook.name,
                code = ?output.code,
                stderr = %output.stderr.trim(),
                "hook exited non-zero"
            );
        }
        Err(err) => {
            warn!(name = %hook.name, %err, "hook failed to run");
        }
    }
}

/// Environment variables describing the event state.
fn event_env(event: &HookEvent) -> HashMap<&'static str, String> {
    let mut env = HashMap::new();
    env.insert("ARMOURY_EVENT", event.name().to_string());
    match event {
        HookEvent::Loaded => {}
        HookEvent::StatusUpdate(snapshot) => {
            if let Some(profile) = &snapshot.active_profile {
                env.insert("ARMOURY_PROFILE", profile.clone());
            }
            if let Some(source) = snapshot.power_source {
                env.insert("ARMOURY_POWER_SOURCE", source.to_string());
            }
            if let Some(percent) = snapshot.battery_percent {
                env.insert("ARMOURY_BATTERY", percent.to_string());
            }
            if let Some(temp) = snapshot.cpu_temp_c {
                env.insert("ARMOURY_CPU_TEMP", format!("{temp:.1}"));
            }
        }
        HookEvent::ProfileChange { profile, source } => {
            env.insert("ARMOURY_PROFILE", profile.clone());
            if let Some(source) = source {
                env.insert("ARMOURY_POWER_SOURCE", source.to_string());
            }
        }
    }
    env
}

fn load_manifest(path: &Path) -> Result<CommandHook, HookError> {
    let metadata = std::fs::metadata(path).map_err(|source| HookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > constants::MAX_HOOK_FILE_SIZE {
        return Err(HookError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_HOOK_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| HookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CommandHook::parse(&content, path)
}

fn seed_readme(plugins_dir: &Path) {
    let readme = plugins_dir.join("README");
    if readme.exists() {
        return;
    }
    let text = "\
Drop TOML hook manifests in this directory. Each manifest names an
executable to run on application events:

    name = \"notify\"
    command = \"/usr/local/bin/armoury-notify\"
    events = [\"profile_change\"]    # omit to receive all events

The executable receives the event name as its last argument and the
current state in ARMOURY_* environment variables (ARMOURY_EVENT,
ARMOURY_PROFILE, ARMOURY_POWER_SOURCE, ARMOURY_BATTERY,
ARMOURY_CPU_TEMP).
";
    if let Err(err) = std::fs::write(&readme, text) {
        debug!(%err, "could not seed plugins README");
    }
}
