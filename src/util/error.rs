// linux-armoury - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every error keeps its causal chain
// for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all Linux Armoury operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ArmouryError {
    /// Settings loading or persistence failed.
    Settings(SettingsError),

    /// Profile loading, validation, or persistence failed.
    Profile(ProfileError),

    /// An external command failed, timed out, or was not found.
    Exec(ExecError),

    /// A sysfs read or write failed.
    Sysfs(SysfsError),

    /// A display query or refresh-rate change failed.
    Display(DisplayError),

    /// A hook manifest could not be loaded.
    Hook(HookError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for ArmouryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(e) => write!(f, "Settings error: {e}"),
            Self::Profile(e) => write!(f, "Profile error: {e}"),
            Self::Exec(e) => write!(f, "Command error: {e}"),
            Self::Sysfs(e) => write!(f, "Sysfs error: {e}"),
            Self::Display(e) => write!(f, "Display error: {e}"),
            Self::Hook(e) => write!(f, "Hook error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ArmouryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Settings(e) => Some(e),
            Self::Profile(e) => Some(e),
            Self::Exec(e) => Some(e),
            Self::Sysfs(e) => Some(e),
            Self::Display(e) => Some(e),
            Self::Hook(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings errors
// ---------------------------------------------------------------------------

/// Errors related to settings.json loading and persistence.
#[derive(Debug)]
pub enum SettingsError {
    /// JSON (de)serialisation failed.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// I/O error reading or writing the settings file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { path, source } => {
                write!(f, "Failed to parse '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "I/O error on '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<SettingsError> for ArmouryError {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

// ---------------------------------------------------------------------------
// Profile errors
// ---------------------------------------------------------------------------

/// Errors related to power profile loading, validation, and persistence.
#[derive(Debug)]
pub enum ProfileError {
    /// JSON file could not be parsed.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Profile file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty.
    MissingField { profile: String, field: &'static str },

    /// A numeric field is outside its allowed range.
    OutOfRange {
        profile: String,
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A refresh rate the panel does not support.
    UnsupportedRefreshRate { profile: String, rate: u32 },

    /// No profile with this name exists (built-in or custom).
    NotFound { name: String },

    /// Built-in profiles cannot be deleted.
    BuiltinProtected { name: String },

    /// Maximum number of profiles exceeded.
    TooManyProfiles { count: usize, max: usize },

    /// I/O error reading or writing a profile file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonParse { path, source } => {
                write!(f, "Failed to parse JSON '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Profile '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { profile, field } => {
                write!(f, "Profile '{profile}': missing required field '{field}'")
            }
            Self::OutOfRange {
                profile,
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "Profile '{profile}': {field} = {value} is out of range ({min}-{max})"
            ),
            Self::UnsupportedRefreshRate { profile, rate } => write!(
                f,
                "Profile '{profile}': refresh rate {rate}Hz is not supported by the panel"
            ),
            Self::NotFound { name } => write!(f, "No profile named '{name}'"),
            Self::BuiltinProtected { name } => {
                write!(f, "Cannot delete built-in profile '{name}'")
            }
            Self::TooManyProfiles { count, max } => {
                write!(f, "Too many profiles loaded ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error on profile '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ProfileError> for ArmouryError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

// ---------------------------------------------------------------------------
// Exec errors
// ---------------------------------------------------------------------------

/// Errors related to spawning and supervising external commands.
#[derive(Debug)]
pub enum ExecError {
    /// The binary was not found on PATH.
    MissingBinary { name: String },

    /// The process did not exit within the timeout and was killed.
    Timeout { command: String, timeout_ms: u64 },

    /// The process could not be spawned.
    Spawn { command: String, source: io::Error },

    /// The process exited with a non-zero status.
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBinary { name } => write!(f, "'{name}' not found on PATH"),
            Self::Timeout {
                command,
                timeout_ms,
            } => write!(f, "'{command}' timed out after {timeout_ms}ms and was killed"),
            Self::Spawn { command, source } => {
                write!(f, "Failed to spawn '{command}': {source}")
            }
            Self::Failed {
                command,
                code,
                stderr,
            } => {
                let stderr = stderr.trim();
                match code {
                    Some(c) if !stderr.is_empty() => {
                        write!(f, "'{command}' exited with status {c}: {stderr}")
                    }
                    Some(c) => write!(f, "'{command}' exited with status {c}"),
                    None if !stderr.is_empty() => {
                        write!(f, "'{command}' was killed by a signal: {stderr}")
                    }
                    None => write!(f, "'{command}' was killed by a signal"),
                }
            }
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExecError> for ArmouryError {
    fn from(e: ExecError) -> Self {
        Self::Exec(e)
    }
}

// ---------------------------------------------------------------------------
// Sysfs errors
// ---------------------------------------------------------------------------

/// Errors related to sysfs reads and writes.
#[derive(Debug)]
pub enum SysfsError {
    /// The node does not exist on this machine.
    NotFound { path: PathBuf },

    /// Writing the node requires root (run under pkexec or as root).
    PermissionDenied { path: PathBuf, source: io::Error },

    /// The node's content could not be parsed as the expected type.
    Parse { path: PathBuf, content: String },

    /// The hardware feature is not present (no matching node was discovered).
    Unsupported { feature: &'static str },

    /// Any other I/O error on a sysfs node.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for SysfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Sysfs node '{}' does not exist", path.display())
            }
            Self::PermissionDenied { path, source } => write!(
                f,
                "Permission denied writing '{}': {source} (root required)",
                path.display()
            ),
            Self::Parse { path, content } => write!(
                f,
                "Cannot parse '{content}' read from '{}'",
                path.display()
            ),
            Self::Unsupported { feature } => {
                write!(f, "{feature} is not supported on this hardware")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error on '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SysfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SysfsError> for ArmouryError {
    fn from(e: SysfsError) -> Self {
        Self::Sysfs(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

/// Errors related to display queries and refresh-rate changes.
#[derive(Debug)]
pub enum DisplayError {
    /// xrandr reported no connected output.
    NoConnectedOutput,

    /// The requested rate is not in the panel's mode list.
    UnsupportedRate { rate: u32, supported: Vec<u32> },

    /// The underlying xrandr invocation failed.
    Exec(ExecError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConnectedOutput => write!(f, "No connected display output found"),
            Self::UnsupportedRate { rate, supported } => write!(
                f,
                "Refresh rate {rate}Hz is not supported (panel offers {supported:?})"
            ),
            Self::Exec(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Exec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExecError> for DisplayError {
    fn from(e: ExecError) -> Self {
        Self::Exec(e)
    }
}

impl From<DisplayError> for ArmouryError {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Hook errors
// ---------------------------------------------------------------------------

/// Errors related to command hook manifest loading.
#[derive(Debug)]
pub enum HookError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A required field is missing or empty.
    MissingField { hook: String, field: &'static str },

    /// Manifest file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// Maximum number of hooks exceeded.
    TooManyHooks { count: usize, max: usize },

    /// I/O error reading a manifest.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::MissingField { hook, field } => {
                write!(f, "Hook '{hook}': missing required field '{field}'")
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Hook manifest '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::TooManyHooks { count, max } => {
                write!(f, "Too many hooks loaded ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading hook '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<HookError> for ArmouryError {
    fn from(e: HookError) -> Self {
        Self::Hook(e)
    }
}

/// Convenience type alias for Linux Armoury results.
pub type Result<T> = std::result::Result<T, ArmouryError>;
