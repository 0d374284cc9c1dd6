//! Command resolution for child processes.
//!
//! A child configured with the bare name of the aggregator's own runtime is
//! launched with that runtime's absolute path instead of whatever the search
//! path would find, so parent and child always run the same runtime. Tools
//! that ship next to the runtime (its "companions") are looked up in the
//! runtime's directory first. Everything else passes through untouched and is
//! resolved by the OS as usual.

use std::path::{Path, PathBuf};

use tracing::info;

/// Script extension appended to companion tools on this platform, if any.
#[cfg(windows)]
pub const COMMAND_SCRIPT_EXTENSION: Option<&str> = Some("cmd");
#[cfg(not(windows))]
pub const COMMAND_SCRIPT_EXTENSION: Option<&str> = None;

/// The runtime a child command may be redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeToolchain {
    /// Bare command name that selects the runtime (e.g. `node`).
    pub name: String,

    /// Absolute path of the runtime executable.
    pub executable: PathBuf,

    /// Tools installed alongside the runtime (e.g. `npm`, `npx`).
    pub companions: Vec<String>,

    /// Extension tried for companions when the bare name is missing.
    pub script_extension: Option<String>,
}

impl RuntimeToolchain {
    pub fn new(name: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        let executable = std::path::absolute(&executable).unwrap_or(executable);
        Self {
            name: name.into(),
            executable,
            companions: Vec::new(),
            script_extension: COMMAND_SCRIPT_EXTENSION.map(str::to_string),
        }
    }

    pub fn with_companions<I, S>(mut self, companions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.companions = companions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_script_extension(mut self, extension: Option<&str>) -> Self {
        self.script_extension = extension.map(str::to_string);
        self
    }

    /// The toolchain of the running process: its own executable, named by
    /// the executable's file stem.
    pub fn current_process() -> Option<Self> {
        let executable = std::env::current_exe().ok()?;
        let name = executable.file_stem()?.to_str()?.to_string();
        Some(Self::new(name, executable))
    }

    fn find_companion(&self, command: &str) -> Option<PathBuf> {
        let dir = self.executable.parent()?;
        let bare = dir.join(command);
        if bare.is_file() {
            return Some(bare);
        }
        let extension = self.script_extension.as_deref()?;
        let scripted = dir.join(format!("{command}.{extension}"));
        scripted.is_file().then_some(scripted)
    }
}

/// Maps configured child commands to the executable actually spawned.
#[derive(Debug, Clone, Default)]
pub struct CommandResolver {
    runtime: Option<RuntimeToolchain>,
}

impl CommandResolver {
    pub fn new(runtime: RuntimeToolchain) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }

    /// A resolver that never substitutes anything.
    pub fn passthrough() -> Self {
        Self { runtime: None }
    }

    pub fn runtime(&self) -> Option<&RuntimeToolchain> {
        self.runtime.as_ref()
    }

    /// Resolve a configured command. Never fails: when nothing applies the
    /// command is returned as given.
    pub fn resolve(&self, command: &str) -> String {
        let Some(resolved) = self.substitute(command) else {
            return command.to_string();
        };
        let resolved = resolved.to_string_lossy().into_owned();
        info!(original = command, resolved = %resolved, "Resolved child command");
        resolved
    }

    fn substitute(&self, command: &str) -> Option<PathBuf> {
        if Path::new(command).is_absolute() {
            return None;
        }
        let runtime = self.runtime.as_ref()?;
        if command == runtime.name {
            return Some(runtime.executable.clone());
        }
        if runtime.companions.iter().any(|c| c == command) {
            return runtime.find_companion(command);
        }
        None
    }
}
