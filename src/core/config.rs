//! Configuration management for the aggregator.
//!
//! This module provides a centralized configuration structure populated from
//! the command line (with environment fallbacks, see [`Cli`]) and from the
//! JSON file that lists the child servers.
//!
//! The file is parsed and validated here, once. The rest of the crate only
//! ever sees the resulting [`Config`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::cli::Cli;
use super::error::{Error, Result};
use crate::domains::children::{ChildSpec, CommandResolver, FleetSpec, RuntimeToolchain};
use crate::domains::tools::Separator;

/// Main configuration structure for the aggregator.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Separator between child key and tool name.
    pub separator: Separator,

    /// Runtime used to resolve child commands.
    pub runtime: RuntimeConfig,

    /// Child servers, in configuration order.
    pub children: FleetSpec,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Diagnostics mode; forces the `debug` level.
    pub debug: bool,

    /// Write diagnostics to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// The level actually applied.
    pub fn effective_level(&self) -> &str {
        if self.debug { "debug" } else { &self.level }
    }
}

/// The runtime that child commands may be redirected to.
///
/// With no executable configured, the aggregator's own executable is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Command name that selects the runtime. Defaults to the executable's
    /// file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Path of the runtime executable.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Tools installed next to the runtime executable.
    #[serde(default)]
    pub companions: Vec<String>,
}

impl RuntimeConfig {
    /// Build the toolchain described by this configuration.
    pub fn toolchain(&self) -> Option<RuntimeToolchain> {
        let base = match &self.executable {
            Some(executable) => {
                let name = match &self.name {
                    Some(name) => name.clone(),
                    None => executable.file_stem()?.to_str()?.to_string(),
                };
                RuntimeToolchain::new(name, executable.clone())
            }
            None => {
                let mut current = RuntimeToolchain::current_process()?;
                if let Some(name) = &self.name {
                    current.name = name.clone();
                }
                current
            }
        };
        Some(base.with_companions(self.companions.iter().cloned()))
    }

    /// Build the command resolver for child processes.
    pub fn resolver(&self) -> CommandResolver {
        match self.toolchain() {
            Some(toolchain) => CommandResolver::new(toolchain),
            None => CommandResolver::passthrough(),
        }
    }
}

/// On-disk configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Child servers keyed by namespace, in file order.
    #[serde(default)]
    pub mcp_servers: serde_json::Map<String, serde_json::Value>,

    /// Optional runtime toolchain override.
    #[serde(default)]
    pub runtime: Option<RuntimeConfig>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Cannot read configuration file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&contents).map_err(|e| {
            Error::config(format!("Invalid configuration file {}: {e}", path.display()))
        })
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Validate the raw child entries and turn them into a [`FleetSpec`].
    ///
    /// `${VAR}` references are expanded through `lookup`.
    pub fn children(
        &self,
        separator: &Separator,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<FleetSpec> {
        let mut fleet = FleetSpec::new();
        for (key, raw) in &self.mcp_servers {
            validate_key(key, separator)?;

            let spec: ChildSpec = serde_json::from_value(raw.clone()).map_err(|e| {
                Error::config(format!("Invalid configuration for child server '{key}': {e}"))
            })?;
            let spec = expand_spec(key, spec, &lookup)?;

            if spec.command.trim().is_empty() {
                return Err(Error::config(format!(
                    "Child server '{key}' has an empty command"
                )));
            }
            fleet.insert(key.clone(), spec);
        }
        Ok(fleet)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-aggregator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug: false,
            file: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the configuration from parsed command-line arguments, reading
    /// the child list from the configuration file if one is given.
    pub fn load(cli: &Cli) -> Result<Self> {
        let separator = Separator::new(cli.separator.as_str())?;

        let mut config = Self {
            server: ServerConfig {
                name: cli.server_name.clone(),
                ..Default::default()
            },
            logging: LoggingConfig {
                level: cli.log_level.clone(),
                debug: cli.debug,
                file: cli.log_file.clone(),
            },
            separator,
            ..Default::default()
        };

        if let Some(path) = &cli.config {
            let file = ConfigFile::read(path)?;
            config.children = file.children(&config.separator, |name| std::env::var(name).ok())?;
            config.runtime = file.runtime.unwrap_or_default();
            info!(
                path = %path.display(),
                children = config.children.len(),
                "Configuration loaded"
            );
        }

        Ok(config)
    }

    /// Replace the child list.
    pub fn with_children(mut self, children: FleetSpec) -> Self {
        self.children = children;
        self
    }

    /// Replace the separator.
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }
}

/// A child key becomes the namespace prefix of its tools, so it must be
/// non-empty, free of whitespace and must not contain the separator.
fn validate_key(key: &str, separator: &Separator) -> Result<()> {
    if key.is_empty() {
        return Err(Error::config("Child server key must not be empty"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(Error::config(format!(
            "Child server key '{key}' must not contain whitespace"
        )));
    }
    if key.contains(separator.as_str()) {
        return Err(Error::config(format!(
            "Child server key '{key}' must not contain the namespace separator '{separator}'"
        )));
    }
    Ok(())
}

fn expand_spec(
    key: &str,
    spec: ChildSpec,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<ChildSpec> {
    let expand = |value: &str| {
        expand_env(value, lookup)
            .map_err(|var| Error::config(format!(
                "Child server '{key}' references environment variable '{var}', which is not set"
            )))
    };

    Ok(ChildSpec {
        command: expand(&spec.command)?,
        args: spec
            .args
            .iter()
            .map(|arg| expand(arg))
            .collect::<Result<_>>()?,
        env: spec
            .env
            .iter()
            .map(|(name, value)| Ok::<_, Error>((name.clone(), expand(value)?)))
            .collect::<Result<_>>()?,
    })
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// Returns the name of the first unset variable without a default as the
/// error. A `$` not followed by `{`, or an unterminated `${`, is kept
/// literally.
pub fn expand_env(
    input: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> std::result::Result<String, String> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        output.push_str(&rest[..start]);

        let reference = &rest[start + 2..start + 2 + len];
        let (name, default) = match reference.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (reference, None),
        };

        match (lookup(name), default) {
            (Some(value), _) => output.push_str(&value),
            (None, Some(default)) => output.push_str(default),
            (None, None) => return Err(name.to_string()),
        }

        rest = &rest[start + 2 + len + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn cli(args: &[&str]) -> Cli {
        use clap::Parser;
        let mut argv = vec!["mcp_aggregator"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_expand_env() {
        let lookup = vars(&[("HOME", "/home/me"), ("TOKEN", "abc")]);
        assert_eq!(expand_env("plain", &lookup).unwrap(), "plain");
        assert_eq!(expand_env("${HOME}/data", &lookup).unwrap(), "/home/me/data");
        assert_eq!(expand_env("a${TOKEN}b${TOKEN}", &lookup).unwrap(), "aabcbabc");
        assert_eq!(expand_env("${MISSING:-fallback}", &lookup).unwrap(), "fallback");
        assert_eq!(expand_env("${TOKEN:-fallback}", &lookup).unwrap(), "abc");
        assert_eq!(expand_env("$HOME and ${unterminated", &lookup).unwrap(), "$HOME and ${unterminated");
        assert_eq!(expand_env("${MISSING}", &lookup).unwrap_err(), "MISSING");
    }

    #[test]
    fn test_children_keep_file_order() {
        let file = ConfigFile::parse(
            r#"{
                "mcpServers": {
                    "zeta": { "command": "z" },
                    "alpha": { "command": "a", "args": ["--x"] },
                    "github": { "command": "npx", "env": { "TOKEN": "${GH}" } }
                }
            }"#,
        )
        .unwrap();

        let fleet = file.children(&Separator::default(), vars(&[("GH", "secret")])).unwrap();
        assert_eq!(fleet.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "github"]);
        assert_eq!(fleet.get("alpha").unwrap().args, vec!["--x"]);
        assert_eq!(fleet.get("github").unwrap().env["TOKEN"], "secret");
    }

    #[test]
    fn test_missing_variable_names_child_and_variable() {
        let file = ConfigFile::parse(
            r#"{ "mcpServers": { "github": { "command": "npx", "args": ["${GH_BIN}"] } } }"#,
        )
        .unwrap();

        let err = file.children(&Separator::default(), vars(&[])).unwrap_err().to_string();
        assert!(err.contains("github"));
        assert!(err.contains("GH_BIN"));
    }

    #[test]
    fn test_invalid_child_keys() {
        let separator = Separator::new("__").unwrap();
        for key in ["", "has space", "git__hub"] {
            let json = serde_json::json!({ "mcpServers": { key: { "command": "x" } } });
            let file = ConfigFile::parse(&json.to_string()).unwrap();
            assert!(file.children(&separator, vars(&[])).is_err(), "key: {key:?}");
        }
        // Fine with a different separator.
        let json = serde_json::json!({ "mcpServers": { "git__hub": { "command": "x" } } });
        let file = ConfigFile::parse(&json.to_string()).unwrap();
        assert!(file.children(&Separator::default(), vars(&[])).is_ok());
    }

    #[test]
    fn test_invalid_child_spec() {
        for json in [
            r#"{ "mcpServers": { "a": { "args": [] } } }"#,
            r#"{ "mcpServers": { "a": { "command": "  " } } }"#,
            r#"{ "mcpServers": { "a": { "command": 42 } } }"#,
        ] {
            let file = ConfigFile::parse(json).unwrap();
            let err = file.children(&Separator::default(), vars(&[])).unwrap_err();
            assert!(err.to_string().contains("'a'"), "{err}");
        }
    }

    #[test]
    fn test_load_defaults_without_file() {
        let config = Config::load(&cli(&[])).unwrap();
        assert_eq!(config.separator.as_str(), ":");
        assert!(config.children.is_empty());
        assert_eq!(config.logging.effective_level(), "info");
        assert_eq!(config.server.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_load_rejects_bad_separator() {
        let err = Config::load(&cli(&["--separator", "a b"])).unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
        assert!(err.to_string().contains("a b"));
    }

    #[test]
    fn test_load_from_file() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_AGGREGATOR_TEST_TOKEN", "t0ken");
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("servers.json");
        std::fs::write(
            &path,
            r#"{
                "mcpServers": {
                    "github": { "command": "npx", "env": { "TOKEN": "${MCP_AGGREGATOR_TEST_TOKEN}" } }
                },
                "runtime": { "name": "node", "executable": "/opt/node/bin/node", "companions": ["npx"] }
            }"#,
        )
        .unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let config = Config::load(&cli(&["--config", &path_arg, "--separator", "__", "--debug"])).unwrap();

        assert_eq!(config.separator.as_str(), "__");
        assert_eq!(config.logging.effective_level(), "debug");
        assert_eq!(config.children.get("github").unwrap().env["TOKEN"], "t0ken");
        assert_eq!(config.runtime.name.as_deref(), Some("node"));
        assert_eq!(config.runtime.companions, vec!["npx"]);

        unsafe {
            std::env::remove_var("MCP_AGGREGATOR_TEST_TOKEN");
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(&cli(&["--config", "/nonexistent/servers.json"])).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/servers.json"));
    }

    #[test]
    fn test_runtime_toolchain() {
        let runtime = RuntimeConfig {
            name: None,
            executable: Some(PathBuf::from("/opt/node/bin/node")),
            companions: vec!["npm".to_string()],
        };
        let toolchain = runtime.toolchain().unwrap();
        assert_eq!(toolchain.name, "node");
        assert_eq!(toolchain.companions, vec!["npm"]);

        let default = RuntimeConfig::default().toolchain().unwrap();
        assert_eq!(default.executable, std::env::current_exe().unwrap());
    }
}
