//! Configuration System
//!
//! Layered configuration for hosts and logging. Sources, lowest to highest
//! precedence: built-in defaults, `scoped-context.toml` in the given
//! directory, `scoped-context.{env}.toml` for the active environment
//! (`SCOPED_CONTEXT_ENV`), then `SCOPED_CONTEXT__*` environment variables
//! (`__` separates nested keys, e.g. `SCOPED_CONTEXT__HOST__LABEL`).

use crate::error::ContextError;
use crate::logging::LoggingConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE_STEM: &str = "scoped-context";
pub const DEFAULT_ENV_PREFIX: &str = "SCOPED_CONTEXT";
const ENV_NAME_VAR: &str = "SCOPED_CONTEXT_ENV";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopedContextConfig {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings applied to a [`crate::Host`] and every scope mounted from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Label used in log output for the host frame
    #[serde(default = "default_host_label")]
    pub label: String,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Warn when a scope reads a key it registered itself
    #[serde(default = "default_true")]
    pub warn_self_lookup: bool,

    /// Log at debug level when a registration shadows an ancestor's
    #[serde(default)]
    pub report_shadowing: bool,
}

fn default_host_label() -> String {
    "host".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            label: default_host_label(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            warn_self_lookup: default_true(),
            report_shadowing: false,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Host(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Host(msg) => write!(f, "Host: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ScopedContextConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.host.label.trim().is_empty() {
            errors.push(ValidationError::Host("label cannot be empty".to_string()));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ContextError> {
        toml::to_string_pretty(self)
            .map_err(|e| ContextError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

/// Loads [`ScopedContextConfig`] from layered sources
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    environment: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            environment: None,
        }
    }

    /// Override the environment-variable prefix (default `SCOPED_CONTEXT`).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Select the environment overlay instead of reading `SCOPED_CONTEXT_ENV`.
    pub fn with_environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    /// Load configuration for `dir`, validating the result.
    pub fn load(&self, dir: &Path) -> Result<ScopedContextConfig, ContextError> {
        let mut builder = builder_with_defaults()?;

        let base = dir.join(format!("{}.toml", CONFIG_FILE_STEM));
        if base.exists() {
            debug!(config_path = %base.display(), "Loading base configuration");
            builder = builder.add_source(File::from(base.as_path()).required(false));
        }

        let environment = self
            .environment
            .clone()
            .or_else(|| std::env::var(ENV_NAME_VAR).ok());
        if let Some(environment) = environment {
            let overlay = dir.join(format!("{}.{}.toml", CONFIG_FILE_STEM, environment));
            if overlay.exists() {
                debug!(config_path = %overlay.display(), "Loading environment configuration");
                builder = builder.add_source(File::from(overlay.as_path()).required(false));
            }
        }

        self.finish(builder)
    }

    /// Load a single explicit file on top of the defaults.
    pub fn load_file(&self, path: &Path) -> Result<ScopedContextConfig, ContextError> {
        if !path.exists() {
            return Err(ContextError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path));
        self.finish(builder)
    }

    fn finish(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ScopedContextConfig, ContextError> {
        let config: ScopedContextConfig = builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ContextError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        Ok(config)
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ContextError> {
    Ok(Config::builder()
        .set_default("host.label", default_host_label())?
        .set_default("host.diagnostics.warn_self_lookup", true)?
        .set_default("host.diagnostics.report_shadowing", false)?)
}
