//! Configuration management module
//!
//! Settings come from defaults, then an optional TOML file
//! (`.docker-workbench/config.toml` in the workspace, or `--config`), then
//! `DOCKER_WORKBENCH_*` environment variables.

use crate::error::handlers::ValidationErrorHandler;
use crate::error::{Result, WorkbenchError};
use crate::templates::TemplateSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".docker-workbench";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_CLIENT_ID: &str = "docker-workbench";

/// Extra registry provider appended after the built-in rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRuleConfig {
    pub name: String,
    /// Registry host as written in image names, e.g. `registry.internal:5000`
    pub host: String,
    /// API base URL, e.g. `https://registry.internal:5000/v2`
    pub base_url: String,
    /// Use the bearer challenge flow
    #[serde(default)]
    pub signed: bool,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub container_command: String,
    pub compose_command: String,
    /// Pass `--build` to compose up
    pub compose_build: bool,
    /// Pass `-d` to compose up
    pub compose_detached: bool,
    /// Build context override; empty means the Dockerfile's folder
    pub image_build_context_path: String,
    /// Commands that execute workspace content refuse to run when false
    pub trusted: bool,
    pub client_id: String,
    /// Network timeout in seconds
    pub timeout: u64,
    pub skip_tls: bool,
    pub templates: TemplateSettings,
    pub registries: Vec<RegistryRuleConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            container_command: "docker".to_string(),
            compose_command: "docker compose".to_string(),
            compose_build: true,
            compose_detached: true,
            image_build_context_path: String::new(),
            trusted: true,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            timeout: 60,
            skip_tls: false,
            templates: TemplateSettings::default(),
            registries: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.container_command.trim().is_empty() {
            return Err(WorkbenchError::Validation(
                "container_command cannot be empty".to_string(),
            ));
        }
        if self.compose_command.trim().is_empty() {
            return Err(WorkbenchError::Validation(
                "compose_command cannot be empty".to_string(),
            ));
        }
        ValidationErrorHandler::validate_timeout(self.timeout)?;
        for rule in &self.registries {
            ValidationErrorHandler::validate_base_url(&rule.base_url)?;
            if rule.host.is_empty() {
                return Err(WorkbenchError::Validation(format!(
                    "Registry rule '{}' has an empty host",
                    rule.name
                )));
            }
        }
        self.templates.validate()
    }

    /// Default config file location for a workspace
    pub fn default_path(workspace: &Path) -> PathBuf {
        workspace.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from `path`, or the workspace default when present, then apply the environment
    pub fn load(path: Option<&Path>, workspace: &Path) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = Self::default_path(workspace);
                if default_path.is_file() {
                    Self::read_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        let config = config.from_env();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WorkbenchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
            .map_err(|e| WorkbenchError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Override with environment variables if present
    pub fn from_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `DOCKER_WORKBENCH_*` overrides from an arbitrary lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("DOCKER_WORKBENCH_CONTAINER_COMMAND") {
            self.container_command = val;
        }
        if let Some(val) = lookup("DOCKER_WORKBENCH_COMPOSE_COMMAND") {
            self.compose_command = val;
        }
        if let Some(val) = lookup("DOCKER_WORKBENCH_CLIENT_ID") {
            self.client_id = val;
        }
        if let Some(timeout) = lookup("DOCKER_WORKBENCH_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.timeout = timeout;
        }
        if let Some(val) = lookup("DOCKER_WORKBENCH_SKIP_TLS") {
            self.skip_tls = is_truthy(&val);
        }
        if let Some(val) = lookup("DOCKER_WORKBENCH_TRUSTED") {
            self.trusted = is_truthy(&val);
        }
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}
