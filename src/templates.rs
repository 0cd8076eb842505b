//! Command templates
//!
//! Every terminal command the workbench runs starts life as a template such as
//! `${containerCommand} build --pull --rm -f "${dockerfile}" -t ${tag} "${context}"`.
//! Templates may carry a `match` pattern restricting them to certain files;
//! when several apply, the user picks one.

use crate::error::{Result, WorkbenchError};
use crate::prompt::{PickItem, Prompter};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());
static REDUNDANT_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

pub static TAG_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\$\{tag\}").unwrap());
pub static SERVICE_LIST_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$\{serviceList\}").unwrap());
pub static PROFILE_LIST_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$\{profileList\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Build,
    Run,
    RunInteractive,
    ComposeUp,
    ComposeDown,
    ComposeUpSubset,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Build => "build",
            TemplateKind::Run => "run",
            TemplateKind::RunInteractive => "runInteractive",
            TemplateKind::ComposeUp => "composeUp",
            TemplateKind::ComposeDown => "composeDown",
            TemplateKind::ComposeUpSubset => "composeUpSubset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub label: String,
    pub template: String,
    /// Regex tested against the workspace-relative file path
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,
}

impl CommandTemplate {
    pub fn new(label: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            template: template.into(),
            match_pattern: None,
        }
    }

    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = Some(pattern.into());
        self
    }

    fn matches(&self, file: Option<&str>) -> Result<bool> {
        match (&self.match_pattern, file) {
            (Some(pattern), Some(file)) => Ok(Regex::new(pattern)?.is_match(file)),
            _ => Ok(false),
        }
    }
}

/// Configured templates per kind; an empty list falls back to the built-in default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub build: Vec<CommandTemplate>,
    pub run: Vec<CommandTemplate>,
    pub run_interactive: Vec<CommandTemplate>,
    pub compose_up: Vec<CommandTemplate>,
    pub compose_down: Vec<CommandTemplate>,
    pub compose_up_subset: Vec<CommandTemplate>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        let defaults = |kind| vec![Self::default_template(kind)];
        Self {
            build: defaults(TemplateKind::Build),
            run: defaults(TemplateKind::Run),
            run_interactive: defaults(TemplateKind::RunInteractive),
            compose_up: defaults(TemplateKind::ComposeUp),
            compose_down: defaults(TemplateKind::ComposeDown),
            compose_up_subset: defaults(TemplateKind::ComposeUpSubset),
        }
    }
}

impl TemplateSettings {
    pub fn default_template(kind: TemplateKind) -> CommandTemplate {
        let template = match kind {
            TemplateKind::Build => {
                r#"${containerCommand} build --pull --rm -f "${dockerfile}" -t ${tag} "${context}""#
            }
            TemplateKind::Run => "${containerCommand} run --rm -d ${exposedPorts} ${tag}",
            TemplateKind::RunInteractive => "${containerCommand} run --rm -it ${exposedPorts} ${tag}",
            TemplateKind::ComposeUp => {
                "${composeCommand} ${configurationFile} up ${detached} ${build}"
            }
            TemplateKind::ComposeDown => "${composeCommand} ${configurationFile} down",
            TemplateKind::ComposeUpSubset => {
                "${composeCommand} ${profileList} ${configurationFile} up ${detached} ${build} ${serviceList}"
            }
        };
        CommandTemplate::new(format!("{} (default)", kind.as_str()), template)
    }

    pub fn templates(&self, kind: TemplateKind) -> Vec<CommandTemplate> {
        let configured = match kind {
            TemplateKind::Build => &self.build,
            TemplateKind::Run => &self.run,
            TemplateKind::RunInteractive => &self.run_interactive,
            TemplateKind::ComposeUp => &self.compose_up,
            TemplateKind::ComposeDown => &self.compose_down,
            TemplateKind::ComposeUpSubset => &self.compose_up_subset,
        };
        if configured.is_empty() {
            vec![Self::default_template(kind)]
        } else {
            configured.clone()
        }
    }

    /// Every `match` pattern must compile
    pub fn validate(&self) -> Result<()> {
        let all = [
            &self.build,
            &self.run,
            &self.run_interactive,
            &self.compose_up,
            &self.compose_down,
            &self.compose_up_subset,
        ];
        for template in all.into_iter().flatten() {
            if let Some(pattern) = &template.match_pattern {
                Regex::new(pattern).map_err(|e| {
                    WorkbenchError::Config(format!(
                        "Template '{}' has an invalid match pattern: {}",
                        template.label, e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

/// Values substituted into a template; `None` leaves the variable untouched
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    pub container_command: Option<String>,
    pub compose_command: Option<String>,
    pub dockerfile: Option<String>,
    pub context: Option<String>,
    /// Compose file, rendered as `-f "file"`; `Some("")` renders nothing
    pub configuration_file: Option<String>,
    pub detached: Option<bool>,
    pub build: Option<bool>,
    pub exposed_ports: Option<Vec<String>>,
}

impl TemplateVariables {
    fn values(&self) -> HashMap<&'static str, String> {
        let mut values = HashMap::new();
        if let Some(v) = &self.container_command {
            values.insert("containercommand", v.clone());
        }
        if let Some(v) = &self.compose_command {
            values.insert("composecommand", v.clone());
        }
        if let Some(v) = &self.dockerfile {
            values.insert("dockerfile", v.clone());
        }
        if let Some(v) = &self.context {
            values.insert("context", v.clone());
        }
        if let Some(file) = &self.configuration_file {
            let rendered = if file.is_empty() {
                String::new()
            } else {
                format!("-f \"{}\"", file)
            };
            values.insert("configurationfile", rendered);
        }
        if let Some(detached) = self.detached {
            values.insert("detached", if detached { "-d" } else { "" }.to_string());
        }
        if let Some(build) = self.build {
            values.insert("build", if build { "--build" } else { "" }.to_string());
        }
        if let Some(ports) = &self.exposed_ports {
            let rendered = ports
                .iter()
                .map(|port| {
                    let number = port.split('/').next().unwrap_or(port);
                    format!("-p {}:{}", number, port)
                })
                .collect::<Vec<_>>()
                .join(" ");
            values.insert("exposedports", rendered);
        }
        values
    }
}

/// Substitute known variables (case-insensitively) and collapse runs of blanks
pub fn resolve_variables(template: &str, variables: &TemplateVariables) -> String {
    let values = variables.values();
    let resolved = VARIABLE.replace_all(template, |caps: &regex::Captures| {
        let name = caps[1].to_lowercase();
        match values.get(name.as_str()) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    });
    REDUNDANT_SPACE.replace_all(&resolved, " ").trim().to_string()
}

/// Replace the first match of `placeholder` with `value`, literally
pub fn replace_placeholder(command: &str, placeholder: &Regex, value: &str) -> String {
    placeholder.replace(command, NoExpand(value)).into_owned()
}

/// Choose the template for `kind`
///
/// Templates whose `match` pattern matches `file` win; otherwise those
/// without a pattern are candidates. Several candidates are offered to the user.
pub async fn select_template(
    kind: TemplateKind,
    settings: &TemplateSettings,
    file: Option<&str>,
    prompter: &dyn Prompter,
) -> Result<CommandTemplate> {
    let templates = settings.templates(kind);

    let mut matched = Vec::new();
    for template in &templates {
        if template.matches(file)? {
            matched.push(template.clone());
        }
    }
    let mut candidates: Vec<CommandTemplate> = if matched.is_empty() {
        templates
            .into_iter()
            .filter(|t| t.match_pattern.is_none())
            .collect()
    } else {
        matched
    };

    match candidates.len() {
        0 => Err(WorkbenchError::Config(format!(
            "No {} command template applies{}",
            kind.as_str(),
            file.map(|f| format!(" to {}", f)).unwrap_or_default()
        ))),
        1 => Ok(candidates.swap_remove(0)),
        _ => {
            let items: Vec<PickItem> = candidates
                .iter()
                .map(|t| PickItem::new(&t.label).with_description(&t.template))
                .collect();
            let index = prompter.pick_one("Choose a command template", &items).await?;
            candidates
                .into_iter()
                .nth(index)
                .ok_or_else(|| WorkbenchError::Validation("Invalid template choice".to_string()))
        }
    }
}

/// Select a template and resolve its variables
pub async fn select_command(
    kind: TemplateKind,
    settings: &TemplateSettings,
    file: Option<&str>,
    variables: &TemplateVariables,
    prompter: &dyn Prompter,
) -> Result<String> {
    let template = select_template(kind, settings, file, prompter).await?;
    tracing::debug!(kind = kind.as_str(), label = %template.label, "command template selected");
    Ok(resolve_variables(&template.template, variables))
}
