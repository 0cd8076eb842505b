//! Compose orchestration
//!
//! `up`, `down`, `restart` and `up-subset` all follow the same path: pick the
//! compose files, select and resolve a template per file, fill in service or
//! profile lists, then hand the command line to the runner.

pub mod placeholders;
pub mod subset;

pub use placeholders::add_services_or_profiles_if_needed;
pub use subset::{ProfilesOrServices, SubsetKind};

use crate::error::Result;
use crate::templates::{TemplateKind, TemplateVariables, select_command};
use crate::workbench::Workbench;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static COMPOSE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(docker-)?compose.*\.ya?ml$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    Up,
    Down,
    UpSubset,
}

impl ComposeCommand {
    fn template_kind(&self) -> TemplateKind {
        match self {
            ComposeCommand::Up => TemplateKind::ComposeUp,
            ComposeCommand::Down => TemplateKind::ComposeDown,
            ComposeCommand::UpSubset => TemplateKind::ComposeUpSubset,
        }
    }
}

/// Which compose files the command applies to
#[derive(Debug, Clone, Default)]
pub struct ComposeTarget {
    /// The file the command was invoked on
    pub file: Option<PathBuf>,
    /// An explicit multi-selection; takes precedence over `file`
    pub selected_files: Vec<PathBuf>,
}

/// Compose files anywhere in the workspace
pub fn discover_compose_files(workbench: &Workbench) -> Result<Vec<PathBuf>> {
    workbench.find_files(&COMPOSE_FILE)
}

async fn compose(
    workbench: &Workbench,
    commands: &[ComposeCommand],
    message: &str,
    target: &ComposeTarget,
) -> Result<()> {
    workbench.ensure_trusted()?;

    let mut files: Vec<PathBuf> = if !target.selected_files.is_empty() {
        target.selected_files.clone()
    } else {
        target.file.iter().cloned().collect()
    };
    if files.is_empty() {
        let discovered = discover_compose_files(workbench)?;
        files.extend(workbench.pick_file(&discovered, message).await?);
    }

    // Without any file the command still runs once, leaving file lookup to compose
    let files: Vec<Option<String>> = if files.is_empty() {
        vec![None]
    } else {
        files.iter().map(|f| Some(workbench.relative(f))).collect()
    };

    for command in commands {
        for file in &files {
            let variables = TemplateVariables {
                compose_command: Some(workbench.config.compose_command.clone()),
                configuration_file: Some(file.clone().unwrap_or_default()),
                detached: Some(workbench.config.compose_detached),
                build: Some(workbench.config.compose_build),
                ..Default::default()
            };
            let line = select_command(
                command.template_kind(),
                &workbench.config.templates,
                file.as_deref(),
                &variables,
                workbench.prompter.as_ref(),
            )
            .await?;

            let line = add_services_or_profiles_if_needed(workbench, &line).await?;
            tracing::info!(command = ?command, file = file.as_deref().unwrap_or("<default>"), "running compose");
            workbench.runner.run(&line, &workbench.workspace).await?;
        }
    }
    Ok(())
}

pub async fn compose_up(workbench: &Workbench, target: &ComposeTarget) -> Result<()> {
    compose(
        workbench,
        &[ComposeCommand::Up],
        "Choose Docker Compose file to bring up",
        target,
    )
    .await
}

pub async fn compose_up_subset(workbench: &Workbench, target: &ComposeTarget) -> Result<()> {
    compose(
        workbench,
        &[ComposeCommand::UpSubset],
        "Choose Docker Compose file to bring up",
        target,
    )
    .await
}

pub async fn compose_down(workbench: &Workbench, target: &ComposeTarget) -> Result<()> {
    compose(
        workbench,
        &[ComposeCommand::Down],
        "Choose Docker Compose file to take down",
        target,
    )
    .await
}

pub async fn compose_restart(workbench: &Workbench, target: &ComposeTarget) -> Result<()> {
    compose(
        workbench,
        &[ComposeCommand::Down, ComposeCommand::Up],
        "Choose Docker Compose file to restart",
        target,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_file_pattern() {
        for name in ["compose.yml", "compose.yaml", "docker-compose.yml", "docker-compose.debug.yml", "Docker-Compose.YAML", "compose.override.yaml"] {
            assert!(COMPOSE_FILE.is_match(name), "{}", name);
        }
        for name in ["compose.json", "my-compose.yml", "Dockerfile", "docker-compose.yml.bak"] {
            assert!(!COMPOSE_FILE.is_match(name), "{}", name);
        }
    }
}
