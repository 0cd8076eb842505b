//! Compose service and profile discovery
//!
//! The compose CLI is asked for the subsets with the same file arguments as
//! the command being built, then the user multi-picks. Earlier picks are
//! pre-selected.

use crate::error::{Result, WorkbenchError};
use crate::prompt::PickItem;
use crate::workbench::Workbench;
use once_cell::sync::Lazy;
use regex::Regex;

static UP_OR_DOWN_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(up|down).*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsetKind {
    Services,
    Profiles,
}

impl SubsetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsetKind::Services => "services",
            SubsetKind::Profiles => "profiles",
        }
    }

    fn state_key(&self, workbench: &Workbench) -> String {
        let folder = workbench
            .workspace
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self {
            SubsetKind::Services => format!("composeServices.{}", folder),
            SubsetKind::Profiles => format!("composeProfiles.{}", folder),
        }
    }
}

/// Both lists resolved from one combined prompt; exactly one of them is non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilesOrServices {
    pub services: String,
    pub profiles: String,
}

/// `docker compose -f a.yml up -d` becomes `docker compose -f a.yml config --services`
pub fn config_command(prefix: &str, kind: SubsetKind) -> String {
    let base = UP_OR_DOWN_TAIL.replace(prefix, "");
    format!("{} config --{}", base.trim_end(), kind.as_str())
}

/// List the services or profiles the compose files define
pub async fn get_service_subsets(
    workbench: &Workbench,
    prefix: &str,
    kind: SubsetKind,
) -> Result<Vec<String>> {
    let command = config_command(prefix, kind);
    let stdout = workbench
        .runner
        .capture_success(&command, &workbench.workspace)
        .await?;
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

async fn pick_subset(
    workbench: &Workbench,
    kind: SubsetKind,
    available: Vec<String>,
    placeholder: &str,
) -> Result<Vec<String>> {
    let key = kind.state_key(workbench);
    let previous: Vec<String> = workbench.state.get(&key).unwrap_or_default();

    let items: Vec<PickItem> = available
        .iter()
        .map(|name| PickItem::new(name).picked(previous.contains(name)))
        .collect();
    let chosen: Vec<String> = workbench
        .prompter
        .pick_many(placeholder, &items)
        .await?
        .into_iter()
        .filter_map(|i| available.get(i).cloned())
        .collect();

    if let Err(e) = workbench.state.update(&key, &chosen) {
        tracing::warn!(error = %e, "failed to remember compose {}", kind.as_str());
    }
    Ok(chosen)
}

/// Space-separated services to start
pub async fn get_compose_service_list(workbench: &Workbench, prefix: &str) -> Result<String> {
    let services = get_service_subsets(workbench, prefix, SubsetKind::Services).await?;
    if services.is_empty() {
        return Err(WorkbenchError::NotFound(
            "No services were found in the compose document(s). Did you mean to use profiles instead?"
                .to_string(),
        ));
    }

    let chosen = pick_subset(workbench, SubsetKind::Services, services, "Choose services to start").await?;
    if chosen.is_empty() {
        return Err(WorkbenchError::cancelled());
    }
    Ok(chosen.join(" "))
}

/// `--profile a --profile b`; empty when the files define no profiles
pub async fn get_compose_profile_list(
    workbench: &Workbench,
    prefix: &str,
    prefetched: Option<Vec<String>>,
) -> Result<String> {
    let profiles = match prefetched {
        Some(profiles) => profiles,
        None => get_service_subsets(workbench, prefix, SubsetKind::Profiles).await?,
    };
    if profiles.is_empty() {
        return Ok(String::new());
    }

    let chosen = pick_subset(workbench, SubsetKind::Profiles, profiles, "Choose profiles to start").await?;
    Ok(chosen
        .iter()
        .map(|p| format!("--profile {}", p))
        .collect::<Vec<_>>()
        .join(" "))
}

/// Services and profiles are mutually exclusive, so ask which one first
///
/// Without any profiles the question is skipped and services are asked for.
pub async fn get_compose_profiles_or_services(
    workbench: &Workbench,
    prefix: &str,
) -> Result<ProfilesOrServices> {
    let profiles = get_service_subsets(workbench, prefix, SubsetKind::Profiles).await?;

    let use_profiles = if profiles.is_empty() {
        false
    } else {
        let items = [PickItem::new("Services"), PickItem::new("Profiles")];
        workbench
            .prompter
            .pick_one("Do you want to start services or profiles?", &items)
            .await?
            == 1
    };

    if use_profiles {
        Ok(ProfilesOrServices {
            services: String::new(),
            profiles: get_compose_profile_list(workbench, prefix, Some(profiles)).await?,
        })
    } else {
        Ok(ProfilesOrServices {
            services: get_compose_service_list(workbench, prefix).await?,
            profiles: String::new(),
        })
    }
}
