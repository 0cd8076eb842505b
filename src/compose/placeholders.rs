//! Resolution of the `${serviceList}` and `${profileList}` placeholders.
//!
//! Both present: one combined prompt decides between services and profiles.
//! One present: only that list is asked for. Neither: the command is returned
//! as is and nothing is prompted.

use crate::compose::subset::{
    get_compose_profile_list, get_compose_profiles_or_services, get_compose_service_list,
};
use crate::error::Result;
use crate::templates::{PROFILE_LIST_PLACEHOLDER, SERVICE_LIST_PLACEHOLDER, replace_placeholder};
use crate::workbench::Workbench;

/// The command with both placeholders removed, used to query the compose CLI
pub fn without_placeholders(command: &str) -> String {
    let without = replace_placeholder(command, &SERVICE_LIST_PLACEHOLDER, "");
    replace_placeholder(&without, &PROFILE_LIST_PLACEHOLDER, "")
}

pub async fn add_services_or_profiles_if_needed(
    workbench: &Workbench,
    command: &str,
) -> Result<String> {
    let has_services = SERVICE_LIST_PLACEHOLDER.is_match(command);
    let has_profiles = PROFILE_LIST_PLACEHOLDER.is_match(command);
    let without = without_placeholders(command);

    let resolved = match (has_services, has_profiles) {
        (true, true) => {
            let chosen = get_compose_profiles_or_services(workbench, &without).await?;
            let command = replace_placeholder(command, &SERVICE_LIST_PLACEHOLDER, &chosen.services);
            replace_placeholder(&command, &PROFILE_LIST_PLACEHOLDER, &chosen.profiles)
        }
        (true, false) => {
            let services = get_compose_service_list(workbench, &without).await?;
            replace_placeholder(command, &SERVICE_LIST_PLACEHOLDER, &services)
        }
        (false, true) => {
            let profiles = get_compose_profile_list(workbench, &without, None).await?;
            replace_placeholder(command, &PROFILE_LIST_PLACEHOLDER, &profiles)
        }
        (false, false) => return Ok(command.to_string()),
    };

    Ok(collapse_blanks(&resolved))
}

fn collapse_blanks(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}
