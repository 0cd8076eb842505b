use crate::error::{Result, WorkbenchError};
use crate::workbench::Workbench;
use futures::future::join_all;

/// Remove one or more containers after a single confirmation
///
/// Removals run concurrently; every failure is reported, not just the first.
pub async fn remove_containers(workbench: &Workbench, containers: &[String]) -> Result<()> {
    let confirm = match containers {
        [] => {
            return Err(WorkbenchError::NotFound(
                "No containers are available to remove".to_string(),
            ));
        }
        [only] => format!("Are you sure you want to remove container \"{}\"?", only),
        _ => "Are you sure you want to remove selected containers?".to_string(),
    };
    workbench.prompter.confirm(&confirm, "Remove").await?;

    workbench.logger.step("Removing container(s)...");
    let results = join_all(
        containers
            .iter()
            .map(|container| workbench.engine.remove_container(container)),
    )
    .await;

    let mut errors = Vec::new();
    for (container, result) in containers.iter().zip(results) {
        match result {
            Ok(()) => workbench.logger.detail(&format!("Removed {}", container)),
            Err(e) => {
                tracing::warn!(container = %container, error = %e, "container removal failed");
                errors.push(e);
            }
        }
    }

    match WorkbenchError::aggregate(errors) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
