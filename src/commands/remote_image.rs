use crate::error::{Result, WorkbenchError};
use crate::registry::RegistryClient;
use crate::workbench::Workbench;

pub const DELETE_SUPPORT_LINK: &str = "https://aka.ms/AA7jsql";

/// Delete a remote tag and every tag sharing its digest
///
/// Registries without delete support produce a warning and a cancellation.
pub async fn delete_remote_image(
    workbench: &Workbench,
    client: &RegistryClient,
    image: &str,
) -> Result<()> {
    let confirm = format!(
        "Are you sure you want to delete image \"{}\"? This will delete all images that have the same digest.",
        image
    );
    workbench.prompter.confirm(&confirm, "Delete").await?;

    workbench
        .logger
        .step(&format!("Deleting image \"{}\"...", image));
    match client.delete_tag(image).await {
        Ok(digest) => {
            workbench.logger.detail(&format!("Deleted digest {}", digest));
        }
        Err(e) if e.is_unsupported() => {
            workbench
                .prompter
                .show_warning(
                    "Deleting remote images is not supported on this registry. It may need to be enabled.",
                    Some(DELETE_SUPPORT_LINK),
                )
                .await;
            return Err(WorkbenchError::cancelled());
        }
        Err(e) => return Err(e),
    }

    workbench
        .prompter
        .show_info(&format!("Successfully deleted image \"{}\".", image))
        .await;
    Ok(())
}

/// Resolve the digest a remote tag points at and print it
pub async fn copy_remote_image_digest(
    workbench: &Workbench,
    client: &RegistryClient,
    image: &str,
) -> Result<String> {
    let digest = client.image_digest(image).await?;
    workbench.logger.value(&digest);
    Ok(digest)
}

/// Print the tags of a remote repository
pub async fn list_remote_tags(
    workbench: &Workbench,
    client: &RegistryClient,
    image: &str,
) -> Result<Vec<String>> {
    let tags = client.list_tags(image).await?;
    for tag in &tags {
        workbench.logger.value(tag);
    }
    Ok(tags)
}
