use crate::error::Result;
use crate::templates::{TAG_PLACEHOLDER, TemplateKind, TemplateVariables, replace_placeholder, select_command};
use crate::workbench::Workbench;

/// Start a container from `image`, publishing every port the image exposes
pub async fn run_image(workbench: &Workbench, image: &str, interactive: bool) -> Result<()> {
    let kind = if interactive {
        TemplateKind::RunInteractive
    } else {
        TemplateKind::Run
    };

    // Port inspection is best effort; the template still runs without it
    let exposed_ports = match workbench.engine.inspect_image_ports(image).await {
        Ok(ports) => ports,
        Err(e) => {
            tracing::warn!(image, error = %e, "could not inspect exposed ports");
            Vec::new()
        }
    };

    let variables = TemplateVariables {
        container_command: Some(workbench.config.container_command.clone()),
        exposed_ports: Some(exposed_ports),
        ..Default::default()
    };
    let line = select_command(
        kind,
        &workbench.config.templates,
        Some(image),
        &variables,
        workbench.prompter.as_ref(),
    )
    .await?;
    let line = replace_placeholder(&line, &TAG_PLACEHOLDER, image);

    workbench.runner.run(&line, &workbench.workspace).await
}
