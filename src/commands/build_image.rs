use crate::commands::tag_image::get_tag_from_user_input;
use crate::error::{Result, WorkbenchError};
use crate::image::valid_image_name_from_path;
use crate::telemetry::{self, PropertyPostfix, TelemetryProperties, add_image_tagging_telemetry};
use crate::templates::{TAG_PLACEHOLDER, TemplateKind, TemplateVariables, replace_placeholder, select_command};
use crate::workbench::Workbench;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static DOCKERFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(dockerfile(\..+)?|.+\.dockerfile)$").unwrap());

/// State key remembering the last tag used for a Dockerfile
pub fn build_tag_key(dockerfile: &Path) -> String {
    format!("buildTag_{}", dockerfile.display())
}

pub fn discover_dockerfiles(workbench: &Workbench) -> Result<Vec<PathBuf>> {
    workbench.find_files(&DOCKERFILE)
}

/// Build an image from a Dockerfile, prompting for the tag when the template wants one
pub async fn build_image(workbench: &Workbench, dockerfile: Option<&Path>) -> Result<()> {
    workbench.ensure_trusted()?;

    let dockerfile = match dockerfile {
        Some(path) => workbench.absolute(path),
        None => {
            let found = discover_dockerfiles(workbench)?;
            workbench
                .pick_file(&found, "Choose a Dockerfile to build")
                .await?
                .ok_or_else(|| {
                    WorkbenchError::NotFound("No Dockerfiles found in the workspace".to_string())
                })?
        }
    };
    if !dockerfile.is_file() {
        return Err(WorkbenchError::NotFound(format!(
            "Dockerfile {} does not exist",
            dockerfile.display()
        )));
    }

    let folder = dockerfile
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| workbench.workspace.clone());
    let relative_file = workbench.relative(&dockerfile);
    let context = if workbench.config.image_build_context_path.is_empty() {
        let relative_folder = workbench.relative(&folder);
        if relative_folder.is_empty() {
            ".".to_string()
        } else {
            relative_folder
        }
    } else {
        workbench.config.image_build_context_path.clone()
    };

    let variables = TemplateVariables {
        container_command: Some(workbench.config.container_command.clone()),
        dockerfile: Some(relative_file.clone()),
        context: Some(context),
        ..Default::default()
    };
    let mut line = select_command(
        TemplateKind::Build,
        &workbench.config.templates,
        Some(&relative_file),
        &variables,
        workbench.prompter.as_ref(),
    )
    .await?;

    // Only prompt for a tag when the chosen template actually uses one
    if TAG_PLACEHOLDER.is_match(&line) {
        let key = build_tag_key(&dockerfile);
        let suggested = workbench
            .state
            .get::<String>(&key)
            .unwrap_or_else(|| valid_image_name_from_path(&folder, "latest"));

        let mut properties = TelemetryProperties::new();
        add_image_tagging_telemetry(&mut properties, &suggested, PropertyPostfix::Before);
        let image_name = get_tag_from_user_input(workbench.prompter.as_ref(), &suggested, None).await?;
        add_image_tagging_telemetry(&mut properties, &image_name, PropertyPostfix::After);
        telemetry::emit("buildImage", &properties);

        if let Err(e) = workbench.state.update(&key, &image_name) {
            tracing::warn!(error = %e, "failed to remember build tag");
        }
        line = replace_placeholder(&line, &TAG_PLACEHOLDER, &image_name);
    }

    workbench.logger.section(&format!("Building {}", relative_file));
    workbench.runner.run(&line, &workbench.workspace).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dockerfile_pattern() {
        for name in ["Dockerfile", "dockerfile", "Dockerfile.dev", "api.dockerfile", "web.Dockerfile"] {
            assert!(DOCKERFILE.is_match(name), "{}", name);
        }
        for name in ["Dockerfile.", "dockerfiles", "README.md", ".dockerignore"] {
            assert!(!DOCKERFILE.is_match(name), "{}", name);
        }
    }

    #[test]
    fn test_build_tag_key() {
        assert_eq!(
            build_tag_key(Path::new("/w/api/Dockerfile")),
            "buildTag_/w/api/Dockerfile"
        );
    }
}
