use crate::error::Result;
use crate::prompt::{InputBoxOptions, Prompter};
use crate::telemetry::{self, PropertyPostfix, TelemetryProperties, add_image_tagging_telemetry};
use crate::workbench::Workbench;

/// Ask for a tag, suggesting `full_tag`
///
/// The repository prefix (up to the last `/`) is pre-selected. When the tag
/// has no prefix and `base_image_path` is given, the suggestion is moved
/// under it first.
pub async fn get_tag_from_user_input(
    prompter: &dyn Prompter,
    full_tag: &str,
    base_image_path: Option<&str>,
) -> Result<String> {
    let mut options = InputBoxOptions {
        prompt: "Tag image as...".to_string(),
        value: full_tag.to_string(),
        value_selection: None,
    };

    if let Some(slash) = full_tag.rfind('/') {
        options.value_selection = Some(0..slash);
    } else if let Some(base) = base_image_path {
        options.value = format!("{}/{}", base, full_tag);
        options.value_selection = options.value.rfind('/').map(|slash| 0..slash);
    }

    prompter.input_box(options).await
}

/// Tag a local image under a new name and return that name
pub async fn tag_image(
    workbench: &Workbench,
    image: &str,
    base_image_path: Option<&str>,
) -> Result<String> {
    let mut properties = TelemetryProperties::new();
    add_image_tagging_telemetry(&mut properties, image, PropertyPostfix::Before);

    let new_name = get_tag_from_user_input(workbench.prompter.as_ref(), image, base_image_path).await?;
    add_image_tagging_telemetry(&mut properties, &new_name, PropertyPostfix::After);
    telemetry::emit("tagImage", &properties);

    workbench.engine.tag_image(image, &new_name).await?;
    workbench
        .logger
        .success(&format!("Tagged {} as {}", image, new_name));
    Ok(new_name)
}
