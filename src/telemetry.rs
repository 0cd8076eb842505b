//! Image tag classification
//!
//! Tag names are never recorded verbatim. Instead a small property bag
//! describes their shape (registry kind, slash count, whether the tag looks
//! like a version) and is emitted as a `telemetry` tracing event.

use crate::error::{Result, WorkbenchError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

pub type TelemetryProperties = BTreeMap<String, String>;

pub const TELEMETRY_TARGET: &str = "telemetry";

/// Which side of a user edit the properties describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyPostfix {
    Before,
    After,
    None,
}

impl PropertyPostfix {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyPostfix::Before => ".before",
            PropertyPostfix::After => ".after",
            PropertyPostfix::None => "",
        }
    }
}

static REPOSITORY_AND_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*):(.*)$").unwrap());

static SAFE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9.-]*(|alpha|beta|latest|edge|v|version)?[0-9.-]*$").unwrap());

// Checked in order; the first match names the registry kind
static KNOWN_REGISTRIES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("dockerhub-namespace", r"^[^.:]+/[^.:]+$"),
        ("dockerhub-dockerio", r"^docker.io.*/"),
        ("github", r"ghcr\.io.*/"),
        ("gitlab", r"gitlab.*/"),
        ("ACR", r"azurecr\.io.*/"),
        ("GCR", r"gcr\.io.*/"),
        ("ECR", r"\.ecr\..*/"),
        ("localhost", r"localhost:.*/"),
        ("privateWithPort", r":[0-9]+/"),
        ("other", r"/"),
        ("none", r"."),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

/// Describe the shape of `full_name` without revealing it
pub fn classify_image_tag(full_name: &str) -> TelemetryProperties {
    // Greedy, so the split happens at the last colon
    let (repository, tag) = match REPOSITORY_AND_TAG.captures(full_name) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()),
            caps.get(2).map_or("", |m| m.as_str()),
        ),
        None => (full_name, ""),
    };

    let mut properties = TelemetryProperties::new();
    if SAFE_TAG.is_match(tag) {
        properties.insert("safeTag".to_string(), tag.to_string());
    }
    properties.insert("hasTag".to_string(), (!tag.is_empty()).to_string());
    properties.insert(
        "numSlashes".to_string(),
        repository.matches('/').count().to_string(),
    );

    if let Some((kind, _)) = KNOWN_REGISTRIES
        .iter()
        .find(|(_, regex)| regex.is_match(repository))
    {
        properties.insert("registryType".to_string(), kind.to_string());
    }

    properties
}

/// Merge the classification of `full_name` into `properties`, suffixing each key
///
/// Never fails; problems are logged and the bag is left as it was.
pub fn add_image_tagging_telemetry(
    properties: &mut TelemetryProperties,
    full_name: &str,
    postfix: PropertyPostfix,
) {
    if let Err(e) = try_add(properties, full_name, postfix) {
        tracing::warn!(error = %e, "failed to classify image tag");
    }
}

fn try_add(
    properties: &mut TelemetryProperties,
    full_name: &str,
    postfix: PropertyPostfix,
) -> Result<()> {
    if full_name.contains('\n') {
        return Err(WorkbenchError::Validation(
            "Image name spans several lines".to_string(),
        ));
    }
    for (key, value) in classify_image_tag(full_name) {
        properties.insert(format!("{}{}", key, postfix.as_str()), value);
    }
    Ok(())
}

/// Emit a property bag for `command`
pub fn emit(command: &str, properties: &TelemetryProperties) {
    tracing::info!(target: TELEMETRY_TARGET, command, ?properties, "command telemetry");
}
