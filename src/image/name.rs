//! Image reference parsing and normalization
//!
//! An image reference has the shape `[registry/][namespace/]name[:tag][@digest]`.
//! The first path component is only treated as a registry host when it looks
//! like one (contains `.` or `:`, or is `localhost`); otherwise the reference
//! implicitly targets Docker Hub.

use crate::error::{Result, WorkbenchError};
use std::fmt;

pub const DOCKER_HUB_REGISTRY: &str = "docker.io";
pub const DOCKER_HUB_LIBRARY_NAMESPACE: &str = "library";
pub const DEFAULT_TAG: &str = "latest";

/// Parsed but un-normalized image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNameInfo {
    /// The reference exactly as given
    pub original_name: String,
    /// Explicit registry host, if present
    pub registry: Option<String>,
    /// Repository path below the registry, e.g. `library/alpine` or `alpine`
    pub image: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageNameInfo {
    pub fn parse(input: &str) -> Result<Self> {
        let original = input.trim();
        if original.is_empty() {
            return Err(WorkbenchError::Validation(
                "Image name cannot be empty".to_string(),
            ));
        }

        let (name_and_tag, digest) = match original.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (original, None),
        };

        // A colon only separates a tag when it comes after the last slash,
        // otherwise it belongs to a registry port
        let last_slash = name_and_tag.rfind('/');
        let tag_separator = name_and_tag
            .rfind(':')
            .filter(|&colon| last_slash.is_none_or(|slash| colon > slash));

        let (path, tag) = match tag_separator {
            Some(pos) => {
                let tag = &name_and_tag[pos + 1..];
                (&name_and_tag[..pos], (!tag.is_empty()).then(|| tag.to_string()))
            }
            None => (name_and_tag, None),
        };

        let (registry, image) = match path.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest)
            }
            _ => (None, path),
        };

        if image.is_empty() || image.starts_with('/') || image.ends_with('/') || image.contains("//") {
            return Err(WorkbenchError::Validation(format!(
                "Invalid image name: {}",
                original
            )));
        }

        Ok(Self {
            original_name: original.to_string(),
            registry,
            image: image.to_string(),
            tag,
            digest,
        })
    }

    /// Everything before the final path component, if any
    pub fn namespace(&self) -> Option<&str> {
        self.image.rsplit_once('/').map(|(namespace, _)| namespace)
    }

    /// The final path component
    pub fn name(&self) -> &str {
        self.image
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.image)
    }

    pub fn normalize(&self) -> NormalizedImageNameInfo {
        NormalizedImageNameInfo::new(self)
    }
}

impl fmt::Display for ImageNameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.image)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// Image reference with Docker Hub defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImageNameInfo {
    pub normalized_registry: String,
    pub normalized_namespace: Option<String>,
    pub normalized_image_name: String,
    /// `latest` when neither tag nor digest was given
    pub normalized_tag: Option<String>,
    pub digest: Option<String>,
}

impl NormalizedImageNameInfo {
    pub fn new(info: &ImageNameInfo) -> Self {
        let normalized_registry = match info.registry.as_deref() {
            None | Some("index.docker.io") | Some("registry-1.docker.io") => {
                DOCKER_HUB_REGISTRY.to_string()
            }
            Some(registry) => registry.to_string(),
        };

        let normalized_namespace = match info.namespace() {
            Some(namespace) => Some(namespace.to_string()),
            None if normalized_registry == DOCKER_HUB_REGISTRY => {
                Some(DOCKER_HUB_LIBRARY_NAMESPACE.to_string())
            }
            None => None,
        };

        let normalized_tag = match (&info.tag, &info.digest) {
            (Some(tag), _) => Some(tag.clone()),
            (None, None) => Some(DEFAULT_TAG.to_string()),
            (None, Some(_)) => None,
        };

        Self {
            normalized_registry,
            normalized_namespace,
            normalized_image_name: info.name().to_string(),
            normalized_tag,
            digest: info.digest.clone(),
        }
    }

    /// Repository path including namespace, e.g. `library/alpine`
    pub fn repository(&self) -> String {
        match &self.normalized_namespace {
            Some(namespace) => format!("{}/{}", namespace, self.normalized_image_name),
            None => self.normalized_image_name.clone(),
        }
    }

    /// Manifest reference: the digest when pinned, otherwise the tag
    pub fn reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.normalized_tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }
}

/// Derive a valid image name from a folder path, e.g. `My App` -> `myapp:latest`
pub fn valid_image_name_from_path(path: &std::path::Path, tag: &str) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let name: String = base
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let name = name.trim_start_matches(['.', '_', '-']);
    let name = if name.is_empty() { "image" } else { name };
    format!("{}:{}", name, tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_short_name() {
        let info = ImageNameInfo::parse("alpine").unwrap();
        assert_eq!(info.registry, None);
        assert_eq!(info.image, "alpine");
        assert_eq!(info.tag, None);

        let normalized = info.normalize();
        assert_eq!(normalized.normalized_registry, "docker.io");
        assert_eq!(normalized.normalized_namespace.as_deref(), Some("library"));
        assert_eq!(normalized.normalized_tag.as_deref(), Some("latest"));
        assert_eq!(normalized.repository(), "library/alpine");
    }

    #[test]
    fn test_parse_registry_with_port() {
        let info = ImageNameInfo::parse("localhost:5000/team/app:1.2").unwrap();
        assert_eq!(info.registry.as_deref(), Some("localhost:5000"));
        assert_eq!(info.image, "team/app");
        assert_eq!(info.namespace(), Some("team"));
        assert_eq!(info.name(), "app");
        assert_eq!(info.tag.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_port_without_tag_is_not_a_tag() {
        let info = ImageNameInfo::parse("myregistry.io:443/app").unwrap();
        assert_eq!(info.registry.as_deref(), Some("myregistry.io:443"));
        assert_eq!(info.tag, None);
    }

    #[test]
    fn test_parse_digest() {
        let info = ImageNameInfo::parse("mcr.microsoft.com/dotnet/runtime@sha256:abc").unwrap();
        assert_eq!(info.registry.as_deref(), Some("mcr.microsoft.com"));
        assert_eq!(info.digest.as_deref(), Some("sha256:abc"));
        let normalized = info.normalize();
        assert_eq!(normalized.normalized_tag, None);
        assert_eq!(normalized.normalized_namespace.as_deref(), Some("dotnet"));
        assert_eq!(normalized.reference(), "sha256:abc");
    }

    #[test]
    fn test_docker_io_aliases() {
        let normalized = ImageNameInfo::parse("index.docker.io/library/redis:7").unwrap().normalize();
        assert_eq!(normalized.normalized_registry, "docker.io");
        assert_eq!(normalized.repository(), "library/redis");

        let user_image = ImageNameInfo::parse("myrepo/app").unwrap().normalize();
        assert_eq!(user_image.normalized_namespace.as_deref(), Some("myrepo"));
    }

    #[test]
    fn test_display_round_trip() {
        let info = ImageNameInfo::parse("ghcr.io/org/tool:v1").unwrap();
        assert_eq!(info.to_string(), "ghcr.io/org/tool:v1");
    }

    #[test]
    fn test_invalid_names() {
        assert!(ImageNameInfo::parse("").is_err());
        assert!(ImageNameInfo::parse("   ").is_err());
        assert!(ImageNameInfo::parse("docker.io/").is_err());
        assert!(ImageNameInfo::parse("a//b").is_err());
    }

    #[test]
    fn test_valid_image_name_from_path() {
        assert_eq!(
            valid_image_name_from_path(Path::new("/work/My App"), "latest"),
            "myapp:latest"
        );
        assert_eq!(
            valid_image_name_from_path(Path::new("/work/.hidden"), "dev"),
            "hidden:dev"
        );
    }
}
