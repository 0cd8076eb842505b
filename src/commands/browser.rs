//! Links opened in the user's browser

use crate::error::{Result, WorkbenchError};

pub const DOCKER_HUB_URL: &str = "https://hub.docker.com/";
pub const REGISTRY_HELP_URL: &str = "https://aka.ms/helpicon_containerregistries";

/// A Docker Hub account, repository or tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerHubItem {
    User(String),
    Repository { namespace: String, name: String },
    Tag { namespace: String, repository: String, tag: String },
}

impl DockerHubItem {
    /// `user`, `namespace/repository` or `namespace/repository:tag`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || {
            WorkbenchError::Validation(format!(
                "'{}' is not a Docker Hub user, repository or tag",
                input
            ))
        };

        let (path, tag) = match input.split_once(':') {
            Some((path, tag)) if !tag.is_empty() => (path, Some(tag)),
            Some(_) => return Err(invalid()),
            None => (input, None),
        };
        let parts: Vec<&str> = path.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        match (parts.as_slice(), tag) {
            ([user], None) => Ok(DockerHubItem::User(user.to_string())),
            ([namespace, name], None) => Ok(DockerHubItem::Repository {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            ([namespace, repository], Some(tag)) => Ok(DockerHubItem::Tag {
                namespace: namespace.to_string(),
                repository: repository.to_string(),
                tag: tag.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}

/// Docker Hub page for `item`; a tag links to its repository's tag list
pub fn docker_hub_url(item: &DockerHubItem) -> String {
    match item {
        DockerHubItem::User(user) => format!("{}u/{}", DOCKER_HUB_URL, user),
        DockerHubItem::Repository { namespace, name } => {
            format!("{}r/{}/{}", DOCKER_HUB_URL, namespace, name)
        }
        DockerHubItem::Tag {
            namespace,
            repository,
            ..
        } => format!("{}r/{}/{}/tags", DOCKER_HUB_URL, namespace, repository),
    }
}

pub fn open_url(url: &str) -> Result<()> {
    tracing::debug!(url, "opening browser");
    webbrowser::open(url)
        .map_err(|e| WorkbenchError::Io(format!("Failed to open {}: {}", url, e)))
}

pub fn open_docker_hub_in_browser(item: &DockerHubItem) -> Result<String> {
    let url = docker_hub_url(item);
    open_url(&url)?;
    Ok(url)
}

pub fn registry_help() -> Result<()> {
    open_url(REGISTRY_HELP_URL)
}
