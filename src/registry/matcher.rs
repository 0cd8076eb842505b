//! Ordered registry provider rules
//!
//! Each [`ImageRegistry`] pairs a predicate over an image name with the API base
//! URL to use for it. [`RegistryMatcher::find`] returns the first rule that
//! matches, so list order decides precedence.

use crate::error::Result;
use crate::error::handlers::ValidationErrorHandler;
use crate::image::{ImageNameInfo, NormalizedImageNameInfo};
use crate::image::name::{DOCKER_HUB_LIBRARY_NAMESPACE, DOCKER_HUB_REGISTRY};
use crate::registry::auth::Auth;
use crate::registry::token_manager::{RequestSigner, TokenManager};
use std::fmt;
use std::sync::Arc;
use url::Url;

pub const DOCKER_HUB_LIBRARY_BASE_URL: &str = "https://registry-1.docker.io/v2/library";
pub const DOCKER_HUB_ROOT_URL: &str = "https://registry-1.docker.io/v2/";
pub const MCR_REGISTRY: &str = "mcr.microsoft.com";
pub const MCR_BASE_URL: &str = "https://mcr.microsoft.com/v2";

pub type ImagePredicate = Arc<dyn Fn(&ImageNameInfo) -> bool + Send + Sync>;

/// One provider rule
#[derive(Clone)]
pub struct ImageRegistry {
    pub name: String,
    pub base_url: Url,
    is_match: ImagePredicate,
    /// The base URL already ends in the namespace (Docker Hub's `/v2/library`)
    namespace_in_base: bool,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl fmt::Debug for ImageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRegistry")
            .field("name", &self.name)
            .field("base_url", &self.base_url.as_str())
            .field("namespace_in_base", &self.namespace_in_base)
            .field("signed", &self.signer.is_some())
            .finish()
    }
}

impl ImageRegistry {
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        is_match: impl Fn(&ImageNameInfo) -> bool + Send + Sync + 'static,
    ) -> Result<Self> {
        ValidationErrorHandler::validate_base_url(base_url)?;
        Ok(Self {
            name: name.into(),
            base_url: Url::parse(base_url.trim_end_matches('/'))?,
            is_match: Arc::new(is_match),
            namespace_in_base: false,
            signer: None,
        })
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_namespace_in_base(mut self, namespace_in_base: bool) -> Self {
        self.namespace_in_base = namespace_in_base;
        self
    }

    /// Official Docker Hub images (`docker.io/library/*`), signed through a
    /// challenge-driven token cache probing `root_url`
    pub fn docker_hub_library(auth: Auth, base_url: &str, root_url: &str) -> Result<Self> {
        let token_manager = TokenManager::new(auth, Url::parse(root_url)?);
        Ok(Self::new("Docker Hub", base_url, |info: &ImageNameInfo| {
            let normalized = NormalizedImageNameInfo::new(info);
            !info.original_name.is_empty()
                && normalized.normalized_registry == DOCKER_HUB_REGISTRY
                && normalized.normalized_namespace.as_deref() == Some(DOCKER_HUB_LIBRARY_NAMESPACE)
        })?
        .with_namespace_in_base(true)
        .with_signer(Arc::new(token_manager)))
    }

    /// Microsoft Container Registry, anonymous
    pub fn microsoft_container_registry(base_url: &str) -> Result<Self> {
        Self::new("Microsoft Container Registry", base_url, |info: &ImageNameInfo| {
            !info.original_name.is_empty() && info.registry.as_deref() == Some(MCR_REGISTRY)
        })
    }

    /// Any image whose explicit registry host equals `host`
    pub fn for_host(
        name: impl Into<String>,
        host: impl Into<String>,
        base_url: &str,
    ) -> Result<Self> {
        let host = host.into();
        Self::new(name, base_url, move |info: &ImageNameInfo| {
            info.registry.as_deref() == Some(host.as_str())
        })
    }

    pub fn is_match(&self, info: &ImageNameInfo) -> bool {
        (self.is_match)(info)
    }

    pub fn signer(&self) -> Option<&Arc<dyn RequestSigner>> {
        self.signer.as_ref()
    }

    /// Repository path relative to the base URL
    pub fn repository_path(&self, info: &ImageNameInfo) -> String {
        if self.namespace_in_base {
            info.name().to_string()
        } else {
            info.image.clone()
        }
    }

    /// Token scope for `actions` (e.g. `pull`, `pull,delete`) on the image's repository
    pub fn scope(&self, info: &ImageNameInfo, actions: &str) -> String {
        let repository = if self.namespace_in_base {
            NormalizedImageNameInfo::new(info).repository()
        } else {
            info.image.clone()
        };
        format!("repository:{}:{}", repository, actions)
    }

    /// `{base}/{repository}/{suffix}`
    pub fn url_for(&self, info: &ImageNameInfo, suffix: &str) -> Result<Url> {
        let url = format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.repository_path(info),
            suffix.trim_start_matches('/')
        );
        Ok(Url::parse(&url)?)
    }
}

/// Ordered provider list, first match wins
#[derive(Debug, Clone, Default)]
pub struct RegistryMatcher {
    registries: Vec<ImageRegistry>,
}

impl RegistryMatcher {
    pub fn new(registries: Vec<ImageRegistry>) -> Self {
        Self { registries }
    }

    /// Docker Hub official images, then MCR
    pub fn with_defaults(auth: Auth) -> Result<Self> {
        Ok(Self::new(vec![
            ImageRegistry::docker_hub_library(auth, DOCKER_HUB_LIBRARY_BASE_URL, DOCKER_HUB_ROOT_URL)?,
            ImageRegistry::microsoft_container_registry(MCR_BASE_URL)?,
        ]))
    }

    /// Append a rule with lower precedence than every existing one
    pub fn push(&mut self, registry: ImageRegistry) {
        self.registries.push(registry);
    }

    pub fn registries(&self) -> &[ImageRegistry] {
        &self.registries
    }

    pub fn find(&self, info: &ImageNameInfo) -> Option<&ImageRegistry> {
        let found = self.registries.iter().find(|registry| registry.is_match(info));
        tracing::debug!(
            image = %info.original_name,
            registry = found.map(|r| r.name.as_str()).unwrap_or("<none>"),
            "registry lookup"
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> RegistryMatcher {
        let auth = Auth::new(reqwest::Client::new(), "test-client");
        RegistryMatcher::with_defaults(auth).unwrap()
    }

    fn find_name(matcher: &RegistryMatcher, image: &str) -> Option<String> {
        let info = ImageNameInfo::parse(image).unwrap();
        matcher.find(&info).map(|r| r.name.clone())
    }

    #[test]
    fn test_docker_hub_library_images() {
        let matcher = matcher();
        for image in ["alpine", "alpine:3.19", "library/alpine", "docker.io/library/alpine", "index.docker.io/library/node:20"] {
            assert_eq!(find_name(&matcher, image).as_deref(), Some("Docker Hub"), "{}", image);
        }
    }

    #[test]
    fn test_docker_hub_user_images_do_not_match() {
        let matcher = matcher();
        assert_eq!(find_name(&matcher, "myrepo/app:latest"), None);
        assert_eq!(find_name(&matcher, "docker.io/someone/tool"), None);
    }

    #[test]
    fn test_mcr_images() {
        let matcher = matcher();
        assert_eq!(
            find_name(&matcher, "mcr.microsoft.com/dotnet/aspnet:8.0").as_deref(),
            Some("Microsoft Container Registry")
        );
        assert_eq!(find_name(&matcher, "ghcr.io/org/tool"), None);
    }

    #[test]
    fn test_at_most_one_builtin_matches() {
        let matcher = matcher();
        for image in ["alpine", "mcr.microsoft.com/dotnet/sdk", "ghcr.io/a/b", "myrepo/app"] {
            let info = ImageNameInfo::parse(image).unwrap();
            let count = matcher.registries().iter().filter(|r| r.is_match(&info)).count();
            assert!(count <= 1, "{} matched {} rules", image, count);
        }
    }

    #[test]
    fn test_order_determines_precedence() {
        let mut matcher = matcher();
        // A catch-all appended later never shadows the built-in Docker Hub rule
        matcher.push(ImageRegistry::new("fallback", "https://fallback.example.com/v2", |_| true).unwrap());
        assert_eq!(find_name(&matcher, "docker.io/library/x").as_deref(), Some("Docker Hub"));
        assert_eq!(find_name(&matcher, "myrepo/app").as_deref(), Some("fallback"));

        let first = RegistryMatcher::new(vec![
            ImageRegistry::new("fallback", "https://fallback.example.com/v2", |_| true).unwrap(),
            ImageRegistry::microsoft_container_registry(MCR_BASE_URL).unwrap(),
        ]);
        assert_eq!(find_name(&first, "mcr.microsoft.com/dotnet/sdk").as_deref(), Some("fallback"));
    }

    #[test]
    fn test_urls_and_scopes() {
        let matcher = matcher();
        let alpine = ImageNameInfo::parse("alpine:3.19").unwrap();
        let hub = matcher.find(&alpine).unwrap();
        assert_eq!(
            hub.url_for(&alpine, "manifests/3.19").unwrap().as_str(),
            "https://registry-1.docker.io/v2/library/alpine/manifests/3.19"
        );
        assert_eq!(hub.scope(&alpine, "pull"), "repository:library/alpine:pull");

        let sdk = ImageNameInfo::parse("mcr.microsoft.com/dotnet/sdk:8.0").unwrap();
        let mcr = matcher.find(&sdk).unwrap();
        assert_eq!(
            mcr.url_for(&sdk, "tags/list").unwrap().as_str(),
            "https://mcr.microsoft.com/v2/dotnet/sdk/tags/list"
        );
        assert!(mcr.signer().is_none());
    }

    #[test]
    fn test_for_host_rule() {
        let rule = ImageRegistry::for_host("internal", "registry.internal:5000", "http://registry.internal:5000/v2").unwrap();
        assert!(rule.is_match(&ImageNameInfo::parse("registry.internal:5000/team/app").unwrap()));
        assert!(!rule.is_match(&ImageNameInfo::parse("team/app").unwrap()));
        assert!(ImageRegistry::for_host("bad", "x", "registry.internal").is_err());
    }
}
