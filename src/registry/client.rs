//! Registry client: resolves the provider rule for an image, signs requests
//! through the rule's signer and maps registry responses onto workbench errors.

use crate::config::RegistryRuleConfig;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{Result, WorkbenchError};
use crate::image::{DigestUtils, ImageNameInfo, NormalizedImageNameInfo};
use crate::registry::auth::Auth;
use crate::registry::matcher::{ImageRegistry, RegistryMatcher};
use crate::registry::token_manager::TokenManager;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Every manifest flavour a registry may serve for a tag
pub const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub struct RegistryClientBuilder {
    client_id: String,
    timeout: u64,
    skip_tls: bool,
    rules: Vec<RegistryRuleConfig>,
}

impl RegistryClientBuilder {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            timeout: 60,
            skip_tls: false,
            rules: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    /// Extra rules, consulted after the built-in providers
    pub fn with_rules(mut self, rules: Vec<RegistryRuleConfig>) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .danger_accept_invalid_certs(self.skip_tls)
            .build()
            .map_err(|e| WorkbenchError::Network(format!("Failed to create registry client: {}", e)))?;

        let auth = Auth::new(client.clone(), self.client_id);

        let mut matcher = RegistryMatcher::with_defaults(auth.clone())?;
        for rule in &self.rules {
            matcher.push(registry_from_rule(rule, &auth)?);
        }

        Ok(RegistryClient { client, matcher })
    }
}

fn registry_from_rule(rule: &RegistryRuleConfig, auth: &Auth) -> Result<ImageRegistry> {
    let registry = ImageRegistry::for_host(&rule.name, &rule.host, &rule.base_url)?;
    if !rule.signed {
        return Ok(registry);
    }

    let root = Url::parse(&rule.base_url)?.join("/v2/")?;
    Ok(registry.with_signer(Arc::new(TokenManager::new(auth.clone(), root))))
}

pub struct RegistryClient {
    client: Client,
    matcher: RegistryMatcher,
}

impl RegistryClient {
    pub fn new(client: Client, matcher: RegistryMatcher) -> Self {
        Self { client, matcher }
    }

    pub fn builder(client_id: impl Into<String>) -> RegistryClientBuilder {
        RegistryClientBuilder::new(client_id)
    }

    pub fn matcher(&self) -> &RegistryMatcher {
        &self.matcher
    }

    /// Parse `image` and find the provider responsible for it
    pub fn resolve(&self, image: &str) -> Result<(ImageNameInfo, &ImageRegistry)> {
        let info = ImageNameInfo::parse(image)?;
        let registry = self.matcher.find(&info).ok_or_else(|| {
            WorkbenchError::NotFound(format!("No registry provider is configured for {}", image))
        })?;
        Ok((info, registry))
    }

    /// Send a request signed for `scope`, retrying once with a fresh token on 401
    async fn send(
        &self,
        registry: &ImageRegistry,
        method: Method,
        url: Url,
        scope: &str,
        accept: Option<&str>,
    ) -> Result<Response> {
        let build = || {
            let request = self.client.request(method.clone(), url.clone());
            match accept {
                Some(accept) => request.header(ACCEPT, accept),
                None => request,
            }
        };

        let Some(signer) = registry.signer() else {
            return build()
                .send()
                .await
                .map_err(|e| NetworkErrorHandler::handle_network_error(&e, registry.name.as_str()));
        };

        let request = signer.sign(build(), scope).await?;
        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, registry.name.as_str()))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(%url, scope, "signed request rejected, refreshing token");
        signer.invalidate(scope).await;
        let request = signer.sign(build(), scope).await?;
        request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, registry.name.as_str()))
    }

    async fn error_from(response: Response, operation: &str) -> WorkbenchError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        HttpErrorHandler::handle_registry_error(status, &error_text, operation)
    }

    /// Resolve the manifest digest the image's tag currently points at
    pub async fn image_digest(&self, image: &str) -> Result<String> {
        let (info, registry) = self.resolve(image)?;
        self.digest_for(&info, registry).await
    }

    async fn digest_for(&self, info: &ImageNameInfo, registry: &ImageRegistry) -> Result<String> {
        let normalized = NormalizedImageNameInfo::new(info);
        if let Some(digest) = &normalized.digest {
            return DigestUtils::normalize_digest(digest);
        }

        let url = registry.url_for(info, &format!("manifests/{}", normalized.reference()))?;
        let scope = registry.scope(info, "pull");

        let head = self
            .send(registry, Method::HEAD, url.clone(), &scope, Some(MANIFEST_ACCEPT))
            .await?;
        if head.status().is_success() {
            if let Some(digest) = header_digest(&head) {
                return Ok(digest);
            }
        } else if head.status() != StatusCode::METHOD_NOT_ALLOWED {
            return Err(Self::error_from(head, "manifest lookup").await);
        }

        // Some registries omit the digest header on HEAD; hash the manifest instead
        let response = self
            .send(registry, Method::GET, url, &scope, Some(MANIFEST_ACCEPT))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "manifest download").await);
        }
        if let Some(digest) = header_digest(&response) {
            return Ok(digest);
        }

        let body = response.bytes().await?;
        Ok(DigestUtils::compute_docker_digest(&body))
    }

    /// List the tags of the image's repository
    pub async fn list_tags(&self, image: &str) -> Result<Vec<String>> {
        let (info, registry) = self.resolve(image)?;
        let url = registry.url_for(&info, "tags/list")?;
        let scope = registry.scope(&info, "pull");

        let response = self.send(registry, Method::GET, url, &scope, None).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "tag listing").await);
        }

        let tags: TagList = response
            .json()
            .await
            .map_err(|e| WorkbenchError::Parse(format!("Failed to parse tags response: {}", e)))?;
        Ok(tags.tags.unwrap_or_default())
    }

    /// Delete the manifest a tag points at; every tag sharing that digest goes with it
    ///
    /// Returns the deleted digest. Registries that do not allow deletion yield
    /// [`WorkbenchError::Unsupported`].
    pub async fn delete_tag(&self, image: &str) -> Result<String> {
        let (info, registry) = self.resolve(image)?;
        let digest = self.digest_for(&info, registry).await?;

        let url = registry.url_for(&info, &format!("manifests/{}", digest))?;
        let scope = registry.scope(&info, "pull,delete");

        let response = self.send(registry, Method::DELETE, url, &scope, None).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "image deletion").await);
        }

        tracing::info!(image, %digest, "remote image deleted");
        Ok(digest)
    }
}

fn header_digest(response: &Response) -> Option<String> {
    response
        .headers()
        .get(DOCKER_CONTENT_DIGEST)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
