//! Bearer challenge parsing and token exchange
//!
//! A registry that requires auth answers `GET /v2/` with `401` and a header like
//! `WWW-Authenticate: Bearer realm="https://auth.docker.io/token",service="registry.docker.io"`.
//! The realm is then asked for a token scoped to a repository.

use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{Result, WorkbenchError};
use reqwest::{Client, StatusCode, header::WWW_AUTHENTICATE};
use serde::Deserialize;
use std::time::{Duration, Instant};
use url::Url;

/// Header identifying this client to registries
pub const SOURCE_CLIENT_HEADER: &str = "X-Meta-Source-Client";

/// Lifetime assumed when the token endpoint omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60);

/// Tokens are treated as expired this long before their real expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

/// Where and for which service bearer tokens are issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub realm: Url,
    pub service: String,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// A bearer token and when it stops being usable
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub token: String,
    pub expires_at: Instant,
}

impl TokenInfo {
    pub fn new(token: String, lifetime: Duration) -> Self {
        Self {
            token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Parse a `WWW-Authenticate` header value into an [`AuthContext`]
///
/// Returns `None` for non-Bearer schemes and for challenges without a usable realm.
pub fn parse_www_authenticate(header: &str) -> Option<AuthContext> {
    let header = header.trim();
    let (scheme, params_str) = header.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(scheme, "ignoring non-bearer auth challenge");
        return None;
    }

    let mut realm = None;
    let mut service = None;
    let mut scope = None;

    for (key, value) in split_challenge_params(params_str) {
        match key.to_ascii_lowercase().as_str() {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }

    let realm = match Url::parse(&realm?) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("auth challenge has an invalid realm: {}", e);
            return None;
        }
    };

    Some(AuthContext {
        realm,
        service: service.unwrap_or_default(),
        scope,
    })
}

/// Split `k="v",k2=v2` respecting commas inside quoted values
fn split_challenge_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = params.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        let key = key.trim().to_string();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        pairs.push((key, value));
    }

    pairs
}

/// Performs the unauthenticated probe and the token request
#[derive(Debug, Clone)]
pub struct Auth {
    client: Client,
    client_id: String,
}

impl Auth {
    pub fn new(client: Client, client_id: impl Into<String>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
        }
    }

    /// Probe the registry root and capture its bearer challenge
    ///
    /// `Ok(None)` means the registry answered without asking for auth.
    pub async fn get_auth_challenge(&self, registry_root: &Url) -> Result<Option<AuthContext>> {
        tracing::debug!(url = %registry_root, "probing registry for auth challenge");

        let response = self
            .client
            .get(registry_root.clone())
            .header(SOURCE_CLIENT_HEADER, &self.client_id)
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "auth challenge"))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("registry does not require authentication");
            return Ok(None);
        }

        if status == StatusCode::UNAUTHORIZED {
            let header = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    WorkbenchError::Auth("Registry returned 401 without a WWW-Authenticate challenge".to_string())
                })?;

            return parse_www_authenticate(header).map(Some).ok_or_else(|| {
                WorkbenchError::Auth(format!("Unsupported auth challenge: {}", header))
            });
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(HttpErrorHandler::handle_registry_error(status, &error_text, "auth challenge"))
    }

    /// Request a token for `scope` from the challenge's realm
    pub async fn get_token(&self, context: &AuthContext, scope: &str) -> Result<TokenInfo> {
        let mut url = context.realm.clone();
        url.query_pairs_mut()
            .append_pair("service", &context.service)
            .append_pair("scope", scope);

        tracing::debug!(realm = %context.realm, scope, "requesting bearer token");

        let response = self
            .client
            .get(url)
            .header(SOURCE_CLIENT_HEADER, &self.client_id)
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "token request"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(HttpErrorHandler::handle_auth_error(status, &error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| WorkbenchError::Parse(format!("Failed to parse token response: {}", e)))?;

        let token = token_response
            .token
            .or(token_response.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WorkbenchError::Auth("Token response did not contain a token".to_string()))?;

        let lifetime = token_response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        tracing::debug!(length = token.len(), expires_in = lifetime.as_secs(), "bearer token obtained");

        Ok(TokenInfo::new(token, lifetime))
    }
}
