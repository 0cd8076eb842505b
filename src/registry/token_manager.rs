//! Lazily populated bearer-token cache for one registry
//!
//! The auth context (realm and service) is discovered from the first challenge
//! and memoized for the life of the manager; tokens are cached per scope until
//! they expire or a signed request comes back `401`.

use crate::error::Result;
use crate::registry::auth::{Auth, AuthContext, TokenInfo};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// Attaches credentials to outbound registry requests
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Sign `request` for access to `scope` (e.g. `repository:library/alpine:pull`)
    async fn sign(&self, request: RequestBuilder, scope: &str) -> Result<RequestBuilder>;

    /// Forget any cached credential for `scope`
    async fn invalidate(&self, scope: &str);
}

#[derive(Debug, Default)]
struct TokenState {
    context: Option<AuthContext>,
    /// Set when the probe succeeded without a challenge
    anonymous: bool,
    tokens: HashMap<String, TokenInfo>,
}

/// Token cache shared by every clone
#[derive(Debug, Clone)]
pub struct TokenManager {
    auth: Auth,
    registry_root: Url,
    state: Arc<RwLock<TokenState>>,
}

impl TokenManager {
    /// `registry_root` is the `/v2/` endpoint probed for the challenge
    pub fn new(auth: Auth, registry_root: Url) -> Self {
        Self {
            auth,
            registry_root,
            state: Arc::new(RwLock::new(TokenState::default())),
        }
    }

    /// Get a usable token for `scope`, fetching one if needed
    ///
    /// The check-then-fetch is not atomic: two concurrent callers with a cold
    /// cache may both fetch, and the later write wins.
    pub async fn get_valid_token(&self, scope: &str) -> Result<Option<String>> {
        {
            let state = self.state.read().await;
            if let Some(info) = state.tokens.get(scope).filter(|info| !info.is_expired()) {
                return Ok(Some(info.token.clone()));
            }
        }

        let Some(context) = self.ensure_context().await? else {
            return Ok(None);
        };

        let info = self.auth.get_token(&context, scope).await?;
        let token = info.token.clone();
        self.state.write().await.tokens.insert(scope.to_string(), info);

        Ok(Some(token))
    }

    async fn ensure_context(&self) -> Result<Option<AuthContext>> {
        {
            let state = self.state.read().await;
            if state.anonymous {
                return Ok(None);
            }
            if let Some(context) = &state.context {
                return Ok(Some(context.clone()));
            }
        }

        let challenge = self.auth.get_auth_challenge(&self.registry_root).await?;

        let mut state = self.state.write().await;
        match &challenge {
            Some(context) => {
                tracing::debug!(realm = %context.realm, service = %context.service, "auth context cached");
                state.context = Some(context.clone());
            }
            None => state.anonymous = true,
        }

        Ok(challenge)
    }
}

#[async_trait]
impl RequestSigner for TokenManager {
    async fn sign(&self, request: RequestBuilder, scope: &str) -> Result<RequestBuilder> {
        Ok(match self.get_valid_token(scope).await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn invalidate(&self, scope: &str) {
        if self.state.write().await.tokens.remove(scope).is_some() {
            tracing::debug!(scope, "cached token invalidated");
        }
    }
}
