//! Access-token resolution across session state, the process-wide cache, and
//! locally minted credentials.

use crate::auth::gcp::GcpAuthorizer;
use crate::error::Result;
use crate::state::SessionState;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Source that can mint a fresh access token.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    async fn mint(&self) -> Result<String>;
}

/// Mints short-lived tokens from ambient local developer identity. Only
/// wired up when running outside a managed deployment; deployed environments
/// place tokens into session state instead.
pub struct LocalTokenMinter {
    authorizer: Arc<dyn GcpAuthorizer>,
}

impl LocalTokenMinter {
    pub fn new(authorizer: Arc<dyn GcpAuthorizer>) -> Self {
        Self { authorizer }
    }
}

#[async_trait]
impl TokenMinter for LocalTokenMinter {
    async fn mint(&self) -> Result<String> {
        let token = self.authorizer.bearer_token().await?;
        info!("minted access token from application default credentials");
        Ok(token)
    }
}

/// Process-lifetime token cache. Session `temp:` state is cleared at every
/// turn boundary, so the last resolved token survives here between turns.
#[derive(Default)]
pub struct TokenCache {
    token: Mutex<Option<String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.token.lock().expect("token cache lock poisoned").clone()
    }

    pub fn store(&self, token: &str) {
        *self.token.lock().expect("token cache lock poisoned") = Some(token.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    SessionState,
    ProcessCache,
    LocalCredentials,
}

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenResolution {
    Resolved { token: String, source: TokenSource },
    NotFound,
    Error(String),
}

/// Resolves an access token for one auth flow.
///
/// Lookup order: the well-known session-state key, then the process cache,
/// then local minting when a minter is configured. Any resolved token is
/// written back to both session state and the cache so later calls in the
/// same execution chain, and later turns in the same process, reuse it.
pub struct TokenResolver {
    state_key: String,
    cache: Arc<TokenCache>,
    minter: Option<Arc<dyn TokenMinter>>,
}

impl TokenResolver {
    pub fn new(state_key: impl Into<String>, cache: Arc<TokenCache>) -> Self {
        Self { state_key: state_key.into(), cache, minter: None }
    }

    pub fn with_minter(mut self, minter: Arc<dyn TokenMinter>) -> Self {
        self.minter = Some(minter);
        self
    }

    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    pub async fn resolve(&self, session: &SessionState) -> TokenResolution {
        let (token, source) = if let Some(token) =
            session.get(&self.state_key).as_ref().and_then(Value::as_str).map(str::to_string)
        {
            (token, TokenSource::SessionState)
        } else if let Some(token) = self.cache.get() {
            info!(key = %self.state_key, "token not in session state, using process cache");
            (token, TokenSource::ProcessCache)
        } else if let Some(minter) = &self.minter {
            match minter.mint().await {
                Ok(token) => (token, TokenSource::LocalCredentials),
                Err(e) => {
                    warn!(error = %e, "could not mint access token from local credentials");
                    return TokenResolution::Error(e.to_string());
                }
            }
        } else {
            return TokenResolution::NotFound;
        };

        session.set(self.state_key.clone(), Value::String(token.clone()));
        self.cache.store(&token);
        TokenResolution::Resolved { token, source }
    }
}
