//! Google Cloud credential plumbing shared by the Secret Manager client and
//! local token minting.

use crate::error::{AgentError, Result};
use async_trait::async_trait;
use google_cloud_auth::credentials::{self, CacheableResource, Credentials};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::sync::RwLock;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[async_trait]
pub trait GcpAuthorizer: Send + Sync {
    /// Auth headers for an outbound Google Cloud API request.
    async fn auth_headers(&self) -> Result<HeaderMap>;

    /// The raw bearer token, extracted from the authorization header.
    async fn bearer_token(&self) -> Result<String> {
        let headers = self.auth_headers().await?;
        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AgentError::Auth("credentials produced no authorization header".to_string()))?
            .to_str()
            .map_err(|e| AgentError::Auth(format!("authorization header is not valid UTF-8: {e}")))?;
        value
            .strip_prefix("Bearer ")
            .map(|token| token.to_string())
            .ok_or_else(|| AgentError::Auth("authorization header is not a bearer token".to_string()))
    }
}

/// Authorizer backed by Application Default Credentials. Works with local
/// `gcloud` developer identity and with the service identity of a managed
/// deployment.
pub struct AdcAuthorizer {
    credentials: Credentials,
    cached_headers: RwLock<Option<HeaderMap>>,
}

impl AdcAuthorizer {
    pub fn new() -> Result<Self> {
        let credentials = credentials::Builder::default()
            .with_scopes([CLOUD_PLATFORM_SCOPE])
            .build()
            .map_err(|e| {
                AgentError::Auth(format!("failed to build application default credentials: {e}"))
            })?;
        Ok(Self::with_credentials(credentials))
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self { credentials, cached_headers: RwLock::new(None) }
    }
}

#[async_trait]
impl GcpAuthorizer for AdcAuthorizer {
    async fn auth_headers(&self) -> Result<HeaderMap> {
        let cacheable = self.credentials.headers(Default::default()).await.map_err(|e| {
            AgentError::Auth(format!("failed to obtain google cloud auth headers: {e}"))
        })?;

        match cacheable {
            CacheableResource::New { data, .. } => {
                *self.cached_headers.write().expect("auth header cache lock poisoned") =
                    Some(data.clone());
                Ok(data)
            }
            CacheableResource::NotModified => self
                .cached_headers
                .read()
                .expect("auth header cache lock poisoned")
                .clone()
                .ok_or_else(|| {
                    AgentError::Auth(
                        "credentials returned NotModified before any auth headers were cached"
                            .to_string(),
                    )
                }),
        }
    }
}

/// Authorizer holding a fixed token. Useful in tests and for environments
/// where a token is provisioned out of band.
pub struct StaticTokenAuthorizer {
    token: String,
}

impl StaticTokenAuthorizer {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl GcpAuthorizer for StaticTokenAuthorizer {
    async fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| AgentError::Auth(format!("token is not a valid header value: {e}")))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}
