//! OAuth2 authorization-code flow configuration for the connector.

use crate::config::AppConfig;
use crate::error::Result;
use crate::secrets::SecretManagerClient;
use std::fmt;
use tracing::info;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Client credentials and endpoints for the authorization-code flow the
/// connector's authorization was created with.
#[derive(Clone)]
pub struct OAuthFlowConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub redirect_uri: Option<String>,
}

impl OAuthFlowConfig {
    /// Fetches the OAuth client id and secret from Secret Manager and pairs
    /// them with the configured flow endpoints. A retrieval failure aborts
    /// startup; continuing without credentials would only defer the error to
    /// the first tool call.
    pub async fn from_secret_manager(
        secrets: &SecretManagerClient,
        config: &AppConfig,
    ) -> Result<Self> {
        let client_id = secrets.access_latest(&config.client_id_secret).await?;
        let client_secret = secrets.access_latest(&config.client_secret_secret).await?;
        info!("fetched OAuth client credentials from Secret Manager");

        // Deployed environments redirect back through the hosting platform;
        // local runs use the development redirect when one is configured.
        let redirect_uri = if config.running_in_gcp {
            config.redirect_uri.clone()
        } else {
            config.local_redirect_uri.clone().or_else(|| config.redirect_uri.clone())
        };

        Ok(Self {
            client_id,
            client_secret,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            scopes: config.oauth_scopes.clone(),
            redirect_uri,
        })
    }
}

impl fmt::Debug for OAuthFlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthFlowConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}
