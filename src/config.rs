use crate::error::{AgentError, Result};
use crate::state::KEY_PREFIX_TEMP;
use std::collections::HashMap;

const DEFAULT_OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/bigquery.readonly";
const DEFAULT_TOOL_NAME_PREFIX: &str = "bq";

/// Environment-driven configuration for the agent.
///
/// `K_SERVICE` is set by Cloud Run and other serverless Google Cloud
/// environments; its presence means the platform handles OAuth and places
/// access tokens into session state, so local token minting is disabled.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_id: String,
    pub connection_region: String,
    pub connection_name: String,
    /// Authorization identifier; prefixes the session-state key holding the
    /// per-call access token.
    pub auth_id: String,
    pub tool_name_prefix: String,
    pub oauth_scopes: Vec<String>,
    pub redirect_uri: Option<String>,
    pub local_redirect_uri: Option<String>,
    /// Secret Manager secret name holding the OAuth client id.
    pub client_id_secret: String,
    /// Secret Manager secret name holding the OAuth client secret.
    pub client_secret_secret: String,
    pub running_in_gcp: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            vars.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| AgentError::Config(format!("{key} environment variable not set")))
        };
        let optional = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let oauth_scopes = optional("BQ_OAUTH_SCOPES")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|| vec![DEFAULT_OAUTH_SCOPE.to_string()]);

        Ok(Self {
            project_id: required("GOOGLE_CLOUD_PROJECT")?,
            connection_region: required("BQ_CONNECTION_REGION")?,
            connection_name: required("BQ_CONNECTION_NAME")?,
            auth_id: required("BQ_AUTHORIZATION_ID")?,
            tool_name_prefix: optional("BQ_TOOL_NAME_PREFIX")
                .unwrap_or_else(|| DEFAULT_TOOL_NAME_PREFIX.to_string()),
            oauth_scopes,
            redirect_uri: optional("BQ_REDIRECT_URI"),
            local_redirect_uri: optional("BQ_ADK_LOCAL_REDIRECT_URI"),
            client_id_secret: required("BQ_SECMGR_ID")?,
            client_secret_secret: required("BQ_SECMGR_SECRET")?,
            running_in_gcp: vars.contains_key("K_SERVICE"),
        })
    }

    /// The well-known transient session-state key holding the access token
    /// for this auth flow: `temp:<auth_id>_0`.
    pub fn token_state_key(&self) -> String {
        format!("{KEY_PREFIX_TEMP}{}_0", self.auth_id)
    }
}
