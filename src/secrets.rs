//! Minimal Google Cloud Secret Manager client.

use crate::auth::gcp::GcpAuthorizer;
use crate::error::{AgentError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_ENDPOINT: &str = "https://secretmanager.googleapis.com";

pub struct SecretManagerClient {
    http: reqwest::Client,
    authorizer: Arc<dyn GcpAuthorizer>,
    endpoint: String,
    project_id: String,
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

impl SecretManagerClient {
    pub fn new(project_id: impl Into<String>, authorizer: Arc<dyn GcpAuthorizer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            authorizer,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: project_id.into(),
        }
    }

    /// Override the API endpoint. Used by tests against a local server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn access_latest(&self, secret_id: &str) -> Result<String> {
        self.access_secret(secret_id, "latest").await
    }

    /// Fetches and decodes one secret version's payload.
    pub async fn access_secret(&self, secret_id: &str, version: &str) -> Result<String> {
        let url = format!(
            "{}/v1/projects/{}/secrets/{}/versions/{}:access",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            secret_id,
            version
        );

        let headers = self.authorizer.auth_headers().await?;
        let response = self.http.get(&url).headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Secret(format!(
                "access of secret '{secret_id}' version '{version}' returned HTTP {status}"
            )));
        }

        let body: AccessSecretVersionResponse = response.json().await?;
        let bytes = BASE64.decode(body.payload.data.as_bytes()).map_err(|e| {
            AgentError::Secret(format!("secret '{secret_id}' payload is not valid base64: {e}"))
        })?;
        String::from_utf8(bytes).map_err(|e| {
            AgentError::Secret(format!("secret '{secret_id}' payload is not valid UTF-8: {e}"))
        })
    }
}
