//! Toolset over a managed Application Integration connector.
//!
//! Each configured connector action becomes one tool. Authentication is
//! per-call: the `dynamic_auth_config` argument injected by the before-tool
//! hook carries the OAuth2 access token the remote call is made with.

use crate::auth::flow::OAuthFlowConfig;
use crate::auth::injection::{ACCESS_TOKEN_FIELD, DYNAMIC_AUTH_PARAM};
use crate::error::{AgentError, Result};
use crate::tool::{Tool, ToolContext};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://integrations.googleapis.com";

pub struct ApplicationIntegrationToolset {
    project: String,
    location: String,
    connection: String,
    actions: Vec<String>,
    tool_name_prefix: String,
    tool_instructions: String,
    oauth_flow: Option<OAuthFlowConfig>,
    endpoint: String,
}

impl ApplicationIntegrationToolset {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        connection: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            connection: connection.into(),
            actions: Vec::new(),
            tool_name_prefix: "connector".to_string(),
            tool_instructions: String::new(),
            oauth_flow: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn tool_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tool_name_prefix = prefix.into();
        self
    }

    pub fn tool_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.tool_instructions = instructions.into();
        self
    }

    pub fn oauth_flow(mut self, flow: OAuthFlowConfig) -> Self {
        self.oauth_flow = Some(flow);
        self
    }

    /// Override the API endpoint. Used by tests against a local server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.actions
            .iter()
            .map(|action| {
                Arc::new(ExecuteConnectionTool {
                    name: format!("{}_{}", self.tool_name_prefix, action),
                    action: action.clone(),
                    description: self.tool_instructions.clone(),
                    project: self.project.clone(),
                    location: self.location.clone(),
                    connection: self.connection.clone(),
                    oauth_flow: self.oauth_flow.clone(),
                    endpoint: self.endpoint.clone(),
                    http: reqwest::Client::new(),
                }) as Arc<dyn Tool>
            })
            .collect()
    }
}

struct ExecuteConnectionTool {
    name: String,
    action: String,
    description: String,
    project: String,
    location: String,
    connection: String,
    oauth_flow: Option<OAuthFlowConfig>,
    endpoint: String,
    http: reqwest::Client,
}

/// Extracts the access token from a serialized auth envelope.
pub fn parse_access_token(raw: &str) -> Result<String> {
    let envelope: Value = serde_json::from_str(raw)
        .map_err(|e| AgentError::Connector(format!("{DYNAMIC_AUTH_PARAM} is not valid JSON: {e}")))?;
    envelope
        .get(ACCESS_TOKEN_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AgentError::Connector(format!(
                "{DYNAMIC_AUTH_PARAM} is missing the {ACCESS_TOKEN_FIELD} field"
            ))
        })
}

impl ExecuteConnectionTool {
    fn execute_url(&self) -> String {
        format!(
            "{}/v2/projects/{}/locations/{}/connections/{}/actions/{}:execute",
            self.endpoint.trim_end_matches('/'),
            self.project,
            self.location,
            self.connection,
            self.action
        )
    }
}

#[async_trait]
impl Tool for ExecuteConnectionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "SQL query to run against the connected BigQuery dataset."
                }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Tool(format!("{} requires a 'query' string", self.name)))?;

        let Some(raw_auth) = args.get(DYNAMIC_AUTH_PARAM).and_then(Value::as_str) else {
            let hint = self
                .oauth_flow
                .as_ref()
                .map(|flow| format!("; the connector authorization uses {}", flow.auth_url))
                .unwrap_or_default();
            return Err(AgentError::Connector(format!(
                "no {DYNAMIC_AUTH_PARAM} argument was injected for connection '{}'{hint}",
                self.connection
            )));
        };
        let token = parse_access_token(raw_auth)?;

        let url = self.execute_url();
        debug!(action = %self.action, connection = %self.connection, "executing connector action");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({"inputParameters": {"query": query}}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Connector(format!(
                "action '{}' on connection '{}' returned HTTP {status}: {detail}",
                self.action, self.connection
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::injection::auth_envelope;

    #[test]
    fn test_tools_are_named_with_prefix() {
        let toolset = ApplicationIntegrationToolset::new("p", "us-central1", "bq-conn")
            .actions(["ExecuteCustomQuery"])
            .tool_name_prefix("bqcitibike");
        let tools = toolset.tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "bqcitibike_ExecuteCustomQuery");
    }

    #[test]
    fn test_parse_access_token_roundtrip() {
        let raw = auth_envelope("tok123").unwrap();
        assert_eq!(parse_access_token(&raw).unwrap(), "tok123");
    }

    #[test]
    fn test_parse_access_token_rejects_wrong_shape() {
        assert!(parse_access_token("not json").is_err());
        assert!(parse_access_token(r#"{"other_field": "tok"}"#).is_err());
    }
}
