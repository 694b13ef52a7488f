//! Wires configuration, secrets, the connector toolset, and the two agents
//! into a runnable app.

use crate::agent::{AgentTool, LlmAgent, LlmAgentBuilder};
use crate::auth::flow::OAuthFlowConfig;
use crate::auth::gcp::{AdcAuthorizer, GcpAuthorizer};
use crate::auth::injection::DynamicTokenInjector;
use crate::auth::token::{LocalTokenMinter, TokenCache, TokenResolver};
use crate::config::AppConfig;
use crate::connector::ApplicationIntegrationToolset;
use crate::error::Result;
use crate::model::Llm;
use crate::prompts;
use crate::secrets::SecretManagerClient;
use std::sync::Arc;
use tracing::info;

const BQ_AGENT_NAME: &str = "bigquery_oauth_agent";
const ROOT_AGENT_NAME: &str = "root_agent";
const CONNECTOR_ACTION: &str = "ExecuteCustomQuery";

pub struct AgentApp {
    pub root_agent: Arc<LlmAgent>,
}

/// Builds the delegating root agent and its BigQuery worker.
///
/// Secret retrieval failures propagate and abort initialization; the OAuth
/// client credentials are a startup precondition, not something to limp
/// along without.
pub async fn build(config: &AppConfig, model: Arc<dyn Llm>) -> Result<AgentApp> {
    let authorizer: Arc<dyn GcpAuthorizer> = Arc::new(AdcAuthorizer::new()?);

    let secrets = SecretManagerClient::new(&config.project_id, authorizer.clone());
    let oauth_flow = OAuthFlowConfig::from_secret_manager(&secrets, config).await?;

    let toolset = ApplicationIntegrationToolset::new(
        &config.project_id,
        &config.connection_region,
        &config.connection_name,
    )
    .actions([CONNECTOR_ACTION])
    .tool_name_prefix(&config.tool_name_prefix)
    .tool_instructions(prompts::CONNECTOR_TOOL_INSTRUCTIONS)
    .oauth_flow(oauth_flow);

    let cache = Arc::new(TokenCache::new());
    let mut resolver = TokenResolver::new(config.token_state_key(), cache);
    if config.running_in_gcp {
        info!("managed environment detected via K_SERVICE; relying on platform-provided tokens");
    } else {
        info!("local environment; enabling token minting from application default credentials");
        resolver = resolver.with_minter(Arc::new(LocalTokenMinter::new(authorizer)));
    }
    let injector = Arc::new(DynamicTokenInjector::new(resolver));

    let mut worker = LlmAgentBuilder::new(BQ_AGENT_NAME)
        .description("Answers questions about the connected BigQuery dataset.")
        .instruction(prompts::BQ_AGENT_INSTRUCTIONS)
        .model(model.clone())
        .temperature(0.01)
        .before_tool_callback(injector);
    for tool in toolset.tools() {
        worker = worker.tool(tool);
    }
    let worker = Arc::new(worker.build()?);

    let root_agent = LlmAgentBuilder::new(ROOT_AGENT_NAME)
        .description("Delegating coordinator with no direct tools.")
        .instruction(prompts::ROOT_AGENT_INSTRUCTIONS)
        .model(model)
        .temperature(0.01)
        .tool(Arc::new(AgentTool::new(worker)))
        .build()?;

    Ok(AgentApp { root_agent: Arc::new(root_agent) })
}
