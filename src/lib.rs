//! # bq-oauth-agent
//!
//! An LLM agent wired to a managed BigQuery integration connector, with
//! OAuth2 token propagation between the user session, the agent runtime,
//! and the connector.
//!
//! ## Overview
//!
//! - [`auth`] - token resolution (session state, process cache, local
//!   minting) and injection of the `dynamic_auth_config` envelope into
//!   outbound tool calls
//! - [`connector`] - the Application Integration toolset the worker agent
//!   calls through
//! - [`agent`] - declarative agent composition: a delegating root agent and
//!   a specialized BigQuery worker
//! - [`secrets`] - Secret Manager retrieval of the OAuth client credentials
//! - [`state`] - per-conversation key/value state with `temp:` scoping
//!
//! Token lifecycle: a token is resolved once per tool call, written back to
//! session state under `temp:<auth_id>_0` and to the process-wide cache,
//! and reused until overwritten. No refresh or expiry is tracked here; an
//! unauthorized downstream call surfaces as a connector error.

pub mod agent;
pub mod app;
pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod model;
pub mod prompts;
pub mod secrets;
pub mod state;
pub mod tool;
pub mod types;

pub use agent::{AgentTool, LlmAgent, LlmAgentBuilder};
pub use app::{AgentApp, build};
pub use auth::{
    ACCESS_TOKEN_FIELD, AdcAuthorizer, DYNAMIC_AUTH_PARAM, DynamicTokenInjector, GcpAuthorizer,
    LocalTokenMinter, OAuthFlowConfig, StaticTokenAuthorizer, TokenCache, TokenMinter,
    TokenResolution, TokenResolver, TokenSource, auth_envelope,
};
pub use config::AppConfig;
pub use connector::ApplicationIntegrationToolset;
pub use error::{AgentError, Result};
pub use model::{GeminiModel, GenerateContentConfig, Llm, LlmRequest, LlmResponse};
pub use secrets::SecretManagerClient;
pub use state::{KEY_PREFIX_APP, KEY_PREFIX_TEMP, KEY_PREFIX_USER, SessionState};
pub use tool::{Tool, ToolCallback, ToolContext};
pub use types::{Content, Part};
