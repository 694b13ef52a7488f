//! Injects a resolved access token into outbound tool-call arguments.

use crate::auth::token::{TokenResolution, TokenResolver};
use crate::error::Result;
use crate::tool::{Tool, ToolCallback, ToolContext};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Name of the argument the connector reads the auth envelope from.
pub const DYNAMIC_AUTH_PARAM: &str = "dynamic_auth_config";

/// The single key inside the envelope identifying the access-token field.
pub const ACCESS_TOKEN_FIELD: &str = "oauth2_auth_code_flow.access_token";

/// Serializes the auth envelope the connector expects:
/// `{"oauth2_auth_code_flow.access_token": "<token>"}`.
pub fn auth_envelope(token: &str) -> Result<String> {
    let mut envelope = Map::new();
    envelope.insert(ACCESS_TOKEN_FIELD.to_string(), Value::String(token.to_string()));
    Ok(serde_json::to_string(&Value::Object(envelope))?)
}

/// Before-tool hook that resolves an access token and embeds it in the
/// outgoing argument map. All failure paths leave the arguments untouched
/// and only log; the downstream call is then expected to fail with an
/// authorization error.
pub struct DynamicTokenInjector {
    resolver: TokenResolver,
}

impl DynamicTokenInjector {
    pub fn new(resolver: TokenResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl ToolCallback for DynamicTokenInjector {
    async fn before_tool(
        &self,
        tool: &dyn Tool,
        args: &mut Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<()> {
        match self.resolver.resolve(&ctx.session).await {
            TokenResolution::Resolved { token, source } => {
                args.insert(DYNAMIC_AUTH_PARAM.to_string(), Value::String(auth_envelope(&token)?));
                info!(tool = tool.name(), ?source, "injected dynamic auth config into tool arguments");
            }
            TokenResolution::NotFound => {
                warn!(
                    tool = tool.name(),
                    "no access token in any source; tool call proceeds unauthenticated"
                );
            }
            TokenResolution::Error(e) => {
                warn!(
                    tool = tool.name(),
                    error = %e,
                    "token resolution failed; tool call proceeds unauthenticated"
                );
            }
        }
        Ok(())
    }
}
