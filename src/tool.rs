use crate::error::Result;
use crate::state::SessionState;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Context handed to tools and before-tool callbacks for one function call.
pub struct ToolContext {
    pub session: SessionState,
    pub invocation_id: String,
    pub function_call_id: String,
}

impl ToolContext {
    pub fn new(session: SessionState, invocation_id: impl Into<String>) -> Self {
        Self {
            session,
            invocation_id: invocation_id.into(),
            function_call_id: format!("call-{}", Uuid::new_v4()),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Option<Value> {
        None
    }
    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value>;
}

/// Hook run before a tool executes. May mutate the outgoing argument map.
#[async_trait]
pub trait ToolCallback: Send + Sync {
    async fn before_tool(
        &self,
        tool: &dyn Tool,
        args: &mut Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<()>;
}
