//! Agent definitions and the tool-dispatch loop.

use crate::error::{AgentError, Result};
use crate::model::{GenerateContentConfig, Llm, LlmRequest};
use crate::state::SessionState;
use crate::tool::{Tool, ToolCallback, ToolContext};
use crate::types::{Content, Part};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const MAX_TOOL_ITERATIONS: usize = 10;

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("instruction", &self.instruction)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

pub struct LlmAgent {
    name: String,
    description: String,
    instruction: Option<String>,
    model: Arc<dyn Llm>,
    temperature: Option<f64>,
    tools: Vec<Arc<dyn Tool>>,
    before_tool_callbacks: Vec<Arc<dyn ToolCallback>>,
}

pub struct LlmAgentBuilder {
    name: String,
    description: Option<String>,
    instruction: Option<String>,
    model: Option<Arc<dyn Llm>>,
    temperature: Option<f64>,
    tools: Vec<Arc<dyn Tool>>,
    before_tool_callbacks: Vec<Arc<dyn ToolCallback>>,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instruction: None,
            model: None,
            temperature: None,
            tools: Vec::new(),
            before_tool_callbacks: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn before_tool_callback(mut self, callback: Arc<dyn ToolCallback>) -> Self {
        self.before_tool_callbacks.push(callback);
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let model = self
            .model
            .ok_or_else(|| AgentError::Config(format!("agent '{}' has no model", self.name)))?;
        Ok(LlmAgent {
            name: self.name,
            description: self.description.unwrap_or_default(),
            instruction: self.instruction,
            model,
            temperature: self.temperature,
            tools: self.tools,
            before_tool_callbacks: self.before_tool_callbacks,
        })
    }
}

impl LlmAgent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn tool_declarations(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                let mut decl = json!({
                    "name": tool.name(),
                    "description": tool.description(),
                });
                if let Some(parameters) = tool.parameters_schema() {
                    decl["parameters"] = parameters;
                }
                decl
            })
            .collect()
    }

    /// Runs one user turn to completion, dispatching tool calls until the
    /// model produces a plain-text answer.
    pub async fn run(&self, session: &SessionState, user_text: &str) -> Result<String> {
        let invocation_id = format!("inv-{}", Uuid::new_v4());
        debug!(agent = %self.name, invocation = %invocation_id, "starting agent turn");

        let mut history = Vec::new();
        if let Some(instruction) = &self.instruction {
            history.push(Content::new("user").with_text(instruction.clone()));
        }
        history.push(Content::new("user").with_text(user_text));

        let declarations = self.tool_declarations();

        for _ in 0..MAX_TOOL_ITERATIONS {
            let request = LlmRequest {
                contents: history.clone(),
                tools: declarations.clone(),
                config: self
                    .temperature
                    .map(|temperature| GenerateContentConfig { temperature: Some(temperature) }),
            };

            let response = self.model.generate_content(request).await?;
            let content = response
                .content
                .ok_or_else(|| AgentError::Model("model returned no content".to_string()))?;
            history.push(content.clone());

            let calls: Vec<(String, Value)> = content
                .function_calls()
                .into_iter()
                .map(|(name, args)| (name.to_string(), args.clone()))
                .collect();

            if calls.is_empty() {
                return Ok(content.text());
            }

            let mut response_parts = Vec::new();
            for (name, call_args) in calls {
                let tool = self
                    .tools
                    .iter()
                    .find(|t| t.name() == name)
                    .ok_or_else(|| AgentError::Tool(format!("model requested unknown tool '{name}'")))?;

                let mut args = match call_args {
                    Value::Object(map) => map,
                    Value::Null => Map::new(),
                    other => {
                        return Err(AgentError::Tool(format!(
                            "tool '{name}' called with non-object arguments: {other}"
                        )));
                    }
                };

                let ctx = ToolContext::new(session.clone(), invocation_id.clone());
                for callback in &self.before_tool_callbacks {
                    callback.before_tool(tool.as_ref(), &mut args, &ctx).await?;
                }

                debug!(agent = %self.name, tool = %name, "executing tool");
                let result = tool.execute(&ctx, Value::Object(args)).await?;
                response_parts.push(Part::FunctionResponse { name, response: result });
            }
            history.push(Content { role: "function".to_string(), parts: response_parts });
        }

        Err(AgentError::Agent(format!("max tool iterations ({MAX_TOOL_ITERATIONS}) exceeded")))
    }
}

/// Wraps an agent so a coordinator can call it as a tool. The coordinator's
/// request is forwarded as a single opaque sub-call sharing the same session.
pub struct AgentTool {
    agent: Arc<LlmAgent>,
}

impl AgentTool {
    pub fn new(agent: Arc<LlmAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn description(&self) -> &str {
        self.agent.description()
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "The request to forward to this agent."
                }
            },
            "required": ["request"]
        }))
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let request = args.get("request").and_then(Value::as_str).ok_or_else(|| {
            AgentError::Tool(format!("agent tool '{}' requires a 'request' string", self.name()))
        })?;
        let reply = self.agent.run(&ctx.session, request).await?;
        Ok(json!({"result": reply}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LlmResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockLlm {
        responses: Mutex<VecDeque<LlmResponse>>,
    }

    impl MockLlm {
        fn new(responses: Vec<LlmResponse>) -> Self {
            Self { responses: Mutex::new(responses.into()) }
        }
    }

    #[async_trait]
    impl Llm for MockLlm {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate_content(&self, _req: LlmRequest) -> Result<LlmResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Model("mock exhausted".to_string()))
        }
    }

    struct RecordingTool {
        seen_args: Mutex<Option<Value>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "recorder"
        }
        fn description(&self) -> &str {
            "records its arguments"
        }
        async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<Value> {
            *self.seen_args.lock().unwrap() = Some(args);
            Ok(json!({"rows": [["1"]]}))
        }
    }

    struct MarkerCallback;

    #[async_trait]
    impl ToolCallback for MarkerCallback {
        async fn before_tool(
            &self,
            _tool: &dyn Tool,
            args: &mut Map<String, Value>,
            _ctx: &ToolContext,
        ) -> Result<()> {
            args.insert("marker".to_string(), json!("set-by-callback"));
            Ok(())
        }
    }

    fn text_response(text: &str) -> LlmResponse {
        LlmResponse { content: Some(Content::new("model").with_text(text)), finish_reason: None }
    }

    fn call_response(name: &str, args: Value) -> LlmResponse {
        LlmResponse {
            content: Some(Content::new("model").with_function_call(name, args)),
            finish_reason: None,
        }
    }

    #[tokio::test]
    async fn test_plain_text_turn() {
        let agent = LlmAgentBuilder::new("assistant")
            .model(Arc::new(MockLlm::new(vec![text_response("hello")])))
            .build()
            .unwrap();

        let reply = agent.run(&SessionState::new(), "hi").await.unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_tool_dispatch_runs_callbacks_before_execution() {
        let tool = Arc::new(RecordingTool { seen_args: Mutex::new(None) });
        let agent = LlmAgentBuilder::new("worker")
            .model(Arc::new(MockLlm::new(vec![
                call_response("recorder", json!({"query": "SELECT 1"})),
                text_response("one row"),
            ])))
            .tool(tool.clone())
            .before_tool_callback(Arc::new(MarkerCallback))
            .build()
            .unwrap();

        let reply = agent.run(&SessionState::new(), "count rows").await.unwrap();
        assert_eq!(reply, "one row");

        let seen = tool.seen_args.lock().unwrap().clone().unwrap();
        assert_eq!(seen["query"], "SELECT 1");
        assert_eq!(seen["marker"], "set-by-callback");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let agent = LlmAgentBuilder::new("worker")
            .model(Arc::new(MockLlm::new(vec![call_response("nope", json!({}))])))
            .build()
            .unwrap();

        let err = agent.run(&SessionState::new(), "go").await.unwrap_err();
        assert!(matches!(err, AgentError::Tool(_)));
    }

    #[tokio::test]
    async fn test_agent_tool_forwards_request_and_shares_session() {
        let worker = Arc::new(
            LlmAgentBuilder::new("worker")
                .description("specialized worker")
                .model(Arc::new(MockLlm::new(vec![text_response("done")])))
                .build()
                .unwrap(),
        );
        let agent_tool = AgentTool::new(worker);

        let session = SessionState::new();
        let ctx = ToolContext::new(session, "inv-test");
        let result = agent_tool.execute(&ctx, json!({"request": "do it"})).await.unwrap();
        assert_eq!(result, json!({"result": "done"}));
    }

    #[tokio::test]
    async fn test_missing_model_fails_build() {
        let err = LlmAgentBuilder::new("nameless").build().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
