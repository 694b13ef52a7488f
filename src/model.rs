//! Model abstraction and the Gemini REST backend.

use crate::error::{AgentError, Result};
use crate::types::{Content, Part};
use async_trait::async_trait;
use serde_json::{Value, json};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub contents: Vec<Content>,
    /// Function declarations exposed to the model.
    pub tools: Vec<Value>,
    pub config: Option<GenerateContentConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateContentConfig {
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait Llm: Send + Sync {
    fn name(&self) -> &str;
    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse>;
}

pub struct GeminiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Override the API endpoint. Used by tests against a local server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn content_to_wire(content: &Content) -> Value {
        let parts: Vec<Value> = content
            .parts
            .iter()
            .map(|part| match part {
                Part::Text { text } => json!({"text": text}),
                Part::FunctionCall { name, args } => {
                    json!({"functionCall": {"name": name, "args": args}})
                }
                Part::FunctionResponse { name, response } => {
                    json!({"functionResponse": {"name": name, "response": response}})
                }
            })
            .collect();

        // The API only accepts "user" and "model" roles; function responses
        // travel under the user role.
        let role = if content.role == "function" { "user" } else { content.role.as_str() };
        json!({"role": role, "parts": parts})
    }

    fn build_request_body(req: &LlmRequest) -> Value {
        let contents: Vec<Value> = req.contents.iter().map(Self::content_to_wire).collect();
        let mut body = json!({"contents": contents});
        if !req.tools.is_empty() {
            body["tools"] = json!([{"functionDeclarations": req.tools}]);
        }
        if let Some(config) = &req.config {
            if let Some(temperature) = config.temperature {
                body["generationConfig"] = json!({"temperature": temperature});
            }
        }
        body
    }

    fn parse_response(value: &Value) -> Result<LlmResponse> {
        let Some(candidate) = value.get("candidates").and_then(|c| c.get(0)) else {
            return Ok(LlmResponse::default());
        };

        let mut parts = Vec::new();
        if let Some(wire_parts) =
            candidate.pointer("/content/parts").and_then(|p| p.as_array())
        {
            for wire_part in wire_parts {
                if let Some(text) = wire_part.get("text").and_then(|t| t.as_str()) {
                    parts.push(Part::Text { text: text.to_string() });
                } else if let Some(call) = wire_part.get("functionCall") {
                    let name = call
                        .get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| {
                            AgentError::Model("function call without a name".to_string())
                        })?
                        .to_string();
                    let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
                    parts.push(Part::FunctionCall { name, args });
                }
            }
        }

        let finish_reason = candidate
            .get("finishReason")
            .and_then(|f| f.as_str())
            .map(|f| f.to_string());

        Ok(LlmResponse {
            content: Some(Content { role: "model".to_string(), parts }),
            finish_reason,
        })
    }
}

#[async_trait]
impl Llm for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );
        let body = Self::build_request_body(&req);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Model(format!(
                "generateContent returned HTTP {status}: {detail}"
            )));
        }

        let value: Value = response.json().await?;
        Self::parse_response(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_body_includes_tools_and_config() {
        let req = LlmRequest {
            contents: vec![Content::new("user").with_text("hi")],
            tools: vec![json!({"name": "bq_execute", "description": "run a query"})],
            config: Some(GenerateContentConfig { temperature: Some(0.01) }),
        };

        let body = GeminiModel::build_request_body(&req);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "bq_execute");
        assert_eq!(body["generationConfig"]["temperature"], 0.01);
    }

    #[test]
    fn test_function_responses_are_sent_as_user_role() {
        let content = Content {
            role: "function".to_string(),
            parts: vec![Part::FunctionResponse {
                name: "bq_execute".to_string(),
                response: json!({"rows": []}),
            }],
        };

        let wire = GeminiModel::content_to_wire(&content);
        assert_eq!(wire["role"], "user");
        assert_eq!(wire["parts"][0]["functionResponse"]["name"], "bq_execute");
    }

    #[test]
    fn test_parse_response_with_function_call() {
        let value = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Querying now."},
                        {"functionCall": {"name": "bq_execute", "args": {"query": "SELECT 1"}}}
                    ]
                },
                "finishReason": "STOP"
            }]
        });

        let response = GeminiModel::parse_response(&value).unwrap();
        let content = response.content.unwrap();
        assert_eq!(content.text(), "Querying now.");
        let calls = content.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "bq_execute");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_parse_empty_response() {
        let response = GeminiModel::parse_response(&json!({})).unwrap();
        assert!(response.content.is_none());
    }
}
