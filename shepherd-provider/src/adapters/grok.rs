//! OpenAI-compatible chat-completions wire adapter, used for the "grok"
//! provider name.

use crate::wire::normalize_usage;
use crate::Provider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shepherd_types::{
    ErrorKind, FinishReason, LlmRequest, LlmResponse, Message, ShepherdError, ToolCall,
    ToolDefinition,
};

const DEFAULT_MODEL: &str = "grok-4-fast";
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Calls an OpenAI Chat Completions-compatible endpoint.
pub struct GrokProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl GrokProvider {
    /// Build an adapter against the given base URL (no trailing slash),
    /// e.g. `https://api.x.ai/v1`.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the default model used when a request leaves `model` empty.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn build_request(&self, request: &LlmRequest) -> GrokRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };
        let max_tokens = request.max_output_tokens.max(1);
        let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let messages = request.messages.iter().map(to_grok_message).collect();
        let tools: Vec<GrokTool> = request.tools().iter().map(to_grok_tool).collect();

        GrokRequest {
            model,
            messages,
            max_tokens,
            temperature,
            tools: if tools.is_empty() { None } else { Some(tools) },
        }
    }

    fn parse_response(&self, response: GrokResponse) -> Result<LlmResponse, ShepherdError> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ShepherdError::new(ErrorKind::Unknown, "provider returned no choices")
        })?;

        let text = choice.message.content.clone().unwrap_or_default();
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        let finish_reason = match choice.finish_reason.as_str() {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCall,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        Ok(LlmResponse {
            provider: "grok".to_string(),
            model: response.model,
            text: text.clone(),
            message: Message::assistant(text, tool_calls),
            usage: normalize_usage(&response.usage),
            finish_reason,
            response_id: Some(response.id),
        })
    }
}

#[async_trait]
impl Provider for GrokProvider {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, ShepherdError> {
        if self.api_key.is_empty() {
            return Err(ShepherdError::config_missing_key("grok"));
        }

        let body = self.build_request(&request);
        let url = format!("{}/chat/completions", self.base_url);
        let http_response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ShepherdError::new(ErrorKind::Network, e.to_string()))?;

        let status = http_response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = http_response.text().await.unwrap_or_default();
            return Err(ShepherdError::new(ErrorKind::Auth, body));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            let body = http_response.text().await.unwrap_or_default();
            return Err(ShepherdError::new(ErrorKind::ModelNotFound, body));
        }
        if !status.is_success() {
            let body = http_response.text().await.unwrap_or_default();
            return Err(ShepherdError::new(
                ErrorKind::Unknown,
                format!("HTTP {status}: {body}"),
            ));
        }

        let parsed: GrokResponse = http_response
            .json()
            .await
            .map_err(|e| ShepherdError::new(ErrorKind::Unknown, e.to_string()))?;
        self.parse_response(parsed)
    }
}

fn to_grok_message(message: &Message) -> GrokMessage {
    match message {
        Message::System { content } => GrokMessage {
            role: "system".into(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::User { content } => GrokMessage {
            role: "user".into(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant {
            content,
            tool_calls,
        } => GrokMessage {
            role: "assistant".into(),
            content: if content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(content.clone())
            },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(
                    tool_calls
                        .iter()
                        .map(|tc| GrokToolCall {
                            id: tc.id.clone(),
                            call_type: "function".into(),
                            function: GrokFunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.arguments_json.clone(),
                            },
                        })
                        .collect(),
                )
            },
            tool_call_id: None,
        },
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => GrokMessage {
            role: "tool".into(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

fn to_grok_tool(def: &ToolDefinition) -> GrokTool {
    GrokTool {
        tool_type: "function".into(),
        function: GrokFunction {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.parameters.clone(),
        },
    }
}

#[derive(Debug, Serialize)]
struct GrokRequest {
    model: String,
    messages: Vec<GrokMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GrokTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GrokMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<GrokToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GrokToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: GrokFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GrokFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct GrokTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: GrokFunction,
}

#[derive(Debug, Serialize)]
struct GrokFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GrokResponse {
    #[serde(default)]
    id: String,
    choices: Vec<GrokChoice>,
    model: String,
    #[serde(default)]
    usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GrokChoice {
    message: GrokMessage,
    finish_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::Purpose;

    fn base_request() -> LlmRequest {
        LlmRequest {
            provider: "grok".into(),
            model: String::new(),
            messages: vec![Message::user("hello")],
            max_output_tokens: 512,
            temperature: None,
            tools: None,
            purpose: Purpose::Default,
            meta: None,
        }
    }

    #[test]
    fn build_request_fills_default_model_and_temperature() {
        let provider = GrokProvider::new("key", "https://api.x.ai/v1");
        let body = provider.build_request(&base_request());
        assert_eq!(body.model, DEFAULT_MODEL);
        assert_eq!(body.temperature, DEFAULT_TEMPERATURE);
        assert!(body.tools.is_none());
    }

    #[test]
    fn assistant_tool_call_message_omits_content_when_empty() {
        let provider = GrokProvider::new("key", "https://api.x.ai/v1");
        let mut req = base_request();
        req.messages.push(Message::assistant(
            "",
            vec![ToolCall::new("call_1", "list_dir", "{}".into())],
        ));
        let body = provider.build_request(&req);
        let last = body.messages.last().unwrap();
        assert!(last.content.is_none());
        assert_eq!(last.tool_calls.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn tool_message_carries_tool_call_id() {
        let provider = GrokProvider::new("key", "https://api.x.ai/v1");
        let mut req = base_request();
        req.messages
            .push(Message::tool("list_dir", "call_1", "{\"ok\":true}"));
        let body = provider.build_request(&req);
        let last = body.messages.last().unwrap();
        assert_eq!(last.role, "tool");
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn parse_response_maps_tool_calls_finish_reason() {
        let provider = GrokProvider::new("key", "https://api.x.ai/v1");
        let response = GrokResponse {
            id: "resp_1".into(),
            choices: vec![GrokChoice {
                message: GrokMessage {
                    role: "assistant".into(),
                    content: None,
                    tool_calls: Some(vec![GrokToolCall {
                        id: "call_1".into(),
                        call_type: "function".into(),
                        function: GrokFunctionCall {
                            name: "calculator".into(),
                            arguments: "{\"expression\":\"1+1\"}".into(),
                        },
                    }]),
                    tool_call_id: None,
                },
                finish_reason: "tool_calls".into(),
            }],
            model: "grok-4-fast".into(),
            usage: serde_json::json!({"prompt_tokens": 10, "completion_tokens": 4}),
        };

        let parsed = provider.parse_response(response).unwrap();
        assert_eq!(parsed.finish_reason, FinishReason::ToolCall);
        assert_eq!(parsed.usage.total_tokens, 14);
        assert_eq!(parsed.message.tool_calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected_before_any_request() {
        let provider = GrokProvider::new("", "https://api.x.ai/v1");
        let err = provider.chat(base_request()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConfigMissingKey);
    }
}
