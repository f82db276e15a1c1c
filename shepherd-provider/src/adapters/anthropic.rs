//! Native Anthropic Messages API wire adapter.

use crate::Provider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shepherd_types::{
    ErrorKind, FinishReason, LlmRequest, LlmResponse, Message, ShepherdError, ToolCall,
    ToolDefinition, Usage,
};

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PLACEHOLDER_USER_TURN: &str = "Hello";
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Calls Anthropic's native Messages API.
pub struct AnthropicProvider {
    api_key: String,
    api_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Build an adapter with the given API key, using the production endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the endpoint URL, for testing or a proxy.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Override the default model used when a request leaves `model` empty.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn build_request(&self, request: &LlmRequest) -> Result<AnthropicRequest, ShepherdError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };
        let max_tokens = request.max_output_tokens.max(1);

        let system_parts: Vec<&str> = request
            .messages
            .iter()
            .filter_map(|m| match m {
                Message::System { content } if !content.is_empty() => Some(content.as_str()),
                _ => None,
            })
            .collect();
        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        let mut messages = Vec::new();
        for message in &request.messages {
            if let Some(translated) = to_anthropic_message(message)? {
                messages.push(translated);
            }
        }
        if !messages.iter().any(|m| m.role == "user") {
            messages.push(AnthropicMessage {
                role: "user".into(),
                content: AnthropicContent::Text(PLACEHOLDER_USER_TURN.into()),
            });
        }

        let tools: Vec<AnthropicTool> = request.tools().iter().map(to_anthropic_tool).collect();
        let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);

        Ok(AnthropicRequest {
            model,
            max_tokens,
            messages,
            system,
            tools,
            temperature,
        })
    }

    fn parse_response(&self, response: AnthropicResponse) -> LlmResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in response.content {
            match block {
                AnthropicContentBlock::Text { text: t } => text.push_str(&t),
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(
                        id,
                        name,
                        serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_string()),
                    ));
                }
                AnthropicContentBlock::ToolResult { .. } => {}
            }
        }

        let finish_reason = match response.stop_reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "tool_use" => FinishReason::ToolCall,
            "max_tokens" => FinishReason::Length,
            _ => FinishReason::Unknown,
        };

        LlmResponse {
            provider: "anthropic".to_string(),
            model: response.model,
            text: text.clone(),
            message: Message::assistant(text, tool_calls),
            usage: Usage::new(response.usage.input_tokens, response.usage.output_tokens),
            finish_reason,
            response_id: Some(response.id),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, ShepherdError> {
        if self.api_key.is_empty() {
            return Err(ShepherdError::config_missing_key("anthropic"));
        }

        let body = self.build_request(&request)?;
        let http_response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        let parsed: AnthropicResponse = http_response
            .json()
            .await
            .map_err(|e| ShepherdError::new(ErrorKind::Unknown, e.to_string()))?;
        Ok(self.parse_response(parsed))
    }
}

/// Translate one canonical message into its Anthropic wire form. Returns
/// `Ok(None)` for a `System` message, which is folded into the request's
/// top-level `system` field instead of the message list.
fn to_anthropic_message(message: &Message) -> Result<Option<AnthropicMessage>, ShepherdError> {
    match message {
        Message::System { .. } => Ok(None),
        Message::User { content } => Ok(Some(AnthropicMessage {
            role: "user".into(),
            content: AnthropicContent::Text(content.clone()),
        })),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            if tool_calls.is_empty() {
                return Ok(Some(AnthropicMessage {
                    role: "assistant".into(),
                    content: AnthropicContent::Text(content.clone()),
                }));
            }
            let mut blocks = Vec::new();
            if !content.is_empty() {
                blocks.push(AnthropicContentBlock::Text {
                    text: content.clone(),
                });
            }
            for tc in tool_calls {
                let input = tc
                    .arguments()
                    .map_err(|e| ShepherdError::new(ErrorKind::Unknown, e.to_string()))?;
                blocks.push(AnthropicContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input,
                });
            }
            Ok(Some(AnthropicMessage {
                role: "assistant".into(),
                content: AnthropicContent::Blocks(blocks),
            }))
        }
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => Ok(Some(AnthropicMessage {
            role: "user".into(),
            content: AnthropicContent::Blocks(vec![AnthropicContentBlock::ToolResult {
                tool_use_id: tool_call_id.clone(),
                content: content.clone(),
                is_error: false,
            }]),
        })),
    }
}

fn to_anthropic_tool(def: &ToolDefinition) -> AnthropicTool {
    AnthropicTool {
        name: def.name.clone(),
        description: def.description.clone(),
        input_schema: def.parameters.clone(),
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    id: String,
    content: Vec<AnthropicContentBlock>,
    model: String,
    stop_reason: String,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
