use crate::tool::ToolCall;
use serde::{Deserialize, Serialize};

/// A single turn in a conversation.
///
/// `Assistant.content` is always present, even when empty — an assistant
/// turn that is pure tool-calling carries `content: ""` rather than no
/// content at all. A `Tool` message's `tool_call_id` must equal the `id`
/// of some `ToolCall` in a preceding `Assistant` message in the same
/// conversation, and no two `Tool` messages in one conversation share a
/// `tool_call_id`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System prompt.
    System {
        /// Prompt text.
        content: String,
    },
    /// User turn.
    User {
        /// User-provided text.
        content: String,
    },
    /// Model turn, optionally carrying tool-call requests.
    Assistant {
        /// Model text. May be empty when `tool_calls` is non-empty.
        content: String,
        /// Tool calls requested by the model, in emission order.
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of executing one tool call.
    Tool {
        /// Name of the tool that was invoked.
        tool_name: String,
        /// The `id` of the `ToolCall` this result answers.
        tool_call_id: String,
        /// Serialized `ToolResult` JSON.
        content: String,
    },
}

impl Message {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Build a tool-result message.
    pub fn tool(
        tool_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool_name: tool_name.into(),
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Tool calls carried by this message, if any.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Text content of this message, regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    /// Role name as it appears on the wire (`system`, `user`, `assistant`, `tool`).
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_with_empty_content_and_tool_calls_roundtrips() {
        let msg = Message::assistant(
            "",
            vec![ToolCall::new("call_1", "list_dir", "{}".to_string())],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
        assert_eq!(back.tool_calls().len(), 1);
    }

    #[test]
    fn tool_message_carries_matching_call_id() {
        let msg = Message::tool("read_file", "call_1", "{\"ok\":true}");
        assert_eq!(msg.role(), "tool");
        match &msg {
            Message::Tool { tool_call_id, .. } => assert_eq!(tool_call_id, "call_1"),
            _ => panic!("expected Tool variant"),
        }
    }
}
