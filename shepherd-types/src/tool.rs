use serde::{Deserialize, Serialize};

/// A model-requested invocation of a registered tool.
///
/// `id` is unique within its conversation; `arguments_json` must parse as a
/// well-formed JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique id within the conversation.
    pub id: String,
    /// Name that must resolve in the tool registry.
    pub name: String,
    /// Serialized JSON object of arguments.
    pub arguments_json: String,
}

impl ToolCall {
    /// Build a tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments_json: String) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments_json,
        }
    }

    /// Parse `arguments_json` into a JSON value.
    pub fn arguments(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.arguments_json)
    }
}

/// Description of a tool the provider may offer to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name, as the model sees and invokes it.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// Minimal JSON-schema subset describing the argument object.
    pub parameters: serde_json::Value,
}

/// Budget classification of a tool, coarser than its name.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Reads state without mutating it.
    Read,
    /// Mutates filesystem or external state.
    Write,
    /// Neither a read nor a write (e.g. arithmetic, subprocess).
    Other,
}

/// Outcome of executing one `ToolCall`, serialized into a `Message::Tool`'s
/// `content` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    /// The tool executed successfully.
    Success {
        /// Always `true`.
        ok: bool,
        /// Name of the tool that ran.
        tool: String,
        /// Tool-specific result payload.
        result: serde_json::Value,
    },
    /// The tool failed, was denied, or its dispatch raised.
    Failure {
        /// Always `false`.
        ok: bool,
        /// Name of the tool that was invoked.
        tool: String,
        /// Human-readable failure description.
        error: String,
        /// Optional structured detail.
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
}

impl ToolResult {
    /// Build a successful result.
    pub fn ok(tool: impl Into<String>, result: serde_json::Value) -> Self {
        Self::Success {
            ok: true,
            tool: tool.into(),
            result,
        }
    }

    /// Build a failed result with no extra detail.
    pub fn err(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure {
            ok: false,
            tool: tool.into(),
            error: error.into(),
            details: None,
        }
    }

    /// Build a failed result carrying structured detail.
    pub fn err_with_details(
        tool: impl Into<String>,
        error: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::Failure {
            ok: false,
            tool: tool.into(),
            error: error.into(),
            details: Some(details),
        }
    }

    /// Whether this result represents success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Serialize to a compact JSON string, for embedding as `Message::Tool.content`.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).expect("ToolResult always serializes")
    }
}
