use serde_json::Value;
use shepherd_types::{Purpose, ToolCall, ToolDefinition, ToolResult};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors a tool implementation may raise. Never escapes the registry — see
/// [`ToolRegistry::execute`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The caller-supplied arguments were invalid for this tool.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A policy-engine rejection occurred while preparing the effect.
    #[error("{0}")]
    Policy(#[from] shepherd_policy::PolicyError),
    /// The effect itself failed (I/O error, non-zero spawn failure, etc).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Per-call context threaded into every tool invocation.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext {
    /// The mode this call runs under; gates write-path policy.
    pub purpose: Purpose,
}

/// Object-safe trait implemented by each of the five registered tools.
///
/// Modeled as a dyn-compatible trait (rather than `async fn` in a trait) so
/// tools can be stored as `Arc<dyn ToolDyn>` in [`ToolRegistry`].
pub trait ToolDyn: Send + Sync {
    /// The tool's unique name, as the model invokes it.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// Minimal JSON-schema subset describing the argument object.
    fn parameters(&self) -> Value;

    /// Execute the tool with already-parsed JSON arguments.
    fn call(
        &self,
        args: Value,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>>;
}

/// Registry of the tools available to a scheduler run.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, overwriting any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no tools registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `ToolDefinition`s for every registered tool, in an unspecified but
    /// stable-within-a-process order; suitable for a provider request's
    /// `tools` field.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Execute a single tool call, funneling every outcome — success,
    /// expected failure, or a thrown error — through [`ToolResult`]. No
    /// exception ever escapes this call.
    #[tracing::instrument(skip(self, ctx), fields(tool = %call.name))]
    pub async fn execute(&self, call: &ToolCall, ctx: ToolContext) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            return ToolResult::err(&call.name, format!("unknown tool: {}", call.name));
        };

        let args = match call.arguments() {
            Ok(args) => args,
            Err(err) => {
                return ToolResult::err(
                    &call.name,
                    format!("arguments were not well-formed JSON: {err}"),
                );
            }
        };

        match tool.call(args, ctx).await {
            Ok(result) => ToolResult::ok(&call.name, result),
            Err(err) => ToolResult::err(&call.name, err.to_string()),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
