use crate::registry::{ToolContext, ToolDyn, ToolError};
use serde::Serialize;
use serde_json::{json, Value};
use shepherd_policy::{AccessKind, PolicyEngine};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Entries beyond this count are not returned; `capped` is set instead.
const MAX_ENTRIES: usize = 200;

#[derive(Debug, Serialize)]
struct DirEntry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Enumerates the direct children of a directory under the read-allowed
/// prefixes.
pub struct ListDirTool {
    policy: Arc<PolicyEngine>,
}

impl ListDirTool {
    /// Build the tool against the given policy engine.
    pub fn new(policy: Arc<PolicyEngine>) -> Self {
        Self { policy }
    }
}

impl ToolDyn for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List the direct children of a directory under the project's read-allowed directories."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Project-relative directory to list." }
            },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    fn call(
        &self,
        args: Value,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let path = args
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing required field: path".into()))?
                .to_string();

            let resolved = self
                .policy
                .validate_path(&path, AccessKind::Read, ctx.purpose)?;

            let mut read_dir = tokio::fs::read_dir(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

            let mut entries = Vec::new();
            let mut total = 0usize;
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?
            {
                total += 1;
                if entries.len() >= MAX_ENTRIES {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
                let kind = if file_type.is_symlink() {
                    "symlink"
                } else if file_type.is_dir() {
                    "dir"
                } else if file_type.is_file() {
                    "file"
                } else {
                    "other"
                };
                entries.push(DirEntry { name, kind });
            }

            Ok(json!({
                "path": path,
                "entries": entries,
                "capped": total > MAX_ENTRIES,
            }))
        })
    }
}
