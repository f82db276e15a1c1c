use crate::registry::{ToolContext, ToolDyn, ToolError};
use serde_json::{json, Value};
use shepherd_policy::{AccessKind, PolicyEngine};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// Writes a UTF-8 text file under the write-allowed prefixes for the
/// calling purpose, atomically (write-to-temp-then-rename within the same
/// directory).
pub struct WriteFileTool {
    policy: Arc<PolicyEngine>,
}

impl WriteFileTool {
    /// Build the tool against the given policy engine.
    pub fn new(policy: Arc<PolicyEngine>) -> Self {
        Self { policy }
    }
}

impl ToolDyn for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write a UTF-8 text file under data/outputs (or also under src, when running with \
         elevated dev permissions). Fails if the target exists unless overwrite is true."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Project-relative path to write." },
                "content": { "type": "string", "description": "UTF-8 content to write." },
                "overwrite": {
                    "type": "boolean",
                    "description": "Whether to overwrite an existing file. Defaults to false."
                }
            },
            "required": ["path", "content"],
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
            let content = args
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing required field: content".into()))?
                .to_string();
            let overwrite = args
                .get("overwrite")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let resolved = self
                .policy
                .validate_path(&path, AccessKind::Write, ctx.purpose)?;

            if let Some(parent) = resolved.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            }

            if !overwrite && tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
                return Err(ToolError::ExecutionFailed(format!(
                    "File exists: {path}"
                )));
            }

            let parent = resolved.parent().ok_or_else(|| {
                ToolError::ExecutionFailed("resolved path has no parent directory".into())
            })?;
            let tmp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));
            tokio::fs::write(&tmp_path, content.as_bytes())
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            tokio::fs::rename(&tmp_path, &resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

            Ok(json!({
                "path": path,
                "bytes_written": content.len(),
                "overwritten": overwrite,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::Purpose;

    fn ctx(purpose: Purpose) -> ToolContext {
        ToolContext { purpose }
    }

    #[tokio::test]
    async fn writes_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = WriteFileTool::new(policy);

        let result = tool
            .call(
                json!({"path": "data/outputs/x.txt", "content": "A", "overwrite": false}),
                ctx(Purpose::Default),
            )
            .await
            .unwrap();
        assert_eq!(result["bytes_written"], 1);
        let written = std::fs::read_to_string(dir.path().join("data/outputs/x.txt")).unwrap();
        assert_eq!(written, "A");
    }

    #[tokio::test]
    async fn overwrite_false_fails_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = WriteFileTool::new(policy);

        tool.call(
            json!({"path": "data/outputs/x.txt", "content": "A", "overwrite": false}),
            ctx(Purpose::Default),
        )
        .await
        .unwrap();

        let err = tool
            .call(
                json!({"path": "data/outputs/x.txt", "content": "B", "overwrite": false}),
                ctx(Purpose::Default),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File exists"));

        let content = std::fs::read_to_string(dir.path().join("data/outputs/x.txt")).unwrap();
        assert_eq!(content, "A");
    }

    #[tokio::test]
    async fn overwrite_true_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = WriteFileTool::new(policy);

        tool.call(
            json!({"path": "data/outputs/x.txt", "content": "A", "overwrite": false}),
            ctx(Purpose::Default),
        )
        .await
        .unwrap();
        tool.call(
            json!({"path": "data/outputs/x.txt", "content": "B", "overwrite": true}),
            ctx(Purpose::Default),
        )
        .await
        .unwrap();

        let content = std::fs::read_to_string(dir.path().join("data/outputs/x.txt")).unwrap();
        assert_eq!(content, "B");
    }

    #[tokio::test]
    async fn denied_write_outside_outputs_for_default_purpose() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = WriteFileTool::new(policy);

        let err = tool
            .call(
                json!({"path": "notes/should-fail.txt", "content": "nope"}),
                ctx(Purpose::Default),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Policy(_)));
        assert!(!dir.path().join("notes/should-fail.txt").exists());
    }

    #[tokio::test]
    async fn dev_purpose_permits_writes_under_src() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = WriteFileTool::new(policy);

        tool.call(
            json!({"path": "src/generated.rs", "content": "// generated"}),
            ctx(Purpose::Dev),
        )
        .await
        .unwrap();
        assert!(dir.path().join("src/generated.rs").exists());
    }
}
