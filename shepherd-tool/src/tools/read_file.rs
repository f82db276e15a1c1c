use crate::registry::{ToolContext, ToolDyn, ToolError};
use regex::Regex;
use serde_json::{json, Value};
use shepherd_policy::{AccessKind, PolicyEngine};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

/// Files larger than this are rejected before they are read.
const MAX_READ_BYTES: u64 = 200 * 1024;

/// Returned content is truncated to this many characters.
const MAX_RETURN_CHARS: usize = 4_000;

const TRUNCATION_MARKER: &str = "\n…[truncated]";
const REDACTION_SENTINEL: &str = "[REDACTED]";

static SECRET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^(?P<prefix>\s*[\w.]*?(?:API_KEY|GROK_API_KEY|OPENAI_API_KEY|ANTHROPIC_API_KEY|TOKEN|SECRET|PASSWORD)\s*=\s*).*$",
    )
    .expect("valid regex")
});

fn redact(content: &str) -> String {
    SECRET_LINE
        .replace_all(content, |caps: &regex::Captures| {
            format!("{}{}", &caps["prefix"], REDACTION_SENTINEL)
        })
        .into_owned()
}

/// Reads a UTF-8 text file under the read-allowed prefixes, redacting
/// secret-bearing lines and truncating oversized content.
pub struct ReadFileTool {
    policy: Arc<PolicyEngine>,
}

impl ReadFileTool {
    /// Build the tool against the given policy engine.
    pub fn new(policy: Arc<PolicyEngine>) -> Self {
        Self { policy }
    }
}

impl ToolDyn for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a UTF-8 text file under the project's read-allowed directories. \
         Secret-bearing lines are redacted and content over 4,000 characters is truncated."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Project-relative path to read." }
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

            let metadata = tokio::fs::metadata(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            if metadata.len() > MAX_READ_BYTES {
                return Err(ToolError::InvalidInput(format!(
                    "file exceeds the 200 KB read limit ({} bytes)",
                    metadata.len()
                )));
            }

            let raw = tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            let redacted = redact(&raw);

            let truncated = redacted.chars().count() > MAX_RETURN_CHARS;
            let content = if truncated {
                let mut out: String = redacted.chars().take(MAX_RETURN_CHARS).collect();
                out.push_str(TRUNCATION_MARKER);
                out
            } else {
                redacted
            };

            Ok(json!({
                "path": path,
                "content": content,
                "size_bytes": metadata.len(),
                "truncated": truncated,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::Purpose;

    fn ctx() -> ToolContext {
        ToolContext {
            purpose: Purpose::Default,
        }
    }

    #[tokio::test]
    async fn reads_a_small_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/test.txt"), "hello world").unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = ReadFileTool::new(policy);

        let result = tool
            .call(json!({"path": "notes/test.txt"}), ctx())
            .await
            .unwrap();
        assert_eq!(result["content"], "hello world");
        assert_eq!(result["truncated"], false);
    }

    #[tokio::test]
    async fn redacts_secret_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(
            dir.path().join("notes/secrets.txt"),
            "ANTHROPIC_API_KEY=sk-ant-abc123\nplain line",
        )
        .unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = ReadFileTool::new(policy);

        let result = tool
            .call(json!({"path": "notes/secrets.txt"}), ctx())
            .await
            .unwrap();
        let content = result["content"].as_str().unwrap();
        assert!(content.contains("ANTHROPIC_API_KEY=[REDACTED]"));
        assert!(!content.contains("sk-ant-abc123"));
        assert!(content.contains("plain line"));
    }

    #[tokio::test]
    async fn truncates_oversized_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/big.txt"), "a".repeat(5_000)).unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = ReadFileTool::new(policy);

        let result = tool
            .call(json!({"path": "notes/big.txt"}), ctx())
            .await
            .unwrap();
        assert_eq!(result["truncated"], true);
        assert!(result["content"].as_str().unwrap().ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn rejects_oversized_files_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/huge.txt"), vec![b'a'; 250 * 1024]).unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = ReadFileTool::new(policy);

        let err = tool
            .call(json!({"path": "notes/huge.txt"}), ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_disallowed_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let tool = ReadFileTool::new(policy);

        let err = tool
            .call(json!({"path": "data/outputs/x.txt"}), ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Policy(_)));
    }
}
