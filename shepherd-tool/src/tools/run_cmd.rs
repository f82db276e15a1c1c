use crate::registry::{ToolContext, ToolDyn, ToolError};
use serde_json::{json, Value};
use shepherd_policy::PolicyEngine;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Wall-clock deadline for a single `run_cmd` invocation.
const DEADLINE: Duration = Duration::from_secs(10);

/// Each captured stream is truncated to this many characters.
const MAX_STREAM_CHARS: usize = 8_000;

/// Spawns an allowlisted command directly (no shell interpretation), bounds
/// its wall-clock time and captured output, and reports its exit status.
pub struct RunCmdTool {
    policy: Arc<PolicyEngine>,
}

impl RunCmdTool {
    /// Build the tool against the given policy engine.
    pub fn new(policy: Arc<PolicyEngine>) -> Self {
        Self { policy }
    }
}

fn truncate_stream(raw: Vec<u8>) -> (String, bool) {
    let text = String::from_utf8_lossy(&raw).into_owned();
    let truncated = text.chars().count() > MAX_STREAM_CHARS;
    let out = if truncated {
        text.chars().take(MAX_STREAM_CHARS).collect()
    } else {
        text
    };
    (out, truncated)
}

impl ToolDyn for RunCmdTool {
    fn name(&self) -> &str {
        "run_cmd"
    }

    fn description(&self) -> &str {
        "Run an allowlisted command (no shell interpretation), bounded to 10 seconds wall-clock \
         and 8,000 captured characters per stream."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The exact allowlisted command string to run."
                }
            },
            "required": ["command"],
            "additionalProperties": false
        })
    }

    fn call(
        &self,
        args: Value,
        _ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let command = args
                .get("command")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing required field: command".into()))?
                .to_string();

            let canonical = self.policy.validate_command(&command)?;
            let mut parts = canonical.split_whitespace();
            let program = parts
                .next()
                .ok_or_else(|| ToolError::InvalidInput("empty command".into()))?;
            let program_args: Vec<&str> = parts.collect();

            let mut child = tokio::process::Command::new(program)
                .args(&program_args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| ToolError::ExecutionFailed(format!("failed to spawn: {e}")))?;

            let mut stdout_handle = child.stdout.take().expect("stdout was piped");
            let mut stderr_handle = child.stderr.take().expect("stderr was piped");

            let started = tokio::time::Instant::now();
            let outcome = tokio::time::timeout(DEADLINE, async {
                let mut stdout_buf = Vec::new();
                let mut stderr_buf = Vec::new();
                let (stdout_res, stderr_res, status_res) = tokio::join!(
                    stdout_handle.read_to_end(&mut stdout_buf),
                    stderr_handle.read_to_end(&mut stderr_buf),
                    child.wait(),
                );
                stdout_res.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
                stderr_res.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
                let status = status_res.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
                Ok::<_, ToolError>((stdout_buf, stderr_buf, status))
            })
            .await;

            let (stdout_buf, stderr_buf, exit_code) = match outcome {
                Ok(result) => {
                    let (stdout_buf, stderr_buf, status) = result?;
                    (stdout_buf, stderr_buf, status.code().unwrap_or(-1))
                }
                Err(_) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    (Vec::new(), Vec::new(), -1)
                }
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            let (stdout, stdout_truncated) = truncate_stream(stdout_buf);
            let (stderr, stderr_truncated) = truncate_stream(stderr_buf);

            Ok(json!({
                "command": canonical,
                "exit_code": exit_code,
                "success": exit_code == 0,
                "stdout": stdout,
                "stdout_truncated": stdout_truncated,
                "stderr": stderr,
                "stderr_truncated": stderr_truncated,
                "elapsed_ms": elapsed_ms,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_policy::PolicyConfig;
    use shepherd_types::Purpose;

    fn ctx() -> ToolContext {
        ToolContext {
            purpose: Purpose::Default,
        }
    }

    fn policy_with(commands: Vec<String>) -> Arc<PolicyEngine> {
        let mut config = PolicyConfig::default();
        config.command_allowlist = commands;
        Arc::new(PolicyEngine::new(std::env::temp_dir(), config))
    }

    #[tokio::test]
    async fn rejects_commands_outside_the_allowlist() {
        let tool = RunCmdTool::new(policy_with(vec!["git status".into()]));
        let err = tool
            .call(json!({"command": "rm -rf /"}), ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Policy(_)));
    }

    #[tokio::test]
    async fn runs_an_allowlisted_command() {
        let tool = RunCmdTool::new(policy_with(vec!["true".into()]));
        let result = tool.call(json!({"command": "true"}), ctx()).await.unwrap();
        assert_eq!(result["exit_code"], 0);
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn reports_nonzero_exit() {
        let tool = RunCmdTool::new(policy_with(vec!["false".into()]));
        let result = tool.call(json!({"command": "false"}), ctx()).await.unwrap();
        assert_eq!(result["success"], false);
        assert_ne!(result["exit_code"], 0);
    }

    #[tokio::test]
    async fn kills_a_hanging_command_after_the_deadline() {
        let tool = RunCmdTool::new(policy_with(vec!["sleep 30".into()]));
        let started = std::time::Instant::now();
        let result = tool.call(json!({"command": "sleep 30"}), ctx()).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(12));
        assert_eq!(result["exit_code"], -1);
    }
}
