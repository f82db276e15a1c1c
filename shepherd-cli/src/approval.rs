use async_trait::async_trait;
use shepherd_loop::ApprovalGate;
use shepherd_policy::{classify_tool, PolicyConfig};
use shepherd_types::{ToolCall, ToolKind};
use std::io::Write;

/// Prompts on standard input for each tool call. `y`/`yes` (any case)
/// confirms, anything else denies.
///
/// With `auto_approve_reads` set (the CLI's `--yes` flag), calls classified
/// [`ToolKind::Read`] or [`ToolKind::Other`] approve without a prompt;
/// writes always confirm regardless of the flag.
pub struct StdinApprovalGate {
    pub auto_approve_reads: bool,
}

#[async_trait]
impl ApprovalGate for StdinApprovalGate {
    async fn approve(&self, call: &ToolCall) -> bool {
        let kind = classify_tool(&call.name);
        if self.auto_approve_reads && kind != ToolKind::Write {
            return true;
        }

        print!(
            "approve {} {}? [y/N] ",
            call.name,
            call.arguments_json
        );
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Unused by the gate itself, but keeps `shepherd-policy`'s `PolicyConfig`
/// reachable from this crate for the binary's future `--policy` flag.
#[allow(dead_code)]
fn _default_policy_config_is_reachable() -> PolicyConfig {
    PolicyConfig::default()
}
