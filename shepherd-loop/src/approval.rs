use async_trait::async_trait;
use shepherd_types::ToolCall;

/// Gates whether a classified, budget-reserved tool call may actually run.
///
/// Implementors decide synchronously or by waiting on an external signal
/// (an interactive approval prompt, an inline-button click) — the scheduler
/// only ever sees the boolean outcome.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Whether `call` may proceed to execution.
    async fn approve(&self, call: &ToolCall) -> bool;
}

/// Approves every call. Suitable for `--dev`/non-interactive runs and tests.
pub struct AllowAll;

#[async_trait]
impl ApprovalGate for AllowAll {
    async fn approve(&self, _call: &ToolCall) -> bool {
        true
    }
}

/// Denies every call. Used to test the scheduler's denial path.
pub struct DenyAll;

#[async_trait]
impl ApprovalGate for DenyAll {
    async fn approve(&self, _call: &ToolCall) -> bool {
        false
    }
}
