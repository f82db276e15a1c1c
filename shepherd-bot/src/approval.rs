use async_trait::async_trait;
use shepherd_loop::ApprovalGate;
use shepherd_policy::classify_tool;
use shepherd_types::{EventLevel, EventRecord, ToolCall, ToolKind};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tokio::sync::oneshot;

/// One chat's outstanding approval requests, keyed by an opaque id embedded
/// in the inline button's callback data (`approve:<key>` / `deny:<key>`).
///
/// Shared across every [`TelegramApprovalGate`] the bot builds, so the
/// callback-query handler (which does not know which chat's scheduler run
/// is waiting) can resolve any pending key.
#[derive(Default)]
pub struct PendingApprovals {
    inner: Mutex<HashMap<String, oneshot::Sender<bool>>>,
}

impl PendingApprovals {
    /// Build an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, key: String, tx: oneshot::Sender<bool>) {
        self.inner.lock().expect("pending approvals lock poisoned").insert(key, tx);
    }

    fn remove(&self, key: &str) -> Option<oneshot::Sender<bool>> {
        self.inner.lock().expect("pending approvals lock poisoned").remove(key)
    }

    /// Resolve a pending approval by key, as delivered through an inline
    /// button callback. `approved` is `true` for the `approve:` prefix,
    /// `false` for `deny:`. A miss (key already resolved or expired) is not
    /// an error — the button is simply stale.
    pub fn resolve(&self, key: &str, approved: bool) {
        if let Some(tx) = self.remove(key) {
            let _ = tx.send(approved);
        }
    }
}

/// Gates a scheduler run's tool calls through a Telegram inline-button
/// prompt, bridging the scheduler's synchronous-looking
/// [`ApprovalGate::approve`] to an asynchronous button click.
///
/// Every call sends a fresh message with `approve:<key>` / `deny:<key>`
/// buttons and waits on the key's slot in [`PendingApprovals`], with a TTL
/// after which it is treated as a denial and the stale key is discarded.
pub struct TelegramApprovalGate {
    bot: Bot,
    chat_id: ChatId,
    pending: std::sync::Arc<PendingApprovals>,
    ttl: Duration,
}

impl TelegramApprovalGate {
    /// Build a gate bound to one chat and one run.
    pub fn new(
        bot: Bot,
        chat_id: ChatId,
        pending: std::sync::Arc<PendingApprovals>,
        ttl: Duration,
    ) -> Self {
        Self {
            bot,
            chat_id,
            pending,
            ttl,
        }
    }
}

#[async_trait]
impl ApprovalGate for TelegramApprovalGate {
    async fn approve(&self, call: &ToolCall) -> bool {
        let key = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(key.clone(), tx);

        let keyboard = InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("✅ Approve", format!("approve:{key}")),
            InlineKeyboardButton::callback("❌ Deny", format!("deny:{key}")),
        ]]);

        let prompt = format!("Approve tool call `{}`?\n{}", call.name, call.arguments_json);
        let sent = self
            .bot
            .send_message(self.chat_id, prompt)
            .reply_markup(keyboard)
            .await;

        if let Err(err) = sent {
            EventRecord::new(EventLevel::Error, "toolloop_approve_prompt")
                .message(format!("failed to send approval prompt: {err}"))
                .emit_tracing();
            self.pending.resolve(&key, false);
            return false;
        }

        EventRecord::new(EventLevel::Info, "toolloop_approve_prompt")
            .details(serde_json::json!({ "tool": call.name, "key": key }))
            .emit_tracing();

        match tokio::time::timeout(self.ttl, rx).await {
            Ok(Ok(approved)) => approved,
            Ok(Err(_)) => false,
            Err(_) => {
                self.pending.resolve(&key, false);
                false
            }
        }
    }
}

/// Wraps another gate and refuses write-classified tool calls outright for
/// chats that are not on the admin sub-list, per spec.md §6 ("admin
/// sub-list (required for write operations)") — a non-admin chat never even
/// sees the inline-button prompt for a write, since self-approving one's
/// own write would defeat the requirement.
pub struct AdminGatedApprovalGate<G> {
    inner: G,
    is_admin: bool,
}

impl<G> AdminGatedApprovalGate<G> {
    /// Build a gate that delegates to `inner` for everything a non-admin
    /// chat is allowed to approve, and denies writes itself otherwise.
    pub fn new(inner: G, is_admin: bool) -> Self {
        Self { inner, is_admin }
    }
}

#[async_trait]
impl<G: ApprovalGate> ApprovalGate for AdminGatedApprovalGate<G> {
    async fn approve(&self, call: &ToolCall) -> bool {
        if !self.is_admin && classify_tool(&call.name) == ToolKind::Write {
            EventRecord::new(EventLevel::Info, "tool_denied")
                .message("write denied: chat is not on the admin sub-list")
                .details(serde_json::json!({ "tool": call.name, "id": call.id }))
                .emit_tracing();
            return false;
        }
        self.inner.approve(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_loop::AllowAll;

    #[tokio::test]
    async fn non_admin_write_is_denied_without_reaching_the_inner_gate() {
        let gate = AdminGatedApprovalGate::new(AllowAll, false);
        let call = ToolCall::new("call_1", "write_file", "{}".into());
        assert!(!gate.approve(&call).await);
    }

    #[tokio::test]
    async fn non_admin_read_still_reaches_the_inner_gate() {
        let gate = AdminGatedApprovalGate::new(AllowAll, false);
        let call = ToolCall::new("call_1", "read_file", "{}".into());
        assert!(gate.approve(&call).await);
    }

    #[tokio::test]
    async fn admin_write_reaches_the_inner_gate() {
        let gate = AdminGatedApprovalGate::new(AllowAll, true);
        let call = ToolCall::new("call_1", "write_file", "{}".into());
        assert!(gate.approve(&call).await);
    }
}
