#![deny(missing_docs)]
//! Telegram chat-bot surface for the shepherd tool-loop runtime.
//!
//! One session per chat (`session_key::session_id_for_chat`), gated by an
//! allow-list and admin sub-list (`access::AccessControl`), rate-limited
//! per chat (`access::Cooldown`), and approved through inline buttons
//! (`approval::TelegramApprovalGate`) rather than the terminal surface's
//! stdin prompt.

mod access;
mod approval;
mod commands;
mod reply;
mod session_key;

pub use access::{AccessControl, Cooldown};
pub use approval::{AdminGatedApprovalGate, PendingApprovals, TelegramApprovalGate};
pub use commands::Command;
pub use reply::chunk_message;
pub use session_key::session_id_for_chat;

use shepherd_policy::PolicyEngine;
use shepherd_provider::ProviderRouter;
use shepherd_session::SessionStore;
use shepherd_types::{BudgetLimits, EventLevel, EventRecord, LlmRequest, Message, Purpose};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message as TgMessage, Update};
use tokio::sync::Mutex as AsyncMutex;

const DEFAULT_MAX_STEPS: u32 = 8;
const DEFAULT_MAX_TOOL_CALLS: u32 = 16;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
const DEFAULT_SYSTEM_PROMPT: &str = "You are shepherd, a careful coding assistant with access to \
a small set of sandboxed tools. Use them only when they help answer the user.";

/// Everything one running bot process shares across every chat.
pub struct BotRuntime {
    bot: Bot,
    sessions: Arc<dyn SessionStore>,
    router: Arc<ProviderRouter>,
    policy_root: PathBuf,
    access: AccessControl,
    cooldown: Cooldown,
    pending: Arc<PendingApprovals>,
    approval_ttl: Duration,
    show_usage: bool,
    /// Serializes concurrent turns for the same chat so a session document
    /// is never read-modify-written by two turns at once.
    chat_locks: AsyncMutex<std::collections::HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl BotRuntime {
    /// Build a runtime bound to one Telegram bot instance.
    pub fn new(
        bot: Bot,
        sessions: Arc<dyn SessionStore>,
        router: Arc<ProviderRouter>,
        policy_root: PathBuf,
        allowed_chat_ids: Vec<i64>,
        admin_chat_ids: Vec<i64>,
        rate_limit_seconds: u64,
        approval_ttl_seconds: u64,
        show_usage: bool,
    ) -> Self {
        Self {
            bot,
            sessions,
            router,
            policy_root,
            access: AccessControl::new(allowed_chat_ids, admin_chat_ids),
            cooldown: Cooldown::new(rate_limit_seconds),
            pending: Arc::new(PendingApprovals::new()),
            approval_ttl: Duration::from_secs(approval_ttl_seconds),
            show_usage,
            chat_locks: AsyncMutex::new(std::collections::HashMap::new()),
        }
    }

    async fn lock_for(&self, chat_id: i64) -> Arc<AsyncMutex<()>> {
        let mut locks = self.chat_locks.lock().await;
        locks.entry(chat_id).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        for chunk in chunk_message(text) {
            if let Err(err) = self.bot.send_message(chat_id, chunk).await {
                EventRecord::new(EventLevel::Error, "bot_send_failed")
                    .message(err.to_string())
                    .emit_tracing();
            }
        }
    }

    async fn handle_command(self: &Arc<Self>, msg: TgMessage, cmd: Command) {
        let chat_id = msg.chat.id;
        if !self.access.is_allowed(chat_id.0) {
            return;
        }

        match cmd {
            Command::Start | Command::Help => {
                self.reply(
                    chat_id,
                    "shepherd bot — send a message to start a turn.\n\n\
                     /id — show this chat's session id\n\
                     /reset — forget this chat's history\n\
                     /dev <text> — run with elevated permissions (admins only)",
                )
                .await;
            }
            Command::Id => {
                self.reply(
                    chat_id,
                    &format!(
                        "chat_id: {}\nsession_id: {}",
                        chat_id.0,
                        session_id_for_chat(chat_id.0)
                    ),
                )
                .await;
            }
            Command::Reset => {
                let id = session_id_for_chat(chat_id.0);
                if let Err(err) = self.sessions.delete(&id).await {
                    self.reply(chat_id, &format!("❗ Error: {err}")).await;
                } else {
                    self.reply(chat_id, "session cleared.").await;
                }
            }
            Command::Dev(text) => {
                if !self.access.is_admin(chat_id.0) {
                    self.reply(chat_id, "❗ Error: /dev is restricted to admins.").await;
                    return;
                }
                self.run_turn(chat_id, text, Purpose::Dev).await;
            }
        }
    }

    async fn handle_text(self: &Arc<Self>, msg: TgMessage, text: String) {
        let chat_id = msg.chat.id;
        if !self.access.is_allowed(chat_id.0) {
            return;
        }
        if !self.cooldown.check(chat_id.0) {
            self.reply(chat_id, "you're sending messages too quickly, slow down a little.").await;
            return;
        }
        self.run_turn(chat_id, text, Purpose::Default).await;
    }

    async fn run_turn(self: &Arc<Self>, chat_id: ChatId, text: String, purpose: Purpose) {
        let lock = self.lock_for(chat_id.0).await;
        let _guard = lock.lock().await;

        let session_id = session_id_for_chat(chat_id.0);
        let mut session = match self.sessions.get_or_create(Some(session_id.clone())).await {
            Ok(session) => session,
            Err(err) => {
                self.reply(chat_id, &format!("❗ Error: {err}")).await;
                return;
            }
        };
        if session.messages.is_empty() {
            session.push(Message::system(DEFAULT_SYSTEM_PROMPT));
        }
        session.push(Message::user(text));

        let policy = Arc::new(PolicyEngine::with_default_config(self.policy_root.clone()));
        let registry = shepherd_tool::default_registry(policy);
        let scheduler = shepherd_loop::Scheduler::new(self.router.clone(), registry);
        let gate = AdminGatedApprovalGate::new(
            TelegramApprovalGate::new(
                self.bot.clone(),
                chat_id,
                self.pending.clone(),
                self.approval_ttl,
            ),
            self.access.is_admin(chat_id.0),
        );
        let tool_ctx = shepherd_tool::ToolContext { purpose };

        let request = LlmRequest {
            provider: String::new(),
            model: String::new(),
            messages: session.messages.clone(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: None,
            tools: None,
            purpose,
            meta: None,
        };
        let limits = BudgetLimits::new(DEFAULT_MAX_STEPS, DEFAULT_MAX_TOOL_CALLS);

        let outcome = scheduler
            .run(request, limits, &gate, tool_ctx, Some(64), Some(&session_id))
            .await;

        match outcome {
            Ok(result) => {
                session.messages = result.messages;
                if let Err(err) = self.sessions.save(&mut session).await {
                    EventRecord::new(EventLevel::Error, "bot_session_save_failed")
                        .session(&session_id)
                        .message(err.to_string())
                        .emit_tracing();
                }

                let mut reply_text = result.final_response.text.clone();
                if self.show_usage {
                    reply_text.push_str(&format!(
                        "\n\n_usage: {} in / {} out tokens_",
                        result.usage_total.input_tokens, result.usage_total.output_tokens
                    ));
                }
                if reply_text.trim().is_empty() {
                    reply_text = "(no response text)".to_string();
                }
                self.reply(chat_id, &reply_text).await;
            }
            Err(err) => {
                EventRecord::new(EventLevel::Error, "bot_turn_failed")
                    .session(&session_id)
                    .purpose(purpose)
                    .message(err.to_string())
                    .emit_tracing();
                self.reply(chat_id, &format!("❗ Error: {err}")).await;
            }
        }
    }

    async fn handle_callback(self: &Arc<Self>, query: CallbackQuery) {
        let Some(data) = query.data.as_ref() else {
            return;
        };
        let (approved, key) = if let Some(key) = data.strip_prefix("approve:") {
            (true, key)
        } else if let Some(key) = data.strip_prefix("deny:") {
            (false, key)
        } else {
            return;
        };

        self.pending.resolve(key, approved);
        let _ = self.bot.answer_callback_query(query.id).await;

        if let Some(msg) = query.message {
            let label = if approved { "approved ✅" } else { "denied ❌" };
            let _ = self
                .bot
                .edit_message_reply_markup(msg.chat.id, msg.id)
                .await;
            self.reply(msg.chat.id, &format!("tool call {label}.")).await;
        }
    }
}

/// Build the dptree-driven update handler and run the dispatcher to
/// completion (until ctrl-c, via teloxide's `ctrlc_handler` feature).
pub async fn run(runtime: Arc<BotRuntime>) {
    let bot = runtime.bot.clone();

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint({
                    let runtime = runtime.clone();
                    move |msg: TgMessage, cmd: Command| {
                        let runtime = runtime.clone();
                        async move {
                            runtime.handle_command(msg, cmd).await;
                            teloxide::prelude::respond(())
                        }
                    }
                }),
        )
        .branch(
            Update::filter_message()
                .filter_map(|msg: TgMessage| msg.text().map(|t| t.to_string()))
                .endpoint({
                    let runtime = runtime.clone();
                    move |msg: TgMessage, text: String| {
                        let runtime = runtime.clone();
                        async move {
                            runtime.handle_text(msg, text).await;
                            teloxide::prelude::respond(())
                        }
                    }
                }),
        )
        .branch(Update::filter_callback_query().endpoint({
            let runtime = runtime.clone();
            move |query: CallbackQuery| {
                let runtime = runtime.clone();
                async move {
                    runtime.handle_callback(query).await;
                    teloxide::prelude::respond(())
                }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
