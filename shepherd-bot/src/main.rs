use shepherd_config::{init_logging, Config};
use shepherd_provider::adapters::{AnthropicProvider, GrokProvider};
use shepherd_provider::ProviderRouter;
use shepherd_session::FsSessionStore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> ExitCode {
    let _logging_guard = init_logging("logs");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("shepherd-bot: {err}");
            return ExitCode::FAILURE;
        }
    };

    let Some(telegram) = config.telegram.clone() else {
        eprintln!("shepherd-bot: TELEGRAM_BOT_TOKEN is not set, nothing to run");
        return ExitCode::FAILURE;
    };

    let mut router = ProviderRouter::new();
    router.register(
        "grok",
        Arc::new(
            GrokProvider::new(config.grok_api_key.clone(), config.grok_base_url.clone())
                .with_default_model(config.grok_model.clone()),
        ),
    );
    if let Some(anthropic_key) = config.anthropic_api_key.clone() {
        router.register(
            "anthropic",
            Arc::new(
                AnthropicProvider::new(anthropic_key)
                    .with_default_model(config.anthropic_model.clone()),
            ),
        );
    }

    let sessions = Arc::new(FsSessionStore::new(PathBuf::from("data/sessions")));
    let bot = Bot::new(telegram.bot_token.clone());
    let policy_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let runtime = Arc::new(shepherd_bot::BotRuntime::new(
        bot,
        sessions,
        Arc::new(router),
        policy_root,
        telegram.allowed_chat_ids,
        telegram.admin_chat_ids,
        telegram.rate_limit_seconds,
        telegram.approval_ttl_seconds,
        telegram.show_usage,
    ));

    shepherd_bot::run(runtime).await;
    ExitCode::SUCCESS
}
