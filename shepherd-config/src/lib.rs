#![deny(missing_docs)]
//! Environment-sourced configuration and the `logs/app.log` sink.
//!
//! Every setting a surface needs lives in process environment variables;
//! this crate is the single place that reads them, so a surface never
//! calls `std::env::var` directly.

mod logging;

pub use logging::{init_logging, LoggingGuard};

use rust_decimal::Decimal;
use shepherd_types::ShepherdError;
use std::str::FromStr;

/// Per-million-token cost rates used to estimate a run's dollar cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostRates {
    /// USD per 1M input tokens.
    pub usd_per_1m_in: Option<Decimal>,
    /// USD per 1M output tokens.
    pub usd_per_1m_out: Option<Decimal>,
}

/// Telegram chat-bot surface settings. `None` when `TELEGRAM_BOT_TOKEN` is
/// unset — the bot surface simply does not start.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: String,
    /// Chat ids allowed to use the bot. Empty means unrestricted.
    pub allowed_chat_ids: Vec<i64>,
    /// Chat ids permitted to run write operations.
    pub admin_chat_ids: Vec<i64>,
    /// Minimum seconds between non-command messages from one chat.
    pub rate_limit_seconds: u64,
    /// Seconds an inline-button approval request stays valid.
    pub approval_ttl_seconds: u64,
    /// Whether to append a usage/cost line to replies.
    pub show_usage: bool,
}

/// Fully resolved process configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Grok API key. Required — startup fails without it.
    pub grok_api_key: String,
    /// Grok model name, defaulted if unset.
    pub grok_model: String,
    /// Grok API base url, defaulted if unset.
    pub grok_base_url: String,
    /// Anthropic API key, if configured.
    pub anthropic_api_key: Option<String>,
    /// Anthropic model name, defaulted if unset.
    pub anthropic_model: String,
    /// Telegram surface settings, present only when `TELEGRAM_BOT_TOKEN` is set.
    pub telegram: Option<TelegramConfig>,
    /// Cost-estimation rates for the Grok provider.
    pub grok_cost: CostRates,
    /// Cost-estimation rates for the Anthropic provider.
    pub anthropic_cost: CostRates,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Fails closed: `GROK_API_KEY` is the only required variable, and its
    /// absence is the only condition that returns an error. Every other
    /// variable is optional and defaults to a sensible value.
    pub fn from_env() -> Result<Self, ShepherdError> {
        let grok_api_key = require_var("GROK_API_KEY")?;
        let grok_model = optional_var("GROK_MODEL").unwrap_or_else(|| "grok-4".to_string());
        let grok_base_url = optional_var("GROK_BASE_URL")
            .unwrap_or_else(|| "https://api.x.ai/v1".to_string());

        let anthropic_api_key = optional_var("ANTHROPIC_API_KEY");
        let anthropic_model =
            optional_var("ANTHROPIC_MODEL").unwrap_or_else(|| "claude-sonnet-4-5".to_string());

        let telegram = optional_var("TELEGRAM_BOT_TOKEN").map(|bot_token| TelegramConfig {
            bot_token,
            allowed_chat_ids: parse_id_list("TELEGRAM_ALLOWED_CHAT_IDS"),
            admin_chat_ids: parse_id_list("TELEGRAM_ADMIN_CHAT_IDS"),
            rate_limit_seconds: parse_u64("TELEGRAM_RATE_LIMIT_SECONDS").unwrap_or(3),
            approval_ttl_seconds: parse_u64("TELEGRAM_APPROVAL_TTL_SECONDS").unwrap_or(600),
            show_usage: parse_bool("TELEGRAM_SHOW_USAGE").unwrap_or(false),
        });

        let grok_cost = CostRates {
            usd_per_1m_in: parse_decimal("COST_GROK_USD_PER_1M_IN"),
            usd_per_1m_out: parse_decimal("COST_GROK_USD_PER_1M_OUT"),
        };
        let anthropic_cost = CostRates {
            usd_per_1m_in: parse_decimal("COST_ANTHROPIC_USD_PER_1M_IN"),
            usd_per_1m_out: parse_decimal("COST_ANTHROPIC_USD_PER_1M_OUT"),
        };

        Ok(Self {
            grok_api_key,
            grok_model,
            grok_base_url,
            anthropic_api_key,
            anthropic_model,
            telegram,
            grok_cost,
            anthropic_cost,
        })
    }
}

fn require_var(key: &str) -> Result<String, ShepherdError> {
    std::env::var(key).map_err(|_| ShepherdError::config_missing_env(key))
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_u64(key: &str) -> Option<u64> {
    optional_var(key).and_then(|v| v.parse().ok())
}

fn parse_bool(key: &str) -> Option<bool> {
    optional_var(key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn parse_decimal(key: &str) -> Option<Decimal> {
    optional_var(key).and_then(|v| Decimal::from_str(&v).ok())
}

fn parse_id_list(key: &str) -> Vec<i64> {
    optional_var(key)
        .map(|v| {
            v.split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "GROK_API_KEY",
            "GROK_MODEL",
            "GROK_BASE_URL",
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_MODEL",
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_ALLOWED_CHAT_IDS",
            "TELEGRAM_ADMIN_CHAT_IDS",
            "TELEGRAM_RATE_LIMIT_SECONDS",
            "TELEGRAM_APPROVAL_TTL_SECONDS",
            "TELEGRAM_SHOW_USAGE",
            "COST_GROK_USD_PER_1M_IN",
            "COST_GROK_USD_PER_1M_OUT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_grok_api_key_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.kind, shepherd_types::ErrorKind::ConfigMissingEnv);
        assert!(err.message.contains("GROK_API_KEY"));
    }

    #[test]
    fn defaults_fill_in_for_optional_settings() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("GROK_API_KEY", "test-key");
        let config = Config::from_env().unwrap();
        assert_eq!(config.grok_model, "grok-4");
        assert_eq!(config.grok_base_url, "https://api.x.ai/v1");
        assert!(config.telegram.is_none());
        clear_all();
    }

    #[test]
    fn telegram_settings_load_only_when_the_token_is_present() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("GROK_API_KEY", "test-key");
        std::env::set_var("TELEGRAM_BOT_TOKEN", "bot-token");
        std::env::set_var("TELEGRAM_ALLOWED_CHAT_IDS", "1, 2,3");
        std::env::set_var("TELEGRAM_SHOW_USAGE", "true");

        let config = Config::from_env().unwrap();
        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.allowed_chat_ids, vec![1, 2, 3]);
        assert_eq!(telegram.approval_ttl_seconds, 600);
        assert!(telegram.show_usage);
        clear_all();
    }

    #[test]
    fn cost_rates_parse_as_decimals() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("GROK_API_KEY", "test-key");
        std::env::set_var("COST_GROK_USD_PER_1M_IN", "3.00");
        let config = Config::from_env().unwrap();
        assert_eq!(config.grok_cost.usd_per_1m_in, Some(Decimal::new(300, 2)));
        clear_all();
    }
}
