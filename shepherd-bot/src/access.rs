use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Allow-list and admin-list checks for incoming chat ids.
///
/// An empty `allowed_chat_ids` means unrestricted, matching
/// `shepherd_config::TelegramConfig`'s documented default.
pub struct AccessControl {
    allowed_chat_ids: Vec<i64>,
    admin_chat_ids: Vec<i64>,
}

impl AccessControl {
    /// Build from the configured allow-list and admin sub-list.
    pub fn new(allowed_chat_ids: Vec<i64>, admin_chat_ids: Vec<i64>) -> Self {
        Self {
            allowed_chat_ids,
            admin_chat_ids,
        }
    }

    /// Whether `chat_id` may use the bot at all.
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }

    /// Whether `chat_id` may run elevated (`/dev`) or other write-gated
    /// operations.
    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_chat_ids.contains(&chat_id)
    }
}

/// Per-chat minimum spacing between non-command messages.
///
/// Backed by a plain `Mutex<HashMap>` rather than anything fancier: one bot
/// process, contention is microseconds, and the map never needs to survive
/// a restart.
pub struct Cooldown {
    window: Duration,
    last_seen: Mutex<HashMap<i64, Instant>>,
}

impl Cooldown {
    /// Build a cooldown tracker requiring `seconds` between messages from
    /// the same chat. `seconds == 0` disables the cooldown.
    pub fn new(seconds: u64) -> Self {
        Self {
            window: Duration::from_secs(seconds),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `chat_id` may send a non-command message right now. Updates
    /// the chat's last-seen time as a side effect only when it returns
    /// `true` — a chat that is rate-limited gets to retry immediately once
    /// the window has elapsed rather than restarting a fresh window.
    pub fn check(&self, chat_id: i64) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let mut seen = self.last_seen.lock().expect("cooldown lock poisoned");
        let now = Instant::now();
        match seen.get(&chat_id) {
            Some(last) if now.duration_since(*last) < self.window => false,
            _ => {
                seen.insert(chat_id, now);
                true
            }
        }
    }
}
