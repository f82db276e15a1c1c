use serde::{Deserialize, Serialize};

/// The mode a tool-loop run executes under. Flows from the front-end
/// through the scheduler into policy decisions; there is no out-of-band
/// equivalent — every call that needs it takes it explicitly.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Interactive end-user session.
    Default,
    /// Elevated permissions, looser write-policy, higher temperature.
    Dev,
    /// Synthetic ping, not a user-initiated turn.
    Heartbeat,
    /// Programmatic use by another system.
    Runtime,
}

impl Default for Purpose {
    fn default() -> Self {
        Self::Default
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::Dev => "dev",
            Self::Heartbeat => "heartbeat",
            Self::Runtime => "runtime",
        };
        write!(f, "{s}")
    }
}

impl Purpose {
    /// Whether this purpose runs with elevated (dev) write permissions.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Dev)
    }
}
