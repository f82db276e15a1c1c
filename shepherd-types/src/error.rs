use serde::{Deserialize, Serialize};

/// Closed classification of failures, used for logging and for the
/// propagation policy: `Policy` and `Budget` failures are terminal and are
/// never retried within the same run.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required configuration key is absent.
    ConfigMissingEnv,
    /// A provider-credentials check failed at call time.
    ConfigMissingKey,
    /// Transport-level failure (name resolution, reset, timeout).
    Network,
    /// Remote returned an authentication failure.
    Auth,
    /// Remote returned a not-found condition referencing the model.
    ModelNotFound,
    /// A policy-engine rejection.
    Policy,
    /// A ledger booking refused.
    Budget,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConfigMissingEnv => "config_missing_env",
            Self::ConfigMissingKey => "config_missing_key",
            Self::Network => "network",
            Self::Auth => "auth",
            Self::ModelNotFound => "model_not_found",
            Self::Policy => "policy",
            Self::Budget => "budget",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A classified, user-facing error carried across crate boundaries.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ShepherdError {
    /// Classification used by surfaces and the event log.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ShepherdError {
    /// Build an error of the given kind with no source.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// A required environment variable was absent.
    pub fn config_missing_env(key: &str) -> Self {
        Self::new(
            ErrorKind::ConfigMissingEnv,
            format!("missing required environment variable: {key}"),
        )
    }

    /// A provider's credential check failed at call time.
    pub fn config_missing_key(provider: &str) -> Self {
        Self::new(
            ErrorKind::ConfigMissingKey,
            format!("no credentials configured for provider: {provider}"),
        )
    }

    /// A policy-engine rejection. `rule` names the triggering rule.
    pub fn policy(rule: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Policy, format!("{rule}: {}", message.into()))
    }

    /// A budget-ledger booking refusal.
    pub fn budget(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Budget, message)
    }
}

/// Best-effort classification of an arbitrary error into [`ErrorKind`].
///
/// Prefer constructing a [`ShepherdError`] with an explicit kind at the
/// point of failure; this exists for boundaries (e.g. provider HTTP
/// clients) that hand back an opaque `dyn Error` and still need a kind
/// for the event log.
pub fn classify(err: &(dyn std::error::Error + 'static)) -> ErrorKind {
    if let Some(shepherd) = err.downcast_ref::<ShepherdError>() {
        return shepherd.kind;
    }
    let text = err.to_string().to_ascii_lowercase();
    if text.contains("401") || text.contains("unauthorized") || text.contains("auth") {
        ErrorKind::Auth
    } else if text.contains("model") && (text.contains("not found") || text.contains("404")) {
        ErrorKind::ModelNotFound
    } else if text.contains("timed out")
        || text.contains("timeout")
        || text.contains("connection")
        || text.contains("dns")
        || text.contains("resolve")
        || text.contains("reset")
    {
        ErrorKind::Network
    } else {
        ErrorKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_auth_like_messages() {
        let err = ShepherdError::new(ErrorKind::Unknown, "unused");
        let opaque: std::io::Error = std::io::Error::new(std::io::ErrorKind::Other, "401 Unauthorized");
        assert_eq!(classify(&opaque), ErrorKind::Auth);
        let _ = err;
    }

    #[test]
    fn classifies_network_like_messages() {
        let opaque = std::io::Error::new(std::io::ErrorKind::Other, "connection reset by peer");
        assert_eq!(classify(&opaque), ErrorKind::Network);
    }

    #[test]
    fn shepherd_error_downcast_preserves_kind() {
        let err = ShepherdError::budget("tool calls exhausted");
        assert_eq!(classify(&err), ErrorKind::Budget);
    }
}
