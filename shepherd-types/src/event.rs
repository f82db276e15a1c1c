use crate::error::ErrorKind;
use crate::purpose::Purpose;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of an [`EventRecord`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Verbose diagnostic detail.
    Debug,
    /// Routine progress.
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Terminal failure.
    Error,
}

/// One line of the structured event log (`logs/app.log`), emitted by the
/// scheduler at key points (`llm_step`, `toolloop_done`, `tool_suggested`,
/// `tool_approved`, `tool_denied`, `tool_exec`, `tool_result`,
/// `write_budget_exceeded`, `toolloop_approve_prompt`) and by the surfaces
/// on unrecoverable error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the event occurred.
    pub ts: DateTime<Utc>,
    /// Severity.
    pub level: EventLevel,
    /// Event name, one of the fixed emission points above.
    pub event: String,
    /// Session this event pertains to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Purpose this event ran under, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
    /// Provider involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Elapsed milliseconds, if timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms: Option<u64>,
    /// Classified error kind, for `level: error` records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorKind>,
    /// Free-text message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Arbitrary structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl EventRecord {
    /// Start a new record, stamped at `now`.
    pub fn new(level: EventLevel, event: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            level,
            event: event.into(),
            session: None,
            purpose: None,
            provider: None,
            model: None,
            ms: None,
            error_class: None,
            message: None,
            details: None,
        }
    }

    /// Attach a session id.
    #[must_use]
    pub fn session(mut self, id: impl Into<String>) -> Self {
        self.session = Some(id.into());
        self
    }

    /// Attach a purpose.
    #[must_use]
    pub fn purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Attach a provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Attach a model name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach an elapsed-time measurement.
    #[must_use]
    pub fn ms(mut self, ms: u64) -> Self {
        self.ms = Some(ms);
        self
    }

    /// Attach a classified error kind.
    #[must_use]
    pub fn error_class(mut self, kind: ErrorKind) -> Self {
        self.error_class = Some(kind);
        self
    }

    /// Attach a free-text message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach structured detail.
    #[must_use]
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize as one JSON-lines record, newline-terminated.
    pub fn to_json_line(&self) -> String {
        let mut line = serde_json::to_string(self).expect("EventRecord always serializes");
        line.push('\n');
        line
    }

    /// Mirror this record into `tracing`, at the matching level, carrying
    /// every populated field so a JSON-lines subscriber layer reproduces
    /// this record byte-for-byte in `logs/app.log`.
    pub fn emit_tracing(&self) {
        macro_rules! emit {
            ($macro:ident) => {
                tracing::$macro!(
                    event = %self.event,
                    session = ?self.session,
                    purpose = ?self.purpose,
                    provider = ?self.provider,
                    model = ?self.model,
                    ms = ?self.ms,
                    error_class = ?self.error_class,
                    message = ?self.message,
                    details = ?self.details,
                    "event"
                )
            };
        }
        match self.level {
            EventLevel::Debug => emit!(debug),
            EventLevel::Info => emit!(info),
            EventLevel::Warn => emit!(warn),
            EventLevel::Error => emit!(error),
        }
    }
}
