use crate::message::Message;
use crate::purpose::Purpose;
use crate::tool::ToolDefinition;
use serde::{Deserialize, Serialize};

/// Optional request-correlation identifiers, propagated verbatim into logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Caller-supplied request id.
    pub request_id: Option<String>,
    /// Caller-supplied trace id, for cross-service correlation.
    pub trace_id: Option<String>,
}

/// A request to a provider's `chat` operation, provider-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Which provider adapter to route through.
    pub provider: String,
    /// Model name. Adapters fill a default when empty.
    pub model: String,
    /// Full message history for this step.
    pub messages: Vec<Message>,
    /// Hard cap on generated tokens. Always a positive integer once clamped.
    pub max_output_tokens: u32,
    /// Sampling temperature. Adapters default this to `0.2` when absent.
    pub temperature: Option<f32>,
    /// Tools the model may call this step. `None`/empty disables tool-calling.
    pub tools: Option<Vec<ToolDefinition>>,
    /// Mode this request runs under.
    pub purpose: Purpose,
    /// Optional correlation metadata.
    pub meta: Option<RequestMeta>,
}

impl LlmRequest {
    /// Tools list, normalized to an empty slice when absent.
    pub fn tools(&self) -> &[ToolDefinition] {
        self.tools.as_deref().unwrap_or(&[])
    }
}

/// Normalized token accounting. `total_tokens` is always the sum of the
/// other two fields — construct via [`Usage::new`] to keep that invariant,
/// never set fields individually after the fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub input_tokens: u64,
    /// Tokens generated by the model.
    pub output_tokens: u64,
    /// `input_tokens + output_tokens`.
    pub total_tokens: u64,
}

impl Usage {
    /// Build a usage record, computing `total_tokens`.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }

    /// Accumulate another usage record into this one.
    pub fn add(self, other: Usage) -> Self {
        Self::new(
            self.input_tokens.saturating_add(other.input_tokens),
            self.output_tokens.saturating_add(other.output_tokens),
        )
    }
}

/// Normalized reason a model stopped producing output on a given step.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model completed its turn normally.
    Stop,
    /// The model hit `max_output_tokens`.
    Length,
    /// The model is waiting on tool results.
    ToolCall,
    /// The provider's content filter intervened.
    ContentFilter,
    /// The provider reported an error for this step.
    Error,
    /// An unrecognized or unmapped stop condition.
    Unknown,
}

/// Response from a provider's `chat` operation, provider-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Provider that produced this response.
    pub provider: String,
    /// Model that produced this response.
    pub model: String,
    /// Aggregate text, possibly empty when the step is tool-call-only.
    pub text: String,
    /// The canonical `Assistant` message to append to history.
    pub message: Message,
    /// Normalized token usage for this step.
    pub usage: Usage,
    /// Normalized stop reason.
    pub finish_reason: FinishReason,
    /// Provider-assigned response id, if any.
    pub response_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_total_is_always_the_sum() {
        let u = Usage::new(10, 5);
        assert_eq!(u.total_tokens, 15);
        let acc = u.add(Usage::new(1, 2));
        assert_eq!(acc.total_tokens, 18);
    }
}
