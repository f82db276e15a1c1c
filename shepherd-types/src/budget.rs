use crate::llm::Usage;
use crate::tool::ToolKind;
use serde::{Deserialize, Serialize};

/// Caps a scheduler run must respect. `max_steps` and `max_tool_calls` are
/// required; the rest are optional ceilings that, when absent, never gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetLimits {
    /// Maximum model invocations. Normalized to at least `1`.
    pub max_steps: u32,
    /// Maximum tool calls across the whole run.
    pub max_tool_calls: u32,
    /// Optional cap on `total_tokens_used`.
    pub max_total_tokens: Option<u64>,
    /// Optional cap on `total_input_tokens_used`.
    pub max_input_tokens: Option<u64>,
    /// Optional cap on `total_output_tokens_used`.
    pub max_output_tokens: Option<u64>,
    /// Optional cap on `reads_used`.
    pub max_reads: Option<u32>,
    /// Optional cap on `writes_used`.
    pub max_writes: Option<u32>,
}

impl BudgetLimits {
    /// Build limits, normalizing `max_steps` up to at least `1`.
    pub fn new(max_steps: u32, max_tool_calls: u32) -> Self {
        Self {
            max_steps: max_steps.max(1),
            max_tool_calls,
            max_total_tokens: None,
            max_input_tokens: None,
            max_output_tokens: None,
            max_reads: None,
            max_writes: None,
        }
    }

    /// Set the total-token cap.
    #[must_use]
    pub fn with_max_total_tokens(mut self, v: u64) -> Self {
        self.max_total_tokens = Some(v);
        self
    }

    /// Set the input-token cap.
    #[must_use]
    pub fn with_max_input_tokens(mut self, v: u64) -> Self {
        self.max_input_tokens = Some(v);
        self
    }

    /// Set the output-token cap.
    #[must_use]
    pub fn with_max_output_tokens(mut self, v: u64) -> Self {
        self.max_output_tokens = Some(v);
        self
    }

    /// Set the reads cap.
    #[must_use]
    pub fn with_max_reads(mut self, v: u32) -> Self {
        self.max_reads = Some(v);
        self
    }

    /// Set the writes cap.
    #[must_use]
    pub fn with_max_writes(mut self, v: u32) -> Self {
        self.max_writes = Some(v);
        self
    }
}

/// A booking operation was attempted while its pre-check already failed.
/// The scheduler must always check before booking; this error should never
/// be recovered from mid-flight — it means the caller under-specified
/// limits relative to the model's behavior.
#[derive(Debug, Clone, thiserror::Error)]
#[error("budget exceeded: {0}")]
pub struct BudgetExceeded(pub String);

/// Running consumption against a [`BudgetLimits`] for one scheduler run.
/// Every operation returns a new `BudgetState`; there is no shared mutable
/// counter, so nothing here needs a lock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetState {
    /// Limits this state is measured against.
    pub limits: BudgetLimits,
    /// Model invocations made so far.
    pub steps_used: u32,
    /// Tool calls made so far, across all kinds.
    pub tool_calls_used: u32,
    /// Tool calls classified `read` so far.
    pub reads_used: u32,
    /// Tool calls classified `write` so far.
    pub writes_used: u32,
    /// Cumulative total tokens.
    pub total_tokens_used: u64,
    /// Cumulative input tokens.
    pub total_input_tokens_used: u64,
    /// Cumulative output tokens.
    pub total_output_tokens_used: u64,
}

impl BudgetState {
    /// Start a fresh ledger for a new scheduler run.
    pub fn create(limits: BudgetLimits) -> Self {
        Self {
            limits,
            steps_used: 0,
            tool_calls_used: 0,
            reads_used: 0,
            writes_used: 0,
            total_tokens_used: 0,
            total_input_tokens_used: 0,
            total_output_tokens_used: 0,
        }
    }

    /// True iff another model call is allowed: steps remain, and every
    /// configured token cap is still strictly unmet.
    pub fn can_call_model(&self) -> bool {
        if self.steps_used >= self.limits.max_steps {
            return false;
        }
        if let Some(cap) = self.limits.max_total_tokens {
            if self.total_tokens_used >= cap {
                return false;
            }
        }
        if let Some(cap) = self.limits.max_input_tokens {
            if self.total_input_tokens_used >= cap {
                return false;
            }
        }
        if let Some(cap) = self.limits.max_output_tokens {
            if self.total_output_tokens_used >= cap {
                return false;
            }
        }
        true
    }

    /// True iff a tool call of `kind` is allowed: the overall tool-call cap
    /// remains, and the kind-specific cap (if any) is not yet met.
    pub fn can_call_tool(&self, kind: ToolKind) -> bool {
        if self.tool_calls_used >= self.limits.max_tool_calls {
            return false;
        }
        match kind {
            ToolKind::Read => self
                .limits
                .max_reads
                .map(|cap| self.reads_used < cap)
                .unwrap_or(true),
            ToolKind::Write => self
                .limits
                .max_writes
                .map(|cap| self.writes_used < cap)
                .unwrap_or(true),
            ToolKind::Other => true,
        }
    }

    /// Book a model call. Requires [`Self::can_call_model`].
    pub fn book_model_call(&self) -> Result<Self, BudgetExceeded> {
        if !self.can_call_model() {
            return Err(BudgetExceeded(
                "model call refused: step or token budget exhausted".into(),
            ));
        }
        let mut next = *self;
        next.steps_used += 1;
        Ok(next)
    }

    /// Book a tool call of `kind`. Requires [`Self::can_call_tool`].
    pub fn book_tool_call(&self, kind: ToolKind) -> Result<Self, BudgetExceeded> {
        if !self.can_call_tool(kind) {
            return Err(BudgetExceeded(format!(
                "tool call refused: {kind:?} budget exhausted"
            )));
        }
        let mut next = *self;
        next.tool_calls_used += 1;
        match kind {
            ToolKind::Read => next.reads_used += 1,
            ToolKind::Write => next.writes_used += 1,
            ToolKind::Other => {}
        }
        Ok(next)
    }

    /// Accumulate usage unconditionally. It is legal for the resulting
    /// state to exceed a cap — the call already happened — but this
    /// forbids the *next* model call via [`Self::can_call_model`].
    pub fn book_usage(&self, usage: Usage) -> Self {
        let mut next = *self;
        next.total_tokens_used = next.total_tokens_used.saturating_add(usage.total_tokens);
        next.total_input_tokens_used = next
            .total_input_tokens_used
            .saturating_add(usage.input_tokens);
        next.total_output_tokens_used = next
            .total_output_tokens_used
            .saturating_add(usage.output_tokens);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_gated_and_monotone() {
        let limits = BudgetLimits::new(2, 10);
        let l0 = BudgetState::create(limits);
        assert!(l0.can_call_model());
        let l1 = l0.book_model_call().unwrap();
        assert_eq!(l1.steps_used, 1);
        let l2 = l1.book_model_call().unwrap();
        assert_eq!(l2.steps_used, 2);
        assert!(!l2.can_call_model());
        assert!(l2.book_model_call().is_err());
    }

    #[test]
    fn tool_kind_caps_are_independent() {
        let limits = BudgetLimits::new(5, 10).with_max_writes(1);
        let l0 = BudgetState::create(limits);
        let l1 = l0.book_tool_call(ToolKind::Write).unwrap();
        assert!(!l1.can_call_tool(ToolKind::Write));
        assert!(l1.can_call_tool(ToolKind::Read));
        assert!(l1.book_tool_call(ToolKind::Write).is_err());
    }

    #[test]
    fn booking_usage_past_a_cap_still_blocks_the_next_call() {
        let limits = BudgetLimits::new(5, 10).with_max_total_tokens(100);
        let l0 = BudgetState::create(limits);
        let l1 = l0.book_usage(Usage::new(60, 60));
        assert!(l1.total_tokens_used > 100);
        assert!(!l1.can_call_model());
    }
}
