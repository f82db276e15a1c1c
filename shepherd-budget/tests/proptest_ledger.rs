//! Property-based tests: the ledger never lets consumption pass its caps,
//! regardless of call ordering.

use proptest::prelude::*;
use shepherd_budget::{BudgetLimits, BudgetState};
use shepherd_types::ToolKind;

#[derive(Debug, Clone, Copy)]
enum Op {
    Model,
    Tool(ToolKind),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Model),
        Just(Op::Tool(ToolKind::Read)),
        Just(Op::Tool(ToolKind::Write)),
        Just(Op::Tool(ToolKind::Other)),
    ]
}

proptest! {
    #[test]
    fn ledger_never_exceeds_its_caps(
        max_steps in 0u32..6,
        max_tool_calls in 0u32..6,
        max_reads in 0u32..4,
        max_writes in 0u32..4,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let limits = BudgetLimits::new(max_steps, max_tool_calls)
            .with_max_reads(max_reads)
            .with_max_writes(max_writes);
        let mut state = BudgetState::create(limits);

        for op in ops {
            state = match op {
                Op::Model => state.book_model_call().unwrap_or(state),
                Op::Tool(kind) => state.book_tool_call(kind).unwrap_or(state),
            };

            prop_assert!(state.steps_used <= state.limits.max_steps.max(1));
            prop_assert!(state.tool_calls_used <= state.limits.max_tool_calls);
            prop_assert!(state.reads_used <= max_reads);
            prop_assert!(state.writes_used <= max_writes);
        }
    }

    #[test]
    fn a_refused_booking_never_changes_the_state(
        max_steps in 1u32..3,
        max_tool_calls in 1u32..3,
    ) {
        let limits = BudgetLimits::new(max_steps, max_tool_calls);
        let mut state = BudgetState::create(limits);
        while state.can_call_model() {
            state = state.book_model_call().unwrap();
        }
        let before = state.steps_used;
        let err = state.book_model_call();
        prop_assert!(err.is_err());
        prop_assert_eq!(state.steps_used, before);
    }
}
