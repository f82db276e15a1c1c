use crate::ApprovalGate;
use shepherd_policy::classify_tool;
use shepherd_provider::Provider;
use shepherd_tool::{ToolContext, ToolRegistry};
use shepherd_types::{
    BudgetLimits, BudgetState, EventLevel, EventRecord, LlmRequest, LlmResponse, Message,
    RequestMeta, ShepherdError, Usage,
};
use std::sync::Arc;
use std::time::Instant;

/// Failure modes the scheduler surfaces. A [`Self::Budget`] or
/// [`Self::Provider`] failure is terminal for the run — the scheduler never
/// retries within the same call to [`Scheduler::run`].
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// The budget ledger refused a booking the algorithm requires to
    /// continue (a tool-call reservation; a model call past the first is
    /// handled by returning the last response instead of erroring).
    #[error("{0}")]
    Budget(String),
    /// The provider adapter returned an error for a model call.
    #[error(transparent)]
    Provider(#[from] ShepherdError),
}

/// Outcome of a completed [`Scheduler::run`] call.
#[derive(Debug, Clone)]
pub struct SchedulerResult {
    /// The last response returned by the model.
    pub final_response: LlmResponse,
    /// Full message history accumulated over the run (possibly clamped to
    /// `keep_last_n`).
    pub messages: Vec<Message>,
    /// Usage summed across every model call this run made.
    pub usage_total: Usage,
}

/// Drives the model/tool dialogue: one model call per iteration, each
/// model-requested tool call classified, budget-reserved, gated through
/// approval, and executed (or denied) before the next model call.
pub struct Scheduler {
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
}

impl Scheduler {
    /// Build a scheduler around a provider and the tool registry it may
    /// dispatch into.
    pub fn new(provider: Arc<dyn Provider>, registry: ToolRegistry) -> Self {
        Self { provider, registry }
    }

    /// Run to completion: until the model emits no tool calls, the budget
    /// forbids a further model call, or a budget booking the algorithm
    /// requires is refused.
    ///
    /// `keep_last_n`, when set, clamps the in-flight message history to its
    /// last N entries after every append — applied to the history the
    /// scheduler carries forward, not to what is returned.
    ///
    /// `session_id`, when given, is attached to every emitted event record.
    pub async fn run(
        &self,
        request: LlmRequest,
        limits: BudgetLimits,
        approve: &dyn ApprovalGate,
        tool_ctx: ToolContext,
        keep_last_n: Option<usize>,
        session_id: Option<&str>,
    ) -> Result<SchedulerResult, LoopError> {
        let mut ledger = BudgetState::create(limits);
        let mut messages = request.messages.clone();
        let mut usage_total = Usage::default();
        let mut last_response: Option<LlmResponse> = None;

        let event = |level: EventLevel, name: &str| {
            let mut record = EventRecord::new(level, name).purpose(request.purpose);
            if let Some(id) = session_id {
                record = record.session(id);
            }
            record
        };

        loop {
            if !ledger.can_call_model() {
                return match last_response {
                    Some(final_response) => {
                        event(EventLevel::Info, "toolloop_done")
                            .message("stopped: model call budget exhausted")
                            .emit_tracing();
                        Ok(SchedulerResult {
                            final_response,
                            messages,
                            usage_total,
                        })
                    }
                    None => Err(LoopError::Budget(
                        "budget exhausted before first model call".into(),
                    )),
                };
            }
            ledger = ledger
                .book_model_call()
                .map_err(|e| LoopError::Budget(e.to_string()))?;

            let step_request = LlmRequest {
                provider: request.provider.clone(),
                model: request.model.clone(),
                messages: messages.clone(),
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
                tools: Some(
                    request
                        .tools
                        .clone()
                        .unwrap_or_else(|| self.registry.definitions()),
                ),
                purpose: request.purpose,
                meta: request.meta.clone().or(Some(RequestMeta::default())),
            };

            let started = Instant::now();
            let response = self.provider.chat(step_request).await?;
            event(EventLevel::Info, "llm_step")
                .provider(&response.provider)
                .model(&response.model)
                .ms(started.elapsed().as_millis() as u64)
                .emit_tracing();

            usage_total = usage_total.add(response.usage);
            ledger = ledger.book_usage(response.usage);
            last_response = Some(response.clone());

            messages.push(response.message.clone());
            clamp(&mut messages, keep_last_n);

            let tool_calls = response.message.tool_calls().to_vec();
            if tool_calls.is_empty() {
                event(EventLevel::Info, "toolloop_done")
                    .message("stopped: no further tool calls")
                    .emit_tracing();
                return Ok(SchedulerResult {
                    final_response: response,
                    messages,
                    usage_total,
                });
            }

            for call in &tool_calls {
                event(EventLevel::Info, "tool_suggested")
                    .details(serde_json::json!({ "tool": call.name, "id": call.id }))
                    .emit_tracing();

                let kind = classify_tool(&call.name);
                ledger = match ledger.book_tool_call(kind) {
                    Ok(next) => next,
                    Err(e) => {
                        event(EventLevel::Warn, "write_budget_exceeded")
                            .details(serde_json::json!({ "tool": call.name }))
                            .emit_tracing();
                        return Err(LoopError::Budget(e.to_string()));
                    }
                };

                let tool_message = if approve.approve(call).await {
                    event(EventLevel::Info, "tool_approved")
                        .details(serde_json::json!({ "tool": call.name, "id": call.id }))
                        .emit_tracing();

                    event(EventLevel::Info, "tool_exec")
                        .details(serde_json::json!({ "tool": call.name, "id": call.id }))
                        .emit_tracing();
                    let result = self.registry.execute(call, tool_ctx).await;
                    event(EventLevel::Info, "tool_result")
                        .details(serde_json::json!({ "tool": call.name, "ok": result.is_ok() }))
                        .emit_tracing();
                    Message::tool(&call.name, &call.id, result.to_json_string())
                } else {
                    event(EventLevel::Info, "tool_denied")
                        .details(serde_json::json!({ "tool": call.name, "id": call.id }))
                        .emit_tracing();
                    let denial = shepherd_types::ToolResult::err(
                        &call.name,
                        "Tool call denied by policy/approval.",
                    );
                    Message::tool(&call.name, &call.id, denial.to_json_string())
                };

                messages.push(tool_message);
                clamp(&mut messages, keep_last_n);
            }
        }
    }
}

fn clamp(messages: &mut Vec<Message>, keep_last_n: Option<usize>) {
    if let Some(n) = keep_last_n {
        if messages.len() > n {
            let drop = messages.len() - n;
            messages.drain(0..drop);
        }
    }
}
