#![deny(missing_docs)]
//! Provider abstraction normalizing heterogeneous LLM wire formats into one
//! request/response shape.
//!
//! Every adapter under [`adapters`] implements [`Provider`]; [`ProviderRouter`]
//! is the single entry point the scheduler calls through, resolving an empty
//! requested provider name to a purpose-appropriate default.

mod wire;

pub mod adapters;

pub use wire::normalize_usage;

use async_trait::async_trait;
use shepherd_types::{ErrorKind, LlmRequest, LlmResponse, Purpose, ShepherdError};
use std::collections::HashMap;
use std::sync::Arc;

/// A chat-completion backend, normalized to the shepherd wire shapes.
///
/// Implementors own their own credentials and HTTP client; `chat` performs
/// exactly one request/response round trip.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run one step against the model and return its normalized response.
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, ShepherdError>;
}

/// Dispatches a request to the provider adapter named by `LlmRequest::provider`,
/// or to a purpose-based default when that name is empty.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRouter {
    /// Build an empty router.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register an adapter under the given name, overwriting any previous
    /// registration of that name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Default provider name for a purpose, used when the caller leaves
    /// `LlmRequest::provider` empty. `Dev` runs get the native Anthropic
    /// adapter; everything else defaults to the OpenAI-compatible one.
    fn default_provider_name(purpose: Purpose) -> &'static str {
        match purpose {
            Purpose::Dev => "anthropic",
            _ => "grok",
        }
    }

    /// Resolve and run the request, filling in the default provider name and
    /// stamping it onto the outgoing request before forwarding.
    pub async fn chat(&self, mut request: LlmRequest) -> Result<LlmResponse, ShepherdError> {
        let name = if request.provider.is_empty() {
            Self::default_provider_name(request.purpose).to_string()
        } else {
            request.provider.clone()
        };

        let provider = self.providers.get(&name).ok_or_else(|| {
            ShepherdError::new(ErrorKind::Unknown, format!("unknown provider: {name}"))
        })?;
        request.provider = name;
        provider.chat(request).await
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for ProviderRouter {
    /// Delegates to [`ProviderRouter::chat`], so a configured router can be
    /// handed to the scheduler as `Arc<dyn Provider>` directly alongside any
    /// single adapter.
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, ShepherdError> {
        ProviderRouter::chat(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::{FinishReason, Message, Usage};

    struct StubProvider {
        name: &'static str,
    }

    #[async_trait]
    impl Provider for StubProvider {
        async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, ShepherdError> {
            Ok(LlmResponse {
                provider: request.provider,
                model: request.model,
                text: self.name.to_string(),
                message: Message::assistant(self.name, vec![]),
                usage: Usage::new(1, 1),
                finish_reason: FinishReason::Stop,
                response_id: None,
            })
        }
    }

    fn request(provider: &str, purpose: Purpose) -> LlmRequest {
        LlmRequest {
            provider: provider.to_string(),
            model: String::new(),
            messages: vec![Message::user("hi")],
            max_output_tokens: 256,
            temperature: None,
            tools: None,
            purpose,
            meta: None,
        }
    }

    #[tokio::test]
    async fn empty_provider_name_defaults_by_purpose() {
        let mut router = ProviderRouter::new();
        router.register("grok", Arc::new(StubProvider { name: "grok" }));
        router.register("anthropic", Arc::new(StubProvider { name: "anthropic" }));

        let response = router.chat(request("", Purpose::Default)).await.unwrap();
        assert_eq!(response.text, "grok");

        let response = router.chat(request("", Purpose::Dev)).await.unwrap();
        assert_eq!(response.text, "anthropic");
    }

    #[tokio::test]
    async fn explicit_provider_name_overrides_the_default() {
        let mut router = ProviderRouter::new();
        router.register("anthropic", Arc::new(StubProvider { name: "anthropic" }));

        let response = router
            .chat(request("anthropic", Purpose::Default))
            .await
            .unwrap();
        assert_eq!(response.text, "anthropic");
    }

    #[tokio::test]
    async fn unregistered_provider_name_errors() {
        let router = ProviderRouter::new();
        let err = router.chat(request("nonexistent", Purpose::Default)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }
}
