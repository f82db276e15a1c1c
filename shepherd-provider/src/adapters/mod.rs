//! Concrete [`crate::Provider`] implementations.

mod anthropic;
mod echo;
mod grok;

pub use anthropic::AnthropicProvider;
pub use echo::EchoProvider;
pub use grok::GrokProvider;
