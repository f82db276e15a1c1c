//! A dependency-free, scriptable adapter used to drive the scheduler in
//! tests without any network access. Never registered in a production
//! [`crate::ProviderRouter`].

use crate::Provider;
use async_trait::async_trait;
use shepherd_types::{ErrorKind, LlmRequest, LlmResponse, ShepherdError};
use std::sync::Mutex;

/// Replays a fixed script of responses, one per call, in order.
pub struct EchoProvider {
    script: Mutex<Vec<LlmResponse>>,
}

impl EchoProvider {
    /// Build an adapter that returns `script[0]` on the first call,
    /// `script[1]` on the second, and so on.
    pub fn new(script: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().rev().collect()),
        }
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().expect("echo script lock poisoned").len()
    }
}

#[async_trait]
impl Provider for EchoProvider {
    async fn chat(&self, _request: LlmRequest) -> Result<LlmResponse, ShepherdError> {
        self.script
            .lock()
            .expect("echo script lock poisoned")
            .pop()
            .ok_or_else(|| ShepherdError::new(ErrorKind::Unknown, "echo provider script exhausted"))
    }
}
