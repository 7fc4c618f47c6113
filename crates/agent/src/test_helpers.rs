//! Shared test helpers.

use async_trait::async_trait;
use lorekeep_core::error::ProviderError;
use lorekeep_core::provider::{CompletionRequest, Provider};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request for later inspection. Panics if more calls are
/// made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: Mutex<usize>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
        }
    }

    /// Create a provider that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![text.to_string()])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// The i-th request seen by the provider.
    pub fn request(&self, i: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let response = responses[*count].clone();
        *count += 1;
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        Err(self.error.clone())
    }
}
