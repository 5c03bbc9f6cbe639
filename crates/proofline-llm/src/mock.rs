//! Mock LLM provider for deterministic testing

use crate::LlmError;
use proofline_domain::traits::LlmProvider;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Reply = Result<String, LlmError>;

/// Mock LLM provider for deterministic testing
///
/// Replies are looked up by the exact user message. Each key holds a queue of
/// scripted replies: they are consumed in order and the last one repeats.
/// Unknown messages get the default response.
///
/// # Examples
///
/// ```
/// use proofline_llm::{LlmError, MockProvider};
/// use proofline_domain::traits::LlmProvider;
///
/// # tokio_test::block_on(async {
/// let provider = MockProvider::new("[]");
/// provider.add_sequence("flaky", vec![Err(LlmError::Timeout), Ok("ok".to_string())]);
///
/// assert!(provider.generate("sys", "flaky").await.is_err());
/// assert_eq!(provider.generate("sys", "flaky").await.unwrap(), "ok");
/// assert_eq!(provider.generate("sys", "other").await.unwrap(), "[]");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all messages
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
            delays: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep this long for one user message, instead of the global delay
    pub fn add_delay(&self, user: impl Into<String>, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.insert(user.into(), delay);
        }
    }

    /// Add a specific response for a given user message
    pub fn add_response(&self, user: impl Into<String>, response: impl Into<String>) {
        self.add_sequence(user, vec![Ok(response.into())]);
    }

    /// Configure an error for a given user message
    pub fn add_error(&self, user: impl Into<String>, error: LlmError) {
        self.add_sequence(user, vec![Err(error)]);
    }

    /// Script a sequence of replies for a given user message
    pub fn add_sequence(&self, user: impl Into<String>, replies: Vec<Result<String, LlmError>>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(user.into(), replies.into());
        }
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|count| *count).unwrap_or(0)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count = 0;
        }
    }

    /// Highest number of calls observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn delay_for(&self, user: &str) -> Option<Duration> {
        self.delays
            .lock()
            .ok()
            .and_then(|delays| delays.get(user).copied())
            .or(self.delay)
    }

    fn next_reply(&self, user: &str) -> Reply {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }

        let mut responses = match self.responses.lock() {
            Ok(responses) => responses,
            Err(_) => return Err(LlmError::Communication("mock state poisoned".to_string())),
        };

        match responses.get_mut(user) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(self.default_response.clone())),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(self.default_response.clone())),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(&self, _system: &str, user: &str) -> Result<String, Self::Error> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay_for(user) {
            tokio::time::sleep(delay).await;
        }

        let reply = self.next_reply(user);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}
