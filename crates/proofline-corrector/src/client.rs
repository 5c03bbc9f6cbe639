//! Backend calls for single units, with timeout and retry

use crate::config::CorrectorConfig;
use crate::error::UnitFailure;
use crate::parser::parse_corrections;
use crate::prompt::PromptBuilder;
use crate::rules::RuleSet;
use proofline_domain::traits::{ClassifiedError, FailureKind, LlmProvider};
use proofline_domain::{Correction, CorrectionUnit};
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Sends one unit to the backend and turns the reply into corrections
///
/// The client keeps no per-unit state; the rule set is passed on every call.
pub struct CorrectionClient<L: LlmProvider> {
    llm_provider: Arc<L>,
    config: CorrectorConfig,
}

impl<L: LlmProvider> Clone for CorrectionClient<L> {
    fn clone(&self) -> Self {
        Self {
            llm_provider: Arc::clone(&self.llm_provider),
            config: self.config.clone(),
        }
    }
}

impl<L: LlmProvider> CorrectionClient<L> {
    /// Create a new client
    pub fn new(llm_provider: Arc<L>, config: CorrectorConfig) -> Self {
        Self { llm_provider, config }
    }

    /// Correct one unit
    ///
    /// Transient errors and timeouts are retried with exponential backoff up
    /// to `max_attempts`. A permanent error or an unusable reply fails the
    /// unit at once.
    pub async fn submit(&self, unit: &CorrectionUnit, rule_set: &RuleSet) -> Result<Vec<Correction>, UnitFailure> {
        let system = PromptBuilder::new(rule_set).build();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "Unit {} attempt {}/{} ({} chars)",
                unit.index + 1,
                attempt,
                max_attempts,
                unit.char_len()
            );

            let call = self.llm_provider.generate(&system, &unit.source_text);
            let (kind, message) = match timeout(self.config.unit_timeout(), call).await {
                Ok(Ok(response)) => {
                    debug!("Unit {} reply: {} chars", unit.index + 1, response.len());
                    return parse_corrections(&response, unit.index).map_err(UnitFailure::Permanent);
                }
                Ok(Err(e)) => (e.kind(), e.to_string()),
                Err(_) => (
                    FailureKind::Transient,
                    format!("no reply within {}s", self.config.unit_timeout_secs),
                ),
            };

            if kind == FailureKind::Permanent {
                return Err(UnitFailure::Permanent(message));
            }
            if attempt >= max_attempts {
                return Err(UnitFailure::RetriesExhausted {
                    attempts: attempt,
                    last_error: message,
                });
            }

            let delay = self.config.backoff_for(attempt);
            warn!(
                "Unit {} attempt {} failed: {}; retrying in {}ms",
                unit.index + 1,
                attempt,
                message,
                delay.as_millis()
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofline_llm::{LlmError, MockProvider};
    use std::time::Duration;

    fn client(provider: &MockProvider, config: CorrectorConfig) -> CorrectionClient<MockProvider> {
        CorrectionClient::new(Arc::new(provider.clone()), config)
    }

    fn unit(text: &str) -> CorrectionUnit {
        CorrectionUnit::new(0, text, 0..1)
    }

    #[tokio::test]
    async fn test_successful_reply() {
        let provider = MockProvider::new(r#"[{"original": "teh", "corrected": "the"}]"#);
        let client = client(&provider, CorrectorConfig::default());

        let corrections = client.submit(&unit("teh cat"), &RuleSet::default()).await.unwrap();
        assert_eq!(corrections, vec![Correction::new(0, "teh", "the")]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let provider = MockProvider::default();
        provider.add_sequence(
            "flaky",
            vec![
                Err(LlmError::Timeout),
                Err(LlmError::RateLimited),
                Ok(r#"[{"original": "a", "corrected": "b"}]"#.to_string()),
            ],
        );
        let client = client(&provider, CorrectorConfig::default());

        let start = tokio::time::Instant::now();
        let corrections = client.submit(&unit("flaky"), &RuleSet::default()).await.unwrap();

        assert_eq!(corrections.len(), 1);
        assert_eq!(provider.call_count(), 3);
        // 1s then 2s of backoff
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let provider = MockProvider::default();
        provider.add_error(
            "down",
            LlmError::Server {
                status: 503,
                message: "overloaded".into(),
            },
        );
        let client = client(&provider, CorrectorConfig::default());

        let result = client.submit(&unit("down"), &RuleSet::default()).await;
        match result {
            Err(UnitFailure::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("503"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let provider = MockProvider::default();
        provider.add_error("secret", LlmError::ContentRejected("policy".into()));
        let client = client(&provider, CorrectorConfig::default());

        let result = client.submit(&unit("secret"), &RuleSet::default()).await;
        assert!(matches!(result, Err(UnitFailure::Permanent(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_permanent() {
        let provider = MockProvider::new("I could not find any problems.");
        let client = client(&provider, CorrectorConfig::default());

        let result = client.submit(&unit("fine text"), &RuleSet::default()).await;
        assert!(matches!(result, Err(UnitFailure::Permanent(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let provider = MockProvider::new("[]").with_delay(Duration::from_secs(30));
        let config = CorrectorConfig {
            unit_timeout_secs: 5,
            max_attempts: 2,
            ..CorrectorConfig::default()
        };
        let client = client(&provider, config);

        let result = client.submit(&unit("slow"), &RuleSet::default()).await;
        match result {
            Err(UnitFailure::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error, "no reply within 5s");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
