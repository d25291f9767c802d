//! Retrying, fail-soft front of a judge transport
//!
//! A question is attempted up to [`RetryPolicy::max_attempts`] times. The
//! wait after a failed attempt grows linearly and is capped. Once every
//! attempt has failed the gateway answers with an empty string instead of an
//! error, so callers treat "unreachable" exactly like "unusable answer".

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::{ChatRequest, ChatTransport, Judge, JudgeOptions};
use crate::telemetry::PipelineMetrics;

/// Attempt bound and linear backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after the first failed attempt
    pub base_delay: Duration,
    /// Added to the wait for every further attempt
    pub step: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            step: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Same attempt bound, no waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait after the failed attempt with zero-based index `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.base_delay + self.step * attempt).min(self.max_delay)
    }
}

/// The [`Judge`] used in production: a transport plus retry policy
pub struct JudgeGateway<T> {
    transport: T,
    retry: RetryPolicy,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl<T: ChatTransport> JudgeGateway<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            metrics: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a prepared request, retrying transport failures
    pub async fn send(&self, request: &ChatRequest) -> String {
        if let Some(metrics) = &self.metrics {
            metrics.record_judge_request();
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;
        for attempt in 0..max_attempts {
            attempts = attempt + 1;
            match self.transport.chat(request).await {
                Ok(text) => {
                    tracing::debug!(attempt = attempt + 1, "Judge answered");
                    return text;
                }
                Err(e) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_attempt_failure();
                    }
                    tracing::debug!(
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        error = %e,
                        "Failed to get a judge response"
                    );
                    if !e.is_transient() {
                        tracing::error!(
                            attempt = attempt + 1,
                            error = %e,
                            "Judge transport failed with a non-transient error; not retrying"
                        );
                        break;
                    }
                    if attempt + 1 < max_attempts {
                        sleep(self.retry.delay_for(attempt)).await;
                    }
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_degraded();
        }
        tracing::warn!(
            attempts,
            "Failed to get a judge response; answering with empty text (see debug logs)"
        );
        String::new()
    }
}

#[async_trait]
impl<T: ChatTransport> Judge for JudgeGateway<T> {
    async fn ask(&self, system: &str, user: &str, options: &JudgeOptions) -> String {
        let request = ChatRequest::new(system, user, *options);
        self.send(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AliError;
    use crate::judge::MockChatTransport;
    use mockall::predicate::always;

    #[test]
    fn test_delay_schedule_is_linear_and_capped() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for(1), Duration::from_millis(1100));
        assert_eq!(retry.delay_for(4), Duration::from_millis(4100));
        assert_eq!(retry.delay_for(9), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_always_failing_transport_degrades_after_five_attempts() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_chat()
            .with(always())
            .times(5)
            .returning(|_| Err(AliError::transport("connection refused")));

        let metrics = Arc::new(PipelineMetrics::new().unwrap());
        let gateway = JudgeGateway::new(transport)
            .with_retry_policy(RetryPolicy::immediate(5))
            .with_metrics(metrics.clone());

        let answer = gateway.ask("context", "question", &JudgeOptions::default()).await;
        assert_eq!(answer, "");

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("ali_judge_attempt_failures_total 5"));
        assert!(text.contains("ali_judge_degraded_total 1"));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let mut transport = MockChatTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_chat()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(AliError::transport("503")));
        transport
            .expect_chat()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(r#"{"Answer": "no"}"#.to_string()));

        let gateway = JudgeGateway::new(transport).with_retry_policy(RetryPolicy::immediate(5));
        let answer = gateway.ask("context", "question", &JudgeOptions::default()).await;
        assert_eq!(answer, r#"{"Answer": "no"}"#);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_chat()
            .times(1)
            .returning(|_| Err(AliError::configuration("unknown model")));

        let metrics = Arc::new(PipelineMetrics::new().unwrap());
        let gateway = JudgeGateway::new(transport)
            .with_retry_policy(RetryPolicy::immediate(5))
            .with_metrics(metrics.clone());
        assert_eq!(gateway.ask("context", "question", &JudgeOptions::default()).await, "");

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("ali_judge_attempt_failures_total 1"));
        assert!(text.contains("ali_judge_degraded_total 1"));
    }

    #[tokio::test]
    async fn test_request_carries_messages_and_options() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_chat()
            .withf(|request: &ChatRequest| {
                request.messages.len() == 2
                    && request.messages[0].content == "facts"
                    && request.messages[1].content == "task"
                    && request.options.seed == Some(3)
            })
            .times(1)
            .returning(|_| Ok("ok".to_string()));

        let gateway = JudgeGateway::new(transport);
        let options = JudgeOptions::default().with_seed(3);
        assert_eq!(gateway.retry_policy().max_attempts, 5);
        assert_eq!(gateway.ask("facts", "task", &options).await, "ok");
    }
}
