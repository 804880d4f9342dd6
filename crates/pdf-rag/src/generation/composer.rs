//! Response composer: prompt in, raw model text out

use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::providers::{with_timeout, LlmProvider};
use crate::types::{AggregatedRecord, RetrievalResult};

use super::prompt::PromptBuilder;

/// Sends one grounded prompt per query to the language model
pub struct ResponseComposer {
    llm: Arc<dyn LlmProvider>,
    max_output_tokens: u32,
    timeout: Duration,
}

impl ResponseComposer {
    pub fn new(config: &LlmConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            max_output_tokens: config.max_output_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Compose an answer. The model output is returned as-is and failures
    /// are passed through without retry.
    pub async fn compose(
        &self,
        question: &str,
        result: &RetrievalResult,
        aggregated: Option<&AggregatedRecord>,
    ) -> Result<String> {
        let prompt = PromptBuilder::build_rag_prompt(question, result, aggregated);
        tracing::debug!(
            "Prompt for {} ({} chars, {} chunks)",
            self.llm.model(),
            prompt.len(),
            result.len()
        );

        with_timeout(
            self.llm.name(),
            self.timeout,
            self.llm.generate(&prompt, self.max_output_tokens),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingLlm {
        prompts: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
            self.prompts.lock().push((prompt.to_string(), max_output_tokens));
            Ok("  raw answer\n".to_string())
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String> {
            Err(Error::RateLimited("slow down".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    struct StalledLlm;

    #[async_trait]
    impl LlmProvider for StalledLlm {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn name(&self) -> &str {
            "stalled"
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_compose_returns_raw_output() {
        let llm = Arc::new(RecordingLlm::default());
        let config = LlmConfig {
            max_output_tokens: 64,
            ..Default::default()
        };
        let composer = ResponseComposer::new(&config, llm.clone());

        let answer = composer
            .compose("Who?", &RetrievalResult::default(), None)
            .await
            .unwrap();
        assert_eq!(answer, "  raw answer\n");

        let prompts = llm.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("QUESTION: Who?"));
        assert_eq!(prompts[0].1, 64);
    }

    #[tokio::test]
    async fn test_compose_surfaces_failure() {
        let composer = ResponseComposer::new(&LlmConfig::default(), Arc::new(FailingLlm));
        let err = composer
            .compose("Who?", &RetrievalResult::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited(_)));
        assert!(err.is_retriable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_compose_times_out() {
        let config = LlmConfig {
            timeout_secs: 5,
            ..Default::default()
        };
        let composer = ResponseComposer::new(&config, Arc::new(StalledLlm));
        let err = composer
            .compose("Who?", &RetrievalResult::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { secs: 5, .. }));
    }
}
