//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt → text generation
///
/// Failures come back as `Error::RateLimited`, `Error::Timeout`,
/// `Error::InvalidRequest`, or `Error::Llm`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a prompt, producing at most `max_output_tokens` tokens
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
