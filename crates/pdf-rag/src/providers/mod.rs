//! Provider abstractions for embeddings and LLM generation
//!
//! The core never calls an external service directly; it goes through these
//! traits so tests can substitute deterministic stubs.

pub mod embedding;
pub mod hashing;
pub mod llm;
pub mod ollama;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::{Error, Result};

pub use embedding::EmbeddingProvider;
pub use hashing::HashingEmbedder;
pub use llm::LlmProvider;
pub use ollama::OllamaClient;

/// Run an external call under a time budget, mapping expiry to `Error::Timeout`
pub async fn with_timeout<T, F>(service: &str, budget: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(service, budget.as_secs())),
    }
}

/// Build the embedding and LLM providers named by the config
pub fn from_config(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    let ollama = Arc::new(OllamaClient::new(&config.llm, &config.embeddings)?);

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
        EmbeddingBackend::Ollama => Arc::clone(&ollama) as Arc<dyn EmbeddingProvider>,
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)?),
    };
    tracing::info!(
        "Embedding provider: {} ({} dimensions)",
        embedder.name(),
        embedder.dimensions()
    );

    let llm: Arc<dyn LlmProvider> = ollama;
    Ok((embedder, llm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout("stub", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let err = with_timeout::<(), _>("stub", Duration::from_secs(1), async {
            Err(Error::InvalidRequest("nope".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let err = with_timeout("slow-model", Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { ref service, secs: 5 } if service == "slow-model"));
        assert!(err.is_retriable());
    }

    #[test]
    fn test_from_config_hashing_backend() {
        let mut config = RagConfig::default();
        config.embeddings.provider = EmbeddingBackend::Hashing;
        config.embeddings.dimensions = 128;
        let (embedder, llm) = from_config(&config).unwrap();
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimensions(), 128);
        assert_eq!(llm.model(), config.llm.generate_model);
    }
}
