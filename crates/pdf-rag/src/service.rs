//! The RAG service: owns the index and wires ingestion to query resolution

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::aggregation::Aggregator;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::ResponseComposer;
use crate::ingestion::{IngestPipeline, PdfTextExtractor, TextExtractor};
use crate::providers::{self, with_timeout, EmbeddingProvider, LlmProvider};
use crate::retrieval::{ChunkStore, Retriever};
use crate::types::{
    BatchReport, Document, DocumentSummary, IngestError, IngestReport, QueryMode, QueryRequest,
    QueryResponse, RetrievalResult, SourceRef,
};

/// Index and provider status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Documents indexed
    pub documents: usize,
    /// Chunks indexed
    pub chunks: usize,
    /// Index dimensionality, once established
    pub dimensions: Option<usize>,
    /// Embedding provider name
    pub embedding_provider: String,
    /// Generation model
    pub llm_model: String,
}

/// Ingestion and query resolution over one owned index
///
/// Ingestion takes the store's write lock only for the final insert; queries
/// take the read lock only for the search itself.
pub struct RagService {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    pipeline: IngestPipeline,
    store: Arc<RwLock<ChunkStore>>,
    retriever: Retriever,
    aggregator: Aggregator,
    composer: ResponseComposer,
    documents: DashMap<Uuid, DocumentSummary>,
}

impl RagService {
    /// Create a service with the providers named in the config
    pub fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        let (embedder, llm) = providers::from_config(&config)?;
        Self::with_providers(config, embedder, llm, Arc::new(PdfTextExtractor::new()))
    }

    /// Create a service with explicit collaborators
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        let pipeline = IngestPipeline::new(&config, extractor)?;
        let store = Arc::new(RwLock::new(ChunkStore::new(config.retrieval.metric)));
        let retriever = Retriever::new(&config, Arc::clone(&embedder), Arc::clone(&store));
        let aggregator = Aggregator::from_config(&config.aggregation)?;
        let composer = ResponseComposer::new(&config.llm, Arc::clone(&llm));

        tracing::info!(
            "RAG service ready (embeddings: {}, llm: {}, metric: {:?}, chunk size: {})",
            embedder.name(),
            llm.model(),
            config.retrieval.metric,
            config.chunking.chunk_size
        );

        Ok(Self {
            config,
            embedder,
            llm,
            pipeline,
            store,
            retriever,
            aggregator,
            composer,
            documents: DashMap::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Index and provider status
    pub fn stats(&self) -> ServiceStats {
        let store = self.store.read();
        ServiceStats {
            documents: self.documents.len(),
            chunks: store.len(),
            dimensions: store.index().dimensions(),
            embedding_provider: self.embedder.name().to_string(),
            llm_model: self.llm.model().to_string(),
        }
    }

    /// Summaries of every indexed document, oldest first
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        let mut docs: Vec<DocumentSummary> =
            self.documents.iter().map(|e| e.value().clone()).collect();
        docs.sort_by(|a, b| a.ingested_at.cmp(&b.ingested_at).then(a.id.cmp(&b.id)));
        docs
    }

    /// Summary of one document
    pub fn get_document(&self, id: &Uuid) -> Result<DocumentSummary> {
        self.documents
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }

    /// Drop a document and all of its chunks
    pub fn remove_document(&self, id: &Uuid) -> Result<usize> {
        let (_, summary) = self
            .documents
            .remove(id)
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;
        let removed = self.store.write().remove_document(id);
        tracing::info!("Removed {} ({} chunks)", summary.filename, removed);
        Ok(removed)
    }

    /// Index a document whose pages are already extracted
    ///
    /// The document is chunked and every chunk embedded before anything is
    /// inserted, so a failure leaves the index as it was. A document id that
    /// was ingested before has all of its old chunks replaced.
    pub async fn ingest_document(&self, doc: Document) -> Result<IngestReport> {
        let start = Instant::now();
        if doc.pages.iter().all(|page| page.trim().is_empty()) {
            return Err(Error::ingestion(&doc.filename, "document contains no text"));
        }
        let mut chunks = self.pipeline.chunk(&doc);

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embed_texts(&texts).await?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let chunk_count = chunks.len();
        let replaced = self.store.write().replace_document(doc.id, chunks)?;

        let summary = DocumentSummary::new(&doc, chunk_count);
        self.documents.insert(doc.id, summary.clone());

        tracing::info!(
            "Ingested {} ({} pages, {} chunks, {} replaced) in {}ms",
            doc.filename,
            doc.page_count(),
            chunk_count,
            replaced,
            start.elapsed().as_millis()
        );

        Ok(IngestReport {
            document: summary,
            replaced_chunks: replaced,
        })
    }

    /// Extract and index a file
    ///
    /// A filename that was ingested before keeps its document id, so the new
    /// content replaces the old chunks. Unchanged content (same hash) is not
    /// embedded again.
    pub async fn ingest_file(&self, filename: &str, data: Vec<u8>) -> Result<IngestReport> {
        let mut doc = self.pipeline.load(filename, data).await?;
        if let Some(existing) = self.find_by_filename(filename) {
            if existing.content_hash == doc.content_hash {
                tracing::info!("{} is unchanged, keeping {} chunks", filename, existing.chunks);
                return Ok(IngestReport {
                    document: existing,
                    replaced_chunks: 0,
                });
            }
            doc.id = existing.id;
        }
        self.ingest_document(doc).await
    }

    /// Index several documents, skipping the ones that fail
    pub async fn ingest_batch(&self, docs: Vec<Document>) -> BatchReport {
        let mut report = BatchReport::default();
        for doc in docs {
            let name = doc.filename.clone();
            let outcome = self.ingest_document(doc).await;
            record_outcome(&mut report, name, outcome);
        }
        finish_batch(&report);
        report
    }

    /// Extract and index several files, skipping the ones that fail
    pub async fn ingest_files(&self, files: Vec<(String, Vec<u8>)>) -> BatchReport {
        let mut report = BatchReport::default();
        for (filename, data) in files {
            let outcome = self.ingest_file(&filename, data).await;
            record_outcome(&mut report, filename, outcome);
        }
        finish_batch(&report);
        report
    }

    /// Top-k chunks for a query text
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<RetrievalResult> {
        self.retriever.retrieve(query, top_k).await
    }

    /// Resolve a query: embed, search, aggregate when comparing, compose
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let start = Instant::now();
        let question = request.question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".into()));
        }

        let mode = self.aggregator.classify(&request);
        tracing::info!("Query ({:?}): {}", mode, question);

        let result = self.retriever.retrieve(question, request.top_k).await?;

        let aggregated = match mode {
            QueryMode::Comparison => {
                Some(self.aggregator.aggregate(&result, request.field.as_deref()))
            }
            _ => None,
        };

        let answer = self
            .composer
            .compose(question, &result, aggregated.as_ref())
            .await?;

        let response = QueryResponse {
            answer,
            mode,
            sources: result.iter().map(SourceRef::from_hit).collect(),
            aggregated,
            chunks_retrieved: result.len(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Answered in {}ms from {} chunks",
            response.processing_time_ms,
            response.chunks_retrieved
        );
        Ok(response)
    }

    /// Answer text only
    pub async fn ask(&self, question: &str, top_k: Option<usize>, mode: QueryMode) -> Result<String> {
        let mut request = QueryRequest::new(question).with_mode(mode);
        request.top_k = top_k;
        Ok(self.query(request).await?.answer)
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let budget = Duration::from_secs(self.config.embeddings.timeout_secs);
        let batch_size = self.config.embeddings.batch_size.max(1);

        let mut embeddings = Vec::with_capacity(texts.len());
        for group in texts.chunks(batch_size) {
            let vectors =
                with_timeout(self.embedder.name(), budget, self.embedder.embed_batch(group))
                    .await?;
            if vectors.len() != group.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} vectors for {} texts",
                    self.embedder.name(),
                    vectors.len(),
                    group.len()
                )));
            }
            embeddings.extend(vectors);
        }
        tracing::debug!("Embedded {} chunks", embeddings.len());
        Ok(embeddings)
    }

    fn find_by_filename(&self, filename: &str) -> Option<DocumentSummary> {
        self.documents
            .iter()
            .find(|e| e.value().filename == filename)
            .map(|e| e.value().clone())
    }
}

fn record_outcome(report: &mut BatchReport, name: String, outcome: Result<IngestReport>) {
    match outcome {
        Ok(ingested) => {
            report.total_chunks += ingested.document.chunks;
            report.ingested.push(ingested.document);
        }
        Err(e) => {
            tracing::warn!("Skipping {}: {}", name, e);
            report.errors.push(IngestError {
                document: name,
                error: e.to_string(),
            });
        }
    }
}

fn finish_batch(report: &BatchReport) {
    tracing::info!(
        "Batch complete: {} ingested, {} skipped, {} chunks",
        report.ingested.len(),
        report.errors.len(),
        report.total_chunks
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use crate::providers::HashingEmbedder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, prompt: &str, _max_output_tokens: u32) -> Result<String> {
            Ok(prompt.to_string())
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    /// Embeds everything fine except texts containing "poison"
    struct PickyEmbedder(HashingEmbedder);

    #[async_trait]
    impl EmbeddingProvider for PickyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("poison") {
                return Err(Error::embedding("refused"));
            }
            Ok(self.0.embed_sync(text))
        }

        fn dimensions(&self) -> usize {
            self.0.dimensions()
        }

        fn name(&self) -> &str {
            "picky"
        }
    }

    fn config() -> RagConfig {
        let mut config = RagConfig::default();
        config.embeddings.provider = EmbeddingBackend::Hashing;
        config.embeddings.dimensions = 256;
        config.chunking.chunk_size = 80;
        config
    }

    fn service() -> RagService {
        let config = config();
        RagService::with_providers(
            config,
            Arc::new(PickyEmbedder(HashingEmbedder::new(256).unwrap())),
            Arc::new(EchoLlm),
            Arc::new(PdfTextExtractor::new()),
        )
        .unwrap()
    }

    fn survey() -> Document {
        Document::new(
            "survey.pdf",
            vec![
                "Educational attainment survey, national sample.".into(),
                "Median weekly earnings grew for every group.".into(),
                "Unemployment rate by degree\nBachelor's: 4.5%\nMaster's: 2.8%\nPhD: 1.2%".into(),
            ],
        )
    }

    #[tokio::test]
    async fn test_ingest_and_query() {
        let service = service();
        let report = service.ingest_document(survey()).await.unwrap();
        assert_eq!(report.replaced_chunks, 0);
        assert_eq!(report.document.pages, 3);
        assert_eq!(service.stats().chunks, report.document.chunks);

        let response = service
            .query(QueryRequest::new("What is the unemployment rate for PhD holders?"))
            .await
            .unwrap();
        assert_eq!(response.mode, QueryMode::Freeform);
        assert!(response.aggregated.is_none());
        assert!(response.answer.contains("PhD: 1.2%"));
        assert!(response.sources.iter().any(|s| s.snippet.contains("PhD: 1.2%")));
    }

    #[tokio::test]
    async fn test_comparison_query_aggregates() {
        let service = service();
        service.ingest_document(survey()).await.unwrap();

        let response = service
            .query(QueryRequest::new("Compare unemployment across degrees").with_top_k(10))
            .await
            .unwrap();
        assert_eq!(response.mode, QueryMode::Comparison);
        let record = response.aggregated.unwrap();
        assert_eq!(record.get("Bachelor's"), Some(4.5));
        assert_eq!(record.get("Master's"), Some(2.8));
        assert_eq!(record.get("PhD"), Some(1.2));
        assert!(response.answer.contains("EXTRACTED FIGURES"));
    }

    #[tokio::test]
    async fn test_reingestion_replaces_chunks() {
        let service = service();
        let doc = survey();
        let id = doc.id;
        let first = service.ingest_document(doc).await.unwrap();

        let second = service
            .ingest_document(Document::with_id(id, "survey.pdf", vec!["Revised: one page".into()]))
            .await
            .unwrap();
        assert_eq!(second.replaced_chunks, first.document.chunks);
        assert_eq!(service.stats().chunks, 1);
        assert_eq!(service.list_documents().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_file_reuses_id_for_same_filename() {
        let service = service();
        let a = service.ingest_file("notes.txt", b"first draft".to_vec()).await.unwrap();
        let b = service.ingest_file("notes.txt", b"second draft".to_vec()).await.unwrap();
        assert_eq!(a.document.id, b.document.id);
        assert_eq!(b.replaced_chunks, 1);
        assert_eq!(service.stats().documents, 1);
    }

    /// Counts how many texts it was asked to embed
    struct CountingEmbedder(HashingEmbedder, AtomicUsize);

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.embed_sync(text))
        }

        fn dimensions(&self) -> usize {
            self.0.dimensions()
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_unchanged_file_is_not_reembedded() {
        let embedder = Arc::new(CountingEmbedder(
            HashingEmbedder::new(256).unwrap(),
            AtomicUsize::new(0),
        ));
        let service = RagService::with_providers(
            config(),
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            Arc::new(EchoLlm),
            Arc::new(PdfTextExtractor::new()),
        )
        .unwrap();

        let first = service.ingest_file("notes.txt", b"first draft".to_vec()).await.unwrap();
        let calls = embedder.1.load(Ordering::SeqCst);
        assert!(calls > 0);

        let again = service.ingest_file("notes.txt", b"first draft".to_vec()).await.unwrap();
        assert_eq!(embedder.1.load(Ordering::SeqCst), calls);
        assert_eq!(again.replaced_chunks, 0);
        assert_eq!(again.document.id, first.document.id);
        assert_eq!(again.document.ingested_at, first.document.ingested_at);
        assert_eq!(service.stats().chunks, first.document.chunks);

        let changed = service.ingest_file("notes.txt", b"second draft".to_vec()).await.unwrap();
        assert!(embedder.1.load(Ordering::SeqCst) > calls);
        assert_eq!(changed.replaced_chunks, first.document.chunks);
    }

    #[tokio::test]
    async fn test_batch_skips_failures() {
        let service = service();
        let report = service
            .ingest_batch(vec![
                survey(),
                Document::new("bad.pdf", vec!["this page is poison".into()]),
                Document::new("empty.pdf", vec!["   ".into()]),
                Document::new("ok.pdf", vec!["A fine page.".into()]),
            ])
            .await;

        assert_eq!(report.ingested.len(), 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].document, "bad.pdf");
        assert_eq!(report.errors[1].document, "empty.pdf");
        // Nothing from the failed documents reached the index
        assert_eq!(service.stats().chunks, report.total_chunks);
    }

    #[tokio::test]
    async fn test_query_before_ingestion() {
        let service = service();
        let err = service.query(QueryRequest::new("anything")).await.unwrap_err();
        assert!(matches!(err, Error::EmptyIndex));

        let err = service.query(QueryRequest::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_document() {
        let service = service();
        let report = service.ingest_document(survey()).await.unwrap();
        let id = report.document.id;

        assert_eq!(service.remove_document(&id).unwrap(), report.document.chunks);
        assert!(matches!(service.get_document(&id), Err(Error::DocumentNotFound(_))));
        assert!(matches!(service.remove_document(&id), Err(Error::DocumentNotFound(_))));
        assert_eq!(service.stats().chunks, 0);
    }
}
