use crate::document_processor::DocumentProcessor;
use crate::embedding_service::EmbeddingIndex;
use crate::gemini_service::LanguageModel;
use crate::models::*;
use crate::reasoner::Reasoner;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Default)]
struct Corpus {
    documents: Vec<Document>,
    index: EmbeddingIndex,
}

/// Holds the ingested policy documents and answers claim queries against them.
pub struct ClaimEngine {
    corpus: RwLock<Corpus>,
    processor: DocumentProcessor,
    reasoner: Reasoner,
    client: Client,
    max_results: usize,
}

impl ClaimEngine {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            corpus: RwLock::new(Corpus::default()),
            processor: DocumentProcessor::new(),
            reasoner: Reasoner::new(llm),
            client: Client::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub async fn document_count(&self) -> usize {
        self.corpus.read().await.documents.len()
    }

    pub async fn load_directory(&self, dir: &Path) -> Result<usize> {
        let documents = self.processor.process_directory(dir).await?;
        let loaded = documents.len();
        self.add_documents(documents).await;
        Ok(loaded)
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<()> {
        let document = self.processor.process_file(path).await?;
        self.add_documents(vec![document]).await;
        Ok(())
    }

    pub async fn ingest_bytes(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let document = self.process(filename, bytes)?;
        self.add_document(document).await;
        Ok(())
    }

    /// Extracts and chunks a document without adding it to the corpus.
    pub fn process(&self, filename: &str, bytes: &[u8]) -> Result<Document> {
        self.processor.process_bytes(filename, bytes)
    }

    pub async fn add_document(&self, document: Document) {
        self.add_documents(vec![document]).await;
    }

    /// Documents are keyed by file name; a re-ingested name replaces the
    /// earlier copy.
    async fn add_documents(&self, documents: Vec<Document>) {
        if documents.is_empty() {
            return;
        }
        let mut corpus = self.corpus.write().await;
        for document in documents {
            match corpus.documents.iter_mut().find(|d| d.filename == document.filename) {
                Some(existing) => {
                    log::info!("Replacing previously ingested {}", document.filename);
                    *existing = document;
                }
                None => corpus.documents.push(document),
            }
        }
        corpus.index = EmbeddingIndex::build(&corpus.documents);
        log::info!(
            "Index rebuilt: {} documents, {} chunks",
            corpus.documents.len(),
            corpus.index.len()
        );
    }

    pub async fn retrieve(&self, query: &str) -> Vec<String> {
        let corpus = self.corpus.read().await;
        corpus
            .index
            .search(query, self.max_results)
            .into_iter()
            .map(|scored| scored.chunk.content)
            .collect()
    }

    /// Answers `query` from the ingested corpus.
    pub async fn decide(&self, query: &str) -> Result<DecisionResponse> {
        let clauses = self.retrieve(query).await;
        self.reasoner.decide(query, &clauses).await
    }

    /// Downloads the document at `url` into a standalone index that is not
    /// added to the corpus.
    pub async fn index_remote(&self, url: &str) -> Result<EmbeddingIndex> {
        let document = self.fetch_document(url).await?;
        Ok(EmbeddingIndex::build(std::slice::from_ref(&document)))
    }

    /// Answers `question` from a standalone index.
    pub async fn decide_with(&self, index: &EmbeddingIndex, question: &str) -> Result<DecisionResponse> {
        let clauses: Vec<String> = index
            .search(question, self.max_results)
            .into_iter()
            .map(|scored| scored.chunk.content)
            .collect();
        self.reasoner.decide(question, &clauses).await
    }

    /// Answers `question` without any document context.
    pub async fn answer_general(&self, question: &str) -> Result<DecisionResponse> {
        self.reasoner.decide(question, &[]).await
    }

    async fn fetch_document(&self, url: &str) -> Result<Document> {
        log::info!("Downloading document from {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("document download failed with status {}", response.status());
        }
        let filename = document_name(url);
        let bytes = response.bytes().await?;
        self.processor
            .process_bytes(&filename, &bytes)
            .with_context(|| format!("failed to process document from {url}"))
    }
}

/// File name of a document URL, ignoring query string. Defaults to PDF, the
/// format policy documents are published in.
fn document_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or_default();
    if crate::document_processor::is_supported(last) {
        last.to_string()
    } else {
        "document.pdf".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("prompt had {} lines", prompt.lines().count()))
        }
    }

    #[test]
    fn document_name_strips_query() {
        assert_eq!(
            document_name("https://host/assets/Policy%20A.pdf?sv=2023&sig=x"),
            "Policy%20A.pdf"
        );
        assert_eq!(document_name("https://host/download?id=1"), "document.pdf");
        assert_eq!(document_name("https://host/notes.txt"), "notes.txt");
    }

    #[tokio::test]
    async fn ingest_makes_clauses_retrievable() {
        let engine = ClaimEngine::new(Arc::new(EchoModel));
        assert!(engine.retrieve("ambulance").await.is_empty());

        engine
            .ingest_bytes("policy.txt", b"Ambulance charges up to 2000 are payable.")
            .await
            .unwrap();

        assert_eq!(engine.document_count().await, 1);
        let clauses = engine.retrieve("ambulance charges").await;
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].contains("Ambulance"));
    }

    #[tokio::test]
    async fn load_directory_skips_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Day care procedures are covered.").unwrap();
        std::fs::write(dir.path().join("b.xlsx"), "binary").unwrap();

        let engine = ClaimEngine::new(Arc::new(EchoModel));
        let loaded = engine.load_directory(dir.path()).await.unwrap();

        assert_eq!(loaded, 1);
        let decision = engine.decide("day care").await.unwrap();
        assert_eq!(decision.decision, "informational");
    }

    #[tokio::test]
    async fn ingest_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claim.eml");
        std::fs::write(&path, "Subject: claim\n\nPre-existing diseases are covered after 36 months.").unwrap();

        let engine = ClaimEngine::new(Arc::new(EchoModel)).with_max_results(1);
        engine.ingest_file(&path).await.unwrap();

        let clauses = engine.retrieve("pre-existing diseases").await;
        assert_eq!(clauses, vec!["Pre-existing diseases are covered after 36 months."]);
    }

    #[tokio::test]
    async fn reingesting_a_name_replaces_the_document() {
        let engine = ClaimEngine::new(Arc::new(EchoModel));
        engine
            .ingest_bytes("other.txt", b"Dental treatment is excluded unless caused by an accident.")
            .await
            .unwrap();
        for _ in 0..3 {
            engine
                .ingest_bytes("policy.txt", b"Ambulance charges up to 2000 are payable.")
                .await
                .unwrap();
        }

        assert_eq!(engine.document_count().await, 2);
        let clauses = engine.retrieve("ambulance charges").await;
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0], "Ambulance charges up to 2000 are payable.");
        assert!(clauses[1].starts_with("Dental treatment"));
    }

    #[tokio::test]
    async fn reingested_name_uses_new_content() {
        let engine = ClaimEngine::new(Arc::new(EchoModel));
        engine.ingest_bytes("policy.txt", b"Room rent is capped at 1 percent.").await.unwrap();
        engine.ingest_bytes("policy.txt", b"Room rent is capped at 2 percent.").await.unwrap();

        assert_eq!(engine.document_count().await, 1);
        assert_eq!(engine.retrieve("room rent").await, vec!["Room rent is capped at 2 percent."]);
    }
}
