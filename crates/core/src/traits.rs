use crate::error::{EmbeddingError, GenerationError, IndexError};
use crate::models::{ChatTurn, Generation, ScoredMatch, VectorRecord};
use async_trait::async_trait;

/// A single remote embedding service. Fallback between services is the
/// concern of [`crate::FallbackEmbedder`], not of implementations.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Namespaced external vector store holding embedded document chunks.
#[async_trait]
pub trait VectorIndex {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<(), IndexError>;

    /// Nearest-neighbor query. Matches come back ranked by the store's
    /// similarity score with metadata attached; raw vectors are not
    /// requested back.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredMatch>, IndexError>;
}

/// A conversational model turning an ordered turn list into a reply.
#[async_trait]
pub trait ChatModel {
    fn name(&self) -> &'static str;

    async fn generate(&self, turns: &[ChatTurn]) -> Result<Generation, GenerationError>;
}
