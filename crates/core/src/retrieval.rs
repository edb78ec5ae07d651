use crate::embeddings::FallbackEmbedder;
use crate::error::RetrievalError;
use crate::models::RetrievedDoc;
use crate::traits::VectorIndex;

/// Embeds a query and shapes nearest-neighbor matches into ranked
/// snippets for the chat layer.
pub struct Retriever<V: VectorIndex> {
    embedder: FallbackEmbedder,
    index: V,
    namespace: String,
}

impl<V> Retriever<V>
where
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: FallbackEmbedder, index: V, namespace: impl Into<String>) -> Self {
        Self {
            embedder,
            index,
            namespace: namespace.into(),
        }
    }

    /// Returns up to `top_k` documents in the order the index ranked them;
    /// no local re-ranking. An index with no matches yields an empty vec,
    /// not an error.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDoc>, RetrievalError> {
        let vector = self.embedder.embed(query).await?;
        let matches = self.index.query(&self.namespace, &vector, top_k).await?;

        Ok(matches
            .into_iter()
            .map(|hit| {
                let metadata = hit.metadata.unwrap_or_default();
                RetrievedDoc {
                    score: hit.score,
                    text: metadata.chunk_text,
                    file: metadata.source_file,
                    url: metadata.url,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Retriever;
    use crate::embeddings::FallbackEmbedder;
    use crate::error::{EmbeddingError, IndexError};
    use crate::models::{MatchMetadata, ScoredMatch, VectorRecord};
    use crate::traits::{EmbeddingBackend, VectorIndex};
    use async_trait::async_trait;

    struct FixedBackend;

    #[async_trait]
    impl EmbeddingBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.1; 8])
        }
    }

    struct FixedIndex {
        matches: Vec<ScoredMatch>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn upsert(
            &self,
            _namespace: &str,
            _records: &[VectorRecord],
        ) -> Result<(), IndexError> {
            Ok(())
        }

        async fn query(
            &self,
            _namespace: &str,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<ScoredMatch>, IndexError> {
            Ok(self.matches.clone())
        }
    }

    fn embedder() -> FallbackEmbedder {
        FallbackEmbedder::new(Box::new(FixedBackend), None, 8)
    }

    #[tokio::test]
    async fn matches_are_shaped_into_ranked_docs() {
        let index = FixedIndex {
            matches: vec![
                ScoredMatch {
                    id: "vacation-policy.pdf#0-aa".to_string(),
                    score: 0.9,
                    metadata: Some(MatchMetadata {
                        source_file: "vacation-policy.pdf".to_string(),
                        chunk_text: "25 days per year".to_string(),
                        url: Some("https://docs.example.com/vacation-policy.pdf".to_string()),
                    }),
                },
                ScoredMatch {
                    id: "orphan".to_string(),
                    score: 0.4,
                    metadata: None,
                },
            ],
        };

        let retriever = Retriever::new(embedder(), index, "hr");
        let docs = retriever.retrieve("vacation days", 5).await.expect("retrieve");

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].file, "vacation-policy.pdf");
        assert_eq!(docs[0].text, "25 days per year");
        assert!(docs[0].url.is_some());
        // A match without metadata degrades to empty fields rather than
        // being dropped; ranking is the index's order.
        assert_eq!(docs[1].file, "");
        assert_eq!(docs[1].text, "");
        assert!(docs[1].url.is_none());
    }

    #[tokio::test]
    async fn empty_match_set_is_an_empty_result() {
        let retriever = Retriever::new(embedder(), FixedIndex { matches: Vec::new() }, "hr");
        let docs = retriever.retrieve("anything", 3).await.expect("retrieve");
        assert!(docs.is_empty());
    }
}
