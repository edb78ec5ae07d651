use crate::error::EmbeddingError;
use crate::normalize::normalize_dimension;
use crate::traits::EmbeddingBackend;
use tracing::warn;

/// Embeds text through a primary provider with an optional secondary
/// fallback, then maps the result onto the index dimension.
///
/// The fallback is a single attempt with no backoff: when no secondary is
/// configured the primary error propagates unchanged, and when both
/// providers fail the combined failure surfaces as
/// [`EmbeddingError::Unavailable`].
pub struct FallbackEmbedder {
    primary: Box<dyn EmbeddingBackend>,
    secondary: Option<Box<dyn EmbeddingBackend>>,
    target_dim: usize,
}

impl FallbackEmbedder {
    pub fn new(
        primary: Box<dyn EmbeddingBackend>,
        secondary: Option<Box<dyn EmbeddingBackend>>,
        target_dim: usize,
    ) -> Self {
        Self {
            primary,
            secondary,
            target_dim,
        }
    }

    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let raw = match self.primary.embed(text).await {
            Ok(vector) => vector,
            Err(primary_error) => match &self.secondary {
                Some(secondary) => {
                    warn!(
                        provider = self.primary.name(),
                        error = %primary_error,
                        "primary embedding failed, trying fallback provider"
                    );
                    secondary.embed(text).await.map_err(|fallback_error| {
                        EmbeddingError::Unavailable(format!(
                            "{}: {primary_error}; {}: {fallback_error}",
                            self.primary.name(),
                            secondary.name()
                        ))
                    })?
                }
                None => return Err(primary_error),
            },
        };

        Ok(normalize_dimension(&raw, self.target_dim))
    }
}
