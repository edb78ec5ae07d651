use crate::metrics::Metrics;
use crate::models::{ChatOptions, ChatTurn, RetrievedDoc, Role};
use crate::retrieval::Retriever;
use crate::traits::{ChatModel, VectorIndex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// The only failure text an end user ever sees; raw provider errors stay
/// in the logs.
pub const APOLOGY_REPLY: &str = "I'm sorry, I can't answer that. Please contact HR";

const CONTEXT_HEADER: &str = "### Retrieved policy excerpts:";

/// Assembles a grounded prompt per request, generates with the primary
/// chat model, falls back to the secondary on failure, and appends a
/// deduplicated source footer. Stateless across requests; the caller owns
/// conversation history.
pub struct ChatOrchestrator<V, P, S>
where
    V: VectorIndex,
    P: ChatModel,
    S: ChatModel,
{
    retriever: Retriever<V>,
    primary: P,
    secondary: Option<S>,
    system_prompt: String,
    options: ChatOptions,
    metrics: Arc<Metrics>,
}

impl<V, P, S> ChatOrchestrator<V, P, S>
where
    V: VectorIndex + Send + Sync,
    P: ChatModel + Send + Sync,
    S: ChatModel + Send + Sync,
{
    pub fn new(
        retriever: Retriever<V>,
        primary: P,
        secondary: Option<S>,
        system_prompt: impl Into<String>,
        options: ChatOptions,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            retriever,
            primary,
            secondary,
            system_prompt: system_prompt.into(),
            options,
            metrics,
        }
    }

    /// Produces the reply for one chat request. Provider failures never
    /// escape: generation falls back to the secondary model and then to
    /// the fixed apology, and the sources footer is appended either way
    /// from the originally retrieved documents.
    pub async fn answer(&self, message: &str, history: &[ChatTurn]) -> String {
        self.metrics.record_request();

        let message = truncate_chars(message, self.options.max_message_chars);

        let docs = match self.retriever.retrieve(&message, self.options.top_k).await {
            Ok(docs) => docs,
            Err(error) => {
                warn!(error = %error, "retrieval failed, answering without context");
                self.metrics.record_error();
                Vec::new()
            }
        };

        let turns = self.compose_turns(&message, history, &docs);
        let answer = self.generate(&turns).await;

        format!("{answer}\n\n{}", build_sources_markdown(&docs))
    }

    fn compose_turns(
        &self,
        message: &str,
        history: &[ChatTurn],
        docs: &[RetrievedDoc],
    ) -> Vec<ChatTurn> {
        let context = docs
            .iter()
            .map(|doc| format!("- {}", doc.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        let context = truncate_chars(&context, self.options.context_budget_chars);

        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(ChatTurn {
            role: Role::User,
            content: format!("{}\n\n{CONTEXT_HEADER}\n{context}", self.system_prompt),
        });
        turns.extend(history.iter().cloned());
        turns.push(ChatTurn {
            role: Role::User,
            content: message.to_string(),
        });
        turns
    }

    async fn generate(&self, turns: &[ChatTurn]) -> String {
        match self.primary.generate(turns).await {
            Ok(generation) => {
                self.metrics.record_primary_generation(generation.usage);
                return generation.text.trim().to_string();
            }
            Err(error) => {
                warn!(
                    provider = self.primary.name(),
                    error = %error,
                    "primary generation failed"
                );
            }
        }

        let Some(secondary) = &self.secondary else {
            self.metrics.record_error();
            return APOLOGY_REPLY.to_string();
        };

        match secondary.generate(turns).await {
            Ok(generation) => {
                self.metrics.record_fallback_generation(generation.usage);
                generation.text.trim().to_string()
            }
            Err(error) => {
                warn!(
                    provider = secondary.name(),
                    error = %error,
                    "fallback generation failed"
                );
                self.metrics.record_error();
                APOLOGY_REPLY.to_string()
            }
        }
    }
}

/// Renders the `Sources:` footer: one bullet per distinct source file in
/// first-occurrence order, linking to the citation URL when present and
/// to the bare file name otherwise. The `^1` marker is the same for every
/// bullet, matching the citation style the system instruction asks the
/// model to produce inline.
pub fn build_sources_markdown(docs: &[RetrievedDoc]) -> String {
    let mut lines = vec!["Sources:".to_string()];
    let mut seen = HashSet::new();

    for doc in docs {
        let file = if doc.file.is_empty() {
            "Document"
        } else {
            doc.file.as_str()
        };
        if !seen.insert(file.to_string()) {
            continue;
        }

        let target = doc.url.as_deref().unwrap_or(file);
        lines.push(format!("- ^1 [{file}]({target})"));
    }

    lines.join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
