use crate::models::TokenUsage;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    errors: u64,
    primary_generations: u64,
    fallback_generations: u64,
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Process-wide, increment-only counters. One mutex guards the whole set;
/// readers take a snapshot copy. Reset only by process restart.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: Mutex<Counters>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub primary_generations: u64,
    pub fallback_generations: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_counters(&self, update: impl FnOnce(&mut Counters)) {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut counters);
    }

    pub fn record_request(&self) {
        self.with_counters(|counters| counters.requests += 1);
    }

    pub fn record_error(&self) {
        self.with_counters(|counters| counters.errors += 1);
    }

    pub fn record_primary_generation(&self, usage: Option<TokenUsage>) {
        self.with_counters(|counters| {
            counters.primary_generations += 1;
            if let Some(usage) = usage {
                counters.prompt_tokens += usage.prompt_tokens;
                counters.completion_tokens += usage.completion_tokens;
            }
        });
    }

    pub fn record_fallback_generation(&self, usage: Option<TokenUsage>) {
        self.with_counters(|counters| {
            counters.fallback_generations += 1;
            if let Some(usage) = usage {
                counters.prompt_tokens += usage.prompt_tokens;
                counters.completion_tokens += usage.completion_tokens;
            }
        });
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        MetricsSnapshot {
            requests: counters.requests,
            errors: counters.errors,
            primary_generations: counters.primary_generations,
            fallback_generations: counters.fallback_generations,
            prompt_tokens: counters.prompt_tokens,
            completion_tokens: counters.completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Metrics;
    use crate::models::TokenUsage;

    #[test]
    fn counters_accumulate_into_the_snapshot() {
        let metrics = Metrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_error();
        metrics.record_primary_generation(Some(TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 20,
        }));
        metrics.record_fallback_generation(None);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.primary_generations, 1);
        assert_eq!(snapshot.fallback_generations, 1);
        assert_eq!(snapshot.prompt_tokens, 100);
        assert_eq!(snapshot.completion_tokens, 20);
    }
}
