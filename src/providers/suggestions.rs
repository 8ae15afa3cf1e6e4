//! Suggested questions drawn from a fixed pool.

use rand::seq::SliceRandom;

use crate::config::SuggestionConfig;

use super::{ProviderError, ProviderFuture, ProviderResult, SuggestionProvider};

/// Samples distinct questions from a configured pool on every call.
#[derive(Clone, Debug)]
pub struct StaticSuggestionProvider {
    pool: Vec<String>,
    count: usize,
}

impl StaticSuggestionProvider {
    /// Create a provider returning `count` questions out of `pool`.
    #[must_use]
    pub const fn new(pool: Vec<String>, count: usize) -> Self {
        Self { pool, count }
    }

    /// Create a provider from configuration.
    #[must_use]
    pub fn from_config(config: &SuggestionConfig) -> Self {
        Self::new(config.pool.clone(), config.count)
    }

    fn sample(&self) -> ProviderResult<Vec<String>> {
        if self.pool.is_empty() {
            return Err(ProviderError::Unavailable(
                "suggestion pool is empty".to_string(),
            ));
        }
        let mut rng = rand::thread_rng();
        Ok(self
            .pool
            .choose_multiple(&mut rng, self.count)
            .cloned()
            .collect())
    }
}

impl SuggestionProvider for StaticSuggestionProvider {
    fn suggestions(&self) -> ProviderFuture<'_, ProviderResult<Vec<String>>> {
        Box::pin(async move { self.sample() })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[tokio::test]
    async fn test_returns_count_distinct_from_pool() {
        let config = SuggestionConfig::default();
        let provider = StaticSuggestionProvider::from_config(&config);

        let got = provider.suggestions().await.unwrap();

        assert_eq!(got.len(), config.count);
        let unique: HashSet<&String> = got.iter().collect();
        assert_eq!(unique.len(), got.len());
        assert!(got.iter().all(|q| config.pool.contains(q)));
    }

    #[tokio::test]
    async fn test_count_larger_than_pool_returns_whole_pool() {
        let provider = StaticSuggestionProvider::new(vec!["a".to_string()], 5);
        assert_eq!(provider.suggestions().await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_pool_is_unavailable() {
        let provider = StaticSuggestionProvider::new(Vec::new(), 3);
        assert!(matches!(
            provider.suggestions().await,
            Err(ProviderError::Unavailable(_))
        ));
    }
}
