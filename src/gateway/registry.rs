//! Provider registry
//!
//! Maps a provider identifier to a factory for its gateway implementation.
//! Resolved once at startup; no inheritance hierarchy beyond the one trait.

use super::RepoMetricsGateway;
use std::collections::HashMap;
use std::sync::Arc;

/// Constructs a gateway for an `{owner}, {repo}` pair.
pub type GatewayFactory = Arc<dyn Fn(&str, &str) -> Arc<dyn RepoMetricsGateway> + Send + Sync>;

/// Registry of known providers and their gateway factories.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    factories: HashMap<String, GatewayFactory>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its identifier, replacing any previous
    /// factory for the same identifier.
    pub fn register(&mut self, provider: impl Into<String>, factory: GatewayFactory) {
        let provider = provider.into();
        log::debug!("Registering gateway provider '{}'", provider);
        self.factories.insert(provider, factory);
    }

    /// Identifiers of all registered providers, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = self.factories.keys().cloned().collect();
        providers.sort();
        providers
    }

    pub fn is_registered(&self, provider: &str) -> bool {
        self.factories.contains_key(provider)
    }

    /// Create a gateway for the given provider and repository, or `None`
    /// when the provider is not registered.
    pub fn create(
        &self,
        provider: &str,
        owner: &str,
        repo: &str,
    ) -> Option<Arc<dyn RepoMetricsGateway>> {
        self.factories
            .get(provider)
            .map(|factory| factory(owner, repo))
    }
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayResult, SampledSeries};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct StubGateway;

    #[async_trait]
    impl RepoMetricsGateway for StubGateway {
        async fn open_pull_requests_count(&self) -> GatewayResult<u64> {
            Ok(1)
        }

        async fn closed_pull_requests_count(&self) -> GatewayResult<u64> {
            Ok(2)
        }

        async fn users_count(&self) -> GatewayResult<u64> {
            Ok(3)
        }

        async fn oldest_pull_request_date(&self) -> GatewayResult<Option<NaiveDate>> {
            Ok(None)
        }

        async fn open_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries> {
            Ok(SampledSeries::new())
        }

        async fn closed_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries> {
            Ok(SampledSeries::new())
        }

        async fn users_timeseries(&self) -> GatewayResult<SampledSeries> {
            Ok(SampledSeries::new())
        }
    }

    fn stub_factory() -> GatewayFactory {
        Arc::new(|_owner, _repo| {
            let gateway: Arc<dyn RepoMetricsGateway> = Arc::new(StubGateway);
            gateway
        })
    }

    #[test]
    fn test_register_and_list_providers() {
        let mut registry = GatewayRegistry::new();
        assert!(registry.providers().is_empty());

        registry.register("github", stub_factory());
        registry.register("gitlab", stub_factory());

        assert_eq!(registry.providers(), vec!["github", "gitlab"]);
        assert!(registry.is_registered("github"));
        assert!(!registry.is_registered("bitbucket"));
    }

    #[test]
    fn test_create_for_unknown_provider_is_none() {
        let registry = GatewayRegistry::new();
        assert!(registry.create("github", "o", "r").is_none());
    }

    #[tokio::test]
    async fn test_created_gateway_is_usable() {
        let mut registry = GatewayRegistry::new();
        registry.register("github", stub_factory());

        let gateway = registry.create("github", "torvalds", "linux").unwrap();
        assert_eq!(gateway.open_pull_requests_count().await.unwrap(), 1);
    }
}
