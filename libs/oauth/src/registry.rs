//! Provider registry for looking up providers by name
//!
//! A [`ProviderRegistry`] owns its own lock; construct one per server (or per
//! test). [`default_registry`] is a process-wide convenience instance.

use crate::error::{OAuthError, OAuthResult};
use crate::provider::OAuthProvider;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Shared handle to a registered provider
pub type ProviderHandle = Arc<dyn OAuthProvider>;

/// Registry of validated OAuth providers keyed by name
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, ProviderHandle>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a new name
    ///
    /// Fails on an empty name, a provider that does not validate, or a name
    /// that is already taken. The existing entry is left untouched on failure.
    pub async fn register(&self, name: &str, provider: ProviderHandle) -> OAuthResult<()> {
        check_registrable(name, provider.as_ref())?;

        let mut providers = self.providers.write().await;
        if providers.contains_key(name) {
            return Err(OAuthError::ProviderAlreadyRegistered(name.to_string()));
        }
        providers.insert(name.to_string(), provider);

        info!(provider = name, "registered OAuth provider");
        Ok(())
    }

    /// Register a provider, replacing any existing entry with the same name
    pub async fn register_or_replace(&self, name: &str, provider: ProviderHandle) -> OAuthResult<()> {
        check_registrable(name, provider.as_ref())?;

        let replaced = self
            .providers
            .write()
            .await
            .insert(name.to_string(), provider)
            .is_some();

        if replaced {
            info!(provider = name, "replaced OAuth provider");
        } else {
            info!(provider = name, "registered OAuth provider");
        }
        Ok(())
    }

    /// Replace the whole registry with `providers`, keyed by their names
    ///
    /// Every provider is checked before the registry is touched: one invalid
    /// provider or a repeated name fails the call and leaves the current
    /// entries in place. Entries missing from `providers` are dropped.
    pub async fn replace_all(&self, providers: Vec<ProviderHandle>) -> OAuthResult<Vec<String>> {
        let mut next = HashMap::with_capacity(providers.len());
        for provider in providers {
            let name = provider.name();
            check_registrable(&name, provider.as_ref())?;
            if next.contains_key(&name) {
                return Err(OAuthError::ProviderAlreadyRegistered(name));
            }
            next.insert(name, provider);
        }

        let mut names: Vec<String> = next.keys().cloned().collect();
        names.sort();

        let previous = std::mem::replace(&mut *self.providers.write().await, next);
        let removed: Vec<&String> = previous
            .keys()
            .filter(|name| names.binary_search(name).is_err())
            .collect();
        info!(
            count = names.len(),
            removed = ?removed,
            "replaced provider registry"
        );
        Ok(names)
    }

    /// Get a provider by name
    pub async fn get(&self, name: &str) -> OAuthResult<ProviderHandle> {
        self.providers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| OAuthError::provider_not_found(name))
    }

    pub async fn unregister(&self, name: &str) -> OAuthResult<()> {
        match self.providers.write().await.remove(name) {
            Some(_) => {
                info!(provider = name, "unregistered OAuth provider");
                Ok(())
            }
            None => Err(OAuthError::provider_not_found(name)),
        }
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.providers.read().await.contains_key(name)
    }

    /// Registered names, sorted
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn count(&self) -> usize {
        self.providers.read().await.len()
    }

    /// Independent copy of the name → provider map
    pub async fn get_all(&self) -> HashMap<String, ProviderHandle> {
        self.providers.read().await.clone()
    }

    /// Providers whose type matches `provider_type`
    pub async fn get_by_type(&self, provider_type: &str) -> Vec<ProviderHandle> {
        self.providers
            .read()
            .await
            .values()
            .filter(|provider| provider.provider_type() == provider_type)
            .cloned()
            .collect()
    }

    /// Validate every provider, collecting failures by name
    pub async fn validate_all(&self) -> HashMap<String, OAuthError> {
        let providers = self.providers.read().await;
        let mut failures = HashMap::new();

        for (name, provider) in providers.iter() {
            if let Err(e) = provider.validate() {
                warn!(provider = %name, error = %e, "provider failed validation");
                failures.insert(name.clone(), e);
            }
        }
        failures
    }

    pub async fn clear(&self) {
        let mut providers = self.providers.write().await;
        let removed = providers.len();
        providers.clear();
        info!(removed, "cleared provider registry");
    }
}

fn check_registrable(name: &str, provider: &dyn OAuthProvider) -> OAuthResult<()> {
    if name.is_empty() {
        return Err(OAuthError::EmptyProviderName);
    }
    provider
        .validate()
        .map_err(|e| OAuthError::InvalidProvider {
            name: name.to_string(),
            source: Box::new(e),
        })
}

static DEFAULT_REGISTRY: LazyLock<ProviderRegistry> = LazyLock::new(ProviderRegistry::new);

/// Process-wide registry used by the free functions below
pub fn default_registry() -> &'static ProviderRegistry {
    &DEFAULT_REGISTRY
}

pub async fn register_provider(name: &str, provider: ProviderHandle) -> OAuthResult<()> {
    default_registry().register(name, provider).await
}

pub async fn register_or_replace_provider(name: &str, provider: ProviderHandle) -> OAuthResult<()> {
    default_registry().register_or_replace(name, provider).await
}

pub async fn get_provider(name: &str) -> OAuthResult<ProviderHandle> {
    default_registry().get(name).await
}

pub async fn list_providers() -> Vec<String> {
    default_registry().list().await
}

pub async fn unregister_provider(name: &str) -> OAuthResult<()> {
    default_registry().unregister(name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::BaseProvider;
    use crate::config::{Endpoints, ProviderConfig};
    use reqwest::Client;

    fn provider(name: &str, provider_type: &str, client_id: &str) -> ProviderHandle {
        let config = ProviderConfig::new(
            client_id,
            "secret",
            "https://rd.example.com/callback",
            vec!["openid".to_string()],
        )
        .with_identity(name, provider_type)
        .with_endpoints(Endpoints::new(
            "https://idp.example.com/auth",
            "https://idp.example.com/token",
        ));
        Arc::new(BaseProvider::with_http_client(config, Client::new()))
    }

    fn invalid_provider(name: &str) -> ProviderHandle {
        provider(name, "oauth2", "")
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ProviderRegistry::new();
        registry
            .register("github", provider("github", "github", "id"))
            .await
            .unwrap();

        assert!(registry.exists("github").await);
        assert_eq!(registry.get("github").await.unwrap().name(), "github");
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name() {
        let registry = ProviderRegistry::new();
        let result = registry.register("", provider("x", "oauth2", "id")).await;
        assert!(matches!(result, Err(OAuthError::EmptyProviderName)));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_provider() {
        let registry = ProviderRegistry::new();
        let result = registry.register("broken", invalid_provider("broken")).await;

        match result {
            Err(OAuthError::InvalidProvider { name, source }) => {
                assert_eq!(name, "broken");
                assert!(matches!(
                    *source,
                    OAuthError::MissingField { field: "client_id" }
                ));
            }
            other => panic!("expected InvalidProvider, got {:?}", other.err()),
        }
        assert!(!registry.exists("broken").await);
    }

    #[tokio::test]
    async fn test_duplicate_register_keeps_original() {
        let registry = ProviderRegistry::new();
        registry
            .register("sso", provider("sso", "oauth2", "first"))
            .await
            .unwrap();

        let result = registry
            .register("sso", provider("sso", "oauth2", "second"))
            .await;
        assert!(matches!(result, Err(OAuthError::ProviderAlreadyRegistered(ref n)) if n == "sso"));
        assert_eq!(registry.get("sso").await.unwrap().config().client_id, "first");
    }

    #[tokio::test]
    async fn test_register_or_replace() {
        let registry = ProviderRegistry::new();
        registry
            .register("sso", provider("sso", "oauth2", "first"))
            .await
            .unwrap();
        registry
            .register_or_replace("sso", provider("sso", "oauth2", "second"))
            .await
            .unwrap();

        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.get("sso").await.unwrap().config().client_id, "second");
    }

    #[tokio::test]
    async fn test_register_or_replace_still_validates() {
        let registry = ProviderRegistry::new();
        registry
            .register("sso", provider("sso", "oauth2", "first"))
            .await
            .unwrap();

        let result = registry.register_or_replace("sso", invalid_provider("sso")).await;
        assert!(matches!(result, Err(OAuthError::InvalidProvider { .. })));
        assert_eq!(registry.get("sso").await.unwrap().config().client_id, "first");
    }

    #[tokio::test]
    async fn test_replace_all_swaps_the_full_set() {
        let registry = ProviderRegistry::new();
        registry
            .register("old", provider("old", "oauth2", "id"))
            .await
            .unwrap();
        registry
            .register("kept", provider("kept", "oauth2", "first"))
            .await
            .unwrap();

        let names = registry
            .replace_all(vec![
                provider("new", "oauth2", "id"),
                provider("kept", "oauth2", "second"),
            ])
            .await
            .unwrap();

        assert_eq!(names, vec!["kept", "new"]);
        assert_eq!(registry.list().await, vec!["kept", "new"]);
        assert_eq!(registry.get("kept").await.unwrap().config().client_id, "second");
    }

    #[tokio::test]
    async fn test_replace_all_is_all_or_nothing() {
        let registry = ProviderRegistry::new();
        registry
            .register("current", provider("current", "oauth2", "id"))
            .await
            .unwrap();

        let result = registry
            .replace_all(vec![provider("good", "oauth2", "id"), invalid_provider("broken")])
            .await;
        assert!(matches!(result, Err(OAuthError::InvalidProvider { ref name, .. }) if name == "broken"));

        let result = registry
            .replace_all(vec![provider("twice", "oauth2", "a"), provider("twice", "oauth2", "b")])
            .await;
        assert!(matches!(result, Err(OAuthError::ProviderAlreadyRegistered(ref n)) if n == "twice"));

        assert_eq!(registry.list().await, vec!["current"]);
    }

    #[tokio::test]
    async fn test_get_unknown() {
        let registry = ProviderRegistry::new();
        let err = registry.get("missing").await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ProviderRegistry::new();
        registry
            .register("a", provider("a", "oauth2", "id"))
            .await
            .unwrap();

        registry.unregister("a").await.unwrap();
        assert!(!registry.exists("a").await);
        assert!(registry.unregister("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let registry = ProviderRegistry::new();
        for name in ["google", "github", "campus"] {
            registry
                .register(name, provider(name, "oauth2", "id"))
                .await
                .unwrap();
        }

        assert_eq!(registry.list().await, vec!["campus", "github", "google"]);
        assert_eq!(registry.count().await, 3);

        registry.unregister("github").await.unwrap();
        assert_eq!(registry.list().await, vec!["campus", "google"]);
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_get_all_is_a_copy() {
        let registry = ProviderRegistry::new();
        registry
            .register("a", provider("a", "oauth2", "id"))
            .await
            .unwrap();

        let mut all = registry.get_all().await;
        all.clear();
        all.insert("b".to_string(), provider("b", "oauth2", "id"));

        assert_eq!(registry.list().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_get_by_type() {
        let registry = ProviderRegistry::new();
        registry
            .register("corp", provider("corp", "oidc", "id"))
            .await
            .unwrap();
        registry
            .register("partner", provider("partner", "oidc", "id"))
            .await
            .unwrap();
        registry
            .register("github", provider("github", "github", "id"))
            .await
            .unwrap();

        let mut names: Vec<String> = registry
            .get_by_type("oidc")
            .await
            .iter()
            .map(|p| p.name())
            .collect();
        names.sort();
        assert_eq!(names, vec!["corp", "partner"]);
        assert!(registry.get_by_type("saml").await.is_empty());
    }

    #[tokio::test]
    async fn test_validate_all_collects_every_failure() {
        let config = ProviderConfig::new("id", "secret", "https://rd.example.com/cb", vec![]);
        let no_scopes: ProviderHandle = Arc::new(BaseProvider::with_http_client(config, Client::new()));

        let registry = ProviderRegistry::new();
        registry
            .register("good", provider("good", "oauth2", "id"))
            .await
            .unwrap();
        // bypass registration checks to simulate a provider that went bad later
        registry
            .providers
            .write()
            .await
            .insert("bad-id".to_string(), invalid_provider("bad-id"));
        registry
            .providers
            .write()
            .await
            .insert("bad-scopes".to_string(), no_scopes);

        let failures = registry.validate_all().await;
        assert_eq!(failures.len(), 2);
        assert!(matches!(
            failures["bad-id"],
            OAuthError::MissingField { field: "client_id" }
        ));
        assert!(matches!(failures["bad-scopes"], OAuthError::NoScopes));
    }

    #[tokio::test]
    async fn test_clear() {
        let registry = ProviderRegistry::new();
        registry
            .register("a", provider("a", "oauth2", "id"))
            .await
            .unwrap();
        registry.clear().await;
        assert_eq!(registry.count().await, 0);
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register() {
        let registry = Arc::new(ProviderRegistry::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let name = format!("provider-{}", i);
                    registry
                        .register(&name, provider(&name, "oauth2", "id"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(registry.count().await, 32);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_during_clear_see_full_or_empty() {
        const N: usize = 16;
        let registry = Arc::new(ProviderRegistry::new());
        for i in 0..N {
            let name = format!("p{}", i);
            registry
                .register(&name, provider(&name, "oauth2", "id"))
                .await
                .unwrap();
        }

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let seen = registry.get_all().await.len();
                        assert!(seen == N || seen == 0, "observed {} providers", seen);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        registry.clear().await;

        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_default_registry_free_functions() {
        let name = "default-registry-test";
        register_provider(name, provider(name, "oauth2", "id"))
            .await
            .unwrap();
        assert!(list_providers().await.contains(&name.to_string()));

        register_or_replace_provider(name, provider(name, "oauth2", "rotated"))
            .await
            .unwrap();
        assert_eq!(get_provider(name).await.unwrap().config().client_id, "rotated");

        unregister_provider(name).await.unwrap();
        assert!(get_provider(name).await.is_err());
    }
}
