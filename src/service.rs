//! Cache-fronted entry point tying the registry and result cache together.

use tracing::{debug, info, instrument};

use crate::cache::ResultCache;
use crate::error::ResolveError;
use crate::resolver::{ProviderRegistry, build_default_registry};
use crate::share::{ResolutionResult, ShareReference};

/// A resolution outcome annotated with where it came from.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub result: ResolutionResult,
    pub cache_hit: bool,
}

/// Facade the outer layers call: identifies share URLs and resolves
/// references, consulting the TTL cache before touching any provider.
pub struct DirectLinkService {
    registry: ProviderRegistry,
    cache: ResultCache,
}

impl DirectLinkService {
    /// Builds the service over the default provider registry.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client or the signing codec cannot be initialized.
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self::with_registry(build_default_registry()?))
    }

    /// Builds the service over a caller-assembled registry.
    #[must_use]
    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            cache: ResultCache::new(),
        }
    }

    /// Identifies which provider owns `url`, if any.
    #[must_use]
    pub fn identify(&self, url: &str) -> Option<ShareReference> {
        self.registry.identify(url)
    }

    /// Resolves a share URL end to end, attaching `password` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotSupportedProvider`] for unrecognized URLs,
    /// otherwise whatever the provider pipeline produces.
    pub async fn resolve_url(
        &self,
        url: &str,
        password: Option<&str>,
    ) -> Result<Resolved, ResolveError> {
        let mut reference = self
            .identify(url)
            .ok_or_else(|| ResolveError::not_supported(url))?;
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            reference = reference.with_password(password);
        }
        self.resolve(&reference).await
    }

    /// Resolves a share reference, serving from cache when a live entry for
    /// the same `(provider, share id, password)` fingerprint exists.
    ///
    /// Failures are never cached; a later identical request retries the
    /// provider.
    ///
    /// # Errors
    ///
    /// Propagates the provider pipeline's error on a cache miss.
    #[instrument(skip(self, reference), fields(provider = %reference.provider, share_id = %reference.share_id))]
    pub async fn resolve(&self, reference: &ShareReference) -> Result<Resolved, ResolveError> {
        let fingerprint = reference.fingerprint();
        if let Some(result) = self.cache.get(&fingerprint) {
            debug!("serving resolution from cache");
            return Ok(Resolved {
                result,
                cache_hit: true,
            });
        }

        let result = self.registry.resolve(reference).await?;
        let ttl = self.registry.cache_ttl(&reference.provider);
        self.cache.put(&fingerprint, result.clone(), ttl);
        info!(
            file_name = %result.file_name,
            ttl_seconds = ttl,
            "resolved share link"
        );
        Ok(Resolved {
            result,
            cache_hit: false,
        })
    }

    /// Drops every cached resolution.
    pub fn flush_cache(&self) {
        self.cache.flush();
    }

    /// Number of live cached resolutions.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::resolver::Resolver;
    use crate::share::unix_now;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingResolver {
        calls: Arc<AtomicUsize>,
        ttl: u64,
    }

    #[async_trait]
    impl Resolver for CountingResolver {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn cache_ttl(&self) -> u64 {
            self.ttl
        }

        fn validate(&self, url: &str) -> Option<String> {
            url.strip_prefix("https://counting.example.com/s/")
                .map(str::to_string)
        }

        async fn resolve(
            &self,
            reference: &ShareReference,
        ) -> Result<ResolutionResult, ResolveError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ResolutionResult {
                provider: "counting".to_string(),
                share_id: reference.share_id.clone(),
                file_name: "file.bin".to_string(),
                file_size: "1 KB".to_string(),
                file_type: "未知文件".to_string(),
                upload_time: String::new(),
                uploader: String::new(),
                download_url: format!("https://dl.example.com/{call}"),
                resolved_at: unix_now(),
            })
        }
    }

    fn service_with_counter(ttl: u64) -> (DirectLinkService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(CountingResolver {
            calls: calls.clone(),
            ttl,
        }));
        (DirectLinkService::with_registry(registry), calls)
    }

    #[tokio::test]
    async fn test_second_resolve_hits_cache() {
        let (service, calls) = service_with_counter(60);
        let reference = ShareReference::new("counting", "abc");

        let first = service.resolve(&reference).await.unwrap();
        assert!(!first.cache_hit);
        let second = service.resolve(&reference).await.unwrap();
        assert!(second.cache_hit);
        assert_eq!(first.result.download_url, second.result.download_url);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_password_variants_cache_separately() {
        let (service, calls) = service_with_counter(60);
        let plain = ShareReference::new("counting", "abc");
        let gated = ShareReference::new("counting", "abc").with_password("pw");

        service.resolve(&plain).await.unwrap();
        service.resolve(&gated).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cached_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let (service, calls) = service_with_counter(0);
        let reference = ShareReference::new("counting", "abc");

        service.resolve(&reference).await.unwrap();
        let second = service.resolve(&reference).await.unwrap();
        assert!(!second.cache_hit);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_url_identifies_and_attaches_password() {
        let (service, _) = service_with_counter(60);
        let resolved = service
            .resolve_url("https://counting.example.com/s/xyz", Some("pw"))
            .await
            .unwrap();
        assert_eq!(resolved.result.share_id, "xyz");
        assert_eq!(service.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_url_unknown_host_errors() {
        let (service, _) = service_with_counter(60);
        let error = service
            .resolve_url("https://other.example.com/s/xyz", None)
            .await
            .unwrap_err();
        assert!(matches!(error, ResolveError::NotSupportedProvider { .. }));
    }

    #[tokio::test]
    async fn test_flush_cache_forces_fresh_resolution() {
        let (service, calls) = service_with_counter(60);
        let reference = ShareReference::new("counting", "abc");
        service.resolve(&reference).await.unwrap();
        service.flush_cache();
        let resolved = service.resolve(&reference).await.unwrap();
        assert!(!resolved.cache_hit);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
