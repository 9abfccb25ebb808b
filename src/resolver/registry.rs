//! Alias-keyed registry of provider resolvers.

use std::collections::HashMap;

use tracing::{debug, instrument};

use super::{DEFAULT_CACHE_TTL, Resolver};
use crate::error::ResolveError;
use crate::share::{ResolutionResult, ShareReference};

/// Holds every registered provider resolver and routes work to them.
///
/// URL identification walks resolvers in registration order and the first
/// match wins, so more specific URL shapes must be registered before broader
/// ones. Name lookup is case-insensitive over canonical names and aliases.
#[derive(Default)]
pub struct ProviderRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
    by_alias: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolver under its canonical name and all of its aliases.
    ///
    /// A later registration silently wins an alias collision; keeping the
    /// registration order authoritative mirrors how identification works.
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        let index = self.resolvers.len();
        self.by_alias
            .insert(resolver.name().to_ascii_lowercase(), index);
        for alias in resolver.aliases() {
            self.by_alias.insert(alias.to_ascii_lowercase(), index);
        }
        self.resolvers.push(resolver);
    }

    /// Returns true if `provider` (name or alias, any case) is registered.
    #[must_use]
    pub fn contains(&self, provider: &str) -> bool {
        self.by_alias.contains_key(&provider.to_ascii_lowercase())
    }

    fn lookup(&self, provider: &str) -> Option<&dyn Resolver> {
        self.by_alias
            .get(&provider.to_ascii_lowercase())
            .map(|index| self.resolvers[*index].as_ref())
    }

    /// Identifies which provider owns `url` and extracts its share id.
    ///
    /// Returns `None` when no registered resolver recognizes the URL. The
    /// returned reference carries no password; callers attach one separately
    /// when they have it.
    #[must_use]
    pub fn identify(&self, url: &str) -> Option<ShareReference> {
        self.resolvers.iter().find_map(|resolver| {
            resolver
                .validate(url)
                .map(|share_id| ShareReference::new(resolver.name(), share_id))
        })
    }

    /// Cache lifetime for a provider's results, in seconds.
    ///
    /// Unknown providers fall back to the default so cache writes never need
    /// a separate existence check.
    #[must_use]
    pub fn cache_ttl(&self, provider: &str) -> u64 {
        self.lookup(provider)
            .map_or(DEFAULT_CACHE_TTL, Resolver::cache_ttl)
    }

    /// Resolves a share reference through its provider's pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotSupportedProvider`] when the reference
    /// names an unregistered provider, otherwise whatever the provider
    /// pipeline produces.
    #[instrument(skip(self), fields(provider = %reference.provider, share_id = %reference.share_id))]
    pub async fn resolve(
        &self,
        reference: &ShareReference,
    ) -> Result<ResolutionResult, ResolveError> {
        let resolver = self
            .lookup(&reference.provider)
            .ok_or_else(|| ResolveError::not_supported(&reference.provider))?;
        debug!(resolver = resolver.name(), "dispatching to provider resolver");
        resolver.resolve(reference).await
    }

    /// Number of registered resolvers (aliases not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no resolver is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field(
                "resolvers",
                &self
                    .resolvers
                    .iter()
                    .map(|resolver| resolver.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
