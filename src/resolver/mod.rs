//! Provider resolver pipeline for turning share links into direct downloads.
//!
//! Each supported netdisk provider implements [`Resolver`]: it recognizes that
//! provider's share URLs and drives the multi-step upstream conversation
//! (page scrape, signed API calls, or JSON exchanges) that ends in a
//! short-lived direct download URL.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait that individual provider resolvers implement
//! - [`ProviderRegistry`] - Alias-keyed collection with URL identification
//! - [`LanzouResolver`] - Page-scrape pipeline for lanzou share links
//! - [`FeijipanResolver`] - Signed-API pipeline for feijipan/feijix links
//! - [`LeCloudResolver`] - Password-gated JSON pipeline for lecloud links
//! - [`CowTransferResolver`] - Two-step JSON pipeline for cowtransfer links
//! - [`Pan123Resolver`] - Scrape-plus-API pipeline for 123pan links
//!
//! # Example
//!
//! ```no_run
//! use pandirect::resolver::build_default_registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_registry()?;
//! if let Some(reference) = registry.identify("https://www.lanzoup.com/iRujd2hkyterd") {
//!     let result = registry.resolve(&reference).await?;
//!     println!("direct url: {}", result.download_url);
//! }
//! # Ok(())
//! # }
//! ```

mod cowtransfer;
mod feijipan;
mod lanzou;
mod lecloud;
mod pan123;
mod registry;
pub mod utils;

pub use cowtransfer::CowTransferResolver;
pub use feijipan::FeijipanResolver;
pub use lanzou::LanzouResolver;
pub use lecloud::LeCloudResolver;
pub use pan123::Pan123Resolver;
pub use registry::ProviderRegistry;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolveError;
use crate::http::FetchClient;
use crate::retry::RetryPolicy;
use crate::share::{ResolutionResult, ShareReference};
use crate::signing::SignatureCodec;

/// Cache lifetime applied when a resolver does not override it, in seconds.
pub const DEFAULT_CACHE_TTL: u64 = 3600;

/// Builds the registry with every supported provider, in the fixed
/// identification order used by URL matching.
///
/// # Errors
///
/// Returns an error if the shared HTTP client cannot be constructed or the
/// bundled signing keys fail to unwrap.
pub fn build_default_registry() -> Result<ProviderRegistry, ResolveError> {
    let client = FetchClient::new()?;
    let codec = Arc::new(SignatureCodec::bootstrap()?);
    let retry = RetryPolicy::default();

    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(LanzouResolver::new(client.clone(), retry.clone())));
    registry.register(Box::new(FeijipanResolver::new(
        client.clone(),
        retry.clone(),
        codec,
    )));
    registry.register(Box::new(LeCloudResolver::new(client.clone(), retry.clone())));
    registry.register(Box::new(CowTransferResolver::new(
        client.clone(),
        retry.clone(),
    )));
    registry.register(Box::new(Pan123Resolver::new(client, retry)));
    Ok(registry)
}

/// Trait that all provider resolvers implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn Resolver>`. Rust 2024 native async traits are not object-safe,
/// so `async_trait` is required for the registry pattern.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Canonical provider name (e.g. "lanzou").
    fn name(&self) -> &'static str;

    /// Alternate names the provider is known by, matched case-insensitively.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// How long resolved results for this provider stay fresh, in seconds.
    fn cache_ttl(&self) -> u64 {
        DEFAULT_CACHE_TTL
    }

    /// Returns the share id if `url` is a share link for this provider.
    fn validate(&self, url: &str) -> Option<String>;

    /// Runs the provider's full pipeline and yields the direct download URL
    /// with the metadata gathered along the way.
    async fn resolve(&self, reference: &ShareReference)
    -> Result<ResolutionResult, ResolveError>;
}
