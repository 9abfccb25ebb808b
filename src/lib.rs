//! Share-link resolution engine for consumer netdisk providers.
//!
//! Turns an opaque share reference (a share URL, or an explicit provider,
//! share id, and optional password) into a time-limited direct download URL
//! plus normalized file metadata. Providers expose no stable APIs, so each
//! pipeline mimics a browser: scraping share pages, deriving signing tokens,
//! and following redirect chains to the content-delivery URL.
//!
//! # Architecture
//!
//! - [`service`] - Cache-fronted [`DirectLinkService`] facade
//! - [`resolver`] - Per-provider pipelines behind the [`resolver::Resolver`] trait
//! - [`signing`] - AES key bootstrap and request-token signing
//! - [`http`] - Browser-profiled HTTP client shared by all pipelines
//! - [`retry`] - Linear-backoff retry of transient network failures
//! - [`cache`] - TTL cache keyed by share fingerprint

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod http;
pub mod resolver;
pub mod retry;
pub mod service;
pub mod share;
pub mod signing;

// Re-export commonly used types
pub use cache::ResultCache;
pub use error::ResolveError;
pub use http::{FetchClient, FetchResponse, HeaderProfile, Redirects};
pub use resolver::{ProviderRegistry, Resolver, build_default_registry};
pub use retry::RetryPolicy;
pub use service::{DirectLinkService, Resolved};
pub use share::{ResolutionResult, ShareReference};
pub use signing::{DerivedKey, SignatureCodec};
