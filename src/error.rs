//! Error types for share-link resolution.
//!
//! Every pipeline failure maps to one of these variants so the routing layer
//! can translate them to transport-level responses without string matching.
//! Only [`ResolveError::Network`] is retryable; all other kinds describe a
//! condition that a retry cannot change.

use thiserror::Error;

/// Errors that can occur while resolving a share reference.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No resolver is registered for the requested provider key or alias.
    #[error("unsupported provider '{provider}'")]
    NotSupportedProvider {
        /// The provider key that failed alias lookup.
        provider: String,
    },

    /// The share reference itself is malformed (empty id, unparseable URL).
    #[error("invalid share reference: {reason}")]
    InvalidShareReference {
        /// Why the reference was rejected.
        reason: String,
    },

    /// The share is password-protected and no (or a wrong) password was supplied.
    #[error("password required for {provider} share '{share_id}'")]
    PasswordRequired {
        /// Provider key.
        provider: String,
        /// The share identifier.
        share_id: String,
    },

    /// The share page could not be scraped: anti-bot page, empty body, or a
    /// layout the extraction cascades no longer recognize.
    #[error("scrape failed for {provider} share '{share_id}': {reason}")]
    ScrapeFailed {
        /// Provider key.
        provider: String,
        /// The share identifier.
        share_id: String,
        /// What the scraper could not find or detected.
        reason: String,
    },

    /// No signing token could be recovered from the embedded script block.
    #[error("signature extraction failed for {provider} share '{share_id}'")]
    SignatureExtractionFailed {
        /// Provider key.
        provider: String,
        /// The share identifier.
        share_id: String,
    },

    /// The provider API answered with an explicit failure status.
    #[error("{provider} rejected the request: {message}")]
    UpstreamRejected {
        /// Provider key.
        provider: String,
        /// The provider's own failure message, preserved verbatim.
        message: String,
    },

    /// The redirect-producing step yielded no `Location` target.
    #[error("no download target available for {provider} share '{share_id}'")]
    DownloadUnavailable {
        /// Provider key.
        provider: String,
        /// The share identifier.
        share_id: String,
    },

    /// Network-level failure (timeout, connection reset, DNS). Retried by
    /// [`RetryPolicy`](crate::retry::RetryPolicy).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Signing keys were never bootstrapped, or bootstrap failed. Family-B
    /// resolvers cannot operate in this state; other families are unaffected.
    #[error("signing keys unavailable: {reason}")]
    SigningUnavailable {
        /// Why the codec could not produce a token.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a `NotSupportedProvider` error.
    #[must_use]
    pub fn not_supported(provider: &str) -> Self {
        Self::NotSupportedProvider {
            provider: provider.to_string(),
        }
    }

    /// Creates an `InvalidShareReference` error.
    #[must_use]
    pub fn invalid_reference(reason: &str) -> Self {
        Self::InvalidShareReference {
            reason: reason.to_string(),
        }
    }

    /// Creates a `PasswordRequired` error.
    #[must_use]
    pub fn password_required(provider: &str, share_id: &str) -> Self {
        Self::PasswordRequired {
            provider: provider.to_string(),
            share_id: share_id.to_string(),
        }
    }

    /// Creates a `ScrapeFailed` error.
    #[must_use]
    pub fn scrape_failed(provider: &str, share_id: &str, reason: impl Into<String>) -> Self {
        Self::ScrapeFailed {
            provider: provider.to_string(),
            share_id: share_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `SignatureExtractionFailed` error.
    #[must_use]
    pub fn signature_extraction(provider: &str, share_id: &str) -> Self {
        Self::SignatureExtractionFailed {
            provider: provider.to_string(),
            share_id: share_id.to_string(),
        }
    }

    /// Creates an `UpstreamRejected` error, preserving the provider message.
    #[must_use]
    pub fn upstream_rejected(provider: &str, message: impl Into<String>) -> Self {
        Self::UpstreamRejected {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Creates a `DownloadUnavailable` error.
    #[must_use]
    pub fn download_unavailable(provider: &str, share_id: &str) -> Self {
        Self::DownloadUnavailable {
            provider: provider.to_string(),
            share_id: share_id.to_string(),
        }
    }

    /// Creates a `Network` error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a `SigningUnavailable` error.
    #[must_use]
    pub fn signing_unavailable(reason: &str) -> Self {
        Self::SigningUnavailable {
            reason: reason.to_string(),
        }
    }

    /// Returns true if a retry could plausibly succeed.
    ///
    /// Only transport-level failures qualify; every other variant describes a
    /// deterministic condition (missing password, changed page layout,
    /// explicit upstream rejection) that retrying cannot fix.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_supported_message() {
        let err = ResolveError::not_supported("megapan");
        assert!(err.to_string().contains("megapan"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_password_required_message() {
        let err = ResolveError::password_required("lanzou", "ia2cntg");
        let msg = err.to_string();
        assert!(msg.contains("lanzou"));
        assert!(msg.contains("ia2cntg"));
        assert!(msg.contains("password"));
    }

    #[test]
    fn test_upstream_rejected_preserves_provider_message() {
        let err = ResolveError::upstream_rejected("lanzou", "文件取消分享了");
        assert!(err.to_string().contains("文件取消分享了"));
    }

    #[test]
    fn test_only_network_is_retryable() {
        let terminal = [
            ResolveError::not_supported("x"),
            ResolveError::invalid_reference("empty id"),
            ResolveError::password_required("lz", "a"),
            ResolveError::scrape_failed("lz", "a", "anti-bot page"),
            ResolveError::signature_extraction("lz", "a"),
            ResolveError::upstream_rejected("lz", "nope"),
            ResolveError::download_unavailable("lz", "a"),
            ResolveError::signing_unavailable("not bootstrapped"),
        ];
        for err in terminal {
            assert!(!err.is_retryable(), "{err} must be terminal");
        }
    }
}
