//! Share references, resolution results, and the cache fingerprint.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// A reference to one shared file on one provider.
///
/// Identity is the `(provider, share_id, password)` triple. A `None` password
/// and an empty password fingerprint identically; the distinction only
/// matters inside encrypted-share handling, where absence short-circuits to
/// [`ResolveError::PasswordRequired`](crate::ResolveError::PasswordRequired).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReference {
    /// Canonical provider key (e.g. `"lanzou"`).
    pub provider: String,
    /// The opaque share identifier extracted from the share URL.
    pub share_id: String,
    /// Share password, when the caller supplied one.
    pub password: Option<String>,
}

impl ShareReference {
    /// Creates a reference without a password.
    #[must_use]
    pub fn new(provider: impl Into<String>, share_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            share_id: share_id.into(),
            password: None,
        }
    }

    /// Attaches a password to the reference.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// The password as presented to provider APIs (absent becomes empty).
    #[must_use]
    pub fn password_or_empty(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }

    /// Stable cache key for this reference.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.provider, &self.share_id, self.password_or_empty())
    }
}

/// Stable string key identifying one cache slot.
///
/// Pure function of its inputs: the same triple always yields the same key.
#[must_use]
pub fn fingerprint(provider: &str, share_id: &str, password: &str) -> String {
    format!("{provider}:{share_id}:{password}")
}

/// Normalized metadata plus the time-limited direct download URL.
///
/// Never constructed partially: any pipeline failure aborts before a result
/// exists, so a cached result is always fully populated and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    /// Canonical provider key.
    pub provider: String,
    /// The share identifier this result was resolved from.
    pub share_id: String,
    /// File name, possibly recovered from the final URL's query string.
    pub file_name: String,
    /// Canonical `"<number> <UNIT>"` size string.
    pub file_size: String,
    /// Human-readable file type.
    pub file_type: String,
    /// Upload time as reported by the provider (provider-specific format).
    pub upload_time: String,
    /// Uploader display name, when the provider exposes one.
    pub uploader: String,
    /// Absolute, time-limited direct download URL.
    pub download_url: String,
    /// Unix timestamp (seconds) of when this result was produced.
    pub resolved_at: u64,
}

/// Current unix timestamp in seconds.
#[must_use]
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current unix timestamp in milliseconds, as the decimal string the
/// signed-API providers expect.
#[must_use]
pub(crate) fn unix_now_millis_string() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_pure() {
        assert_eq!(
            fingerprint("lanzou", "ia2cntg", "1234"),
            fingerprint("lanzou", "ia2cntg", "1234")
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_password() {
        assert_ne!(
            fingerprint("lanzou", "ia2cntg", ""),
            fingerprint("lanzou", "ia2cntg", "secret")
        );
    }

    #[test]
    fn test_absent_password_fingerprints_as_empty() {
        let without = ShareReference::new("lanzou", "ia2cntg");
        let empty = ShareReference::new("lanzou", "ia2cntg").with_password("");
        assert_eq!(without.fingerprint(), empty.fingerprint());
    }

    #[test]
    fn test_reference_equality_is_by_triple() {
        let a = ShareReference::new("fj", "abc").with_password("p");
        let b = ShareReference::new("fj", "abc").with_password("p");
        let c = ShareReference::new("fj", "abc").with_password("q");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
