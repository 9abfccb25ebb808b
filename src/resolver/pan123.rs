//! Resolver for 123pan share links.
//!
//! 123pan mixes the two styles: file metadata and the share token are
//! scraped off the share page, then a JSON POST exchanges them for the
//! direct URL.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};
use tracing::instrument;

use super::Resolver;
use super::utils::{
    compile_static_regex, extract_capture, extract_cascade, file_type_from_name,
    normalize_file_size, strip_html_tags,
};
use crate::error::ResolveError;
use crate::http::{FetchClient, HeaderProfile, Redirects};
use crate::retry::RetryPolicy;
use crate::share::{ResolutionResult, ShareReference, unix_now};

const SHARE_BASE_URL: &str = "https://www.123pan.com";
const API_URL: &str = "https://www.123pan.com/api/share/shareinfo";
const CACHE_TTL: u64 = 7200;
const UNKNOWN_VALUE: &str = "未知";

static SHORT_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"https?://(?:www\.)?123pan\.com/s/([a-zA-Z0-9]+)"));
static SHARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"https?://(?:www\.)?123pan\.com/share/([a-zA-Z0-9]+)")
});

static PASSWORD_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"class="[^"]*password-input[^"]*"|data-password"#)
});

static CLASS_FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<[^>]*class="[^"]*file-name[^"]*"[^>]*>([^<]+)<"#)
});
static CLASS_FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<[^>]*class="[^"]*filename[^"]*"[^>]*>([^<]+)<"#)
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"<title>([^<]+)</title>"));

static CLASS_FILE_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<[^>]*class="[^"]*file-size[^"]*"[^>]*>([^<]+)<"#)
});
static CLASS_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<[^>]*class="[^"]*\bsize[^"]*"[^>]*>([^<]+)<"#)
});

static INPUT_FILE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<input[^>]*name="file_id"[^>]*value="([^"]*)""#)
});
static DATA_FILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"data-file-id="([^"]*)""#));

static INPUT_SHARE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<input[^>]*name="share_token"[^>]*value="([^"]*)""#)
});
static DATA_SHARE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"data-share-token="([^"]*)""#));

pub struct Pan123Resolver {
    client: FetchClient,
    retry: RetryPolicy,
    share_base: String,
    api_url: String,
}

impl Pan123Resolver {
    #[must_use]
    pub fn new(client: FetchClient, retry: RetryPolicy) -> Self {
        Self::with_base_urls(client, retry, SHARE_BASE_URL, API_URL)
    }

    /// Test constructor pointing both the page and API endpoints at a mock
    /// server.
    #[must_use]
    pub fn with_base_urls(
        client: FetchClient,
        retry: RetryPolicy,
        share_base: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            retry,
            share_base: share_base.into(),
            api_url: api_url.into(),
        }
    }

    fn page_file_name(html: &str) -> String {
        if let Some(name) = extract_cascade(html, &[&CLASS_FILE_NAME_RE, &CLASS_FILENAME_RE]) {
            return strip_html_tags(&name);
        }
        extract_capture(html, &TITLE_RE)
            .map(|title| title.replace("123云盘", "").trim().to_string())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Resolver for Pan123Resolver {
    fn name(&self) -> &'static str {
        "pan123"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["123pan"]
    }

    fn cache_ttl(&self) -> u64 {
        CACHE_TTL
    }

    fn validate(&self, url: &str) -> Option<String> {
        extract_cascade(url, &[&SHORT_URL_RE, &SHARE_URL_RE])
    }

    #[instrument(skip(self, reference), fields(share_id = %reference.share_id))]
    async fn resolve(
        &self,
        reference: &ShareReference,
    ) -> Result<ResolutionResult, ResolveError> {
        let share_url = format!("{}/s/{}", self.share_base, reference.share_id);
        let response = self
            .retry
            .execute(|| {
                self.client.get(
                    &share_url,
                    HeaderProfile::Pan123Share,
                    None,
                    Redirects::Follow,
                )
            })
            .await?;
        let html = response.body;
        if html.trim().is_empty() {
            return Err(ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "share page came back empty",
            ));
        }

        let needs_password = PASSWORD_MARKER_RE.is_match(&html);
        if needs_password && reference.password_or_empty().is_empty() {
            return Err(ResolveError::password_required(
                &reference.provider,
                &reference.share_id,
            ));
        }

        let file_name = Self::page_file_name(&html);
        let file_size = extract_cascade(&html, &[&CLASS_FILE_SIZE_RE, &CLASS_SIZE_RE])
            .map_or_else(|| UNKNOWN_VALUE.to_string(), |size| normalize_file_size(&size));
        let Some(file_id) = extract_cascade(&html, &[&INPUT_FILE_ID_RE, &DATA_FILE_ID_RE]) else {
            return Err(ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "share page has no file id",
            ));
        };
        let Some(share_token) =
            extract_cascade(&html, &[&INPUT_SHARE_TOKEN_RE, &DATA_SHARE_TOKEN_RE])
        else {
            return Err(ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "share page has no share token",
            ));
        };

        let mut request = json!({
            "share_id": reference.share_id,
            "file_id": file_id,
            "share_token": share_token,
        });
        if let Some(password) = reference.password.as_deref().filter(|p| !p.is_empty()) {
            request["password"] = Value::from(password);
        }
        let response = self
            .retry
            .execute(|| {
                self.client
                    .post_json(&self.api_url, &request, HeaderProfile::Pan123Api, None)
            })
            .await?;
        let payload: Value = serde_json::from_str(&response.body).map_err(|_| {
            ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "download api returned non-json body",
            )
        })?;
        let code = payload.get("code").and_then(Value::as_i64);
        let direct_url = payload
            .pointer("/data/download_url")
            .and_then(Value::as_str);
        let (Some(0), Some(direct_url)) = (code, direct_url) else {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("download link request rejected");
            return Err(ResolveError::upstream_rejected(
                &reference.provider,
                message,
            ));
        };

        let file_type = file_type_from_name(&file_name);
        Ok(ResolutionResult {
            provider: self.name().to_string(),
            share_id: reference.share_id.clone(),
            file_name,
            file_size,
            file_type,
            upload_time: String::new(),
            uploader: String::new(),
            download_url: direct_url.to_string(),
            resolved_at: unix_now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolver() -> Pan123Resolver {
        Pan123Resolver::new(FetchClient::new().unwrap(), RetryPolicy::default())
    }

    #[test]
    fn test_validate_short_and_share_paths() {
        let resolver = resolver();
        assert_eq!(
            resolver.validate("https://www.123pan.com/s/abcd1234"),
            Some("abcd1234".to_string())
        );
        assert_eq!(
            resolver.validate("https://123pan.com/share/zz99"),
            Some("zz99".to_string())
        );
        assert!(resolver.validate("https://123pan.com/login").is_none());
    }

    #[test]
    fn test_page_file_name_cascade() {
        assert_eq!(
            Pan123Resolver::page_file_name(r#"<div class="file-name">movie.mkv</div>"#),
            "movie.mkv"
        );
        assert_eq!(
            Pan123Resolver::page_file_name(r#"<span class="filename">a.txt</span>"#),
            "a.txt"
        );
        assert_eq!(
            Pan123Resolver::page_file_name("<title>report.pdf - 123云盘</title>"),
            "report.pdf -"
        );
        assert_eq!(Pan123Resolver::page_file_name("<body></body>"), "");
    }

    #[test]
    fn test_password_marker_detection() {
        assert!(PASSWORD_MARKER_RE.is_match(r#"<input class="password-input">"#));
        assert!(PASSWORD_MARKER_RE.is_match(r#"<div data-password="1">"#));
        assert!(!PASSWORD_MARKER_RE.is_match("<div class=\"file-name\">a</div>"));
    }
}
