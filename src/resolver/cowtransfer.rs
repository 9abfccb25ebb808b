//! Resolver for cowtransfer share links.
//!
//! Cowtransfer is the simplest pipeline: one JSON GET for share metadata and
//! one JSON POST that trades the share's guid and file id for a direct URL.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};
use tracing::instrument;

use super::Resolver;
use super::utils::{compile_static_regex, extract_cascade, file_type_from_name, format_byte_count};
use crate::error::ResolveError;
use crate::http::{FetchClient, HeaderProfile};
use crate::retry::RetryPolicy;
use crate::share::{ResolutionResult, ShareReference, unix_now};

const API_BASE_URL: &str = "https://cowtransfer.com/api/transfer/share";
const UNKNOWN_VALUE: &str = "未知";

static SHORT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"https?://(?:www\.)?cowtransfer\.com/s/([a-zA-Z0-9]+)")
});
static SHARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"https?://(?:www\.)?cowtransfer\.com/share/([a-zA-Z0-9]+)")
});

/// Field names shifted across API revisions; each getter checks both.
fn first_str(value: &Value, keys: [&str; 2]) -> String {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn first_u64(value: &Value, keys: [&str; 2]) -> Option<u64> {
    keys.iter().find_map(|key| value.get(*key).and_then(Value::as_u64))
}

pub struct CowTransferResolver {
    client: FetchClient,
    retry: RetryPolicy,
    api_base: String,
}

impl CowTransferResolver {
    #[must_use]
    pub fn new(client: FetchClient, retry: RetryPolicy) -> Self {
        Self::with_base_url(client, retry, API_BASE_URL)
    }

    /// Test constructor pointing the pipeline at a mock server.
    #[must_use]
    pub fn with_base_url(
        client: FetchClient,
        retry: RetryPolicy,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            retry,
            api_base: api_base.into(),
        }
    }
}

#[async_trait::async_trait]
impl Resolver for CowTransferResolver {
    fn name(&self) -> &'static str {
        "cowtransfer"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["cow"]
    }

    fn validate(&self, url: &str) -> Option<String> {
        extract_cascade(url, &[&SHORT_URL_RE, &SHARE_URL_RE])
    }

    #[instrument(skip(self, reference), fields(share_id = %reference.share_id))]
    async fn resolve(
        &self,
        reference: &ShareReference,
    ) -> Result<ResolutionResult, ResolveError> {
        let info_url = format!("{}/{}", self.api_base, reference.share_id);
        let response = self
            .retry
            .execute(|| {
                self.client
                    .get(&info_url, HeaderProfile::CowApi, None, crate::http::Redirects::Follow)
            })
            .await?;
        let info: Value = serde_json::from_str(&response.body).map_err(|_| {
            ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "share info api returned non-json body",
            )
        })?;

        let needs_password = info
            .get("needPassword")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if needs_password && reference.password_or_empty().is_empty() {
            return Err(ResolveError::password_required(
                &reference.provider,
                &reference.share_id,
            ));
        }

        let file_name = first_str(&info, ["fileName", "name"]);
        #[allow(clippy::cast_precision_loss)]
        let file_size = first_u64(&info, ["fileSize", "size"])
            .filter(|bytes| *bytes > 0)
            .map_or_else(|| UNKNOWN_VALUE.to_string(), |bytes| format_byte_count(bytes as f64));
        let file_id = first_str(&info, ["fileId", "id"]);
        let guid = info
            .get("guid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut request = json!({ "guid": guid, "fileId": file_id });
        if let Some(password) = reference.password.as_deref().filter(|p| !p.is_empty()) {
            request["password"] = Value::from(password);
        }
        let download_url = format!("{}/download", self.api_base);
        let response = self
            .retry
            .execute(|| {
                self.client
                    .post_json(&download_url, &request, HeaderProfile::CowApi, None)
            })
            .await?;
        let payload: Value = serde_json::from_str(&response.body).map_err(|_| {
            ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "download api returned non-json body",
            )
        })?;
        let Some(direct_url) = payload.get("downloadUrl").and_then(Value::as_str) else {
            return Err(ResolveError::download_unavailable(
                &reference.provider,
                &reference.share_id,
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
