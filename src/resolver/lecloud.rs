//! Resolver for lecloud (Lenovo cloud disk) share links.
//!
//! Lecloud is a plain JSON API behind a password gate. The share-info call
//! verifies the password and lists files; a packaging call then yields an
//! intermediate download URL. That URL may carry a base64-encoded pointer to
//! a second URL in its `params` query parameter, which must be chased one
//! redirect hop to reach the real file.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Resolver;
use super::utils::{compile_static_regex, extract_capture, file_type_from_name, normalize_file_size};
use crate::error::ResolveError;
use crate::http::{FetchClient, HeaderProfile, Redirects};
use crate::retry::RetryPolicy;
use crate::share::{ResolutionResult, ShareReference, unix_now};

const API_BASE_URL: &str =
    "https://lecloud.lenovo.com/share/api/clouddiskapi/share/public/v1/";

/// A packaging response can nest at most one extra pointer before the URL is
/// final; deeper chains do not occur upstream.
const MAX_INDIRECTION_HOPS: usize = 2;

/// Query parameter carrying the base64-encoded secondary URL.
const INDIRECTION_PARAM: &str = "params";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"https://lecloud\.lenovo\.com/share/([a-zA-Z0-9]+)"));

/// The API is inconsistent about scalar types across endpoints.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct LeCloudResolver {
    client: FetchClient,
    retry: RetryPolicy,
    api_base: String,
}

impl LeCloudResolver {
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

    /// POSTs to an API endpoint and unwraps the `{result, errcode, errmsg,
    /// data}` envelope every lecloud response uses.
    async fn api_post(
        &self,
        endpoint: &str,
        body: &Value,
        reference: &ShareReference,
    ) -> Result<Value, ResolveError> {
        let url = format!("{}{endpoint}", self.api_base);
        let response = self
            .retry
            .execute(|| {
                self.client
                    .post_json(&url, body, HeaderProfile::LeCloudApi, None)
            })
            .await?;
        let payload: Value = serde_json::from_str(&response.body).map_err(|_| {
            ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                format!("{endpoint} returned non-json body"),
            )
        })?;
        let Some(result) = payload.get("result").and_then(Value::as_bool) else {
            return Err(ResolveError::upstream_rejected(
                &reference.provider,
                format!("{endpoint} response missing result flag"),
            ));
        };
        if !result {
            let errcode = scalar_string(payload.get("errcode").unwrap_or(&Value::Null));
            let errmsg = payload
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ResolveError::upstream_rejected(
                &reference.provider,
                format!("{errcode}: {errmsg}"),
            ));
        }
        Ok(payload.get("data").cloned().unwrap_or(Value::Null))
    }

    /// Extracts the base64-encoded secondary URL, if the intermediate URL
    /// carries one.
    fn encoded_target(url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let encoded = parsed
            .query_pairs()
            .find(|(key, _)| key == INDIRECTION_PARAM)
            .map(|(_, value)| value.into_owned())?;
        let decoded = BASE64.decode(encoded.trim()).ok()?;
        String::from_utf8(decoded).ok()
    }

    /// Chases the packaging URL's indirection chain down to the final URL.
    async fn follow_indirection(
        &self,
        reference: &ShareReference,
        mut current: String,
    ) -> Result<String, ResolveError> {
        for _ in 0..MAX_INDIRECTION_HOPS {
            let Some(next) = Self::encoded_target(&current) else {
                return Ok(current);
            };
            debug!(url = %next, "following encoded download pointer");
            let response = self
                .retry
                .execute(|| {
                    self.client
                        .get(&next, HeaderProfile::Browser, None, Redirects::Manual)
                })
                .await?;
            let Some(location) = response.location() else {
                return Err(ResolveError::download_unavailable(
                    &reference.provider,
                    &reference.share_id,
                ));
            };
            current = location.to_string();
        }
        Ok(current)
    }
}

#[async_trait::async_trait]
impl Resolver for LeCloudResolver {
    fn name(&self) -> &'static str {
        "lecloud"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["le"]
    }

    fn validate(&self, url: &str) -> Option<String> {
        extract_capture(url, &URL_RE)
    }

    #[instrument(skip(self, reference), fields(share_id = %reference.share_id))]
    async fn resolve(
        &self,
        reference: &ShareReference,
    ) -> Result<ResolutionResult, ResolveError> {
        let info = self
            .api_post(
                "shareInfo",
                &json!({
                    "shareId": reference.share_id,
                    "password": reference.password_or_empty(),
                    "directoryId": -1,
                }),
                reference,
            )
            .await?;
        // A missing flag counts as unverified, only an explicit true passes.
        if info.get("passwordVerified").and_then(Value::as_bool) != Some(true) {
            return Err(ResolveError::password_required(
                &reference.provider,
                &reference.share_id,
            ));
        }
        let Some(file) = info
            .get("files")
            .and_then(Value::as_array)
            .and_then(|files| files.first())
        else {
            return Err(ResolveError::upstream_rejected(
                &reference.provider,
                "share info response has no files",
            ));
        };
        let file_id = scalar_string(file.get("fileId").unwrap_or(&Value::Null));
        let file_name = scalar_string(file.get("fileName").unwrap_or(&Value::Null));
        let file_size =
            normalize_file_size(&scalar_string(file.get("fileSize").unwrap_or(&Value::Null)));
        let file_type = match file.get("fileType").and_then(Value::as_str) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => file_type_from_name(&file_name),
        };

        let package = self
            .api_post(
                "packageDownloadWithFileIds",
                &json!({
                    "fileIds": [file_id],
                    "shareId": reference.share_id,
                    "browserId": Uuid::new_v4().to_string(),
                }),
                reference,
            )
            .await?;
        let Some(intermediate) = package.get("downloadUrl").and_then(Value::as_str) else {
            return Err(ResolveError::download_unavailable(
                &reference.provider,
                &reference.share_id,
            ));
        };

        let download_url = self
            .follow_indirection(reference, intermediate.to_string())
            .await?;

        Ok(ResolutionResult {
            provider: self.name().to_string(),
            share_id: reference.share_id.clone(),
            file_name,
            file_size,
            file_type,
            upload_time: String::new(),
            uploader: String::new(),
            download_url,
            resolved_at: unix_now(),
        })
    }
}
