//! Resolver for feijipan (feijix) share links.
//!
//! Feijipan exposes a JSON API guarded by AES-derived request tokens: every
//! call carries an encrypted timestamp, and the final redirect endpoint also
//! wants an encrypted file/owner pair plus a matching auth token. The first
//! call to the vip listing endpoint is a session warm-up the API requires
//! before it will answer share queries.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Resolver;
use super::utils::{
    compile_static_regex, extract_capture, file_name_from_query, file_type_from_name,
    normalize_file_size,
};
use crate::error::ResolveError;
use crate::http::{FetchClient, HeaderProfile, Redirects};
use crate::retry::RetryPolicy;
use crate::share::{ResolutionResult, ShareReference, unix_now, unix_now_millis_string};
use crate::signing::{DerivedKey, SignatureCodec};

const API_BASE_URL: &str = "https://api.feijipan.com/ws/";

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"https://(?:share\.feijipan\.com|www\.feijix\.com)/s/(.+)")
});

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    code: i64,
    #[serde(default)]
    list: Vec<ShareEntry>,
}

#[derive(Debug, Deserialize)]
struct ShareEntry {
    #[serde(rename = "fileIds", default)]
    file_ids: Value,
    #[serde(rename = "userId", default)]
    user_id: Value,
    #[serde(rename = "fileList", default)]
    file_list: Vec<FileEntry>,
    #[serde(default)]
    map: ShareMap,
}

#[derive(Debug, Default, Deserialize)]
struct ShareMap {
    #[serde(rename = "userName", default)]
    user_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileEntry {
    #[serde(rename = "fileName", default)]
    file_name: String,
    #[serde(rename = "fileSize", default)]
    file_size: Value,
    #[serde(rename = "updTime", default)]
    upd_time: String,
}

/// The API is inconsistent about whether ids are numbers or strings.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct FeijipanResolver {
    client: FetchClient,
    retry: RetryPolicy,
    codec: Arc<SignatureCodec>,
    api_base: String,
}

impl FeijipanResolver {
    #[must_use]
    pub fn new(client: FetchClient, retry: RetryPolicy, codec: Arc<SignatureCodec>) -> Self {
        Self::with_base_url(client, retry, codec, API_BASE_URL)
    }

    /// Test constructor pointing the pipeline at a mock server.
    #[must_use]
    pub fn with_base_url(
        client: FetchClient,
        retry: RetryPolicy,
        codec: Arc<SignatureCodec>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            retry,
            codec,
            api_base: api_base.into(),
        }
    }

    /// Device id the API tracks a session by: a dash-less v4 uuid cut to
    /// twenty characters, matching the web client's generator.
    fn device_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(20);
        id
    }

    async fn api_get(&self, url: &str, redirects: Redirects) -> Result<crate::http::FetchResponse, ResolveError> {
        self.retry
            .execute(|| {
                self.client
                    .get(url, HeaderProfile::FeijipanApi, None, redirects)
            })
            .await
    }
}

#[async_trait::async_trait]
impl Resolver for FeijipanResolver {
    fn name(&self) -> &'static str {
        "feijipan"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["fj", "feijix"]
    }

    fn validate(&self, url: &str) -> Option<String> {
        extract_capture(url, &URL_RE)
    }

    #[instrument(skip(self, reference), fields(share_id = %reference.share_id))]
    async fn resolve(
        &self,
        reference: &ShareReference,
    ) -> Result<ResolutionResult, ResolveError> {
        let uuid = Self::device_id();
        let timestamp = unix_now_millis_string();
        let timestamp_token = self.codec.sign(&timestamp, DerivedKey::Primary);

        // Session warm-up. The response body is irrelevant but the API
        // refuses share queries from sessions that skipped this call.
        let vip_url = format!(
            "{}buy/vip/list?devType=6&devModel=Chrome&uuid={uuid}&extra=2&timestamp={timestamp_token}",
            self.api_base
        );
        self.api_get(&vip_url, Redirects::Follow).await?;

        let list_url = format!(
            "{}recommend/list?devType=6&devModel=Chrome&uuid={uuid}&extra=2&timestamp={timestamp_token}&shareId={}&type=0&offset=1&limit=60",
            self.api_base, reference.share_id
        );
        let response = self.api_get(&list_url, Redirects::Follow).await?;
        let listing: RecommendResponse = serde_json::from_str(&response.body).map_err(|_| {
            ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "file info api returned non-json body",
            )
        })?;
        if listing.code != 200 {
            return Err(ResolveError::upstream_rejected(
                &reference.provider,
                format!("file info api returned code {}", listing.code),
            ));
        }
        let Some(entry) = listing.list.first() else {
            return Err(ResolveError::upstream_rejected(
                &reference.provider,
                "share file list is empty",
            ));
        };
        let file = entry.file_list.first();
        let mut file_name = file.map(|f| f.file_name.clone()).unwrap_or_default();
        let file_size = normalize_file_size(&scalar_string(
            &file.map(|f| f.file_size.clone()).unwrap_or(Value::Null),
        ));
        let upload_time = file.map(|f| f.upd_time.clone()).unwrap_or_default();

        let file_ids = scalar_string(&entry.file_ids);
        let user_id = scalar_string(&entry.user_id);
        debug!(%file_ids, %user_id, "share listing resolved, requesting redirect");

        let timestamp2 = unix_now_millis_string();
        let timestamp2_token = self.codec.sign(&timestamp2, DerivedKey::Primary);
        let download_id = self
            .codec
            .sign(&format!("{file_ids}|{user_id}"), DerivedKey::Primary);
        let auth = self
            .codec
            .sign(&format!("{file_ids}|{timestamp2}"), DerivedKey::Primary);

        let redirect_url = format!(
            "{}file/redirect?downloadId={download_id}&enable=1&devType=6&uuid={uuid}&timestamp={timestamp2_token}&auth={auth}&shareId={}",
            self.api_base, reference.share_id
        );
        let redirect = self.api_get(&redirect_url, Redirects::Manual).await?;
        let Some(location) = redirect.location() else {
            return Err(ResolveError::download_unavailable(
                &reference.provider,
                &reference.share_id,
            ));
        };

        if file_name.is_empty() {
            if let Some(name) = file_name_from_query(location, "download_name") {
                file_name = name;
            }
        }
        let file_type = file_type_from_name(&file_name);

        Ok(ResolutionResult {
            provider: self.name().to_string(),
            share_id: reference.share_id.clone(),
            file_name,
            file_size,
            file_type,
            upload_time,
            uploader: entry.map.user_name.clone(),
            download_url: location.to_string(),
            resolved_at: unix_now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolver() -> FeijipanResolver {
        FeijipanResolver::new(
            FetchClient::new().unwrap(),
            RetryPolicy::default(),
            Arc::new(SignatureCodec::bootstrap().unwrap()),
        )
    }

    #[test]
    fn test_validate_both_share_hosts() {
        let resolver = resolver();
        assert_eq!(
            resolver.validate("https://share.feijipan.com/s/AbC123"),
            Some("AbC123".to_string())
        );
        assert_eq!(
            resolver.validate("https://www.feijix.com/s/XyZ"),
            Some("XyZ".to_string())
        );
        assert!(resolver.validate("https://feijipan.com/s/AbC123").is_none());
        assert!(resolver.validate("https://www.feijix.com/d/AbC123").is_none());
    }

    #[test]
    fn test_device_id_shape() {
        let id = FeijipanResolver::device_id();
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, FeijipanResolver::device_id());
    }

    #[test]
    fn test_scalar_string_handles_numbers_strings_and_null() {
        assert_eq!(scalar_string(&Value::from(42)), "42");
        assert_eq!(scalar_string(&Value::from("abc")), "abc");
        assert_eq!(scalar_string(&Value::Null), "");
    }

    #[test]
    fn test_recommend_response_tolerates_missing_fields() {
        let listing: RecommendResponse =
            serde_json::from_str(r#"{"code":200,"list":[{"fileIds":77,"userId":"u1"}]}"#).unwrap();
        let entry = &listing.list[0];
        assert_eq!(scalar_string(&entry.file_ids), "77");
        assert_eq!(scalar_string(&entry.user_id), "u1");
        assert!(entry.file_list.is_empty());
        assert_eq!(entry.map.user_name, "");
    }
}
