//! Resolver for lanzou share links.
//!
//! Lanzou serves no stable API. The pipeline scrapes the share page, locates
//! the inline script that carries the download signature (directly on the
//! page for password-gated shares, inside a secondary frame otherwise),
//! replays the page's own form POST against `ajaxm.php`, and finally follows
//! the intermediate download host one redirect hop to the real file URL.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::Resolver;
use super::utils::{
    compile_static_regex, extract_capture, extract_cascade, file_name_from_query,
    file_type_from_name, normalize_file_size, strip_html_tags,
};
use crate::error::ResolveError;
use crate::http::{FetchClient, HeaderProfile, Redirects};
use crate::retry::RetryPolicy;
use crate::share::{ResolutionResult, ShareReference, unix_now};

const SHARE_BASE_URL: &str = "https://wwsd.lanzouw.com";
const CACHE_TTL: u64 = 1800;
const FALLBACK_FILE_NAME: &str = "蓝奏云文件";
const UNKNOWN_VALUE: &str = "未知";

/// Page fragments the provider serves instead of a share page when it is
/// rate-limiting or the share is gone.
const ANTI_BOT_MARKERS: [&str; 3] = ["文件取消分享", "访问异常", "来晚啦"];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?i)https://(?:[a-zA-Z\d-]+\.)?(?:lanzou[a-z]|lanzn)\.com/(?:.+/)?([^/?#]+)",
    )
});

static FID_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"var\s+fid\s*=\s*(\d+)"));

static IFRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"src="(/fn\?[a-zA-Z\d_+/=]{16,})""#));

static TITLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"<title>([^<]+?)\s*-\s*蓝奏云</title>"));
static DIV_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<div[^>]*style="[^"]*font-size:\s*30px[^"]*"[^>]*>([^<]+)</div>"#)
});

// The description lists the size between CJK commas; the capture must stop
// at the comma or it swallows it.
static META_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<meta[^>]*name="description"[^>]*content="[^"]*文件大小：([^"，]+)"#)
});
static DIV_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<div[^>]*class="n_filesize"[^>]*>大小：([^<]+)</div>"#)
});
static SPAN_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"<span[^>]*>文件大小：</span>([^<>\s]+(?:\s*[A-Za-z]+)?)")
});

static INFOS_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<span[^>]*class="n_file_infos"[^>]*>(\d{4}-\d{2}-\d{2})</span>"#)
});
static SPAN_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"<span[^>]*>上传时间：</span>([^<>\n\r]+)"));

static UPLOADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"<span[^>]*>分享用户：</span><font>([^<]+)</font>")
});

static INFOS_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"<span[^>]*class="n_file_infos"[^>]*>([^<]+(?:文件|系统|软件|应用))</span>"#,
    )
});
static SPAN_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"<span[^>]*>运行系统：</span>([^<>\n\r]+)"));

static SCRIPT_TYPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<script type="text/javascript">(.*?)</script>"#)
});
static SCRIPT_PLAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<script>(.*?)</script>"));
static SCRIPT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<script type="text/javascript"[^>]*>(.*?)</script>"#)
});
static SCRIPT_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?is)<script[^>]*>(.*?(?:sign|url|down_p|wp_sign).*?)</script>")
});
static HTML_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<!--.*?-->"));

static SIGN_CC_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"sign\s*:\s*['"]([a-zA-Z0-9_+/=]+_c_c)['"]"#)
});
static SIGN_CC_DATA_SQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"data\s*:\s*\{[^}]*'sign'\s*:\s*['"]([a-zA-Z0-9_+/=]+_c_c)['"]"#)
});
static SIGN_CC_DATA_DQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"data\s*:\s*\{[^}]*"sign"\s*:\s*['"]([a-zA-Z0-9_+/=]+_c_c)['"]"#)
});
static SIGN_PLAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"sign\s*:\s*['"]([^'"]+)['"]"#));
static SIGN_DATA_SQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"data\s*:\s*\{[^}]*'sign'\s*:\s*['"]([^'"]+)['"]"#)
});
static SIGN_DATA_DQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"data\s*:\s*\{[^}]*"sign"\s*:\s*['"]([^'"]+)['"]"#)
});
static WP_SIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"wp_sign\s*=\s*['"]([^'"]+)['"]"#));
static SIGN_LOOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"sign['"]?\s*:\s*['"]([^'"]+)['"]"#));

static AJAXDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"ajaxdata\s*=\s*['"]([^'"]+)['"]"#));
static WEBSIGNKEY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"websignkey\s*=\s*['"]([^'"]+)['"]"#));

static API_URL_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"url\s*:\s*['"]([^'"]+)['"]"#));
static API_URL_ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"url\s*=\s*['"]([^'"]+)['"]"#));

static SCRIPT_FID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"ajaxm\.php\?file=(\d+)"));
static SCRIPT_FID_LOOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"file=(\d+)"));

static KDNS_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"kdns\s*=\s*(\d+)"));
static KD_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"kd\s*:\s*(\d+)"));

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"['"]([a-zA-Z0-9_+/=]{20,})['"]"#));

/// Metadata scraped off the share page; every field may legitimately be
/// missing on older page layouts.
#[derive(Debug, Default)]
struct PageInfo {
    file_name: String,
    file_size: String,
    file_type: String,
    upload_time: String,
    uploader: String,
}

/// Parameters recovered from the page's inline script.
#[derive(Debug)]
struct ScriptParams {
    sign: String,
    api_path: String,
    file_id: Option<String>,
    websignkey: String,
    kd: u64,
}

/// Product of the `ajaxm.php` exchange plus the redirect hop.
struct DownloadOutcome {
    download_url: String,
    file_name: Option<String>,
}

pub struct LanzouResolver {
    client: FetchClient,
    retry: RetryPolicy,
    base_url: String,
}

impl LanzouResolver {
    #[must_use]
    pub fn new(client: FetchClient, retry: RetryPolicy) -> Self {
        Self::with_base_url(client, retry, SHARE_BASE_URL)
    }

    /// Test constructor pointing the pipeline at a mock server.
    #[must_use]
    pub fn with_base_url(
        client: FetchClient,
        retry: RetryPolicy,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            retry,
            base_url: base_url.into(),
        }
    }

    fn check_page_usable(&self, html: &str, reference: &ShareReference) -> Result<(), ResolveError> {
        if html.trim().is_empty() {
            return Err(ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "share page came back empty",
            ));
        }
        if let Some(marker) = ANTI_BOT_MARKERS.iter().find(|marker| html.contains(*marker)) {
            return Err(ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                format!("share page blocked or revoked ({marker})"),
            ));
        }
        Ok(())
    }

    fn extract_page_info(html: &str) -> PageInfo {
        let file_name = extract_cascade(html, &[&TITLE_NAME_RE, &DIV_NAME_RE])
            .map(|value| strip_html_tags(&value))
            .unwrap_or_default();
        let file_size = extract_cascade(html, &[&META_SIZE_RE, &DIV_SIZE_RE, &SPAN_SIZE_RE])
            .map(|value| normalize_file_size(&value))
            .unwrap_or_default();
        let upload_time = extract_cascade(html, &[&INFOS_TIME_RE, &SPAN_TIME_RE])
            .map(|value| strip_html_tags(&value))
            .unwrap_or_default();
        let uploader = extract_capture(html, &UPLOADER_RE)
            .map(|value| strip_html_tags(&value))
            .unwrap_or_default();
        let file_type = extract_cascade(html, &[&INFOS_TYPE_RE, &SPAN_TYPE_RE])
            .map(|value| strip_html_tags(&value))
            .unwrap_or_default();
        PageInfo {
            file_name,
            file_size,
            file_type,
            upload_time,
            uploader,
        }
    }

    /// Pulls the inline script block that computes the download request.
    fn script_text(html: &str) -> Option<String> {
        for pattern in [&*SCRIPT_TYPED_RE, &*SCRIPT_PLAIN_RE, &*SCRIPT_ATTR_RE] {
            if let Some(caps) = pattern.captures(html) {
                let text = HTML_COMMENT_RE
                    .replace_all(caps.get(1).map_or("", |m| m.as_str()), "")
                    .trim()
                    .to_string();
                if text.len() > 50 {
                    return Some(text);
                }
            }
        }
        SCRIPT_KEYWORD_RE.captures(html).map(|caps| {
            HTML_COMMENT_RE
                .replace_all(caps.get(1).map_or("", |m| m.as_str()), "")
                .trim()
                .to_string()
        })
    }

    fn parse_script(
        script: &str,
        reference: &ShareReference,
    ) -> Result<ScriptParams, ResolveError> {
        let sign = extract_cascade(
            script,
            &[
                &SIGN_CC_RE,
                &SIGN_CC_DATA_SQ_RE,
                &SIGN_CC_DATA_DQ_RE,
                &SIGN_PLAIN_RE,
                &SIGN_DATA_SQ_RE,
                &SIGN_DATA_DQ_RE,
                &WP_SIGN_RE,
                &SIGN_LOOSE_RE,
            ],
        )
        .or_else(|| Self::best_token_guess(script))
        .ok_or_else(|| {
            ResolveError::signature_extraction(&reference.provider, &reference.share_id)
        })?;

        let websignkey =
            extract_cascade(script, &[&AJAXDATA_RE, &WEBSIGNKEY_RE]).unwrap_or_default();
        let api_path = extract_cascade(script, &[&API_URL_COLON_RE, &API_URL_ASSIGN_RE])
            .unwrap_or_else(|| "/ajaxm.php".to_string());
        let file_id = extract_cascade(script, &[&SCRIPT_FID_RE, &SCRIPT_FID_LOOSE_RE]);
        let kd = extract_cascade(script, &[&KDNS_RE, &KD_RE])
            .and_then(|value| value.parse().ok())
            .unwrap_or(1);

        Ok(ScriptParams {
            sign,
            api_path,
            file_id,
            websignkey,
            kd,
        })
    }

    /// Last-resort signature recovery: scan every quoted token and keep the
    /// most plausible one. The first token ending in `_c_c` is the current
    /// signature format; otherwise the last candidate in the script wins,
    /// matching where the page's own builder places it.
    fn best_token_guess(script: &str) -> Option<String> {
        let candidates: Vec<String> = TOKEN_RE
            .captures_iter(script)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .filter(|token| {
                token.len() <= 200
                    && !token.contains("http")
                    && !token.contains(".com")
                    && !token.contains(".php")
            })
            .collect();
        candidates
            .iter()
            .find(|token| token.ends_with("_c_c"))
            .or_else(|| candidates.last())
            .cloned()
    }

    async fn fetch_page(
        &self,
        url: &str,
        referer: &str,
        profile: HeaderProfile,
    ) -> Result<String, ResolveError> {
        let response = self
            .retry
            .execute(|| self.client.get(url, profile, Some(referer), Redirects::Follow))
            .await?;
        Ok(response.body)
    }

    /// Replays the download form POST and chases the one redirect hop the
    /// intermediate download host issues.
    async fn request_download(
        &self,
        reference: &ShareReference,
        share_url: &str,
        params: &ScriptParams,
        password: Option<&str>,
    ) -> Result<DownloadOutcome, ResolveError> {
        let api_url = match &params.file_id {
            Some(file_id) => format!("{}/ajaxm.php?file={file_id}", self.base_url),
            None if params.api_path.starts_with("/ajaxm.php") => {
                format!("{}{}", self.base_url, params.api_path)
            }
            None => format!("{}/ajaxm.php", self.base_url),
        };

        let mut form: Vec<(&str, String)> = vec![
            ("action", "downprocess".to_string()),
            ("sign", params.sign.clone()),
        ];
        if password.is_none() {
            form.push(("ves", "1".to_string()));
        }
        if !params.websignkey.is_empty() {
            form.push(("websignkey", params.websignkey.clone()));
            form.push(("signs", params.websignkey.clone()));
        }
        form.push(("kd", params.kd.to_string()));
        if let Some(password) = password {
            form.push(("p", password.to_string()));
        }

        let response = self
            .retry
            .execute(|| {
                self.client
                    .post_form(&api_url, &form, HeaderProfile::LanzouApi, Some(share_url))
            })
            .await?;

        let payload: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|_| {
                ResolveError::scrape_failed(
                    &reference.provider,
                    &reference.share_id,
                    "download api returned non-json body",
                )
            })?;
        if payload["zt"].as_i64() != Some(1) {
            let message = payload["inf"]
                .as_str()
                .map_or_else(|| "download link request rejected".to_string(), str::to_string);
            return Err(ResolveError::upstream_rejected(&reference.provider, message));
        }
        let (Some(dom), Some(path)) = (payload["dom"].as_str(), payload["url"].as_str()) else {
            return Err(ResolveError::scrape_failed(
                &reference.provider,
                &reference.share_id,
                "download api response missing dom or url",
            ));
        };
        let intermediate = format!("{dom}/file/{path}");
        debug!(url = %intermediate, "following intermediate download host");

        let redirect = self
            .retry
            .execute(|| {
                self.client.get(
                    &intermediate,
                    HeaderProfile::LanzouShare,
                    Some(share_url),
                    Redirects::Manual,
                )
            })
            .await?;
        let Some(location) = redirect.location() else {
            return Err(ResolveError::download_unavailable(
                &reference.provider,
                &reference.share_id,
            ));
        };

        Ok(DownloadOutcome {
            file_name: file_name_from_query(location, "fn"),
            download_url: location.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Resolver for LanzouResolver {
    fn name(&self) -> &'static str {
        "lanzou"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["lz"]
    }

    fn cache_ttl(&self) -> u64 {
        CACHE_TTL
    }

    fn validate(&self, url: &str) -> Option<String> {
        extract_capture(url, &URL_RE)
    }

    #[instrument(skip(self, reference), fields(share_id = %reference.share_id))]
    async fn resolve(
        &self,
        reference: &ShareReference,
    ) -> Result<ResolutionResult, ResolveError> {
        let share_url = format!("{}/{}", self.base_url, reference.share_id);
        let html = self
            .fetch_page(&share_url, &share_url, HeaderProfile::LanzouShare)
            .await?;
        self.check_page_usable(&html, reference)?;

        let page_fid = extract_capture(&html, &FID_RE);
        let mut info = Self::extract_page_info(&html);

        let outcome = if let Some(frame_path) = extract_capture(&html, &IFRAME_RE) {
            // Plain share: the signature script lives in a secondary frame.
            let frame_url = format!("{}{frame_path}", self.base_url);
            let frame_html = self
                .fetch_page(&frame_url, &share_url, HeaderProfile::LanzouIframe)
                .await?;
            let script = Self::script_text(&frame_html).ok_or_else(|| {
                ResolveError::scrape_failed(
                    &reference.provider,
                    &reference.share_id,
                    "frame script missing, share may be revoked",
                )
            })?;
            let mut params = Self::parse_script(&script, reference)?;
            if page_fid.is_some() {
                params.file_id = page_fid;
            } else if params.file_id.is_none() {
                params.file_id = extract_capture(&frame_html, &FID_RE);
            }
            self.request_download(reference, &share_url, &params, None)
                .await?
        } else {
            // No frame means a password-gated share; the script sits on the
            // share page itself.
            let Some(password) = reference.password.as_deref().filter(|p| !p.is_empty()) else {
                return Err(ResolveError::password_required(
                    &reference.provider,
                    &reference.share_id,
                ));
            };
            let script = Self::script_text(&html).ok_or_else(|| {
                ResolveError::scrape_failed(
                    &reference.provider,
                    &reference.share_id,
                    "page script missing, share may be revoked",
                )
            })?;
            let mut params = Self::parse_script(&script, reference)?;
            if params.file_id.is_none() {
                params.file_id = page_fid;
            }
            self.request_download(reference, &share_url, &params, Some(password))
                .await?
        };

        if info.file_name.is_empty() {
            if let Some(name) = outcome.file_name {
                info.file_name = name;
            }
        }
        if info.file_name.is_empty() {
            info.file_name = FALLBACK_FILE_NAME.to_string();
        }
        if info.file_type.is_empty() {
            info.file_type = file_type_from_name(&info.file_name);
        }
        if info.file_size.is_empty() {
            info.file_size = UNKNOWN_VALUE.to_string();
        }

        Ok(ResolutionResult {
            provider: self.name().to_string(),
            share_id: reference.share_id.clone(),
            file_name: info.file_name,
            file_size: info.file_size,
            file_type: info.file_type,
            upload_time: info.upload_time,
            uploader: info.uploader,
            download_url: outcome.download_url,
            resolved_at: unix_now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolver() -> LanzouResolver {
        LanzouResolver::new(FetchClient::new().unwrap(), RetryPolicy::default())
    }

    #[test]
    fn test_validate_accepts_known_domain_shapes() {
        let resolver = resolver();
        assert_eq!(
            resolver.validate("https://www.lanzoup.com/iRujd2hkyterd"),
            Some("iRujd2hkyterd".to_string())
        );
        assert_eq!(
            resolver.validate("https://abc-1.lanzn.com/s/iRujd2hkyterd"),
            Some("iRujd2hkyterd".to_string())
        );
        assert_eq!(
            resolver.validate("https://lanzoux.com/iabc123?pwd=x"),
            Some("iabc123".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_other_hosts() {
        let resolver = resolver();
        assert!(resolver.validate("https://cowtransfer.com/s/abc").is_none());
        assert!(resolver.validate("https://example.com/iabc").is_none());
    }

    #[test]
    fn test_extract_page_info_from_current_layout() {
        let html = r#"
            <title>w.zip - 蓝奏云</title>
            <div style="font-size: 30px;text-align: center;padding: 56px 0px 20px 0px;">w.zip</div>
            <meta name="description" content="w.zip蓝奏云为您提供w.zip下载，文件大小：920.1 K，">
            <span class="n_file_infos">2024-03-01</span>
            <span>分享用户：</span><font>uploader1</font>
        "#;
        let info = LanzouResolver::extract_page_info(html);
        assert_eq!(info.file_name, "w.zip");
        assert_eq!(info.file_size, "920.1 KB");
        assert_eq!(info.upload_time, "2024-03-01");
        assert_eq!(info.uploader, "uploader1");
    }

    #[test]
    fn test_meta_size_capture_stops_at_cjk_comma() {
        let with_comma =
            r#"<meta name="description" content="提供w.zip下载，文件大小：920.1 K，">"#;
        let at_end = r#"<meta name="description" content="提供m.iso下载，文件大小：4.7 G">"#;
        assert_eq!(
            LanzouResolver::extract_page_info(with_comma).file_size,
            "920.1 KB"
        );
        assert_eq!(LanzouResolver::extract_page_info(at_end).file_size, "4.7 GB");
    }

    #[test]
    fn test_extract_page_info_span_fallbacks() {
        let html = r#"
            <div style="font-size: 30px">archive.rar</div>
            <span>文件大小：</span>15.2m
            <span>上传时间：</span>2021-09-12 发布
            <span>运行系统：</span>Android
        "#;
        let info = LanzouResolver::extract_page_info(html);
        assert_eq!(info.file_name, "archive.rar");
        assert_eq!(info.file_size, "15.2 MB");
        assert_eq!(info.upload_time, "2021-09-12 发布");
        assert_eq!(info.file_type, "Android");
    }

    #[test]
    fn test_script_text_prefers_typed_blocks_and_strips_comments() {
        let html = format!(
            "<script type=\"text/javascript\">{}<!-- hidden -->var rest = 1;</script>",
            "var sign_payload = 'x'; ".repeat(5)
        );
        let script = LanzouResolver::script_text(&html).unwrap();
        assert!(!script.contains("hidden"));
        assert!(script.contains("var rest = 1;"));
    }

    #[test]
    fn test_script_text_keyword_fallback() {
        let html = r#"<script defer>var wp_sign = 'abc';</script>"#;
        let script = LanzouResolver::script_text(html).unwrap();
        assert!(script.contains("wp_sign"));
    }

    #[test]
    fn test_parse_script_prefers_cc_sign() {
        let reference = ShareReference::new("lanzou", "iabc");
        let script = r#"
            var ajaxdata = 'websign_value';
            data : { 'action':'downprocess','sign':'AAAABBBBCCCCDDDD1111_c_c','ves':1 },
            url : '/ajaxm.php',
        "#;
        let params = LanzouResolver::parse_script(script, &reference).unwrap();
        assert_eq!(params.sign, "AAAABBBBCCCCDDDD1111_c_c");
        assert_eq!(params.websignkey, "websign_value");
        assert_eq!(params.api_path, "/ajaxm.php");
        assert_eq!(params.kd, 1);
    }

    #[test]
    fn test_parse_script_wp_sign_and_file_id() {
        let reference = ShareReference::new("lanzou", "iabc");
        let script = r"
            var wp_sign = 'plain_sign_value';
            $.ajax({ url : '/ajaxm.php?file=225503127' });
            kdns = 3;
        ";
        let params = LanzouResolver::parse_script(script, &reference).unwrap();
        assert_eq!(params.sign, "plain_sign_value");
        assert_eq!(params.file_id.as_deref(), Some("225503127"));
        assert_eq!(params.kd, 3);
    }

    #[test]
    fn test_parse_script_token_guess_skips_urls() {
        let reference = ShareReference::new("lanzou", "iabc");
        let script = r#"
            var a = "https0example0com0file0path0long";
            var b = "Zm9vYmFyYmF6cXV4MTIzNDU2Nzg5MGFi_c_c";
        "#;
        let params = LanzouResolver::parse_script(script, &reference).unwrap();
        assert_eq!(params.sign, "Zm9vYmFyYmF6cXV4MTIzNDU2Nzg5MGFi_c_c");
    }

    #[test]
    fn test_parse_script_token_guess_prefers_first_signature_token() {
        let reference = ShareReference::new("lanzou", "iabc");
        let script = r#"
            var real = "QQQQWWWWEEEERRRRTTTT_c_c";
            var decoy = "YYYYUUUUIIIIOOOOPPPP_c_c";
        "#;
        let params = LanzouResolver::parse_script(script, &reference).unwrap();
        assert_eq!(params.sign, "QQQQWWWWEEEERRRRTTTT_c_c");
    }

    #[test]
    fn test_parse_script_without_any_token_fails() {
        let reference = ShareReference::new("lanzou", "iabc");
        let error = LanzouResolver::parse_script("var x = 1;", &reference).unwrap_err();
        assert!(matches!(
            error,
            ResolveError::SignatureExtractionFailed { .. }
        ));
    }

    #[test]
    fn test_check_page_usable_rejects_markers_and_empty() {
        let resolver = resolver();
        let reference = ShareReference::new("lanzou", "iabc");
        assert!(resolver.check_page_usable("", &reference).is_err());
        assert!(
            resolver
                .check_page_usable("<html>文件取消分享</html>", &reference)
                .is_err()
        );
        assert!(resolver.check_page_usable("<html>ok</html>", &reference).is_ok());
    }
}
