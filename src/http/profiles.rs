//! Named browser header profiles.
//!
//! Providers fingerprint requests aggressively: the same site expects a
//! navigation-shaped header set for its document fetch and a cors/XHR-shaped
//! set for its API calls, and serves an anti-bot page (or an empty body) to
//! anything that looks non-browser-like. Each profile reproduces one such
//! fingerprint; exact values matter and are kept verbatim.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, COOKIE, HeaderMap, HeaderName, HeaderValue, PRAGMA,
    REFERER, USER_AGENT,
};

/// Desktop Edge-on-macOS identity used by the scrape-based providers.
const EDGE_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36 Edg/137.0.0.0";
const EDGE_SEC_CH_UA: &str = r#""Microsoft Edge";v="137", "Chromium";v="137", "Not/A)Brand";v="24""#;

/// Desktop Chrome-on-Windows identity the feijipan API expects.
const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const CHROME_SEC_CH_UA: &str = r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const JS_ACCEPT: &str = "application/json, text/javascript, */*";
const JSON_ACCEPT: &str = "application/json, text/plain, */*";
const ZH_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6";

/// Cookies the lanzou document endpoints require before serving real pages.
const LANZOU_COOKIES: &str = "codelen=1; pc_ad1=1";

/// A named bundle of outbound request headers, selected per provider and per
/// pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Plain top-level browser navigation.
    Browser,
    /// Lanzou share-page fetch (document navigation plus required cookies).
    LanzouShare,
    /// Lanzou secondary-frame fetch (same-origin iframe navigation).
    LanzouIframe,
    /// Lanzou download-issuing form POST (same-origin XHR).
    LanzouApi,
    /// Cowtransfer JSON API calls.
    CowApi,
    /// 123pan share-page fetch.
    Pan123Share,
    /// 123pan JSON API calls.
    Pan123Api,
    /// Lecloud share API calls.
    LeCloudApi,
    /// Feijipan signed-API calls (cross-site Chrome XHR shape).
    FeijipanApi,
}

impl HeaderProfile {
    /// Materializes this profile as a header map.
    #[must_use]
    pub fn headers(self) -> HeaderMap {
        match self {
            Self::Browser | Self::Pan123Share => document_headers("none", None),
            Self::LanzouShare => document_headers("none", Some(LANZOU_COOKIES)),
            Self::LanzouIframe => iframe_headers(Some(LANZOU_COOKIES)),
            Self::LanzouApi | Self::CowApi | Self::Pan123Api | Self::LeCloudApi => {
                same_origin_api_headers()
            }
            Self::FeijipanApi => feijipan_api_headers(),
        }
    }
}

fn static_name(name: &'static str) -> HeaderName {
    HeaderName::from_static(name)
}

fn base_edge_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ZH_LANGUAGE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(static_name("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        static_name("sec-ch-ua"),
        HeaderValue::from_static(EDGE_SEC_CH_UA),
    );
    headers.insert(static_name("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
    headers.insert(
        static_name("sec-ch-ua-platform"),
        HeaderValue::from_static("\"macOS\""),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(EDGE_UA));
    headers
}

/// Top-level document navigation shape.
fn document_headers(fetch_site: &'static str, cookies: Option<&'static str>) -> HeaderMap {
    let mut headers = base_edge_headers();
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    headers.insert(static_name("sec-fetch-dest"), HeaderValue::from_static("document"));
    headers.insert(static_name("sec-fetch-mode"), HeaderValue::from_static("navigate"));
    headers.insert(static_name("sec-fetch-site"), HeaderValue::from_static(fetch_site));
    headers.insert(static_name("sec-fetch-user"), HeaderValue::from_static("?1"));
    headers.insert(
        static_name("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    if let Some(cookies) = cookies {
        headers.insert(COOKIE, HeaderValue::from_static(cookies));
    }
    headers
}

/// Same-origin iframe navigation shape (no `sec-fetch-user`).
fn iframe_headers(cookies: Option<&'static str>) -> HeaderMap {
    let mut headers = base_edge_headers();
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    headers.insert(static_name("sec-fetch-dest"), HeaderValue::from_static("iframe"));
    headers.insert(static_name("sec-fetch-mode"), HeaderValue::from_static("navigate"));
    headers.insert(
        static_name("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    if let Some(cookies) = cookies {
        headers.insert(COOKIE, HeaderValue::from_static(cookies));
    }
    headers
}

/// Same-origin XHR shape used by the scrape-based providers' API steps.
fn same_origin_api_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JS_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ZH_LANGUAGE));
    headers.insert(
        static_name("sec-ch-ua"),
        HeaderValue::from_static(EDGE_SEC_CH_UA),
    );
    headers.insert(static_name("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
    headers.insert(
        static_name("sec-ch-ua-platform"),
        HeaderValue::from_static("\"macOS\""),
    );
    headers.insert(static_name("sec-fetch-dest"), HeaderValue::from_static("empty"));
    headers.insert(static_name("sec-fetch-mode"), HeaderValue::from_static("cors"));
    headers.insert(
        static_name("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        static_name("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(EDGE_UA));
    headers
}

/// Cross-site Chrome XHR shape; the feijipan API validates the referer and
/// client-hint trio together.
fn feijipan_api_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(static_name("dnt"), HeaderValue::from_static("1"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.feijix.com/"));
    headers.insert(static_name("sec-fetch-dest"), HeaderValue::from_static("empty"));
    headers.insert(static_name("sec-fetch-mode"), HeaderValue::from_static("cors"));
    headers.insert(
        static_name("sec-fetch-site"),
        HeaderValue::from_static("cross-site"),
    );
    headers.insert(
        static_name("sec-ch-ua"),
        HeaderValue::from_static(CHROME_SEC_CH_UA),
    );
    headers.insert(static_name("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
    headers.insert(
        static_name("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(CHROME_UA));
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_share_profile_looks_like_document_navigation() {
        let headers = HeaderProfile::LanzouShare.headers();
        assert_eq!(headers.get("sec-fetch-dest").unwrap(), "document");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get("sec-fetch-user").unwrap(), "?1");
        assert!(headers.get(ACCEPT).unwrap().to_str().unwrap().starts_with("text/html"));
        assert_eq!(headers.get(COOKIE).unwrap(), LANZOU_COOKIES);
    }

    #[test]
    fn test_iframe_profile_is_same_origin_without_user_gesture() {
        let headers = HeaderProfile::LanzouIframe.headers();
        assert_eq!(headers.get("sec-fetch-dest").unwrap(), "iframe");
        assert_eq!(headers.get("sec-fetch-site").unwrap(), "same-origin");
        assert!(headers.get("sec-fetch-user").is_none());
    }

    #[test]
    fn test_api_profile_is_xhr_shaped() {
        let headers = HeaderProfile::LanzouApi.headers();
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "cors");
        assert_eq!(headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_feijipan_profile_carries_chrome_identity_and_referer() {
        let headers = HeaderProfile::FeijipanApi.headers();
        assert!(headers.get(USER_AGENT).unwrap().to_str().unwrap().contains("Chrome/131"));
        assert_eq!(headers.get(REFERER).unwrap(), "https://www.feijix.com/");
        assert_eq!(headers.get("sec-fetch-site").unwrap(), "cross-site");
    }
}
