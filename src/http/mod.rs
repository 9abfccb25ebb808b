//! Outbound HTTP client shared by all provider pipelines.

pub mod profiles;

use std::time::Duration;

use reqwest::header::{HeaderMap, LOCATION, REFERER};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;

use crate::error::ResolveError;
pub use profiles::HeaderProfile;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

/// Whether a request should chase redirects or expose them to the caller.
///
/// Every provider pipeline ends with a request whose `Location` header is the
/// product, so the final hop is always issued with [`Redirects::Manual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirects {
    Follow,
    Manual,
}

/// A fully-read response with the pieces the pipelines inspect.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchResponse {
    /// Returns a response header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The `Location` header of a redirect response.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|value| value.to_str().ok())
    }
}

/// Thin wrapper over [`reqwest::Client`] that applies a header profile and an
/// optional referer to every request.
///
/// Two underlying clients are kept because the redirect policy is fixed at
/// client construction time. Both accept invalid upstream certificates; the
/// download hosts these providers redirect to routinely serve mismatched or
/// expired certificates.
#[derive(Debug, Clone)]
pub struct FetchClient {
    following: Client,
    manual: Client,
}

impl FetchClient {
    /// Builds the client pair.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Network`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self {
            following: Self::builder(Policy::limited(MAX_REDIRECTS)).build().map_err(
                |source| ResolveError::network("(http client construction)", source),
            )?,
            manual: Self::builder(Policy::none()).build().map_err(|source| {
                ResolveError::network("(http client construction)", source)
            })?,
        })
    }

    fn builder(redirect: Policy) -> reqwest::ClientBuilder {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect)
            .cookie_store(true)
            .gzip(true)
            .danger_accept_invalid_certs(true)
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Network`] on connection, timeout, or body-read
    /// failures. Non-2xx statuses are not errors; pipelines inspect them.
    pub async fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        referer: Option<&str>,
        redirects: Redirects,
    ) -> Result<FetchResponse, ResolveError> {
        self.send(self.request(Method::GET, url, profile, referer, redirects), url)
            .await
    }

    /// Issues a POST with an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FetchClient::get`].
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        profile: HeaderProfile,
        referer: Option<&str>,
    ) -> Result<FetchResponse, ResolveError> {
        self.send(
            self.request(Method::POST, url, profile, referer, Redirects::Follow)
                .form(form),
            url,
        )
        .await
    }

    /// Issues a POST with a JSON body.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FetchClient::get`].
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        profile: HeaderProfile,
        referer: Option<&str>,
    ) -> Result<FetchResponse, ResolveError> {
        self.send(
            self.request(Method::POST, url, profile, referer, Redirects::Follow)
                .json(body),
            url,
        )
        .await
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        profile: HeaderProfile,
        referer: Option<&str>,
        redirects: Redirects,
    ) -> RequestBuilder {
        let client = match redirects {
            Redirects::Follow => &self.following,
            Redirects::Manual => &self.manual,
        };
        let mut builder = client.request(method, url).headers(profile.headers());
        if let Some(referer) = referer {
            builder = builder.header(REFERER, referer);
        }
        builder
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        url: &str,
    ) -> Result<FetchResponse, ResolveError> {
        let response = builder
            .send()
            .await
            .map_err(|source| ResolveError::network(url, source))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|source| ResolveError::network(url, source))?;
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
