use std::time::Duration;

use engine_logging::{engine_debug, engine_warn, redact_token};
use futures_util::StreamExt;
use receipt_core::{ErrorBody, TokenPreview};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 1024 * 1024,
        }
    }
}

/// Response body read under the configured size limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait::async_trait]
pub trait PreviewClient: Send + Sync {
    async fn fetch_preview(&self, token_id: &str) -> Result<TokenPreview, FetchError>;
}

/// Calls `GET {functions_base_url}/token-preview?token_id=<id>`.
#[derive(Debug, Clone)]
pub struct ReqwestPreviewClient {
    client: reqwest::Client,
    endpoint: Url,
    settings: FetchSettings,
}

impl ReqwestPreviewClient {
    pub fn new(
        functions_base_url: &str,
        api_key: Option<&str>,
        settings: FetchSettings,
    ) -> Result<Self, FetchError> {
        let endpoint = format!("{}/token-preview", functions_base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = build_client(&settings, api_key)?;
        Ok(Self {
            client,
            endpoint,
            settings,
        })
    }

    fn url_for(&self, token_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("token_id", token_id);
        url
    }
}

#[async_trait::async_trait]
impl PreviewClient for ReqwestPreviewClient {
    async fn fetch_preview(&self, token_id: &str) -> Result<TokenPreview, FetchError> {
        engine_debug!("GET token-preview for {}", redact_token(token_id));
        let response = self
            .client
            .get(self.url_for(token_id))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            // The function explains failures as `{ "error": "..." }`.
            let message = read_limited(response, self.settings.max_bytes)
                .await
                .ok()
                .and_then(|body| serde_json::from_slice::<ErrorBody>(&body.bytes).ok())
                .map(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            engine_warn!("token-preview answered {}: {}", status.as_u16(), message);
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        if let Some(ct) = content_type_of(response.headers()) {
            if !is_json(&ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType { content_type: ct },
                    "expected a JSON response",
                ));
            }
        }

        let body = read_limited(response, self.settings.max_bytes).await?;
        serde_json::from_slice(&body.bytes)
            .map_err(|err| FetchError::new(FailureKind::InvalidBody, err.to_string()))
    }
}

pub(crate) fn build_client(
    settings: &FetchSettings,
    api_key: Option<&str>,
) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    if let Some(key) = api_key.filter(|key| !key.is_empty()) {
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let raw = HeaderValue::from_str(key)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("apikey", raw);
    }

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .default_headers(headers)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

/// Reads the whole body, failing once it exceeds `max_bytes`.
pub(crate) async fn read_limited(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<FetchedBody, FetchError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let content_type = content_type_of(response.headers());
    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(FetchedBody {
        bytes,
        content_type,
    })
}

fn content_type_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn is_json(content_type: &str) -> bool {
    let ct = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    ct.eq_ignore_ascii_case("application/json") || ct.to_ascii_lowercase().ends_with("+json")
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
