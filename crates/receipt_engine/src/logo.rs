use engine_logging::engine_debug;
use url::Url;

use crate::fetch::{build_client, map_reqwest_error, read_limited, FetchSettings};
use crate::{FailureKind, FetchError, QrError};

/// Raw logo image plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Logo {
    /// Sniffs the image format from the leading bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, QrError> {
        let mime = sniff_mime(&bytes).ok_or(QrError::LogoFormat)?;
        Ok(Self { mime, bytes })
    }
}

#[async_trait::async_trait]
pub trait LogoSource: Send + Sync {
    async fn load(&self) -> Result<Logo, QrError>;
}

/// Logo already in memory.
#[derive(Debug, Clone)]
pub struct StaticLogo(pub Logo);

#[async_trait::async_trait]
impl LogoSource for StaticLogo {
    async fn load(&self) -> Result<Logo, QrError> {
        Ok(self.0.clone())
    }
}

/// Downloads the logo on every load; a new activation fetches it again.
#[derive(Debug, Clone)]
pub struct HttpLogoSource {
    client: reqwest::Client,
    url: Url,
    max_bytes: u64,
}

impl HttpLogoSource {
    pub fn new(url: &str, settings: &FetchSettings) -> Result<Self, FetchError> {
        let url = Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(Self {
            client: build_client(settings, None)?,
            url,
            max_bytes: settings.max_bytes,
        })
    }
}

#[async_trait::async_trait]
impl LogoSource for HttpLogoSource {
    async fn load(&self) -> Result<Logo, QrError> {
        engine_debug!("Fetching logo from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| QrError::LogoFetch(map_reqwest_error(err)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(QrError::LogoFetch(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            )));
        }
        let body = read_limited(response, self.max_bytes)
            .await
            .map_err(QrError::LogoFetch)?;
        Logo::from_bytes(body.bytes)
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = b"\xFF\xD8\xFF";

    if bytes.starts_with(PNG) {
        return Some("image/png");
    }
    if bytes.starts_with(JPEG) {
        return Some("image/jpeg");
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some("image/svg+xml");
    }
    None
}
