use std::fmt;

use receipt_core::{QrImage, Ticket, TokenPreview};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    QrRendered {
        ticket: Ticket,
        result: Result<QrImage, QrError>,
    },
    PreviewFetched {
        ticket: Ticket,
        result: Result<TokenPreview, FetchError>,
    },
    DismissElapsed {
        ticket: Ticket,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text suitable for the error state of a screen.
    pub fn user_message(&self) -> String {
        match &self.kind {
            FailureKind::HttpStatus(_) if !self.message.is_empty() => {
                format!("{} ({})", self.message, self.kind)
            }
            kind => kind.to_string(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    InvalidBody,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::InvalidBody => write!(f, "malformed response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Asset or generation failure while producing a QR image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QrError {
    #[error("could not encode link as QR code: {0}")]
    Encode(String),
    #[error("could not fetch logo: {0}")]
    LogoFetch(FetchError),
    #[error("unsupported logo format")]
    LogoFormat,
    #[error("no logo configured for branded QR codes")]
    LogoMissing,
}
