use crate::async_view::ViewState;
use crate::preview::TokenPreview;
use crate::state::{QrImage, QrVariant};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub qr: QrModalView,
    pub preview: PreviewView,
    pub scanner: ScannerView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrModalView {
    pub open: bool,
    pub variant: QrVariant,
    pub link: Option<String>,
    /// Error fallback is the plain receipt link.
    pub state: ViewState<QrImage, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewView {
    pub token_id: Option<String>,
    pub state: ViewState<TokenPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerView {
    /// False once a code was recognised, until the scanner is reset.
    pub accepting: bool,
    pub handled: Option<String>,
    pub error: Option<String>,
}
