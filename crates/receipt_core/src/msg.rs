use crate::async_view::Ticket;
use crate::preview::TokenPreview;
use crate::state::{QrImage, QrVariant};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The QR modal became visible for a token.
    QrModalOpened {
        domain: String,
        token: String,
        variant: QrVariant,
    },
    /// User closed the QR modal.
    QrModalClosed,
    /// Engine finished rendering a QR image.
    QrRendered {
        ticket: Ticket,
        result: Result<QrImage, String>,
    },
    /// The auto-dismiss timer of the branded modal elapsed.
    DismissElapsed { ticket: Ticket },
    /// User asked to open the plain receipt link.
    OpenLinkClicked,
    /// Preview screen mounted with a route parameter.
    PreviewOpened { token_id: String },
    /// Preview screen unmounted.
    PreviewClosed,
    /// User asked to load the preview again.
    PreviewReloadClicked,
    /// Engine finished fetching a preview.
    PreviewLoaded {
        ticket: Ticket,
        result: Result<TokenPreview, String>,
    },
    /// Scanner produced raw text.
    CodeScanned(String),
    /// User dismissed the scan result and wants to scan again.
    ScannerReset,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
