use std::time::Duration;

use crate::async_view::{AsyncView, Ticket, TicketCounter};
use crate::codec::TokenId;
use crate::preview::TokenPreview;
use crate::view_model::{AppViewModel, PreviewView, QrModalView, ScannerView};

/// The branded modal closes itself this long after it was opened.
pub const AUTO_DISMISS_AFTER: Duration = Duration::from_secs(12);

/// Message shown when scanned text holds no token.
pub const UNRECOGNIZED_CODE: &str = "Unrecognized QR code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrVariant {
    /// Bare QR image of the receipt link.
    #[default]
    Plain,
    /// QR with the retailer logo composed in the centre; auto-dismisses.
    Branded,
}

impl QrVariant {
    pub fn auto_dismisses(self) -> bool {
        matches!(self, QrVariant::Branded)
    }
}

/// Rendered QR code for a receipt link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub link: String,
    /// `data:image/svg+xml;base64,...`
    pub data_url: String,
    pub svg: String,
    /// Block-character rendering for terminals.
    pub terminal: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct QrModal {
    pub(crate) open: bool,
    pub(crate) variant: QrVariant,
    pub(crate) link: Option<String>,
    pub(crate) view: AsyncView<QrImage, String>,
    pub(crate) dismiss_timer: Option<Ticket>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PreviewScreen {
    pub(crate) token_id: Option<String>,
    pub(crate) view: AsyncView<TokenPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ScannerScreen {
    pub(crate) handled: Option<TokenId>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    tickets: TicketCounter,
    pub(crate) qr: QrModal,
    pub(crate) preview: PreviewScreen,
    pub(crate) scanner: ScannerScreen,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            qr: QrModalView {
                open: self.qr.open,
                variant: self.qr.variant,
                link: self.qr.link.clone(),
                state: self.qr.view.state().clone(),
            },
            preview: PreviewView {
                token_id: self.preview.token_id.clone(),
                state: self.preview.view.state().clone(),
            },
            scanner: ScannerView {
                accepting: self.scanner.handled.is_none(),
                handled: self.scanner.handled.as_ref().map(|t| t.as_str().to_string()),
                error: self.scanner.error.clone(),
            },
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and
    /// clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Tickets of operations currently expected to report back.
    pub fn pending_tickets(&self) -> Vec<Ticket> {
        let mut pending = Vec::new();
        if self.qr.view.state().is_loading() {
            pending.extend(self.qr.view.active_ticket());
        }
        pending.extend(self.qr.dismiss_timer);
        if self.preview.view.state().is_loading() {
            pending.extend(self.preview.view.active_ticket());
        }
        pending
    }

    pub(crate) fn issue_ticket(&mut self) -> Ticket {
        self.tickets.issue()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
