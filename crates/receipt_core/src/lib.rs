//! Receipt core: link/token codec, the generic async view, and the pure state
//! machine behind the QR modal, receipt preview and scanner screens.
mod async_view;
mod codec;
mod effect;
mod msg;
mod preview;
mod state;
mod update;
mod view_model;

pub use async_view::{AsyncView, Failure, Resolution, Ticket, TicketCounter, ViewState};
pub use codec::{build_receipt_url, extract_token_id, is_uuid, normalize_domain, TokenId};
pub use effect::Effect;
pub use msg::Msg;
pub use preview::{
    format_money, ErrorBody, Receipt, ReceiptItem, TokenInfo, TokenPreview, TokenStatus,
};
pub use state::{AppState, QrImage, QrVariant, AUTO_DISMISS_AFTER, UNRECOGNIZED_CODE};
pub use update::update;
pub use view_model::{AppViewModel, PreviewView, QrModalView, ScannerView};
