use std::time::Duration;

use crate::async_view::Ticket;
use crate::state::QrVariant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RenderQr {
        ticket: Ticket,
        link: String,
        variant: QrVariant,
    },
    StartDismissTimer { ticket: Ticket, after: Duration },
    FetchPreview { ticket: Ticket, token_id: String },
    /// Stop the operation started under `ticket`; its result will be ignored.
    Cancel { ticket: Ticket },
    /// The modal closed itself; the host's close callback should run.
    ModalDismissed,
    OpenLink { url: String },
}
