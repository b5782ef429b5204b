use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use receipt_core::{Effect, Msg};
use receipt_engine::{EngineEvent, EngineHandle};

/// Effects the host handles itself instead of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    ModalDismissed,
    OpenLink(String),
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) -> Vec<HostAction> {
        let mut host = Vec::new();
        for effect in effects {
            match effect {
                Effect::RenderQr {
                    ticket,
                    link,
                    variant,
                } => self.engine.render_qr(ticket, link, variant),
                Effect::StartDismissTimer { ticket, after } => {
                    self.engine.start_timer(ticket, after)
                }
                Effect::FetchPreview { ticket, token_id } => {
                    self.engine.fetch_preview(ticket, token_id)
                }
                Effect::Cancel { ticket } => self.engine.cancel(ticket),
                Effect::ModalDismissed => host.push(HostAction::ModalDismissed),
                Effect::OpenLink { url } => host.push(HostAction::OpenLink(url)),
            }
        }
        host
    }

    /// Waits up to `timeout` for the next engine event, as a message.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(event_to_msg)
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::QrRendered { ticket, result } => Msg::QrRendered {
            ticket,
            result: result.map_err(|err| {
                engine_warn!("QR render {} failed: {}", ticket, err);
                err.to_string()
            }),
        },
        EngineEvent::PreviewFetched { ticket, result } => Msg::PreviewLoaded {
            ticket,
            result: result.map_err(|err| {
                engine_warn!("Preview fetch {} failed: {}", ticket, err);
                err.user_message()
            }),
        },
        EngineEvent::DismissElapsed { ticket } => {
            engine_debug!("Dismiss timer {} elapsed", ticket);
            Msg::DismissElapsed { ticket }
        }
    }
}
