use engine_logging::{engine_debug, engine_info, redact_token};

use crate::async_view::{Failure, Resolution};
use crate::codec::{build_receipt_url, extract_token_id};
use crate::state::{QrVariant, AUTO_DISMISS_AFTER, UNRECOGNIZED_CODE};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QrModalOpened {
            domain,
            token,
            variant,
        } => open_qr_modal(&mut state, &domain, &token, variant),
        Msg::QrModalClosed => {
            if !state.qr.open {
                return (state, Vec::new());
            }
            let effects = teardown_qr_modal(&mut state);
            state.mark_dirty();
            effects
        }
        Msg::QrRendered { ticket, result } => {
            let fallback = state.qr.link.clone().unwrap_or_default();
            let result = result.map_err(|message| Failure::new(message, fallback));
            if state.qr.view.resolve(ticket, result) == Resolution::Applied {
                state.mark_dirty();
            } else {
                engine_debug!("Dropping stale QR render for ticket {}", ticket);
            }
            Vec::new()
        }
        Msg::DismissElapsed { ticket } => {
            if state.qr.dismiss_timer != Some(ticket) {
                engine_debug!("Ignoring stale dismiss timer {}", ticket);
                return (state, Vec::new());
            }
            engine_info!("QR modal auto-dismissed");
            let mut effects = teardown_qr_modal(&mut state);
            effects.push(Effect::ModalDismissed);
            state.mark_dirty();
            effects
        }
        Msg::OpenLinkClicked => match state.qr.link.clone() {
            Some(url) if state.qr.open => vec![Effect::OpenLink { url }],
            _ => Vec::new(),
        },
        Msg::PreviewOpened { token_id } => open_preview(&mut state, &token_id),
        Msg::PreviewClosed => {
            let effects = cancel_all(state.preview.view.deactivate());
            if state.preview.token_id.take().is_some() || !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::PreviewReloadClicked => {
            if state.preview.view.state().is_loading() {
                return (state, Vec::new());
            }
            match state.preview.token_id.clone() {
                Some(token_id) => open_preview(&mut state, &token_id),
                None => Vec::new(),
            }
        }
        Msg::PreviewLoaded { ticket, result } => {
            let result = result.map_err(|message| Failure::new(message, ()));
            if state.preview.view.resolve(ticket, result) == Resolution::Applied {
                state.mark_dirty();
            } else {
                engine_debug!("Dropping stale preview for ticket {}", ticket);
            }
            Vec::new()
        }
        Msg::CodeScanned(raw) => {
            if state.scanner.handled.is_some() {
                return (state, Vec::new());
            }
            match extract_token_id(&raw) {
                Some(token) => {
                    engine_info!("Scanned token {}", redact_token(token.as_str()));
                    let token_id = token.as_str().to_string();
                    state.scanner.handled = Some(token);
                    state.scanner.error = None;
                    state.mark_dirty();
                    open_preview(&mut state, &token_id)
                }
                None => {
                    engine_info!("Scanned code holds no token");
                    state.scanner.error = Some(UNRECOGNIZED_CODE.to_string());
                    state.mark_dirty();
                    Vec::new()
                }
            }
        }
        Msg::ScannerReset => {
            if state.scanner.handled.is_some() || state.scanner.error.is_some() {
                state.scanner.handled = None;
                state.scanner.error = None;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn open_qr_modal(state: &mut AppState, domain: &str, token: &str, variant: QrVariant) -> Vec<Effect> {
    let mut effects = teardown_qr_modal(state);
    state.qr.open = true;
    state.qr.variant = variant;
    state.mark_dirty();

    if token.trim().is_empty() {
        return effects;
    }

    let link = build_receipt_url(domain, token);
    let ticket = state.issue_ticket();
    state.qr.view.activate(ticket);
    state.qr.link = Some(link.clone());
    engine_info!(
        "Rendering {:?} QR for token {} (ticket {})",
        variant,
        redact_token(token.trim()),
        ticket
    );
    effects.push(Effect::RenderQr {
        ticket,
        link,
        variant,
    });

    if variant.auto_dismisses() {
        let timer = state.issue_ticket();
        state.qr.dismiss_timer = Some(timer);
        effects.push(Effect::StartDismissTimer {
            ticket: timer,
            after: AUTO_DISMISS_AFTER,
        });
    }
    effects
}

/// Closes the modal and returns cancellations for its render and timer.
fn teardown_qr_modal(state: &mut AppState) -> Vec<Effect> {
    let mut effects = cancel_all(state.qr.view.deactivate());
    effects.extend(cancel_all(state.qr.dismiss_timer.take()));
    state.qr.open = false;
    state.qr.link = None;
    effects
}

fn open_preview(state: &mut AppState, token_id: &str) -> Vec<Effect> {
    let token_id = token_id.trim();
    let mut effects = cancel_all(state.preview.view.deactivate());
    state.mark_dirty();

    if token_id.is_empty() {
        state.preview.token_id = None;
        return effects;
    }

    let ticket = state.issue_ticket();
    state.preview.view.activate(ticket);
    state.preview.token_id = Some(token_id.to_string());
    engine_info!(
        "Fetching preview for token {} (ticket {})",
        redact_token(token_id),
        ticket
    );
    effects.push(Effect::FetchPreview {
        ticket,
        token_id: token_id.to_string(),
    });
    effects
}

fn cancel_all(ticket: Option<crate::Ticket>) -> Vec<Effect> {
    ticket
        .into_iter()
        .map(|ticket| Effect::Cancel { ticket })
        .collect()
}
