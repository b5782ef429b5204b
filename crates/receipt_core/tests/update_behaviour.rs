use std::sync::Once;

use pretty_assertions::assert_eq;
use receipt_core::{
    update, AppState, Effect, Msg, QrImage, QrVariant, ViewState, AUTO_DISMISS_AFTER,
    UNRECOGNIZED_CODE,
};

const TOKEN: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const LINK: &str = "https://r.example.com/r/3fa85f64-5717-4562-b3fc-2c963f66afa6";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn open_modal(state: AppState, token: &str, variant: QrVariant) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::QrModalOpened {
            domain: "https://r.example.com/".to_string(),
            token: token.to_string(),
            variant,
        },
    )
}

fn image(link: &str) -> QrImage {
    QrImage {
        link: link.to_string(),
        data_url: "data:image/svg+xml;base64,AAAA".to_string(),
        svg: "<svg/>".to_string(),
        terminal: "##".to_string(),
    }
}

#[test]
fn opening_plain_modal_requests_render() {
    init_logging();
    let (mut state, effects) = open_modal(AppState::new(), TOKEN, QrVariant::Plain);

    assert_eq!(
        effects,
        vec![Effect::RenderQr {
            ticket: 1,
            link: LINK.to_string(),
            variant: QrVariant::Plain,
        }]
    );
    let view = state.view();
    assert!(view.qr.open);
    assert_eq!(view.qr.link.as_deref(), Some(LINK));
    assert_eq!(view.qr.state, ViewState::Loading);
    assert!(state.consume_dirty());
}

#[test]
fn branded_modal_also_starts_dismiss_timer() {
    init_logging();
    let (_state, effects) = open_modal(AppState::new(), TOKEN, QrVariant::Branded);

    assert_eq!(
        effects,
        vec![
            Effect::RenderQr {
                ticket: 1,
                link: LINK.to_string(),
                variant: QrVariant::Branded,
            },
            Effect::StartDismissTimer {
                ticket: 2,
                after: AUTO_DISMISS_AFTER,
            },
        ]
    );
}

#[test]
fn render_result_moves_modal_to_ready() {
    init_logging();
    let (state, _) = open_modal(AppState::new(), TOKEN, QrVariant::Plain);
    let (state, effects) = update(
        state,
        Msg::QrRendered {
            ticket: 1,
            result: Ok(image(LINK)),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().qr.state, ViewState::Ready(image(LINK)));
}

#[test]
fn render_failure_falls_back_to_plain_link() {
    init_logging();
    let (state, _) = open_modal(AppState::new(), TOKEN, QrVariant::Branded);
    let (state, _) = update(
        state,
        Msg::QrRendered {
            ticket: 1,
            result: Err("logo fetch failed".to_string()),
        },
    );

    assert_eq!(
        state.view().qr.state,
        ViewState::Error {
            message: "logo fetch failed".to_string(),
            fallback: LINK.to_string(),
        }
    );
}

#[test]
fn empty_token_keeps_modal_idle() {
    init_logging();
    let (state, effects) = open_modal(AppState::new(), "   ", QrVariant::Branded);

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.qr.open);
    assert_eq!(view.qr.link, None);
    assert_eq!(view.qr.state, ViewState::Idle);
}

#[test]
fn branded_modal_without_token_never_dismisses_itself() {
    init_logging();
    let (state, effects) = open_modal(AppState::new(), "", QrVariant::Branded);

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartDismissTimer { .. })));
    assert!(state.pending_tickets().is_empty());

    // No timer was started, so no ticket can close it.
    let (state, effects) = update(state, Msg::DismissElapsed { ticket: 1 });
    assert!(effects.is_empty());
    let (state, _) = update(state, Msg::Tick);
    assert!(state.view().qr.open);

    // Only the host closes it.
    let (state, effects) = update(state, Msg::QrModalClosed);
    assert!(effects.is_empty());
    assert!(!state.view().qr.open);
}

#[test]
fn closing_modal_cancels_render_and_timer() {
    init_logging();
    let (state, _) = open_modal(AppState::new(), TOKEN, QrVariant::Branded);
    let (mut state, effects) = update(state, Msg::QrModalClosed);

    assert_eq!(
        effects,
        vec![Effect::Cancel { ticket: 1 }, Effect::Cancel { ticket: 2 }]
    );
    assert!(!state.view().qr.open);
    assert!(state.pending_tickets().is_empty());
    assert!(state.consume_dirty());

    // Closing twice is a no-op.
    let (mut state, effects) = update(state, Msg::QrModalClosed);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn open_link_only_while_modal_has_a_link() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::OpenLinkClicked);
    assert!(effects.is_empty());

    let (state, _) = open_modal(state, TOKEN, QrVariant::Plain);
    let (_state, effects) = update(state, Msg::OpenLinkClicked);
    assert_eq!(
        effects,
        vec![Effect::OpenLink {
            url: LINK.to_string()
        }]
    );
}

#[test]
fn recognised_scan_routes_to_preview_once() {
    init_logging();
    let scanned = format!("https://receipt-less.com/r/{TOKEN}");
    let (state, effects) = update(AppState::new(), Msg::CodeScanned(scanned.clone()));

    assert_eq!(
        effects,
        vec![Effect::FetchPreview {
            ticket: 1,
            token_id: TOKEN.to_string(),
        }]
    );
    let view = state.view();
    assert!(!view.scanner.accepting);
    assert_eq!(view.scanner.handled.as_deref(), Some(TOKEN));
    assert_eq!(view.preview.token_id.as_deref(), Some(TOKEN));
    assert_eq!(view.preview.state, ViewState::Loading);

    // Further scans are ignored until the scanner is reset.
    let (state, effects) = update(state, Msg::CodeScanned(scanned.clone()));
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::ScannerReset);
    assert!(state.view().scanner.accepting);
    let (_state, effects) = update(state, Msg::CodeScanned(scanned));
    assert_eq!(
        effects,
        vec![
            Effect::Cancel { ticket: 1 },
            Effect::FetchPreview {
                ticket: 2,
                token_id: TOKEN.to_string(),
            },
        ]
    );
}

#[test]
fn unrecognised_scan_reports_error_and_keeps_scanning() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), Msg::CodeScanned("not-a-uuid".to_string()));

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.scanner.accepting);
    assert_eq!(view.scanner.error.as_deref(), Some(UNRECOGNIZED_CODE));
    assert!(state.consume_dirty());

    let (state, effects) = update(state, Msg::CodeScanned(TOKEN.to_string()));
    assert_eq!(effects.len(), 1);
    assert_eq!(state.view().scanner.error, None);
}
