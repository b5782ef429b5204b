use std::io::{BufRead, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use engine_logging::{engine_debug, engine_info};
use receipt_core::{update, AppState, AppViewModel, Msg, QrVariant, ViewState};
use receipt_engine::AtomicFileWriter;

use crate::effects::{EffectRunner, HostAction};
use crate::render::{render_preview, render_qr, render_scanner};

/// Poll interval for engine events; a `Tick` is dispatched when none arrive.
const TICK: Duration = Duration::from_millis(75);
/// Upper bound on any single wait, in case the engine stops answering.
const MAX_WAIT: Duration = Duration::from_secs(120);

/// Last text printed per screen, so unchanged views are not repeated.
#[derive(Default)]
struct Printed {
    qr: String,
    preview: String,
    scanner: String,
}

/// Drives the receipt screens from the terminal: messages go through
/// `update`, effects through the engine, and dirty views are printed.
pub struct Session<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    printed: Printed,
}

impl<W: Write> Session<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            out,
            printed: Printed::default(),
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    pub fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        let actions = self.runner.run(effects);
        if self.state.consume_dirty() {
            self.render()?;
        }
        for action in actions {
            self.handle(action)?;
        }
        Ok(())
    }

    /// Shows the QR modal for `token`. Returns whether an image was produced.
    ///
    /// A branded modal stays open until its dismiss timer closes it; a plain
    /// one is closed as soon as the image has been shown.
    pub fn show_qr(
        &mut self,
        domain: &str,
        token: &str,
        variant: QrVariant,
        svg_out: Option<&Path>,
    ) -> anyhow::Result<bool> {
        self.dispatch(Msg::QrModalOpened {
            domain: domain.to_string(),
            token: token.to_string(),
            variant,
        })?;
        self.pump_until(|view| !view.qr.state.is_loading())?;

        let shown = match self.state.view().qr.state {
            ViewState::Ready(image) => {
                if let Some(path) = svg_out {
                    let (writer, filename) = AtomicFileWriter::for_path(path)
                        .with_context(|| format!("invalid output path {}", path.display()))?;
                    let written = writer
                        .write(&filename, &image.svg)
                        .with_context(|| format!("writing {}", path.display()))?;
                    writeln!(self.out, "Saved QR image to {}", written.display())?;
                }
                true
            }
            ViewState::Error { .. } => {
                self.dispatch(Msg::OpenLinkClicked)?;
                false
            }
            ViewState::Idle | ViewState::Loading => false,
        };

        if shown && variant.auto_dismisses() {
            self.pump_until(|view| !view.qr.open)?;
        } else {
            self.dispatch(Msg::QrModalClosed)?;
        }
        Ok(shown)
    }

    /// Loads and prints the preview for `token_id`. Returns whether it loaded.
    pub fn show_preview(&mut self, token_id: &str) -> anyhow::Result<bool> {
        self.dispatch(Msg::PreviewOpened {
            token_id: token_id.to_string(),
        })?;
        if self.state.view().preview.token_id.is_none() {
            writeln!(self.out, "No receipt token given.")?;
        }
        self.finish_preview()
    }

    /// Feeds `text`, or else each line of `input`, to the scanner until a
    /// token is recognised, then previews it.
    pub fn scan(&mut self, text: Option<String>, input: impl BufRead) -> anyhow::Result<bool> {
        match text {
            Some(text) => self.dispatch(Msg::CodeScanned(text))?,
            None => {
                for line in input.lines() {
                    let line = line.context("reading scanned input")?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.printed.scanner.clear();
                    self.dispatch(Msg::CodeScanned(line))?;
                    if !self.state.view().scanner.accepting {
                        break;
                    }
                }
            }
        }

        if self.state.view().scanner.accepting {
            engine_info!("No receipt token recognised");
            return Ok(false);
        }
        let loaded = self.finish_preview()?;
        self.dispatch(Msg::ScannerReset)?;
        Ok(loaded)
    }

    fn finish_preview(&mut self) -> anyhow::Result<bool> {
        self.pump_until(|view| !view.preview.state.is_loading())?;
        let loaded = self.state.view().preview.state.ready().is_some();
        self.dispatch(Msg::PreviewClosed)?;
        Ok(loaded)
    }

    /// Dispatches engine events (or ticks) until `done` holds for the view.
    fn pump_until(&mut self, done: impl Fn(&AppViewModel) -> bool) -> anyhow::Result<()> {
        let started = Instant::now();
        while !done(&self.state.view()) {
            if started.elapsed() > MAX_WAIT {
                bail!("gave up waiting after {:?}", MAX_WAIT);
            }
            let msg = self.runner.next_msg(TICK).unwrap_or(Msg::Tick);
            self.dispatch(msg)?;
        }
        Ok(())
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let view = self.state.view();
        let screens = [
            (render_qr(&view.qr), &mut self.printed.qr),
            (render_preview(&view.preview), &mut self.printed.preview),
            (render_scanner(&view.scanner), &mut self.printed.scanner),
        ];
        for (text, last) in screens {
            if text != *last {
                if !text.is_empty() {
                    write!(self.out, "{text}")?;
                }
                *last = text;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn handle(&mut self, action: HostAction) -> anyhow::Result<()> {
        engine_debug!("Host action {:?}", action);
        match action {
            HostAction::ModalDismissed => writeln!(self.out, "QR code closed automatically.")?,
            HostAction::OpenLink(url) => writeln!(self.out, "Open this link: {url}")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use receipt_core::TokenPreview;
    use receipt_engine::{
        EngineHandle, FailureKind, FetchError, PreviewClient, QrError, QrRenderer, SvgQrRenderer,
    };
    use tempfile::TempDir;

    const TOKEN: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    struct CannedPreview;

    #[async_trait::async_trait]
    impl PreviewClient for CannedPreview {
        async fn fetch_preview(&self, token_id: &str) -> Result<TokenPreview, FetchError> {
            if token_id != TOKEN {
                return Err(FetchError::new(
                    FailureKind::HttpStatus(404),
                    "Token not found",
                ));
            }
            Ok(TokenPreview {
                token: receipt_core::TokenInfo {
                    token_id: token_id.to_string(),
                    status: receipt_core::TokenStatus::Active,
                    consumed_at: None,
                },
                receipt: receipt_core::Receipt {
                    issued_at: "2026-10-01T09:58:12Z".to_string(),
                    retailer_id: "acme".to_string(),
                    store_id: None,
                    currency: "EUR".to_string(),
                    subtotal: 10.0,
                    vat_total: 2.4,
                    total: 12.4,
                    items: Vec::new(),
                },
            })
        }
    }

    struct BrokenRenderer;

    #[async_trait::async_trait]
    impl QrRenderer for BrokenRenderer {
        async fn render(
            &self,
            _link: &str,
            _variant: QrVariant,
        ) -> Result<receipt_core::QrImage, QrError> {
            Err(QrError::LogoMissing)
        }
    }

    fn session(renderer: Arc<dyn QrRenderer>) -> Session<Vec<u8>> {
        let engine =
            EngineHandle::with_parts(Arc::new(CannedPreview), renderer).expect("engine");
        Session::new(EffectRunner::new(engine), Vec::new())
    }

    fn output(session: Session<Vec<u8>>) -> String {
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn plain_qr_is_printed_and_saved() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("qr.svg");
        let mut session = session(Arc::new(SvgQrRenderer::default()));

        let shown = session
            .show_qr("r.example.com", TOKEN, QrVariant::Plain, Some(&target))
            .unwrap();

        assert!(shown);
        assert!(!session.view().qr.open);
        let svg = std::fs::read_to_string(&target).unwrap();
        assert!(svg.starts_with("<svg"));
        let text = output(session);
        assert!(text.contains(&format!("https://r.example.com/r/{TOKEN}")));
        assert!(text.contains("Saved QR image to"));
    }

    #[test]
    fn failed_render_offers_the_link() {
        let mut session = session(Arc::new(BrokenRenderer));

        let shown = session
            .show_qr("r.example.com", "abc", QrVariant::Plain, None)
            .unwrap();

        assert!(!shown);
        let text = output(session);
        assert!(text.contains("Could not generate QR code"));
        assert!(text.contains("Open this link: https://r.example.com/r/abc"));
    }

    #[test]
    fn preview_prints_receipt() {
        let mut session = session(Arc::new(SvgQrRenderer::default()));
        assert!(session.show_preview(TOKEN).unwrap());
        let text = output(session);
        assert!(text.contains("Receipt from acme"));
        assert!(text.contains("Total:    12.40 EUR"));
    }

    #[test]
    fn preview_failure_is_reported() {
        let mut session = session(Arc::new(SvgQrRenderer::default()));
        assert!(!session.show_preview("unknown").unwrap());
        let text = output(session);
        assert!(text.contains("Could not load receipt: Token not found (http status 404)"));
    }

    #[test]
    fn empty_preview_route_stays_idle() {
        let mut session = session(Arc::new(SvgQrRenderer::default()));
        assert!(!session.show_preview("  ").unwrap());
        assert_eq!(output(session), "No receipt token given.\n");
    }

    #[test]
    fn scan_skips_unrecognised_lines_then_previews() {
        let mut session = session(Arc::new(SvgQrRenderer::default()));
        let input = Cursor::new(format!(
            "hello\nnot-a-uuid\nhttps://r.example.com/r/{TOKEN}\nignored\n"
        ));

        assert!(session.scan(None, input).unwrap());
        assert!(session.view().scanner.accepting);
        let text = output(session);
        assert_eq!(text.matches("Unrecognized QR code").count(), 2);
        assert!(text.contains(&format!("Found receipt token {TOKEN}")));
        assert!(text.contains("Receipt from acme"));
    }

    #[test]
    fn scan_without_token_reports_nothing_found() {
        let mut session = session(Arc::new(SvgQrRenderer::default()));
        assert!(!session
            .scan(Some("plain text".to_string()), Cursor::new(""))
            .unwrap());
    }
}
