use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use receipt_core::{QrVariant, Ticket};
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchSettings, PreviewClient, ReqwestPreviewClient};
use crate::logo::HttpLogoSource;
use crate::qr::{QrRenderer, SvgQrRenderer};
use crate::timer::dismiss_after;
use crate::{EngineEvent, FetchError};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub functions_base_url: String,
    pub api_key: Option<String>,
    pub logo_url: Option<String>,
    pub module_px: usize,
    pub fetch: FetchSettings,
}

impl EngineConfig {
    pub fn new(functions_base_url: impl Into<String>) -> Self {
        Self {
            functions_base_url: functions_base_url.into(),
            api_key: None,
            logo_url: None,
            module_px: 8,
            fetch: FetchSettings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(#[from] FetchError),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    RenderQr {
        ticket: Ticket,
        link: String,
        variant: QrVariant,
    },
    FetchPreview {
        ticket: Ticket,
        token_id: String,
    },
    StartTimer {
        ticket: Ticket,
        after: Duration,
    },
    Cancel {
        ticket: Ticket,
    },
    Finished {
        ticket: Ticket,
    },
    Shutdown,
}

/// Runs renders, fetches and timers on a background tokio runtime.
///
/// Every operation is tied to the ticket it was started under. `cancel`
/// aborts the operation through its `CancellationToken`, and no event is
/// emitted for it afterwards.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let preview = Arc::new(ReqwestPreviewClient::new(
            &config.functions_base_url,
            config.api_key.as_deref(),
            config.fetch.clone(),
        )?);
        let mut renderer = SvgQrRenderer::new(config.module_px);
        if let Some(url) = config.logo_url.as_deref() {
            renderer = renderer.with_logo(Arc::new(HttpLogoSource::new(url, &config.fetch)?));
        }
        Self::with_parts(preview, Arc::new(renderer))
    }

    pub fn with_parts(
        preview: Arc<dyn PreviewClient>,
        renderer: Arc<dyn QrRenderer>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let worker = Worker {
            runtime,
            preview,
            renderer,
            event_tx,
            done_tx: cmd_tx.clone(),
            in_flight: HashMap::new(),
        };

        thread::spawn(move || worker.run(cmd_rx));

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn render_qr(&self, ticket: Ticket, link: impl Into<String>, variant: QrVariant) {
        self.send(EngineCommand::RenderQr {
            ticket,
            link: link.into(),
            variant,
        });
    }

    pub fn fetch_preview(&self, ticket: Ticket, token_id: impl Into<String>) {
        self.send(EngineCommand::FetchPreview {
            ticket,
            token_id: token_id.into(),
        });
    }

    pub fn start_timer(&self, ticket: Ticket, after: Duration) {
        self.send(EngineCommand::StartTimer { ticket, after });
    }

    pub fn cancel(&self, ticket: Ticket) {
        self.send(EngineCommand::Cancel { ticket });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

struct Worker {
    runtime: tokio::runtime::Runtime,
    preview: Arc<dyn PreviewClient>,
    renderer: Arc<dyn QrRenderer>,
    event_tx: mpsc::Sender<EngineEvent>,
    done_tx: mpsc::Sender<EngineCommand>,
    in_flight: HashMap<Ticket, CancellationToken>,
}

impl Worker {
    fn run(mut self, cmd_rx: mpsc::Receiver<EngineCommand>) {
        while let Ok(command) = cmd_rx.recv() {
            match command {
                EngineCommand::RenderQr {
                    ticket,
                    link,
                    variant,
                } => {
                    let renderer = self.renderer.clone();
                    self.spawn(ticket, async move {
                        let result = renderer.render(&link, variant).await;
                        EngineEvent::QrRendered { ticket, result }
                    });
                }
                EngineCommand::FetchPreview { ticket, token_id } => {
                    let preview = self.preview.clone();
                    self.spawn(ticket, async move {
                        let result = preview.fetch_preview(&token_id).await;
                        EngineEvent::PreviewFetched { ticket, result }
                    });
                }
                EngineCommand::StartTimer { ticket, after } => {
                    let cancel = self.register(ticket);
                    let event_tx = self.event_tx.clone();
                    let done_tx = self.done_tx.clone();
                    self.runtime.spawn(async move {
                        if dismiss_after(after, &cancel).await {
                            let _ = event_tx.send(EngineEvent::DismissElapsed { ticket });
                        }
                        let _ = done_tx.send(EngineCommand::Finished { ticket });
                    });
                }
                EngineCommand::Cancel { ticket } => {
                    if let Some(token) = self.in_flight.remove(&ticket) {
                        engine_debug!("Cancelling ticket {}", ticket);
                        token.cancel();
                    }
                }
                EngineCommand::Finished { ticket } => {
                    self.in_flight.remove(&ticket);
                }
                EngineCommand::Shutdown => break,
            }
        }

        for (_, token) in self.in_flight.drain() {
            token.cancel();
        }
        engine_info!("Engine worker stopped");
    }

    fn register(&mut self, ticket: Ticket) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.insert(ticket, token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Runs `work` until it finishes or its ticket is cancelled; only a
    /// finished operation reports an event.
    fn spawn<F>(&mut self, ticket: Ticket, work: F)
    where
        F: std::future::Future<Output = EngineEvent> + Send + 'static,
    {
        let cancel = self.register(ticket);
        let event_tx = self.event_tx.clone();
        let done_tx = self.done_tx.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    engine_debug!("Ticket {} cancelled before completion", ticket);
                }
                event = work => {
                    let _ = event_tx.send(event);
                }
            }
            let _ = done_tx.send(EngineCommand::Finished { ticket });
        });
    }
}
