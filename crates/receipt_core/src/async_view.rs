//! Generic `idle → loading → ready | error` container shared by every screen.
//!
//! Each activation is identified by a [`Ticket`]. Results are applied only when
//! they carry the ticket of the current activation; anything else is stale and
//! dropped without touching the state.

/// Identifies one activation of an asynchronous operation.
pub type Ticket = u64;

/// Hands out unique tickets across all screens of an app state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCounter {
    next: Ticket,
}

impl Default for TicketCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TicketCounter {
    pub fn issue(&mut self) -> Ticket {
        let ticket = self.next;
        self.next += 1;
        ticket
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T, F = ()> {
    Idle,
    Loading,
    Ready(T),
    Error { message: String, fallback: F },
}

impl<T, F> ViewState<T, F> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Failure reported for an activation: a human readable message plus the
/// fallback value shown instead of the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure<F> {
    pub message: String,
    pub fallback: F,
}

impl<F> Failure<F> {
    pub fn new(message: impl Into<String>, fallback: F) -> Self {
        Self {
            message: message.into(),
            fallback,
        }
    }
}

/// Outcome of [`AsyncView::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncView<T, F = ()> {
    state: ViewState<T, F>,
    active: Option<Ticket>,
}

impl<T, F> Default for AsyncView<T, F> {
    fn default() -> Self {
        Self {
            state: ViewState::Idle,
            active: None,
        }
    }
}

impl<T, F> AsyncView<T, F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<T, F> {
        &self.state
    }

    pub fn active_ticket(&self) -> Option<Ticket> {
        self.active
    }

    /// Enters `Loading` under `ticket`. Returns the ticket that was superseded,
    /// if an operation was still in flight.
    pub fn activate(&mut self, ticket: Ticket) -> Option<Ticket> {
        let superseded = self.in_flight();
        self.active = Some(ticket);
        self.state = ViewState::Loading;
        superseded
    }

    /// Returns to `Idle`. Returns the in-flight ticket, which the caller
    /// should cancel.
    pub fn deactivate(&mut self) -> Option<Ticket> {
        let in_flight = self.in_flight();
        self.active = None;
        self.state = ViewState::Idle;
        in_flight
    }

    /// Applies a result if `ticket` is the current activation and it is still
    /// loading. A resolved activation cannot be resolved twice.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<T, Failure<F>>) -> Resolution {
        if self.in_flight() != Some(ticket) {
            return Resolution::Stale;
        }
        self.state = match result {
            Ok(value) => ViewState::Ready(value),
            Err(Failure { message, fallback }) => ViewState::Error { message, fallback },
        };
        Resolution::Applied
    }

    fn in_flight(&self) -> Option<Ticket> {
        if self.state.is_loading() {
            self.active
        } else {
            None
        }
    }
}
