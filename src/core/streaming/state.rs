use parking_lot::RwLock;
use tracing::{trace, warn};

/// Lifecycle of one streaming exchange.
///
/// ```text
/// Connecting -> Connected -> Streaming -> Finishing -> Closed
///      \____________\____________\____________\______-> Errored
/// ```
///
/// `Closed` and `Errored` are absorbing. A caller cancellation moves any
/// live state straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Connecting,
    Connected,
    Streaming,
    Finishing,
    Closed,
    Errored,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    pub fn can_transition_to(self, next: StreamState) -> bool {
        use StreamState::*;
        match (self, next) {
            (Closed | Errored, _) => false,
            (_, Errored | Closed) => true,
            (Connecting, Connected) => true,
            (Connected, Streaming) => true,
            (Streaming, Finishing) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Streaming => "streaming",
            Self::Finishing => "finishing",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// State shared between the exchange task and its [`RecognitionStream`](super::RecognitionStream).
#[derive(Debug)]
pub(crate) struct StateCell {
    state: RwLock<StreamState>,
}

impl StateCell {
    pub fn new(initial: StreamState) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> StreamState {
        *self.state.read()
    }

    /// Move to `next` if the transition is legal.
    pub fn advance(&self, next: StreamState) -> bool {
        let mut state = self.state.write();
        if state.can_transition_to(next) {
            trace!("Stream state {} -> {}", *state, next);
            *state = next;
            true
        } else {
            warn!("Ignoring illegal stream transition {} -> {}", *state, next);
            false
        }
    }
}
