//! Session state machine

/// State of a chat session.
///
/// ```text
/// Idle --send(text)--> AwaitingResponse --success/failure--> Idle
/// ```
///
/// At most one request is in flight per session; a send attempted while
/// `AwaitingResponse` is dropped, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingResponse,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::AwaitingResponse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingResponse => "awaiting_response",
        }
    }
}

/// Whether `text` is worth sending: anything but empty or whitespace-only.
pub fn is_sendable(text: &str) -> bool {
    !text.trim().is_empty()
}
