//! Chat session domain.
//!
//! - [`entities::Conversation`] - the in-memory history of one open chat surface
//! - [`entities::Message`] - a single message within a conversation
//! - [`state::SessionState`] - idle / awaiting-response state machine
//! - [`priming`] - system-prompt priming pair injected before the history

pub mod entities;
pub mod priming;
pub mod state;
