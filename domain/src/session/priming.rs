//! System-prompt priming.
//!
//! The provider request has no system role in this client. A configured
//! system prompt is instead sent as a synthetic user turn carrying the
//! instruction, followed by a synthetic assistant acknowledgement, ahead
//! of the real history.

use super::entities::Message;

/// Assistant acknowledgement that follows the instruction turn.
pub const PRIMING_ACKNOWLEDGEMENT: &str =
    "Understood. I will follow these instructions for the rest of our conversation.";

/// Build the user turn that carries the instruction text.
pub fn instruction_message(system_prompt: &str) -> Message {
    Message::user(format!(
        "Please follow these instructions for the rest of our conversation:\n\n{}",
        system_prompt.trim()
    ))
}

/// Prefix `history` with the priming pair when `system_prompt` is non-blank.
///
/// The history itself is never modified; the returned vector is what goes
/// over the wire.
pub fn primed_history(system_prompt: Option<&str>, history: &[Message]) -> Vec<Message> {
    match system_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prompt) => {
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(instruction_message(prompt));
            messages.push(Message::assistant(PRIMING_ACKNOWLEDGEMENT));
            messages.extend_from_slice(history);
            messages
        }
        None => history.to_vec(),
    }
}
