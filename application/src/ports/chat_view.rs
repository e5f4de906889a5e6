//! Chat view port
//!
//! Rendering callbacks driven by the session controller. Implementations
//! live in the presentation layer (terminal REPL, or any other surface).

/// Rendering surface for one chat session.
///
/// Streaming text is passed as plain text; only the completed response
/// goes through [`complete_response`](Self::complete_response), where a
/// view may apply markdown formatting.
pub trait ChatView: Send + Sync {
    /// A user message was accepted and added to the history.
    fn show_user_message(&self, text: &str);

    /// A response placeholder should appear.
    fn begin_response(&self);

    /// The in-progress response changed. `text_so_far` is every chunk
    /// received so far, concatenated.
    fn update_response(&self, text_so_far: &str);

    /// The response finished; render `text` in its final form.
    fn complete_response(&self, text: &str);

    /// The response failed; remove the placeholder.
    fn discard_response(&self);

    /// Show a user-visible error.
    fn show_error(&self, message: &str);

    /// Return to the initial, pre-conversation state.
    fn reset(&self);
}

/// View that renders nothing
pub struct NoChatView;

impl ChatView for NoChatView {
    fn show_user_message(&self, _text: &str) {}
    fn begin_response(&self) {}
    fn update_response(&self, _text_so_far: &str) {}
    fn complete_response(&self, _text: &str) {}
    fn discard_response(&self) {}
    fn show_error(&self, _message: &str) {}
    fn reset(&self) {}
}
