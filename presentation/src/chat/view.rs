//! Terminal rendering of a chat session.

use crate::output::markdown::MarkdownRenderer;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sidechat_application::ChatView;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tracing::trace;

const ASSISTANT_LABEL: &str = "Gemini";

#[derive(Default)]
struct ResponseState {
    spinner: Option<ProgressBar>,
    /// Bytes of the streamed text already consumed.
    consumed: usize,
    /// Tail of the stream after the last newline.
    pending_line: String,
    renderer: MarkdownRenderer,
    header_printed: bool,
}

/// [`ChatView`] that prints to a terminal.
///
/// A spinner runs until the first chunk arrives. Streamed text is then
/// printed line by line with light markdown styling.
pub struct TerminalChatView {
    out: Mutex<Box<dyn Write + Send>>,
    show_progress: bool,
    state: Mutex<ResponseState>,
}

impl TerminalChatView {
    pub fn stdout(show_progress: bool) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), show_progress)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, show_progress: bool) -> Self {
        Self {
            out: Mutex::new(out),
            show_progress,
            state: Mutex::new(ResponseState::default()),
        }
    }

    fn spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        // A closed terminal is not worth failing the session over.
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn writeln(&self, text: &str) {
        self.write(&format!("{}\n", text));
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn print_header(&self, state: &mut ResponseState) {
        if let Some(spinner) = state.spinner.take() {
            spinner.finish_and_clear();
        }
        if !state.header_printed {
            self.writeln(&format!("{}", ASSISTANT_LABEL.bold().green()));
            state.header_printed = true;
        }
    }

    /// Print every complete line in `pending_line`.
    fn drain_lines(&self, state: &mut ResponseState) {
        while let Some(pos) = state.pending_line.find('\n') {
            let line: String = state.pending_line.drain(..=pos).collect();
            let rendered = state.renderer.render_line(line.trim_end_matches(['\n', '\r']));
            self.writeln(&rendered);
        }
    }
}

impl ChatView for TerminalChatView {
    fn show_user_message(&self, text: &str) {
        // The line editor already echoed it.
        trace!("User message accepted ({} bytes)", text.len());
    }

    fn begin_response(&self) {
        let mut state = self.lock_state();
        *state = ResponseState::default();
        if self.show_progress {
            state.spinner = Some(Self::spinner());
        }
    }

    fn update_response(&self, text_so_far: &str) {
        let mut state = self.lock_state();
        self.print_header(&mut state);

        if let Some(delta) = text_so_far.get(state.consumed..) {
            state.pending_line.push_str(delta);
        }
        state.consumed = text_so_far.len();
        self.drain_lines(&mut state);
    }

    fn complete_response(&self, text: &str) {
        let mut state = self.lock_state();
        self.print_header(&mut state);

        // Text that never streamed (or arrived whole) is rendered here.
        if let Some(rest) = text.get(state.consumed..) {
            state.pending_line.push_str(rest);
        }
        state.pending_line.push('\n');
        self.drain_lines(&mut state);
        self.writeln("");

        *state = ResponseState::default();
    }

    fn discard_response(&self) {
        let mut state = self.lock_state();
        if let Some(spinner) = state.spinner.take() {
            spinner.finish_and_clear();
        }
        if state.header_printed {
            if !state.pending_line.is_empty() {
                self.writeln(&state.pending_line);
            }
            self.writeln(&format!("{}", "[response discarded]".dimmed()));
        }
        *state = ResponseState::default();
    }

    fn show_error(&self, message: &str) {
        self.writeln(&format!("{} {}", "Error:".red().bold(), message));
    }

    fn reset(&self) {
        *self.lock_state() = ResponseState::default();
        self.writeln(&format!("{}", "Conversation cleared.".dimmed()));
    }
}
