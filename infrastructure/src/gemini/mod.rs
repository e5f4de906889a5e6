//! Gemini API adapter.
//!
//! - [`protocol`]: wire types and request shaping
//! - [`sse`]: incremental decoding of the streaming endpoint
//! - [`error`]: status and transport error classification
//! - [`client`]: the [`ChatClient`](sidechat_application::ChatClient) implementation

pub mod client;
pub mod error;
pub mod protocol;
pub mod sse;

pub use client::{DEFAULT_BASE_URL, GeminiChatClient, GeminiClientConfig, GeminiClientFactory};
pub use protocol::{GenerationConfig, SAFETY_REFUSAL, SafetySetting, default_safety_settings};
