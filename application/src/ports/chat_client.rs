//! Chat client port
//!
//! Defines the interface for talking to the LLM provider. The client is
//! stateless per request: every call receives the full message history.

use async_trait::async_trait;
use sidechat_domain::{Message, ModelId};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Probe message used by [`ChatClient::test_connection`].
pub const CONNECTION_PROBE: &str = "Hello";

/// Incremental chunk callback. Receives each text increment, never the
/// cumulative text.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Errors surfaced by a chat client.
///
/// Every provider or network failure is classified into one of these
/// before it reaches the session controller. The `Display` text is shown
/// to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("API key is not set. Add your Gemini API key in settings.")]
    NoApiKey,

    #[error("The API key is invalid. Check the key in settings.")]
    InvalidApiKey,

    #[error("Network error. Check your connection and try again.")]
    NetworkError,

    #[error("Rate limit reached. Wait a moment and try again.")]
    RateLimited,

    #[error("The API returned an error. Try again later.")]
    ApiError,

    #[error("An unknown error occurred.")]
    UnknownError,

    /// Provider-supplied error message, passed through verbatim.
    #[error("{0}")]
    Provider(String),

    /// Transport failure that is not a reachability problem.
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Response stopped.")]
    Cancelled,
}

impl ChatError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChatError::Cancelled)
    }

    /// Whether the user has to change settings before retrying.
    pub fn needs_settings(&self) -> bool {
        matches!(self, ChatError::NoApiKey | ChatError::InvalidApiKey)
    }
}

/// Client for one LLM provider.
///
/// Implementations hold only credentials (`api_key`, `model`), which can be
/// swapped through the setters between calls.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Model used for subsequent requests
    fn model(&self) -> ModelId;

    /// Replace the API key used for subsequent requests
    fn set_api_key(&self, api_key: String);

    /// Replace the model used for subsequent requests
    fn set_model(&self, model: ModelId);

    /// Send the history and wait for the complete reply.
    async fn chat(&self, messages: &[Message]) -> Result<String, ChatError>;

    /// Send the history and stream the reply.
    ///
    /// Each text increment is passed to `on_chunk` as it arrives; the full
    /// text is returned when the stream ends. The stream is abandoned with
    /// [`ChatError::Cancelled`] once `cancellation` fires.
    async fn stream_chat_with_cancellation(
        &self,
        messages: &[Message],
        on_chunk: Option<ChunkSink<'_>>,
        cancellation: CancellationToken,
    ) -> Result<String, ChatError>;

    /// Send the history and stream the reply without cancellation support.
    async fn stream_chat(
        &self,
        messages: &[Message],
        on_chunk: Option<ChunkSink<'_>>,
    ) -> Result<String, ChatError> {
        self.stream_chat_with_cancellation(messages, on_chunk, CancellationToken::new())
            .await
    }

    /// Send a fixed probe and report whether a non-empty reply came back.
    ///
    /// Never fails: every error collapses to `false`.
    async fn test_connection(&self) -> bool {
        match self.chat(&[Message::user(CONNECTION_PROBE)]).await {
            Ok(reply) => !reply.is_empty(),
            Err(e) => {
                warn!("Connection test failed: {}", e);
                false
            }
        }
    }
}

/// Builds chat clients from credentials.
///
/// The session controller uses this to re-instantiate its client after a
/// settings change.
pub trait ChatClientFactory: Send + Sync {
    fn create(&self, api_key: &str, model: &ModelId) -> Arc<dyn ChatClient>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String, ChatError>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        fn model(&self) -> ModelId {
            ModelId::default()
        }

        fn set_api_key(&self, _api_key: String) {}

        fn set_model(&self, _model: ModelId) {}

        async fn chat(&self, messages: &[Message]) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply.clone()
        }

        async fn stream_chat_with_cancellation(
            &self,
            messages: &[Message],
            on_chunk: Option<ChunkSink<'_>>,
            _cancellation: CancellationToken,
        ) -> Result<String, ChatError> {
            let reply = self.chat(messages).await?;
            if let Some(sink) = on_chunk {
                sink(&reply);
            }
            Ok(reply)
        }
    }

    fn client(reply: Result<String, ChatError>) -> ScriptedClient {
        ScriptedClient {
            reply,
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_connection_sends_probe() {
        let client = client(Ok("Hi there".to_string()));
        assert!(client.test_connection().await);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec![Message::user(CONNECTION_PROBE)]);
    }

    #[tokio::test]
    async fn test_connection_false_on_empty_reply() {
        assert!(!client(Ok(String::new())).test_connection().await);
    }

    #[tokio::test]
    async fn test_connection_swallows_errors() {
        assert!(!client(Err(ChatError::InvalidApiKey)).test_connection().await);
        assert!(!client(Err(ChatError::NetworkError)).test_connection().await);
    }

    #[tokio::test]
    async fn test_stream_chat_default_passes_sink() {
        let client = client(Ok("streamed".to_string()));
        let mut chunks = Vec::new();
        let mut sink = |c: &str| chunks.push(c.to_string());
        let text = client.stream_chat(&[Message::user("x")], Some(&mut sink)).await.unwrap();
        assert_eq!(text, "streamed");
        assert_eq!(chunks, vec!["streamed"]);
    }

    #[test]
    fn test_error_classification_helpers() {
        assert!(ChatError::Cancelled.is_cancelled());
        assert!(ChatError::NoApiKey.needs_settings());
        assert!(!ChatError::RateLimited.needs_settings());
        assert_eq!(
            ChatError::Provider("Model not found".to_string()).to_string(),
            "Model not found"
        );
    }
}
