//! Gemini chat client.
//!
//! Implements [`ChatClient`] over the `generateContent` REST API. The
//! client keeps only credentials; every call carries the full history.

use super::error::{classify_transport_error, handle_api_error};
use super::protocol::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, SAFETY_REFUSAL,
    SafetySetting, build_request, default_safety_settings,
};
use super::sse::read_event_stream;
use async_trait::async_trait;
use futures::StreamExt;
use sidechat_application::{ChatClient, ChatClientFactory, ChatError, ChunkSink};
use sidechat_domain::{Message, ModelId};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_VERSION: &str = "v1beta";

/// Connection settings shared by every client a factory creates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiClientConfig {
    pub base_url: String,
    pub generation: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
    /// Whole-request timeout for non-streaming calls and connect timeout
    /// for streaming ones.
    pub request_timeout: Duration,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            generation: GenerationConfig::default(),
            safety_settings: default_safety_settings(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    api_key: String,
    model: ModelId,
}

/// [`ChatClient`] for the Gemini API.
pub struct GeminiChatClient {
    http: reqwest::Client,
    config: GeminiClientConfig,
    credentials: RwLock<Credentials>,
}

impl GeminiChatClient {
    pub fn new(api_key: impl Into<String>, model: ModelId) -> Self {
        Self::with_config(api_key, model, GeminiClientConfig::default())
    }

    pub fn with_config(
        api_key: impl Into<String>,
        model: ModelId,
        config: GeminiClientConfig,
    ) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self::with_http_client(http, api_key, model, config)
    }

    /// Build on a shared HTTP client.
    pub fn with_http_client(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: ModelId,
        config: GeminiClientConfig,
    ) -> Self {
        Self {
            http,
            config,
            credentials: RwLock::new(Credentials {
                api_key: api_key.into(),
                model,
            }),
        }
    }

    fn credentials(&self) -> Credentials {
        match self.credentials.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update_credentials(&self, update: impl FnOnce(&mut Credentials)) {
        match self.credentials.write() {
            Ok(mut guard) => update(&mut guard),
            Err(poisoned) => update(&mut poisoned.into_inner()),
        }
    }

    fn endpoint(&self, model: &ModelId, method: &str) -> String {
        format!(
            "{}/{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            API_VERSION,
            model.as_str(),
            method
        )
    }

    fn request_body(&self, messages: &[Message]) -> GenerateContentRequest {
        build_request(
            messages,
            &self.config.generation,
            &self.config.safety_settings,
        )
    }

    /// POST the history and return the response once its status is 2xx.
    async fn send_request(
        &self,
        messages: &[Message],
        streaming: bool,
    ) -> Result<reqwest::Response, ChatError> {
        let Credentials { api_key, model } = self.credentials();
        if api_key.is_empty() {
            return Err(ChatError::NoApiKey);
        }

        let method = if streaming {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        debug!(
            "POST {} ({} messages)",
            self.endpoint(&model, method),
            messages.len()
        );

        let mut request = self
            .http
            .post(self.endpoint(&model, method))
            .query(&[("key", api_key.as_str())])
            .json(&self.request_body(messages));
        if streaming {
            request = request.query(&[("alt", "sse")]);
        } else {
            request = request.timeout(self.config.request_timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = handle_api_error(status.as_u16(), &body);
        warn!("Gemini request failed with status {}: {}", status, error);
        Err(error)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    fn model(&self) -> ModelId {
        self.credentials().model
    }

    fn set_api_key(&self, api_key: String) {
        self.update_credentials(|c| c.api_key = api_key);
    }

    fn set_model(&self, model: ModelId) {
        info!("Switching model to {}", model);
        self.update_credentials(|c| c.model = model);
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, ChatError> {
        let response = self.send_request(messages, false).await?;
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        let response: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Malformed response body: {}", e);
            ChatError::ApiError
        })?;

        if response.is_safety_blocked() {
            debug!("Reply blocked by safety filter");
            return Ok(SAFETY_REFUSAL.to_string());
        }

        match response.first_text() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => {
                warn!("Response contained no text part");
                Err(ChatError::ApiError)
            }
        }
    }

    async fn stream_chat_with_cancellation(
        &self,
        messages: &[Message],
        on_chunk: Option<ChunkSink<'_>>,
        cancellation: CancellationToken,
    ) -> Result<String, ChatError> {
        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ChatError::Cancelled),
            response = self.send_request(messages, true) => response?,
        };

        let body = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| classify_transport_error(&e))),
        );
        read_event_stream(body, on_chunk, cancellation).await
    }
}

/// Creates [`GeminiChatClient`]s sharing one HTTP connection pool.
pub struct GeminiClientFactory {
    http: reqwest::Client,
    config: GeminiClientConfig,
}

impl GeminiClientFactory {
    pub fn new(config: GeminiClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { http, config }
    }

    pub fn config(&self) -> &GeminiClientConfig {
        &self.config
    }
}

impl Default for GeminiClientFactory {
    fn default() -> Self {
        Self::new(GeminiClientConfig::default())
    }
}

impl ChatClientFactory for GeminiClientFactory {
    fn create(&self, api_key: &str, model: &ModelId) -> Arc<dyn ChatClient> {
        Arc::new(GeminiChatClient::with_http_client(
            self.http.clone(),
            api_key,
            model.clone(),
            self.config.clone(),
        ))
    }
}
