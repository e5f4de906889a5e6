//! Chat session controller.
//!
//! Owns the in-memory conversation of one chat surface and drives a
//! request through the [`ChatClient`] while keeping the [`ChatView`] in
//! step:
//!
//! ```text
//! Idle --send(text)--> AwaitingResponse
//!   entry: append user message, render it, open a response placeholder,
//!          stream_chat(priming pair + history)
//!   chunk: append to display buffer, re-render as plain text
//! AwaitingResponse --success--> Idle   (final render, history += assistant)
//! AwaitingResponse --failure--> Idle   (placeholder discarded, error shown)
//! ```

use crate::ports::chat_client::{ChatClient, ChatClientFactory, ChatError};
use crate::ports::chat_view::ChatView;
use crate::use_cases::settings_store::{SettingsError, SettingsEvent, SettingsStore};
use sidechat_domain::{
    Conversation, Message, ModelId, SessionState, Settings, is_sendable, is_valid_api_key,
    primed_history,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of [`ChatSessionController::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or a request was already in flight.
    Ignored,
    /// The reply was received and added to the history.
    Responded(String),
    /// The request failed; the history holds the user message only.
    Failed(ChatError),
}

/// Result of [`ChatSessionController::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// A response is streaming; clearing now would orphan its callbacks.
    Busy,
}

/// Controller for one chat surface.
pub struct ChatSessionController {
    client: RwLock<Arc<dyn ChatClient>>,
    client_factory: Arc<dyn ChatClientFactory>,
    settings_store: Arc<SettingsStore>,
    view: Arc<dyn ChatView>,
    conversation: Mutex<Conversation>,
    system_prompt: RwLock<Option<String>>,
    loading: AtomicBool,
    cancellation: Mutex<Option<CancellationToken>>,
}

/// Resets the loading flag when a send finishes, including when the send
/// future is dropped mid-stream.
struct InFlight<'a> {
    controller: &'a ChatSessionController,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.controller.cancellation.lock() {
            slot.take();
        }
        self.controller.loading.store(false, Ordering::SeqCst);
    }
}

impl ChatSessionController {
    /// Create a controller from stored settings.
    pub async fn load(
        client_factory: Arc<dyn ChatClientFactory>,
        settings_store: Arc<SettingsStore>,
        view: Arc<dyn ChatView>,
    ) -> Result<Self, SettingsError> {
        let settings = settings_store.get_settings().await?;
        let client = build_client(client_factory.as_ref(), &settings);

        Ok(Self {
            client: RwLock::new(client),
            client_factory,
            settings_store,
            view,
            conversation: Mutex::new(Conversation::new()),
            system_prompt: RwLock::new(settings.system_prompt().map(str::to_string)),
            loading: AtomicBool::new(false),
            cancellation: Mutex::new(None),
        })
    }

    /// Override the system prompt for this session only.
    pub fn set_system_prompt(&self, prompt: Option<String>) {
        let prompt = prompt.filter(|p| !p.trim().is_empty());
        *write_lock(&self.system_prompt) = prompt;
    }

    pub fn system_prompt(&self) -> Option<String> {
        read_lock(&self.system_prompt).clone()
    }

    /// Override the model for this session only.
    pub fn set_model(&self, model: ModelId) {
        self.current_client().set_model(model);
    }

    pub fn model(&self) -> ModelId {
        self.current_client().model()
    }

    pub fn state(&self) -> SessionState {
        if self.loading.load(Ordering::SeqCst) {
            SessionState::AwaitingResponse
        } else {
            SessionState::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// Snapshot of the conversation history.
    pub fn history(&self) -> Vec<Message> {
        self.conversation
            .lock()
            .map(|c| c.messages().to_vec())
            .unwrap_or_default()
    }

    /// Send `text` and stream the reply into the view.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if !is_sendable(text) {
            return SendOutcome::Ignored;
        }
        if self.loading.swap(true, Ordering::SeqCst) {
            debug!("Send ignored: a response is already streaming");
            return SendOutcome::Ignored;
        }
        let _in_flight = InFlight { controller: self };

        let text = text.trim();
        let cancellation = CancellationToken::new();
        if let Ok(mut slot) = self.cancellation.lock() {
            *slot = Some(cancellation.clone());
        }

        let outbound = {
            let mut conversation = lock(&self.conversation);
            conversation.add_user_message(text);
            primed_history(self.system_prompt().as_deref(), conversation.messages())
        };
        self.view.show_user_message(text);
        self.view.begin_response();

        let client = self.current_client();
        info!(
            model = %client.model(),
            messages = outbound.len(),
            "Sending chat request"
        );

        let view = Arc::clone(&self.view);
        let mut display = String::new();
        let mut on_chunk = |chunk: &str| {
            display.push_str(chunk);
            view.update_response(&display);
        };

        let result = client
            .stream_chat_with_cancellation(&outbound, Some(&mut on_chunk), cancellation)
            .await;

        match result {
            Ok(full_text) => {
                self.view.complete_response(&full_text);
                lock(&self.conversation).add_assistant_message(full_text.clone());
                debug!("Response complete ({} bytes)", full_text.len());
                SendOutcome::Responded(full_text)
            }
            Err(e) => {
                if e.is_cancelled() {
                    info!("Response cancelled by user");
                } else {
                    warn!("Chat request failed: {}", e);
                }
                self.view.discard_response();
                self.view.show_error(&e.to_string());
                SendOutcome::Failed(e)
            }
        }
    }

    /// Stop the response that is currently streaming, if any.
    ///
    /// Returns `true` when a request was in flight.
    pub fn cancel(&self) -> bool {
        match self.cancellation.lock().ok().and_then(|slot| slot.clone()) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the history and return the view to its initial state.
    ///
    /// Refused while a response is streaming.
    pub fn clear(&self) -> ClearOutcome {
        if self.is_loading() {
            debug!("Clear refused: a response is streaming");
            return ClearOutcome::Busy;
        }
        lock(&self.conversation).clear();
        self.view.reset();
        ClearOutcome::Cleared
    }

    /// Probe the provider with the current client.
    pub async fn test_connection(&self) -> bool {
        self.current_client().test_connection().await
    }

    /// React to a settings notification by rebuilding the client.
    pub async fn handle_settings_event(&self, event: SettingsEvent) -> Result<(), SettingsError> {
        match event {
            SettingsEvent::SettingsUpdated => {
                let settings = self.settings_store.get_settings().await?;
                let client = build_client(self.client_factory.as_ref(), &settings);
                *write_lock(&self.client) = client;
                self.set_system_prompt(settings.system_prompt().map(str::to_string));
                info!("Chat client reloaded (model: {})", settings.model);
                Ok(())
            }
        }
    }

    /// Spawn a task that applies settings notifications until the channel closes.
    pub fn watch_settings(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<SettingsEvent>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(e) = controller.handle_settings_event(event).await {
                            warn!("Failed to reload settings: {}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Skipped {} stale settings events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn current_client(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&read_lock(&self.client))
    }
}

/// Build a client, refusing a stored key with the wrong shape.
fn build_client(factory: &dyn ChatClientFactory, settings: &Settings) -> Arc<dyn ChatClient> {
    let api_key = if settings.has_api_key() && !is_valid_api_key(&settings.api_key) {
        warn!("Stored API key has an unexpected shape; ignoring it");
        ""
    } else {
        settings.api_key.as_str()
    };
    factory.create(api_key, &settings.model)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_client::ChunkSink;
    use crate::use_cases::settings_store::tests::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use sidechat_domain::{PRIMING_ACKNOWLEDGEMENT, Role, SettingsPatch};
    use std::collections::VecDeque;

    // ==================== Test Mocks ====================

    /// Client that replays scripted chunk lists and records every request.
    struct MockClient {
        api_key: Mutex<String>,
        model: Mutex<ModelId>,
        replies: Mutex<VecDeque<Result<Vec<String>, ChatError>>>,
        requests: Arc<Mutex<Vec<Vec<Message>>>>,
        wait_for_cancel: bool,
    }

    #[async_trait]
    impl ChatClient for MockClient {
        fn model(&self) -> ModelId {
            self.model.lock().unwrap().clone()
        }

        fn set_api_key(&self, api_key: String) {
            *self.api_key.lock().unwrap() = api_key;
        }

        fn set_model(&self, model: ModelId) {
            *self.model.lock().unwrap() = model;
        }

        async fn chat(&self, messages: &[Message]) -> Result<String, ChatError> {
            self.stream_chat(messages, None).await
        }

        async fn stream_chat_with_cancellation(
            &self,
            messages: &[Message],
            mut on_chunk: Option<ChunkSink<'_>>,
            cancellation: CancellationToken,
        ) -> Result<String, ChatError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            if self.api_key.lock().unwrap().is_empty() {
                return Err(ChatError::NoApiKey);
            }
            if self.wait_for_cancel {
                cancellation.cancelled().await;
                return Err(ChatError::Cancelled);
            }
            let chunks = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ChatError::UnknownError))?;
            let mut full = String::new();
            for chunk in chunks {
                if let Some(sink) = on_chunk.as_mut() {
                    sink(&chunk);
                }
                full.push_str(&chunk);
            }
            Ok(full)
        }
    }

    struct MockFactory {
        replies: Mutex<VecDeque<Result<Vec<String>, ChatError>>>,
        requests: Arc<Mutex<Vec<Vec<Message>>>>,
        created_with: Mutex<Vec<(String, ModelId)>>,
        wait_for_cancel: bool,
    }

    impl MockFactory {
        fn new(replies: Vec<Result<Vec<&str>, ChatError>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(|chunks| chunks.into_iter().map(String::from).collect()))
                        .collect(),
                ),
                requests: Arc::new(Mutex::new(Vec::new())),
                created_with: Mutex::new(Vec::new()),
                wait_for_cancel: false,
            }
        }
    }

    impl ChatClientFactory for MockFactory {
        fn create(&self, api_key: &str, model: &ModelId) -> Arc<dyn ChatClient> {
            self.created_with
                .lock()
                .unwrap()
                .push((api_key.to_string(), model.clone()));
            // Each client drains the shared script.
            let replies = std::mem::take(&mut *self.replies.lock().unwrap());
            Arc::new(MockClient {
                api_key: Mutex::new(api_key.to_string()),
                model: Mutex::new(model.clone()),
                replies: Mutex::new(replies),
                requests: Arc::clone(&self.requests),
                wait_for_cancel: self.wait_for_cancel,
            })
        }
    }

    /// View that records every callback as a line.
    #[derive(Default)]
    struct RecordingView {
        events: Mutex<Vec<String>>,
    }

    impl RecordingView {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ChatView for RecordingView {
        fn show_user_message(&self, text: &str) {
            self.record(format!("user:{}", text));
        }
        fn begin_response(&self) {
            self.record("begin".to_string());
        }
        fn update_response(&self, text_so_far: &str) {
            self.record(format!("update:{}", text_so_far));
        }
        fn complete_response(&self, text: &str) {
            self.record(format!("complete:{}", text));
        }
        fn discard_response(&self) {
            self.record("discard".to_string());
        }
        fn show_error(&self, message: &str) {
            self.record(format!("error:{}", message));
        }
        fn reset(&self) {
            self.record("reset".to_string());
        }
    }

    fn valid_key() -> String {
        format!("AIza{}", "k".repeat(35))
    }

    async fn setup(
        factory: MockFactory,
        stored: serde_json::Value,
    ) -> (Arc<ChatSessionController>, Arc<MockFactory>, Arc<RecordingView>, Arc<SettingsStore>) {
        let memory = MemoryStore::default();
        if let serde_json::Value::Object(items) = stored {
            memory.items.lock().unwrap().extend(items);
        }
        let store = Arc::new(SettingsStore::new(Arc::new(memory)));
        let factory = Arc::new(factory);
        let view = Arc::new(RecordingView::default());
        let controller = ChatSessionController::load(factory.clone(), store.clone(), view.clone())
            .await
            .unwrap();
        (Arc::new(controller), factory, view, store)
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_hello_sends_single_user_message() {
        let factory = MockFactory::new(vec![Ok(vec!["Hi", " there"])]);
        let (controller, factory, view, _) = setup(factory, json!({ "apiKey": valid_key() })).await;

        let outcome = controller.send("hello").await;

        assert_eq!(outcome, SendOutcome::Responded("Hi there".to_string()));
        let requests = factory.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], vec![Message::user("hello")]);
        assert_eq!(
            view.events(),
            vec![
                "user:hello",
                "begin",
                "update:Hi",
                "update:Hi there",
                "complete:Hi there"
            ]
        );
        assert_eq!(
            controller.history(),
            vec![Message::user("hello"), Message::assistant("Hi there")]
        );
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_system_prompt_primes_request() {
        let factory = MockFactory::new(vec![Ok(vec!["ok"])]);
        let (controller, factory, _, _) = setup(
            factory,
            json!({ "apiKey": valid_key(), "systemPrompt": "be terse" }),
        )
        .await;

        controller.send("hello").await;

        let requests = factory.requests.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].role, Role::User);
        assert!(sent[0].content.contains("be terse"));
        assert_eq!(sent[1], Message::assistant(PRIMING_ACKNOWLEDGEMENT));
        assert_eq!(sent[2], Message::user("hello"));
        // The priming pair never lands in the history.
        assert_eq!(controller.history().len(), 2);
    }

    #[tokio::test]
    async fn test_history_is_resent_in_order() {
        let factory = MockFactory::new(vec![Ok(vec!["one"]), Ok(vec!["two"])]);
        let (controller, factory, _, _) = setup(factory, json!({ "apiKey": valid_key() })).await;

        controller.send("first").await;
        controller.send("second").await;

        let requests = factory.requests.lock().unwrap();
        assert_eq!(
            requests[1],
            vec![
                Message::user("first"),
                Message::assistant("one"),
                Message::user("second")
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let factory = MockFactory::new(vec![]);
        let (controller, factory, view, _) = setup(factory, json!({ "apiKey": valid_key() })).await;

        assert_eq!(controller.send("   \n").await, SendOutcome::Ignored);
        assert!(factory.requests.lock().unwrap().is_empty());
        assert!(view.events().is_empty());
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_failure_discards_placeholder_and_keeps_history_clean() {
        let factory = MockFactory::new(vec![Err(ChatError::RateLimited)]);
        let (controller, _, view, _) = setup(factory, json!({ "apiKey": valid_key() })).await;

        let outcome = controller.send("hello").await;

        assert_eq!(outcome, SendOutcome::Failed(ChatError::RateLimited));
        assert_eq!(
            view.events(),
            vec![
                "user:hello".to_string(),
                "begin".to_string(),
                "discard".to_string(),
                format!("error:{}", ChatError::RateLimited),
            ]
        );
        assert_eq!(controller.history(), vec![Message::user("hello")]);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_missing_api_key_surfaces_error() {
        let factory = MockFactory::new(vec![Ok(vec!["unused"])]);
        let (controller, _, _, _) = setup(factory, json!({})).await;

        assert_eq!(
            controller.send("hello").await,
            SendOutcome::Failed(ChatError::NoApiKey)
        );
    }

    #[tokio::test]
    async fn test_malformed_stored_key_is_not_used() {
        let factory = MockFactory::new(vec![]);
        let (_, factory, _, _) = setup(factory, json!({ "apiKey": "abc" })).await;

        let created = factory.created_with.lock().unwrap();
        assert_eq!(created[0].0, "");
    }

    #[tokio::test]
    async fn test_second_send_while_streaming_is_ignored_and_cancel_works() {
        let mut factory = MockFactory::new(vec![]);
        factory.wait_for_cancel = true;
        let (controller, factory, view, _) = setup(factory, json!({ "apiKey": valid_key() })).await;

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.send("first").await })
        };
        while !controller.is_loading() {
            tokio::task::yield_now().await;
        }

        assert_eq!(controller.send("second").await, SendOutcome::Ignored);
        assert_eq!(controller.clear(), ClearOutcome::Busy);

        // Wait until the request has reached the client before cancelling.
        while factory.requests.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(controller.cancel());
        assert_eq!(
            first.await.unwrap(),
            SendOutcome::Failed(ChatError::Cancelled)
        );
        assert!(view.events().contains(&"discard".to_string()));
        assert_eq!(factory.requests.lock().unwrap().len(), 1);
        assert!(!controller.cancel());
    }

    #[tokio::test]
    async fn test_clear_resets_history_and_is_idempotent() {
        let factory = MockFactory::new(vec![Ok(vec!["hi"])]);
        let (controller, _, view, _) = setup(factory, json!({ "apiKey": valid_key() })).await;
        controller.send("hello").await;

        assert_eq!(controller.clear(), ClearOutcome::Cleared);
        assert!(controller.history().is_empty());
        assert_eq!(controller.clear(), ClearOutcome::Cleared);
        assert!(controller.history().is_empty());
        assert_eq!(
            view.events().iter().filter(|e| *e == "reset").count(),
            2
        );
    }

    #[tokio::test]
    async fn test_settings_update_rebuilds_client() {
        let factory = MockFactory::new(vec![]);
        let (controller, factory, _, store) = setup(factory, json!({})).await;

        store
            .save_settings(
                SettingsPatch::new()
                    .with_api_key(valid_key())
                    .with_model(ModelId::Gemini15Pro)
                    .with_system_prompt("be terse"),
            )
            .await
            .unwrap();
        controller
            .handle_settings_event(SettingsEvent::SettingsUpdated)
            .await
            .unwrap();

        let created = factory.created_with.lock().unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1], (valid_key(), ModelId::Gemini15Pro));
        assert_eq!(controller.model(), ModelId::Gemini15Pro);
        assert_eq!(controller.system_prompt().as_deref(), Some("be terse"));
    }

    #[tokio::test]
    async fn test_watch_settings_applies_broadcast() {
        let factory = MockFactory::new(vec![]);
        let (controller, _, _, store) = setup(factory, json!({})).await;
        let handle = controller.watch_settings(store.subscribe());

        store
            .save_settings(SettingsPatch::new().with_model(ModelId::Gemini25Flash))
            .await
            .unwrap();

        while controller.model() != ModelId::Gemini25Flash {
            tokio::task::yield_now().await;
        }
        handle.abort();
    }
}
