//! Domain layer for sidechat
//!
//! This crate contains the core entities, value objects and rules of the
//! chat client. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## Conversation
//!
//! One open chat surface owns one [`Conversation`]: an ordered, append-only
//! list of [`Message`]s that is never persisted. A configured system
//! prompt is not stored in the history; it is injected as a priming pair
//! (see [`session::priming`]) each time the history goes over the wire.
//!
//! ## Settings
//!
//! [`Settings`] is a typed record (API key, model, system prompt) plus an
//! open-ended `extra` map, resolved from the fixed [`SettingsKey`] set.

pub mod core;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use core::{error::DomainError, model::ModelId};
pub use session::{
    entities::{Conversation, Message, Role},
    priming::{PRIMING_ACKNOWLEDGEMENT, primed_history},
    state::{SessionState, is_sendable},
};
pub use settings::{
    api_key::{API_KEY_MIN_LEN, API_KEY_PREFIX, is_valid_api_key, mask_api_key, validate_api_key},
    entities::{Settings, SettingsPatch},
    keys::{SettingsKey, SettingsKeyInfo, known_keys},
};
