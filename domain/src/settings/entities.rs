//! Settings entities and merge rules

use super::api_key::validate_api_key;
use super::keys::SettingsKey;
use crate::core::error::DomainError;
use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fully resolved user settings.
///
/// Typed fields cover what the chat client needs; anything else written
/// under the freeform `settings` key is kept in `extra` so new fields can
/// be added without touching the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub model: ModelId,
    pub system_prompt: String,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Resolve settings from raw host storage.
    ///
    /// Layering (lowest to highest): defaults, then the freeform blob, then
    /// the individual typed keys. Values of the wrong JSON type are ignored.
    pub fn from_storage(stored: &Map<String, Value>) -> Self {
        let mut settings = Settings::default();

        if let Some(Value::Object(blob)) = stored.get(SettingsKey::Settings.as_str()) {
            settings.extra = blob.clone();
        }

        if let Some(api_key) = string_field(stored, SettingsKey::ApiKey) {
            settings.api_key = api_key.to_string();
        }
        if let Some(model) = string_field(stored, SettingsKey::Model).filter(|m| !m.is_empty()) {
            settings.model = model.parse().unwrap_or_default();
        }
        if let Some(prompt) = string_field(stored, SettingsKey::SystemPrompt) {
            settings.system_prompt = prompt.to_string();
        }

        settings
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// System prompt, or `None` when blank.
    pub fn system_prompt(&self) -> Option<&str> {
        let prompt = self.system_prompt.trim();
        (!prompt.is_empty()).then_some(prompt)
    }

    /// Look up a freeform field.
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

fn string_field(stored: &Map<String, Value>, key: SettingsKey) -> Option<&str> {
    stored.get(key.as_str()).and_then(Value::as_str)
}

/// A partial settings update.
///
/// Only fields set to `Some` are written; everything else is left as-is in
/// storage. `extra` entries are merged into the existing freeform blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub api_key: Option<String>,
    pub model: Option<ModelId>,
    pub system_prompt: Option<String>,
    pub extra: Map<String, Value>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.model.is_none()
            && self.system_prompt.is_none()
            && self.extra.is_empty()
    }

    /// Check the patch before anything is written.
    ///
    /// An empty API key is allowed (it clears the key); a non-empty one must
    /// have the expected shape.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => validate_api_key(key),
            _ => Ok(()),
        }
    }

    /// Build the storage writes for this patch.
    ///
    /// `existing_blob` is the current freeform map; it is only rewritten
    /// when the patch carries `extra` entries.
    pub fn to_storage_writes(&self, existing_blob: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut writes = Map::new();

        if let Some(api_key) = &self.api_key {
            writes.insert(SettingsKey::ApiKey.as_str().into(), Value::String(api_key.clone()));
        }
        if let Some(model) = &self.model {
            writes.insert(
                SettingsKey::Model.as_str().into(),
                Value::String(model.as_str().to_string()),
            );
        }
        if let Some(prompt) = &self.system_prompt {
            writes.insert(
                SettingsKey::SystemPrompt.as_str().into(),
                Value::String(prompt.clone()),
            );
        }
        if !self.extra.is_empty() {
            let mut blob = existing_blob.cloned().unwrap_or_default();
            for (name, value) in &self.extra {
                blob.insert(name.clone(), value.clone());
            }
            writes.insert(SettingsKey::Settings.as_str().into(), Value::Object(blob));
        }

        writes
    }
}
