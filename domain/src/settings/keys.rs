//! Storage key registry for persisted settings.
//!
//! Every value the settings store reads or writes lives under one of
//! these keys, in the host's local (non-synced) storage namespace.

/// A persisted settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    /// Provider API key (string)
    ApiKey,
    /// Provider model identifier (string)
    Model,
    /// System prompt used for priming (string)
    SystemPrompt,
    /// Freeform map for forward-compatible extra fields
    Settings,
}

/// Metadata for a single settings key.
#[derive(Debug, Clone)]
pub struct SettingsKeyInfo {
    pub key: SettingsKey,
    /// Name used in host storage.
    pub storage_name: &'static str,
    pub description: &'static str,
}

impl SettingsKey {
    /// Name used in host storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsKey::ApiKey => "apiKey",
            SettingsKey::Model => "model",
            SettingsKey::SystemPrompt => "systemPrompt",
            SettingsKey::Settings => "settings",
        }
    }

    /// All keys, in storage order.
    pub fn all() -> [SettingsKey; 4] {
        [
            SettingsKey::ApiKey,
            SettingsKey::Model,
            SettingsKey::SystemPrompt,
            SettingsKey::Settings,
        ]
    }

    /// Storage names of all keys.
    pub fn all_names() -> Vec<&'static str> {
        Self::all().iter().map(|k| k.as_str()).collect()
    }

    /// Look up a key by its storage name.
    pub fn lookup(name: &str) -> Option<SettingsKey> {
        Self::all().into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All known keys with their metadata.
pub fn known_keys() -> &'static [SettingsKeyInfo] {
    &KNOWN_KEYS
}

static KNOWN_KEYS: [SettingsKeyInfo; 4] = [
    SettingsKeyInfo {
        key: SettingsKey::ApiKey,
        storage_name: "apiKey",
        description: "Gemini API key",
    },
    SettingsKeyInfo {
        key: SettingsKey::Model,
        storage_name: "model",
        description: "Model used for new requests",
    },
    SettingsKeyInfo {
        key: SettingsKey::SystemPrompt,
        storage_name: "systemPrompt",
        description: "Instruction sent ahead of every conversation",
    },
    SettingsKeyInfo {
        key: SettingsKey::Settings,
        storage_name: "settings",
        description: "Additional fields (freeform)",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_roundtrip() {
        for key in SettingsKey::all() {
            assert_eq!(SettingsKey::lookup(key.as_str()), Some(key));
        }
        assert_eq!(SettingsKey::lookup("theme"), None);
    }

    #[test]
    fn test_registry_matches_storage_names() {
        for info in known_keys() {
            assert_eq!(info.key.as_str(), info.storage_name);
            assert!(!info.description.is_empty());
        }
    }
}
