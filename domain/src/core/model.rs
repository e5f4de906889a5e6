//! Model value object representing a provider model identifier

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gemini model identifiers (Value Object)
///
/// Known models get their own variant; anything else the user types is
/// carried through verbatim as [`ModelId::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ModelId {
    Gemini25Pro,
    Gemini25Flash,
    #[default]
    Gemini20Flash,
    Gemini20FlashLite,
    Gemini15Pro,
    Gemini15Flash,
    Custom(String),
}

impl ModelId {
    /// Get the string identifier used in request URLs
    pub fn as_str(&self) -> &str {
        match self {
            ModelId::Gemini25Pro => "gemini-2.5-pro",
            ModelId::Gemini25Flash => "gemini-2.5-flash",
            ModelId::Gemini20Flash => "gemini-2.0-flash",
            ModelId::Gemini20FlashLite => "gemini-2.0-flash-lite",
            ModelId::Gemini15Pro => "gemini-1.5-pro",
            ModelId::Gemini15Flash => "gemini-1.5-flash",
            ModelId::Custom(s) => s,
        }
    }

    /// Models offered in the settings picker
    pub fn known_models() -> Vec<ModelId> {
        vec![
            ModelId::Gemini25Pro,
            ModelId::Gemini25Flash,
            ModelId::Gemini20Flash,
            ModelId::Gemini20FlashLite,
            ModelId::Gemini15Pro,
            ModelId::Gemini15Flash,
        ]
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ModelId::Custom(_))
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Accept the "models/" resource prefix the API uses in listings.
        let s = s.trim().trim_start_matches("models/");
        Ok(match s {
            "gemini-2.5-pro" => ModelId::Gemini25Pro,
            "gemini-2.5-flash" => ModelId::Gemini25Flash,
            "gemini-2.0-flash" => ModelId::Gemini20Flash,
            "gemini-2.0-flash-lite" => ModelId::Gemini20FlashLite,
            "gemini-1.5-pro" => ModelId::Gemini15Pro,
            "gemini-1.5-flash" => ModelId::Gemini15Flash,
            other => ModelId::Custom(other.to_string()),
        })
    }
}

impl Serialize for ModelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // FromStr is infallible
        Ok(s.parse().unwrap_or_default())
    }
}
