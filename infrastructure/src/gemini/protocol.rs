//! Gemini `generateContent` wire types.
//!
//! Request shaping (role mapping, generation and safety configuration)
//! and the few response accessors the client needs.

use serde::{Deserialize, Serialize};
use sidechat_domain::{Message, Role};

/// Returned instead of an error when the provider blocks a reply on
/// safety grounds.
pub const SAFETY_REFUSAL: &str =
    "Sorry, I can't respond to that. The reply was blocked by the content safety filter.";

/// `finishReason` value for a safety block.
pub const FINISH_REASON_SAFETY: &str = "SAFETY";

/// Threshold applied to every harm category.
pub const SAFETY_THRESHOLD: &str = "BLOCK_ONLY_HIGH";

/// Harm categories covered by the safety settings.
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Absent for non-text parts (function calls, inline data).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// Block only high-severity content in every category.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: category.to_string(),
            threshold: SAFETY_THRESHOLD.to_string(),
        })
        .collect()
}

/// Provider role name: `user` stays `user`, everything else is `model`.
pub fn provider_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        _ => "model",
    }
}

/// Map the history into `contents`, one single-part block per message.
///
/// Text is copied verbatim and order is preserved.
pub fn build_contents(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .map(|message| Content {
            role: Some(provider_role(message.role).to_string()),
            parts: vec![Part {
                text: Some(message.content.clone()),
            }],
        })
        .collect()
}

pub fn build_request(
    messages: &[Message],
    generation_config: &GenerationConfig,
    safety_settings: &[SafetySetting],
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: build_contents(messages),
        generation_config: generation_config.clone(),
        safety_settings: safety_settings.to_vec(),
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// A full response, or one streamed fragment of it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's first part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }

    /// Whether the first candidate was stopped by the safety filter.
    pub fn is_safety_blocked(&self) -> bool {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            == Some(FINISH_REASON_SAFETY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_mapping_and_verbatim_text() {
        let messages = vec![
            Message::user("  hello\n"),
            Message::assistant("hi **there**"),
            Message::user("second"),
        ];
        let contents = build_contents(&messages);

        let roles: Vec<_> = contents.iter().map(|c| c.role.as_deref().unwrap()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        for (content, message) in contents.iter().zip(&messages) {
            assert_eq!(content.parts.len(), 1);
            assert_eq!(content.parts[0].text.as_deref(), Some(message.content.as_str()));
        }
    }

    #[test]
    fn test_request_json_shape() {
        let request = build_request(
            &[Message::user("hello")],
            &GenerationConfig::default(),
            &default_safety_settings(),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json["contents"],
            json!([{ "role": "user", "parts": [{ "text": "hello" }] }])
        );
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert!((json["generationConfig"]["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);

        let safety = json["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_ONLY_HIGH"));
        assert_eq!(safety[1]["category"], "HARM_CATEGORY_HATE_SPEECH");
    }

    #[test]
    fn test_first_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "first" }, { "text": "second" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.first_text(), Some("first"));
        assert!(!response.is_safety_blocked());
    }

    #[test]
    fn test_missing_text_is_none() {
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), None);

        let no_parts: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "role": "model" } }]
        }))
        .unwrap();
        assert_eq!(no_parts.first_text(), None);
    }

    #[test]
    fn test_safety_block_detected() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        assert!(response.is_safety_blocked());
    }
}
