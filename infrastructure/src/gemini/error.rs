//! Error classification for Gemini API failures.
//!
//! Maps HTTP statuses, error bodies and transport failures onto the fixed
//! [`ChatError`] taxonomy.

use super::protocol::ErrorEnvelope;
use sidechat_application::ChatError;

/// Message fragments that identify a reachability problem rather than a
/// protocol one.
const REACHABILITY_MARKERS: [&str; 7] = [
    "failed to fetch",
    "network",
    "dns error",
    "connection refused",
    "connection reset",
    "connection closed",
    "unreachable",
];

/// Extract `error.message` from an error body, if it parses.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.is_empty())
}

/// Classify a non-2xx response.
///
/// | condition                                | error            |
/// |------------------------------------------|------------------|
/// | 400 and message mentions `API key`       | `InvalidApiKey`  |
/// | 429                                      | `RateLimited`    |
/// | >= 500                                   | `ApiError`       |
/// | any other parsed message                 | `Provider(msg)`  |
/// | no parseable error body                  | `UnknownError`   |
pub fn handle_api_error(status: u16, body: &str) -> ChatError {
    let message = error_message(body);

    match (status, message) {
        (400, Some(message)) if message.contains("API key") => ChatError::InvalidApiKey,
        (429, _) => ChatError::RateLimited,
        (s, _) if s >= 500 => ChatError::ApiError,
        (_, Some(message)) => ChatError::Provider(message),
        (_, None) => ChatError::UnknownError,
    }
}

/// Whether a transport error message points at network reachability.
pub fn is_reachability_message(message: &str) -> bool {
    let message = message.to_lowercase();
    REACHABILITY_MARKERS.iter().any(|m| message.contains(m))
}

/// Classify a transport-level failure.
///
/// Connect and timeout failures, or anything whose message (including
/// the source chain) reads like a reachability problem, become
/// [`ChatError::NetworkError`]. Everything else is passed through.
pub fn classify_transport_error(error: &reqwest::Error) -> ChatError {
    if error.is_connect() || error.is_timeout() {
        return ChatError::NetworkError;
    }

    let mut chain = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        chain.push_str(": ");
        chain.push_str(&inner.to_string());
        source = inner.source();
    }

    if is_reachability_message(&chain) {
        ChatError::NetworkError
    } else {
        ChatError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(message: &str) -> String {
        serde_json::json!({ "error": { "code": 400, "message": message, "status": "INVALID_ARGUMENT" } })
            .to_string()
    }

    #[test]
    fn test_invalid_api_key() {
        let body = body("API key not valid. Please pass a valid API key.");
        assert_eq!(handle_api_error(400, &body), ChatError::InvalidApiKey);
    }

    #[test]
    fn test_400_without_api_key_mention_passes_message_through() {
        let body = body("Request contains an invalid argument.");
        assert_eq!(
            handle_api_error(400, &body),
            ChatError::Provider("Request contains an invalid argument.".to_string())
        );
    }

    #[test]
    fn test_rate_limited_regardless_of_body() {
        assert_eq!(handle_api_error(429, ""), ChatError::RateLimited);
        assert_eq!(handle_api_error(429, &body("Resource exhausted")), ChatError::RateLimited);
    }

    #[test]
    fn test_server_errors() {
        assert_eq!(handle_api_error(500, ""), ChatError::ApiError);
        assert_eq!(handle_api_error(503, &body("overloaded")), ChatError::ApiError);
    }

    #[test]
    fn test_generic_message() {
        assert_eq!(
            handle_api_error(404, &body("models/nope is not found")),
            ChatError::Provider("models/nope is not found".to_string())
        );
    }

    #[test]
    fn test_unknown_without_body() {
        assert_eq!(handle_api_error(403, "<html>Forbidden</html>"), ChatError::UnknownError);
        assert_eq!(handle_api_error(400, ""), ChatError::UnknownError);
        assert_eq!(handle_api_error(401, r#"{"error":{}}"#), ChatError::UnknownError);
    }

    #[test]
    fn test_reachability_messages() {
        assert!(is_reachability_message("TypeError: Failed to fetch"));
        assert!(is_reachability_message("error trying to connect: dns error"));
        assert!(is_reachability_message("Connection reset by peer"));
        assert!(!is_reachability_message("invalid HTTP header"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let error = reqwest::Client::new()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();
        assert_eq!(classify_transport_error(&error), ChatError::NetworkError);
    }
}
