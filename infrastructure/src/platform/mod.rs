//! Platform compatibility layer
//!
//! Normalizes the two host runtime families into one
//! [`PlatformApi`]. The adapter is picked once, at startup, by
//! [`detect_platform`] and then passed to every consumer.

pub mod callback;
pub mod host;
pub mod json_file;
pub mod memory;
pub mod promise;

pub use callback::CallbackPlatform;
pub use host::{Callback, CallbackHost, PromiseHost, WindowId};
pub use json_file::JsonFileHost;
pub use memory::MemoryCallbackHost;
pub use promise::PromisePlatform;

use sidechat_application::{PlatformApi, PlatformError};
use std::sync::Arc;
use tracing::info;

/// Choose the adapter for whichever host is present.
///
/// Detection is by presence, not version: a promise-native host wins when
/// both are available.
pub fn detect_platform(
    promise_host: Option<Arc<dyn PromiseHost>>,
    callback_host: Option<Arc<dyn CallbackHost>>,
) -> Result<Arc<dyn PlatformApi>, PlatformError> {
    let platform: Arc<dyn PlatformApi> = match (promise_host, callback_host) {
        (Some(host), _) => Arc::new(PromisePlatform::new(host)),
        (None, Some(host)) => Arc::new(CallbackPlatform::new(host)),
        (None, None) => return Err(PlatformError::NoHost),
    };
    info!("Detected {} host", platform.host_kind().as_str());
    Ok(platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidechat_application::HostKind;

    #[test]
    fn test_promise_host_preferred() {
        let dir = tempfile::TempDir::new().unwrap();
        let platform = detect_platform(
            Some(Arc::new(JsonFileHost::new(dir.path().join("s.json")))),
            Some(Arc::new(MemoryCallbackHost::new())),
        )
        .unwrap();
        assert_eq!(platform.host_kind(), HostKind::PromiseNative);
    }

    #[test]
    fn test_callback_host_fallback() {
        let platform = detect_platform(None, Some(Arc::new(MemoryCallbackHost::new()))).unwrap();
        assert_eq!(platform.host_kind(), HostKind::CallbackBased);
    }

    #[test]
    fn test_no_host() {
        assert!(matches!(detect_platform(None, None), Err(PlatformError::NoHost)));
    }
}
