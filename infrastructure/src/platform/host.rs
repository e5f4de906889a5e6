//! Raw host runtime interfaces.
//!
//! The two supported host families expose the same primitives with
//! different calling conventions. These traits describe them as-is; the
//! adapters in [`super::promise`] and [`super::callback`] normalize them
//! into [`PlatformApi`](sidechat_application::PlatformApi).

use async_trait::async_trait;
use sidechat_application::{PlatformError, StorageMap};

/// Completion callback handed to a [`CallbackHost`].
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Identifier of a host window.
pub type WindowId = u64;

/// Host whose primitives return futures and fail through them.
#[async_trait]
pub trait PromiseHost: Send + Sync {
    async fn storage_get(&self, keys: &[&str]) -> Result<StorageMap, PlatformError>;

    async fn storage_set(&self, items: StorageMap) -> Result<(), PlatformError>;

    async fn storage_remove(&self, keys: &[&str]) -> Result<(), PlatformError>;

    /// Show the panel if hidden, hide it otherwise. There is no direct open.
    async fn toggle_sidebar(&self) -> Result<(), PlatformError>;
}

/// Host whose primitives complete through callbacks.
///
/// Failures are not passed to the callback. Instead [`last_error`] returns
/// the failure while the callback runs and `None` at any other time.
///
/// [`last_error`]: CallbackHost::last_error
pub trait CallbackHost: Send + Sync {
    fn storage_get(&self, keys: Vec<String>, callback: Callback<StorageMap>);

    fn storage_set(&self, items: StorageMap, callback: Callback<()>);

    fn storage_remove(&self, keys: Vec<String>, callback: Callback<()>);

    /// Out-of-band error channel, valid only inside a callback.
    fn last_error(&self) -> Option<String>;

    /// Report the window that currently has focus.
    fn current_window(&self, callback: Callback<WindowId>);

    fn open_side_panel(&self, window_id: WindowId, callback: Callback<()>);
}
