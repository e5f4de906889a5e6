//! In-memory callback-based host.
//!
//! Completes every call synchronously. Used for ephemeral sessions and as
//! the callback-host double in tests.

use super::host::{Callback, CallbackHost, WindowId};
use sidechat_application::StorageMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

const DEFAULT_WINDOW: WindowId = 1;

#[derive(Debug)]
pub struct MemoryCallbackHost {
    items: Mutex<StorageMap>,
    window_id: WindowId,
    opened_panels: Mutex<Vec<WindowId>>,
    /// Error to report on the next call.
    pending_failure: Mutex<Option<String>>,
    /// Errors visible to running callbacks, keyed by the thread running them.
    last_error: Mutex<HashMap<ThreadId, String>>,
}

impl Default for MemoryCallbackHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCallbackHost {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(StorageMap::new()),
            window_id: DEFAULT_WINDOW,
            opened_panels: Mutex::new(Vec::new()),
            pending_failure: Mutex::new(None),
            last_error: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next call fail with `message` on the last-error channel.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.pending_failure) = Some(message.into());
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    /// Windows the side panel was opened for, in order.
    pub fn opened_panels(&self) -> Vec<WindowId> {
        lock(&self.opened_panels).clone()
    }

    /// Run `operation` unless a failure is pending, then invoke the
    /// callback with the error channel set accordingly.
    ///
    /// Callbacks run on the calling thread, so the error is scoped to that
    /// thread and other calls in flight never observe it.
    fn finish<T>(&self, callback: Callback<T>, fallback: T, operation: impl FnOnce() -> T) {
        let failure = lock(&self.pending_failure).take();
        match failure {
            Some(message) => {
                let id = thread::current().id();
                lock(&self.last_error).insert(id, message);
                callback(fallback);
                lock(&self.last_error).remove(&id);
            }
            None => callback(operation()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CallbackHost for MemoryCallbackHost {
    fn storage_get(&self, keys: Vec<String>, callback: Callback<StorageMap>) {
        self.finish(callback, StorageMap::new(), || {
            let items = lock(&self.items);
            keys.iter()
                .filter_map(|k| items.get(k).map(|v| (k.clone(), v.clone())))
                .collect()
        });
    }

    fn storage_set(&self, items: StorageMap, callback: Callback<()>) {
        self.finish(callback, (), || lock(&self.items).extend(items));
    }

    fn storage_remove(&self, keys: Vec<String>, callback: Callback<()>) {
        self.finish(callback, (), || {
            let mut items = lock(&self.items);
            for key in &keys {
                items.remove(key);
            }
        });
    }

    fn last_error(&self) -> Option<String> {
        lock(&self.last_error).get(&thread::current().id()).cloned()
    }

    fn current_window(&self, callback: Callback<WindowId>) {
        self.finish(callback, 0, || self.window_id);
    }

    fn open_side_panel(&self, window_id: WindowId, callback: Callback<()>) {
        self.finish(callback, (), || lock(&self.opened_panels).push(window_id));
    }
}
