//! Key-value storage adapters.

mod platform_store;

pub use platform_store::PlatformKeyValueStore;
