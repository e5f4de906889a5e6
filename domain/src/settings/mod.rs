//! User settings domain.
//!
//! - [`keys::SettingsKey`] - the fixed set of persisted storage keys
//! - [`entities::Settings`] - typed settings plus an open-ended extension map
//! - [`entities::SettingsPatch`] - partial update applied by the settings store
//! - [`api_key`] - client-side API key shape validation

pub mod api_key;
pub mod entities;
pub mod keys;
