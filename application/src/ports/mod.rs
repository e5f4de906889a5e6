//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation
//! adapters must implement.

pub mod chat_client;
pub mod chat_view;
pub mod key_value_store;
pub mod platform;
