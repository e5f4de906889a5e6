//! Use cases (application services)

pub mod chat_session;
pub mod settings_store;
