//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelId`] - provider model identifiers (Gemini family)
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod model;
