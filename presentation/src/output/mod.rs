//! Terminal output formatting

pub mod markdown;
