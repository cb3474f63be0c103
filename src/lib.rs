//! termai - AI assistance client for terminal applications
//!
//! Core library providing a dual-provider (Claude/Gemini) request
//! dispatcher, encrypted-at-rest credential storage with graceful
//! fallback, and one-time migration from legacy plaintext settings.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
