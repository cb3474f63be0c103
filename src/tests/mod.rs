//! Test suite.
//!
//! - `unit`: per-component tests with fake backends
//! - `integration`: dispatcher round trips against a mock HTTP server
//! - `property`: invariants checked over generated inputs
//! - `common`: shared fixtures and helpers

mod common;
