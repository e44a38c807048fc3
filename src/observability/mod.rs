//! Observability
//!
//! Structured logging for the data-access core.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. Synchronous, no buffering, deterministic output

mod logger;

pub use logger::{Logger, Severity};
