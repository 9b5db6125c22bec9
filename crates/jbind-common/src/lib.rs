//! Common types and utilities for the jbind crates.
//!
//! This crate provides foundational types used across all jbind crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Non-fatal diagnostics (`Diagnostic`, `DiagnosticCategory`)
//! - Recursion and iteration limits
//! - Qualified/internal name utilities

// String interning for qualified-name deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Diagnostics for degraded and partial results
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, diagnostic_codes, diagnostic_messages, format_message,
};

// Centralized limits and thresholds
pub mod limits;

// Qualified/internal name conversions
pub mod names;

#[cfg(test)]
#[path = "tests/interner_tests.rs"]
mod interner_tests;

#[cfg(test)]
#[path = "tests/names_tests.rs"]
mod names_tests;

#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod diagnostics_tests;
