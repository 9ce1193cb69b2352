//! Foundation module - core types and utilities
//!
//! Fundamental pieces shared by the rest of the toolkit:
//! - Frame identifiers
//! - Logging utilities

pub mod logging;

/// Identifier of a toolkit frame.
///
/// One frame corresponds to one updater tick; the counter is monotonic and
/// never wraps in practice.
pub type FrameId = u64;
