//! Helpers for driving futures that are known not to suspend.
//!
//! The document loaders used for canonicalization are in-memory maps, so every proof operation
//! completes on its first poll and can be run without an executor.

extern crate alloc;

pub use crate::expect_ready::expect_ready;
pub use crate::expect_ready::FutureNotReady;

mod expect_ready;
