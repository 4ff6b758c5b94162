//! Utility functions and helpers

pub mod atomic;

pub use atomic::{atomic_write_lines, remove_stale_temp, AtomicError, AtomicResult};
