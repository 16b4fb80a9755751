//! Channel layer for pattern matching and PTY operations.
//!
//! Handles the interactive session plumbing: prompt detection over an
//! ANSI-stripped buffer, raw writes and timed drains.

mod buffer;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig};
