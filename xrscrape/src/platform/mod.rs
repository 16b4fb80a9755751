//! Platform definitions for the shells xrscrape drives.
//!
//! A platform carries the prompt pattern used by the synchronous strategy,
//! the configuration-mode commands, paging setup and failure markers.

mod definition;
pub mod vendors;

pub use definition::PlatformDefinition;
