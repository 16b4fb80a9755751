//! Built-in platform definitions.

pub mod iosxr;
pub mod linux;
