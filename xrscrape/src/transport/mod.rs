//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication, host-key checking, and channel
//! creation (PTY shells for CLI sessions, `direct-tcpip` for the relay).

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
