//! # xrscrape
//!
//! Async automation of Cisco IOS-XR routers over SSH, optionally hopping
//! through a bastion server.
//!
//! xrscrape drives the router CLI the way an operator would: it tracks which
//! shell it is in (exec, admin, the nested run shell), picks a completion
//! strategy per command, answers confirmation prompts, and parses the fixed
//! output layouts of the commands it issues into typed records.
//!
//! ## Layers
//!
//! - [`transport`]: russh connections, authentication, host keys
//! - [`relay`]: local port forwarding through the bastion
//! - [`channel`]: PTY plumbing and prompt matching
//! - [`driver`]: modes, execution strategies, confirmations, config sessions
//! - [`parse`]: output grammar for `show media`, `admin dir`, `show platform`, install commands
//! - [`session`]: one operation per command family
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xrscrape::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), xrscrape::Error> {
//!     let mut router = SessionBuilder::new("10.20.0.1")
//!         .username("admin")
//!         .password("secret".into())
//!         .bastion("jump.example.net", "ops", "hunter2".into())
//!         .open()
//!         .await?;
//!
//!     for node in router.show_media(2.0).await? {
//!         println!("{node} is low on harddisk space");
//!     }
//!
//!     router.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod parse;
pub mod platform;
pub mod relay;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use config::{RelayEndpoint, SessionConfig, Timeouts};
pub use driver::{CommandExecutor, Mode, Response, Shell};
pub use error::{Error, Result};
pub use platform::PlatformDefinition;
pub use relay::{Relay, RelayConfig};
pub use session::{DeviceSession, ScpRequest, ServerSession, SessionBuilder};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
