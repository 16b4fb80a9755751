//! Command execution against a device CLI.
//!
//! The driver layer owns the mode state machine, the strategies used to
//! decide when a command has finished, confirmation handling for destructive
//! commands, and the [`Shell`] seam the rest of the crate talks through.

mod confirm;
pub mod config_session;
mod executor;
mod mode;
pub(crate) mod response;
mod shell;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use config_session::ConfigSession;
pub use confirm::{ConfirmationHandler, ConfirmationPrompt};
pub use executor::CommandExecutor;
pub use mode::{Mode, ModeController};
pub use response::Response;
pub use shell::SshShell;
pub use strategy::{ExecutionStrategy, Quiescent, Synchronous, TimedRaw};

use std::time::Duration;

use async_trait::async_trait;
use regex::bytes::Regex;

use crate::error::Result;

/// One authenticated interactive CLI session.
///
/// Two ways of talking to the device are offered: request/response calls
/// that wait for a pattern, and raw writes and reads that never wait.
#[async_trait]
pub trait Shell: Send {
    /// Send a command and wait for the prompt, up to `timeout`.
    async fn send_command(&mut self, command: &str, timeout: Duration) -> Result<Response>;

    /// Send a command and wait for `expected` instead of the prompt.
    async fn send_command_expecting(
        &mut self,
        command: &str,
        expected: &Regex,
        timeout: Duration,
    ) -> Result<Response>;

    /// Write text to the channel verbatim.
    async fn write_channel(&mut self, text: &str) -> Result<()>;

    /// Whatever output is available right now. Never waits for more.
    async fn read_channel(&mut self) -> Result<String>;

    /// Enter configuration mode, returning the transcript.
    async fn enter_config_mode(&mut self) -> Result<String>;

    /// Leave configuration mode, returning the transcript.
    async fn exit_config_mode(&mut self) -> Result<String>;

    /// Close the session. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}
