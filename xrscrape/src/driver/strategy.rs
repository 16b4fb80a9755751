//! How a command is judged finished.
//!
//! The exec prompt gives a deterministic completion signal, so commands in
//! Normal mode wait for it. The admin and run shells do not, so commands
//! there are written, given a fixed settle delay and drained. [`Quiescent`]
//! polls instead of sleeping once and is used for long exchanges such as SCP
//! password prompts.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use tokio::time::Instant;

use super::Shell;
use super::response::Response;
use crate::error::Result;

/// Strategy for sending one command and collecting its output.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Send `command` and collect its output. `timeout` bounds the read for
    /// prompt-driven strategies and is the settle delay for timed ones.
    async fn execute(
        &self,
        shell: &mut dyn Shell,
        command: &str,
        timeout: Duration,
    ) -> Result<Response>;
}

/// Request/response: wait for the prompt, failing after `timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synchronous;

#[async_trait]
impl ExecutionStrategy for Synchronous {
    fn name(&self) -> &'static str {
        "synchronous"
    }

    async fn execute(
        &self,
        shell: &mut dyn Shell,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        shell.send_command(command, timeout).await
    }
}

/// Write, sleep `timeout`, drain whatever arrived.
///
/// Output produced after the delay is left in the channel and shows up in
/// the next read. A delay that is too short truncates silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedRaw;

#[async_trait]
impl ExecutionStrategy for TimedRaw {
    fn name(&self) -> &'static str {
        "timed-raw"
    }

    async fn execute(
        &self,
        shell: &mut dyn Shell,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let start = Instant::now();
        shell.write_channel(&format!("{command}\n")).await?;
        tokio::time::sleep(timeout).await;
        let output = shell.read_channel().await?;
        trace!("{} read {} bytes after {:?}", self.name(), output.len(), timeout);
        Ok(Response::raw(command, output, start.elapsed()))
    }
}

/// Write, then read every `idle` until a read comes back empty after some
/// output has arrived, or `timeout` passes.
#[derive(Debug, Clone, Copy)]
pub struct Quiescent {
    idle: Duration,
}

impl Quiescent {
    pub fn new(idle: Duration) -> Self {
        Self { idle }
    }
}

impl Default for Quiescent {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl ExecutionStrategy for Quiescent {
    fn name(&self) -> &'static str {
        "quiescent"
    }

    async fn execute(
        &self,
        shell: &mut dyn Shell,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let start = Instant::now();
        let deadline = start + timeout;
        shell.write_channel(&format!("{command}\n")).await?;

        let mut output = String::new();
        loop {
            tokio::time::sleep(self.idle).await;
            let chunk = shell.read_channel().await?;
            if chunk.is_empty() && !output.is_empty() {
                break;
            }
            output.push_str(&chunk);
            if Instant::now() >= deadline {
                debug!("{} gave up after {:?} with output still arriving", self.name(), timeout);
                break;
            }
        }
        Ok(Response::raw(command, output, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::ScriptedShell;

    #[tokio::test(start_paused = true)]
    async fn test_synchronous_uses_prompt_exchange() {
        let mut shell = ScriptedShell::new().on_command("show clock", "10:00:00.000 UTC");
        let response = Synchronous
            .execute(&mut shell, "show clock", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.result, "10:00:00.000 UTC");
        assert!(shell.written().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_synchronous_unanswered_times_out() {
        let mut shell = ScriptedShell::new();
        let err = Synchronous
            .execute(&mut shell, "show clock", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_raw_waits_then_drains() {
        let mut shell = ScriptedShell::new().on_write("admin", "sysadmin-vm:0_RSP0# ");
        let start = Instant::now();
        let response = TimedRaw
            .execute(&mut shell, "admin", Duration::from_secs(3))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(response.result, "sysadmin-vm:0_RSP0# ");
        assert_eq!(shell.written(), vec!["admin\n"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_raw_silent_channel_is_empty() {
        let mut shell = ScriptedShell::new();
        let response = TimedRaw
            .execute(&mut shell, "run", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.result, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiescent_stops_when_output_settles() {
        let mut shell = ScriptedShell::new().on_write("secret", "Transferred 1024 bytes\n");
        let start = Instant::now();
        let response = Quiescent::new(Duration::from_secs(2))
            .execute(&mut shell, "secret", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(response.result, "Transferred 1024 bytes\n");
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiescent_gives_up_at_deadline() {
        let mut shell = ScriptedShell::new();
        let start = Instant::now();
        let response = Quiescent::new(Duration::from_secs(2))
            .execute(&mut shell, "secret", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(response.result.is_empty());
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
