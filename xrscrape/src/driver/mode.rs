//! Normal / Admin / Run mode tracking.
//!
//! The device offers three execution contexts, entered strictly in order:
//!
//! ```text
//! Normal --admin--> Admin --run--> (run shell) --chvrf 0 ssh <ip>--> Run
//!   ^                 |                                              |
//!   +-----exit--------+<-----------------exit, exit------------------+
//! ```
//!
//! Run is two shell levels deep, so getting from Run back to Normal takes
//! three `exit`s. Every `exit` is relative to the current shell, which is
//! why the controller keeps a stack of frames rather than a single flag.

use std::fmt;
use std::time::Duration;

use log::{debug, info};

use super::Shell;
use super::strategy::{ExecutionStrategy, TimedRaw};
use crate::error::{DriverError, Result};

/// Execution context of the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Exec prompt; commands wait for the prompt.
    Normal,
    /// Sysadmin shell entered with `admin`.
    Admin,
    /// Linux shell on a route processor, reached from Admin.
    Run,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Normal => "normal",
            Mode::Admin => "admin",
            Mode::Run => "run",
        };
        f.write_str(name)
    }
}

/// One nested shell the device has been walked into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Admin,
    RunShell,
    NestedSsh,
}

/// Walks the device between modes with timed raw exchanges.
#[derive(Debug, Default)]
pub struct ModeController {
    frames: Vec<Frame>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode, derived from the frame stack.
    pub fn mode(&self) -> Mode {
        match self.frames.len() {
            0 => Mode::Normal,
            1 => Mode::Admin,
            _ => Mode::Run,
        }
    }

    /// Normal -> Admin.
    pub async fn enter_admin(&mut self, shell: &mut dyn Shell, wait: Duration) -> Result<String> {
        self.require(Mode::Normal, "enter admin mode")?;
        let output = raw(shell, "admin", wait).await?;
        self.frames.push(Frame::Admin);
        Ok(output)
    }

    /// Admin -> Run, hopping to the route processor at `internal_ip`.
    pub async fn enter_run(
        &mut self,
        shell: &mut dyn Shell,
        internal_ip: &str,
        wait: Duration,
    ) -> Result<String> {
        self.require(Mode::Admin, "enter run mode")?;
        let mut output = raw(shell, "run", wait).await?;
        self.frames.push(Frame::RunShell);
        output.push_str(&raw(shell, &format!("chvrf 0 ssh {internal_ip}"), wait).await?);
        self.frames.push(Frame::NestedSsh);
        Ok(output)
    }

    /// Leave the innermost shell.
    pub async fn exit(&mut self, shell: &mut dyn Shell, wait: Duration) -> Result<String> {
        let Some(frame) = self.frames.last().copied() else {
            return Err(DriverError::InvalidModeTransition {
                from: Mode::Normal,
                action: "exit",
            }
            .into());
        };
        let output = raw(shell, "exit", wait).await?;
        self.frames.pop();
        debug!("left {:?}, now in {} mode", frame, self.mode());
        Ok(output)
    }

    /// Run -> Normal.
    pub async fn exit_run(&mut self, shell: &mut dyn Shell, wait: Duration) -> Result<String> {
        self.require(Mode::Run, "exit run mode")?;
        self.exit_to_normal(shell, wait).await
    }

    /// Unwind every frame, whatever the depth. A no-op in Normal.
    pub async fn exit_to_normal(&mut self, shell: &mut dyn Shell, wait: Duration) -> Result<String> {
        let mut output = String::new();
        while !self.frames.is_empty() {
            output.push_str(&self.exit(shell, wait).await?);
        }
        Ok(output)
    }

    fn require(&self, expected: Mode, action: &'static str) -> Result<()> {
        let from = self.mode();
        if from != expected {
            return Err(DriverError::InvalidModeTransition { from, action }.into());
        }
        Ok(())
    }
}

async fn raw(shell: &mut dyn Shell, command: &str, wait: Duration) -> Result<String> {
    let response = TimedRaw.execute(shell, command, wait).await?;
    info!("{command}\n{}", response.result);
    Ok(response.result)
}
