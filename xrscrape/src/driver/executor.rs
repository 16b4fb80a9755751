//! Mode-aware command execution.

use std::time::Duration;

use log::{debug, info};
use regex::bytes::Regex;

use super::config_session::ConfigSession;
use super::confirm::ConfirmationHandler;
use super::mode::{Mode, ModeController};
use super::strategy::{ExecutionStrategy, Quiescent, Synchronous, TimedRaw};
use super::Shell;
use crate::error::{DriverError, Result};
use crate::parse::{InstallOutcome, parse_install_outcome};

/// Sends commands through the strategy the current mode calls for.
///
/// Owns the shell and the mode state; one command is in flight at a time.
pub struct CommandExecutor {
    shell: Box<dyn Shell>,
    modes: ModeController,
    synchronous: Box<dyn ExecutionStrategy>,
    timed: Box<dyn ExecutionStrategy>,
    confirm: ConfirmationHandler,
}

impl CommandExecutor {
    pub fn new(shell: Box<dyn Shell>) -> Self {
        Self {
            shell,
            modes: ModeController::new(),
            synchronous: Box::new(Synchronous),
            timed: Box::new(TimedRaw),
            confirm: ConfirmationHandler::new(),
        }
    }

    /// Replace the strategy used in Normal mode.
    pub fn with_synchronous_strategy(mut self, strategy: impl ExecutionStrategy + 'static) -> Self {
        self.synchronous = Box::new(strategy);
        self
    }

    /// Replace the strategy used in Admin and Run modes and for confirmations.
    pub fn with_timed_strategy(mut self, strategy: impl ExecutionStrategy + 'static) -> Self {
        self.timed = Box::new(strategy);
        self
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    /// Send `command`, waiting for the prompt in Normal mode and for `timeout`
    /// otherwise.
    ///
    /// A failure marker in prompt-driven output is returned as
    /// [`DriverError::CommandFailed`].
    pub async fn run(&mut self, command: &str, timeout: Duration) -> Result<String> {
        let strategy = match self.modes.mode() {
            Mode::Normal => self.synchronous.as_ref(),
            Mode::Admin | Mode::Run => self.timed.as_ref(),
        };
        debug!("{} '{}' in {} mode", strategy.name(), command, self.modes.mode());

        let response = strategy.execute(self.shell.as_mut(), command, timeout).await?;
        info!("{command}\n{}", response.raw_result);

        if let Some(message) = response.failure_message {
            return Err(DriverError::CommandFailed {
                command: command.to_string(),
                message,
            }
            .into());
        }
        Ok(response.result)
    }

    /// Send `command` with the timed strategy whatever the mode.
    pub async fn run_timed(&mut self, command: &str, wait: Duration) -> Result<String> {
        let response = self.timed.execute(self.shell.as_mut(), command, wait).await?;
        info!("{command}\n{}", response.result);
        Ok(response.result)
    }

    /// Send a destructive command and accept its confirmation prompt.
    ///
    /// Always timed: the confirmation prompt is not a CLI prompt, so waiting
    /// for one would time out.
    pub async fn run_and_confirm(&mut self, command: &str, wait: Duration) -> Result<String> {
        let response = self.timed.execute(self.shell.as_mut(), command, wait).await?;
        let result = self
            .confirm
            .resolve(self.shell.as_mut(), self.timed.as_ref(), command, response.result, wait)
            .await;
        match result {
            Ok(output) => {
                info!("{command}\n{output}");
                Ok(output)
            }
            Err(e) => {
                info!("{command}\n{e}");
                Err(e)
            }
        }
    }

    /// Run an `install ... synchronous` command and check its outcome line.
    ///
    /// The outcome is read from the raw output, where the trailing prompt
    /// leaves the outcome line second-to-last.
    pub async fn run_install(&mut self, command: &str, timeout: Duration) -> Result<InstallOutcome> {
        let response = self
            .synchronous
            .execute(self.shell.as_mut(), command, timeout)
            .await?;
        info!("{command}\n{}", response.raw_result);

        match parse_install_outcome(&response.raw_result) {
            Ok(outcome) if outcome.succeeded => Ok(outcome),
            _ => Err(DriverError::InstallFailed {
                command: command.to_string(),
                trailing: trailing_lines(&response.result, 2),
            }
            .into()),
        }
    }

    /// Send `command` and wait for `expected` instead of the prompt.
    pub async fn run_expecting(
        &mut self,
        command: &str,
        expected: &Regex,
        timeout: Duration,
    ) -> Result<String> {
        let response = self
            .shell
            .send_command_expecting(command, expected, timeout)
            .await?;
        info!("{command}\n{}", response.raw_result);
        Ok(response.raw_result)
    }

    /// Send `text` and read until the output has been quiet for `idle`.
    ///
    /// `text` is not logged; it is typically a password.
    pub async fn run_quiescent(&mut self, text: &str, idle: Duration, timeout: Duration) -> Result<String> {
        let response = Quiescent::new(idle)
            .execute(self.shell.as_mut(), text, timeout)
            .await?;
        info!("<hidden>\n{}", response.result);
        Ok(response.result)
    }

    /// Enter configuration mode, send `lines`, commit and leave.
    ///
    /// A rejected line aborts the session before the error is returned.
    pub async fn apply_config(&mut self, lines: &[&str], timeout: Duration) -> Result<String> {
        let from = self.modes.mode();
        if from != Mode::Normal {
            return Err(DriverError::InvalidModeTransition {
                from,
                action: "enter configuration mode",
            }
            .into());
        }

        let mut session = ConfigSession::enter(self.shell.as_mut(), timeout).await?;
        for line in lines {
            if let Err(e) = session.send_command(line).await {
                let transcript = session.abort().await?;
                info!("{transcript}");
                return Err(e);
            }
        }
        let transcript = session.commit().await?;
        info!("{transcript}");
        Ok(transcript)
    }

    pub async fn enter_admin(&mut self, wait: Duration) -> Result<String> {
        self.modes.enter_admin(self.shell.as_mut(), wait).await
    }

    pub async fn enter_run(&mut self, internal_ip: &str, wait: Duration) -> Result<String> {
        self.modes.enter_run(self.shell.as_mut(), internal_ip, wait).await
    }

    pub async fn exit(&mut self, wait: Duration) -> Result<String> {
        self.modes.exit(self.shell.as_mut(), wait).await
    }

    pub async fn exit_run(&mut self, wait: Duration) -> Result<String> {
        self.modes.exit_run(self.shell.as_mut(), wait).await
    }

    pub async fn exit_to_normal(&mut self, wait: Duration) -> Result<String> {
        self.modes.exit_to_normal(self.shell.as_mut(), wait).await
    }

    /// Unwind to Normal and close the shell.
    pub async fn close(&mut self, wait: Duration) -> Result<()> {
        if self.shell.is_open() && self.modes.mode() != Mode::Normal {
            self.exit_to_normal(wait).await?;
        }
        self.shell.close().await
    }
}

/// The last `n` lines of `text`, newline-joined.
fn trailing_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
