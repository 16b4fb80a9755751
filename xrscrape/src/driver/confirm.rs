//! Automatic answers to the confirmation prompts of destructive commands.
//!
//! `admin delete` asks `Delete <file> [y|n][y] ?` and `delete` / `rm` ask
//! `Delete <file>[confirm]`. Neither is a CLI prompt, so the command and its
//! answer both go through a timed strategy.

use std::time::Duration;

use log::{debug, warn};

use super::Shell;
use super::strategy::ExecutionStrategy;
use crate::error::{DriverError, Result};

/// A confirmation prompt the handler knows how to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPrompt {
    /// `[y|n][y] ?`, answered with `y`.
    YesNo,
    /// `[confirm]`, answered with an empty line.
    Confirm,
}

impl ConfirmationPrompt {
    pub const ALL: [ConfirmationPrompt; 2] = [ConfirmationPrompt::YesNo, ConfirmationPrompt::Confirm];

    /// Text identifying the prompt in command output.
    pub fn fragment(self) -> &'static str {
        match self {
            ConfirmationPrompt::YesNo => "[y|n][y] ?",
            ConfirmationPrompt::Confirm => "[confirm]",
        }
    }

    /// Line sent to accept the prompt.
    pub fn answer(self) -> &'static str {
        match self {
            ConfirmationPrompt::YesNo => "y",
            ConfirmationPrompt::Confirm => "",
        }
    }

    /// First known prompt contained in `output`.
    pub fn detect(output: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| output.contains(p.fragment()))
    }
}

/// Answers a known confirmation prompt once.
///
/// Output without a known prompt is taken as complete; an unrecognized
/// prompt therefore goes unanswered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationHandler;

impl ConfirmationHandler {
    pub fn new() -> Self {
        Self
    }

    /// Answer the prompt in `output`, if any, returning the accumulated transcript.
    ///
    /// Fails with [`DriverError::ConfirmationUnanswered`] when the answer's
    /// output shows a prompt again.
    pub async fn resolve(
        &self,
        shell: &mut dyn Shell,
        strategy: &dyn ExecutionStrategy,
        command: &str,
        mut output: String,
        wait: Duration,
    ) -> Result<String> {
        let Some(prompt) = ConfirmationPrompt::detect(&output) else {
            return Ok(output);
        };
        debug!("answering {:?} for '{}'", prompt.fragment(), command);

        let reply = strategy.execute(shell, prompt.answer(), wait).await?;
        output.push_str(&reply.result);

        if ConfirmationPrompt::detect(&reply.result).is_some() {
            warn!("confirmation for '{command}' still pending after answering");
            return Err(DriverError::ConfirmationUnanswered {
                command: command.to_string(),
                output,
            }
            .into());
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::strategy::TimedRaw;
    use crate::driver::testing::ScriptedShell;
    use crate::error::Error;

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn test_detect() {
        assert_eq!(
            ConfirmationPrompt::detect("Delete /misc/disk1/a.iso [y|n][y] ?"),
            Some(ConfirmationPrompt::YesNo)
        );
        assert_eq!(
            ConfirmationPrompt::detect("Delete harddisk:/a.log[confirm]"),
            Some(ConfirmationPrompt::Confirm)
        );
        assert_eq!(ConfirmationPrompt::detect("Proceed? (yes/no)"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_yes_no_answered_with_y() {
        let mut shell = ScriptedShell::new().on_write("y", "Deleted\n");
        let output = ConfirmationHandler
            .resolve(&mut shell, &TimedRaw, "admin delete a.iso", "Delete a.iso [y|n][y] ?".into(), WAIT)
            .await
            .unwrap();
        assert_eq!(output, "Delete a.iso [y|n][y] ?Deleted\n");
        assert_eq!(shell.written(), vec!["y\n"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_answered_with_blank_line() {
        let mut shell = ScriptedShell::new().on_write("", "RP/0/RSP0/CPU0:router#");
        let output = ConfirmationHandler
            .resolve(&mut shell, &TimedRaw, "delete a.log", "Delete harddisk:/a.log[confirm]".into(), WAIT)
            .await
            .unwrap();
        assert!(output.ends_with("RP/0/RSP0/CPU0:router#"));
        assert_eq!(shell.written(), vec!["\n"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_prompt_sends_nothing() {
        let mut shell = ScriptedShell::new();
        let output = ConfirmationHandler
            .resolve(&mut shell, &TimedRaw, "rm a", "done".into(), WAIT)
            .await
            .unwrap();
        assert_eq!(output, "done");
        assert!(shell.written().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_prompt_is_error() {
        let mut shell = ScriptedShell::new().on_write("", "Delete harddisk:/b.log[confirm]");
        let err = ConfirmationHandler
            .resolve(&mut shell, &TimedRaw, "delete *.log", "Delete harddisk:/a.log[confirm]".into(), WAIT)
            .await
            .unwrap_err();
        match err {
            Error::Driver(DriverError::ConfirmationUnanswered { command, output }) => {
                assert_eq!(command, "delete *.log");
                assert!(output.contains("b.log"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
