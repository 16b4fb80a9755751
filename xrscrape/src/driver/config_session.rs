//! Configuration sessions as RAII guards.
//!
//! A session is a transaction, not a mode:
//! - The guard holds `&mut dyn Shell`, so nothing else can use the shell meanwhile
//! - `commit()`/`abort()` consume the guard, ensuring single-use
//!
//! ```rust,no_run
//! # use std::time::Duration;
//! # use xrscrape::driver::{ConfigSession, Shell};
//! # async fn example(shell: &mut dyn Shell) -> Result<(), xrscrape::Error> {
//! let mut session = ConfigSession::enter(shell, Duration::from_secs(30)).await?;
//! session.send_command("hostname pe1").await?;
//! let transcript = session.commit().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use log::{info, warn};

use super::Shell;
use super::response::Response;
use crate::error::{DriverError, Result};

/// Open configuration session on a shell.
pub struct ConfigSession<'a> {
    shell: &'a mut dyn Shell,
    timeout: Duration,
    transcript: String,
    consumed: bool,
}

impl<'a> ConfigSession<'a> {
    /// Enter configuration mode.
    pub async fn enter(shell: &'a mut dyn Shell, timeout: Duration) -> Result<Self> {
        let transcript = shell.enter_config_mode().await?;
        Ok(Self {
            shell,
            timeout,
            transcript,
            consumed: false,
        })
    }

    /// Send one configuration line.
    ///
    /// A failure marker in the output is returned as
    /// [`DriverError::CommandFailed`]; the session stays open.
    pub async fn send_command(&mut self, line: &str) -> Result<Response> {
        let response = self.shell.send_command(line, self.timeout).await?;
        self.record(&response);
        if let Some(message) = &response.failure_message {
            return Err(DriverError::CommandFailed {
                command: line.to_string(),
                message: message.clone(),
            }
            .into());
        }
        Ok(response)
    }

    /// Everything exchanged so far.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Commit and leave configuration mode.
    ///
    /// A rejected commit discards the changes before returning the error.
    pub async fn commit(mut self) -> Result<String> {
        self.consumed = true;
        let response = self.shell.send_command("commit", self.timeout).await?;
        self.record(&response);

        if let Some(message) = response.failure_message.clone() {
            warn!("commit rejected, discarding changes: {message}");
            let discard = self.shell.send_command("abort", self.timeout).await?;
            self.record(&discard);
            info!("{}", self.transcript);
            return Err(DriverError::CommandFailed {
                command: "commit".to_string(),
                message,
            }
            .into());
        }

        let exit = self.shell.exit_config_mode().await?;
        self.transcript.push_str(&exit);
        Ok(std::mem::take(&mut self.transcript))
    }

    /// Discard uncommitted changes and leave configuration mode.
    pub async fn abort(mut self) -> Result<String> {
        self.consumed = true;
        let response = self.shell.send_command("abort", self.timeout).await?;
        self.record(&response);
        Ok(std::mem::take(&mut self.transcript))
    }

    fn record(&mut self, response: &Response) {
        self.transcript.push_str(&response.raw_result);
    }
}

impl Drop for ConfigSession<'_> {
    fn drop(&mut self) {
        if !self.consumed {
            warn!("ConfigSession dropped without commit or abort; the device is still in configuration mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::ScriptedShell;
    use crate::error::Error;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_commit_sequence() {
        let mut shell = ScriptedShell::new()
            .on_command("hostname pe1", "")
            .on_command("commit", "");
        let mut session = ConfigSession::enter(&mut shell, TIMEOUT).await.unwrap();
        session.send_command("hostname pe1").await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(
            shell.commands(),
            vec!["configure terminal", "hostname pe1", "commit", "end"]
        );
    }

    #[tokio::test]
    async fn test_rejected_line_is_command_failed() {
        let mut shell = ScriptedShell::new()
            .on_command("hostnam pe1", "% Invalid input detected at '^' marker.")
            .on_command("abort", "");
        let mut session = ConfigSession::enter(&mut shell, TIMEOUT).await.unwrap();
        let err = session.send_command("hostnam pe1").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::CommandFailed { .. })));
        session.abort().await.unwrap();
        assert_eq!(shell.commands().last().map(String::as_str), Some("abort"));
    }

    #[tokio::test]
    async fn test_rejected_commit_discards() {
        let mut shell = ScriptedShell::new()
            .on_command("commit", "% Failed to commit one or more configuration items")
            .on_command("abort", "");
        let session = ConfigSession::enter(&mut shell, TIMEOUT).await.unwrap();
        assert!(session.commit().await.is_err());
        assert_eq!(shell.commands(), vec!["configure terminal", "commit", "abort"]);
    }
}
