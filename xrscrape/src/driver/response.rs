//! Result of one command round-trip.

use std::time::Duration;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt (or expected pattern) matched at the end. Empty for raw reads.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure marker found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new successful response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Response of a timed or polled exchange: output is taken as-is.
    pub fn raw(command: impl Into<String>, output: impl Into<String>, elapsed: Duration) -> Self {
        let output = output.into();
        Self::new(command, output.clone(), output, "", elapsed)
    }

    /// Mark the response as failed with the matched failure marker.
    pub fn with_failure(mut self, failure_message: impl Into<String>) -> Self {
        self.failure_message = Some(failure_message.into());
        self
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response() {
        let response = Response::raw("admin", "sysadmin-vm:0_RSP0#", Duration::from_secs(1));
        assert_eq!(response.result, response.raw_result);
        assert!(response.prompt.is_empty());
        assert!(response.failure_message.is_none());
    }

    #[test]
    fn test_failed_response() {
        let response = Response::new("sh", "% Invalid input", "", "", Duration::ZERO)
            .with_failure("% Invalid input");
        assert_eq!(response.failure_message.as_deref(), Some("% Invalid input"));
        assert_eq!(response.to_string(), "% Invalid input");
    }
}
