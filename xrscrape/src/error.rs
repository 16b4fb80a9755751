//! Error types for xrscrape.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::driver::Mode;

/// Main error type for xrscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Bastion relay errors
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    /// Device output did not match the expected grammar
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// True when a synchronous read gave up waiting for the prompt.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::PatternTimeout(_))
                | Error::Transport(TransportError::Timeout(_))
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key not present in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Driver layer errors (command execution, mode navigation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Shell not connected - call open() first")]
    NotConnected,

    /// The device reported a failure marker in the output
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Install/prepare/remove did not finish with the success marker
    #[error("Install command '{command}' did not complete successfully: {trailing}")]
    InstallFailed { command: String, trailing: String },

    /// A confirmation prompt was still pending after the automatic answer
    #[error("Confirmation prompt for '{command}' still unanswered")]
    ConfirmationUnanswered { command: String, output: String },

    /// Mode transition not allowed from the current mode
    #[error("Cannot {action} from {from} mode")]
    InvalidModeTransition { from: Mode, action: &'static str },

    /// Hardware table did not match the expected layout
    #[error("Platform mismatch: {message}")]
    PlatformMismatch { message: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Bastion relay errors.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Could not reach or authenticate to the bastion
    #[error("Bastion {host}:{port} unavailable: {source}")]
    Bastion {
        host: String,
        port: u16,
        #[source]
        source: TransportError,
    },

    /// Local listener could not be bound
    #[error("Failed to bind relay listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Bind address could not be parsed
    #[error("Invalid relay bind address '{0}'")]
    InvalidBindAddress(String),
}

/// Device output did not match the grammar its parser expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{parser}: {reason} (line: {line:?})")]
pub struct ParseError {
    /// Name of the parser that rejected the text.
    pub parser: &'static str,
    /// The offending raw line (empty when the whole input was at fault).
    pub line: String,
    /// What was expected.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(parser: &'static str, line: &str, reason: impl Into<String>) -> Self {
        Self {
            parser,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using xrscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
