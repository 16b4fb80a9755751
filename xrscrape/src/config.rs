//! Session configuration.
//!
//! Plain serde types so callers can load them from whatever format they use.
//! Durations are written in seconds (fractions allowed); every field has a
//! default, so a partial document is valid.
//!
//! ```json
//! {
//!   "timeouts": { "read": 120, "settle": 1.5 },
//!   "media_threshold_gb": 2.0,
//!   "bastion": { "host": "10.0.0.5", "username": "ops" }
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-command-family time bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Ordinary prompt-driven commands.
    #[serde(with = "seconds")]
    pub read: Duration,

    /// Each command of a log collection.
    #[serde(with = "seconds")]
    pub log: Duration,

    /// Settle delay of timed raw exchanges (mode changes, `cd`, `ls`).
    #[serde(with = "seconds")]
    pub settle: Duration,

    /// Settle delay of destructive commands and their confirmation answer.
    #[serde(with = "seconds")]
    pub confirm: Duration,

    /// `install ... synchronous` commands.
    #[serde(with = "seconds")]
    pub install: Duration,

    /// Whole SCP transfer after the password is sent.
    #[serde(with = "seconds")]
    pub scp: Duration,

    /// Waiting for the SCP password prompt.
    #[serde(with = "seconds")]
    pub scp_prompt: Duration,

    /// Quiet period that ends an SCP transfer.
    #[serde(with = "seconds")]
    pub scp_idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(60),
            log: Duration::from_secs(300),
            settle: Duration::from_secs(1),
            confirm: Duration::from_secs(10),
            install: Duration::from_secs(3600),
            scp: Duration::from_secs(1800),
            scp_prompt: Duration::from_secs(5),
            scp_idle: Duration::from_secs(2),
        }
    }
}

/// Host and user of an SSH endpoint. Passwords are never part of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEndpoint {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
}

fn default_port() -> u16 {
    22
}

/// Everything a session needs besides addresses and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeouts: Timeouts,

    /// Harddisk availability below this many GB is flagged by the media checks.
    pub media_threshold_gb: f64,

    /// Bastion server to hop through, if any.
    pub bastion: Option<RelayEndpoint>,

    /// Local relay port; 0 picks an ephemeral one.
    pub local_port: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            media_threshold_gb: 2.0,
            bastion: None,
            local_port: 0,
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
