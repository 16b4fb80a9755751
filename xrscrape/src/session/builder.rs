//! Builder for router sessions.

use log::{info, warn};
use secrecy::SecretString;

use super::DeviceSession;
use crate::config::{RelayEndpoint, SessionConfig};
use crate::driver::{CommandExecutor, SshShell};
use crate::error::{DriverError, Result};
use crate::platform::vendors::iosxr;
use crate::relay::{Relay, RelayConfig};
use crate::transport::{HostKeyVerification, SshConfig};

/// Builder for [`DeviceSession`].
///
/// # Example
///
/// ```rust,no_run
/// use xrscrape::SessionBuilder;
///
/// # async fn example() -> Result<(), xrscrape::Error> {
/// let mut router = SessionBuilder::new("10.20.0.1")
///     .username("admin")
///     .password("secret".into())
///     .bastion("jump.example.net", "ops", "hunter2".into())
///     .open()
///     .await?;
///
/// let low = router.show_media(2.0).await?;
/// println!("{low:?}");
/// router.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    bastion: Option<RelayEndpoint>,
    bastion_port: Option<u16>,
    bastion_password: Option<SecretString>,
    local_port: Option<u16>,
    config: SessionConfig,
    host_key_verification: Option<HostKeyVerification>,
}

impl SessionBuilder {
    /// Session to `host`, as seen from the bastion when one is configured.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: None,
            bastion: None,
            bastion_port: None,
            bastion_password: None,
            local_port: None,
            config: SessionConfig::default(),
            host_key_verification: None,
        }
    }

    /// Router SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Reach the router through `host` on port 22.
    pub fn bastion(mut self, host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        self.bastion = Some(RelayEndpoint {
            host: host.into(),
            port: 22,
            username: username.into(),
        });
        self.bastion_password = Some(password);
        self
    }

    /// Bastion SSH port, overriding the endpoint's own.
    pub fn bastion_port(mut self, port: u16) -> Self {
        self.bastion_port = Some(port);
        self
    }

    /// Password for the bastion named in the [`SessionConfig`].
    pub fn bastion_password(mut self, password: SecretString) -> Self {
        self.bastion_password = Some(password);
        self
    }

    /// Local relay port, overriding the config.
    pub fn local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Host key checking for the router connection.
    ///
    /// Defaults to [`HostKeyVerification::Disabled`] through a relay, where
    /// every router answers on the same loopback address, and to the
    /// transport default otherwise.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = Some(mode);
        self
    }

    /// Open the relay (if any), then the router shell.
    pub async fn open(self) -> Result<DeviceSession> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;
        let password = self.password.ok_or_else(|| DriverError::InvalidConfig {
            message: "password is required".to_string(),
        })?;

        let bastion = self.bastion.or_else(|| self.config.bastion.clone());
        let relay = match bastion {
            Some(mut endpoint) => {
                if let Some(port) = self.bastion_port {
                    endpoint.port = port;
                }
                let bastion_password = self.bastion_password.ok_or_else(|| DriverError::InvalidConfig {
                    message: format!("no password for bastion {}", endpoint.host),
                })?;
                let mut relay_config =
                    RelayConfig::new(endpoint.host, endpoint.username, bastion_password, &self.host);
                relay_config.bastion_port = endpoint.port;
                relay_config.target_port = self.port;
                relay_config.local_port = self.local_port.unwrap_or(self.config.local_port);
                relay_config.timeout = self.config.timeouts.read;
                Some(Relay::open(relay_config).await?)
            }
            None => None,
        };

        let mut ssh = match &relay {
            Some(relay) => {
                let mut ssh = SshConfig::with_password("127.0.0.1", relay.local_port(), username, password);
                ssh.host_key_verification = HostKeyVerification::Disabled;
                ssh
            }
            None => SshConfig::with_password(&self.host, self.port, username, password),
        };
        if let Some(mode) = self.host_key_verification {
            ssh.host_key_verification = mode;
        }
        ssh.timeout = self.config.timeouts.read;

        let shell = match SshShell::open(ssh, iosxr::platform()).await {
            Ok(shell) => shell,
            Err(e) => {
                if let Some(relay) = relay
                    && let Err(close_err) = relay.close().await
                {
                    warn!("closing relay after failed login: {close_err}");
                }
                return Err(e);
            }
        };
        info!("router session open on {}:{}", self.host, self.port);

        Ok(DeviceSession::new(
            CommandExecutor::new(Box::new(shell)),
            relay,
            self.config,
        ))
    }
}
