//! Bastion server session.

use log::info;
use secrecy::{ExposeSecret, SecretString};

use super::{PASSWORD_PROMPT, ScpRequest};
use crate::config::{RelayEndpoint, SessionConfig};
use crate::driver::{CommandExecutor, Shell, SshShell};
use crate::error::Result;
use crate::platform::vendors::linux;
use crate::transport::SshConfig;

/// Shell on the bastion server itself, for staging files and picking the
/// standby server.
pub struct ServerSession {
    executor: CommandExecutor,
    config: SessionConfig,
}

impl ServerSession {
    /// Log in to `endpoint` with a password.
    pub async fn open(endpoint: &RelayEndpoint, password: SecretString, config: SessionConfig) -> Result<Self> {
        let mut ssh = SshConfig::with_password(&endpoint.host, endpoint.port, &endpoint.username, password);
        ssh.timeout = config.timeouts.read;
        let shell = SshShell::open(ssh, linux::platform()).await?;
        info!("server session open on {}:{}", endpoint.host, endpoint.port);
        Ok(Self::from_shell(Box::new(shell), config))
    }

    pub fn from_shell(shell: Box<dyn Shell>, config: SessionConfig) -> Self {
        Self {
            executor: CommandExecutor::new(shell),
            config,
        }
    }

    /// First of `servers` that is not the host this session is logged in to.
    pub async fn secondary_hostname(&mut self, servers: &[String]) -> Result<Option<String>> {
        let output = self.executor.run("hostname", self.config.timeouts.read).await?;
        let active = output.trim();
        Ok(servers.iter().find(|s| s.as_str() != active).cloned())
    }

    /// Push a file from the server to the far host.
    pub async fn scp_upload(&mut self, request: &ScpRequest) -> Result<String> {
        let timeouts = self.config.timeouts.clone();
        let mut output = self
            .executor
            .run_expecting(&request.upload_command(), &PASSWORD_PROMPT, timeouts.scp_prompt)
            .await?;
        output.push_str(
            &self
                .executor
                .run_quiescent(request.password.expose_secret(), timeouts.scp_idle, timeouts.scp)
                .await?,
        );
        Ok(output)
    }

    /// `ls -l <address>`
    pub async fn list_files(&mut self, address: &str) -> Result<String> {
        self.executor
            .run(&format!("ls -l {address}"), self.config.timeouts.read)
            .await
    }

    pub async fn close(mut self) -> Result<()> {
        self.executor.close(self.config.timeouts.settle).await
    }
}
