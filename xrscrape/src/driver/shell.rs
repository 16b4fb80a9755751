//! [`Shell`] over an SSH PTY channel.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use regex::bytes::Regex;

use super::Shell;
use super::response::Response;
use crate::channel::{PtyChannel, PtyConfig};
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// Interactive CLI session on one SSH connection.
///
/// Prompt detection, output normalization and failure markers come from the
/// [`PlatformDefinition`] the shell was opened with.
pub struct SshShell {
    /// SSH transport (None once closed).
    transport: Option<SshTransport>,

    channel: Option<PtyChannel>,

    platform: PlatformDefinition,

    /// Bound on the initial prompt and the config-mode exchanges.
    timeout: Duration,
}

impl SshShell {
    /// Connect, wait for the first prompt and run the platform's on-open commands.
    pub async fn open(mut config: SshConfig, platform: PlatformDefinition) -> Result<Self> {
        config.terminal_width = platform.terminal_width;
        config.terminal_height = platform.terminal_height;

        let transport = SshTransport::connect(&config).await?;
        let channel = transport.open_shell().await?;
        let mut channel = PtyChannel::new(channel, PtyConfig::default());

        let banner = channel
            .read_until_pattern(&platform.prompt_pattern, config.timeout)
            .await?;
        debug!(
            "{} shell open on {}: {:?}",
            platform.name,
            transport.peer(),
            String::from_utf8_lossy(&banner)
        );

        let mut shell = Self {
            transport: Some(transport),
            channel: Some(channel),
            platform,
            timeout: config.timeout,
        };

        for command in shell.platform.on_open_commands.clone() {
            shell.send_command(&command, config.timeout).await?;
        }

        Ok(shell)
    }

    /// Platform this shell was opened with.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Whether the underlying SSH session is still running.
    pub fn is_alive(&self) -> bool {
        self.is_open() && self.transport.as_ref().is_some_and(SshTransport::is_alive)
    }

    async fn exchange(&mut self, command: &str, pattern: &Regex, timeout: Duration) -> Result<Response> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;

        let start = Instant::now();
        channel.send_line(command).await?;
        let data = channel.read_until_pattern(pattern, timeout).await?;
        let elapsed = start.elapsed();

        Ok(build_response(&self.platform, command, &data, pattern, elapsed))
    }
}

fn build_response(
    platform: &PlatformDefinition,
    command: &str,
    data: &[u8],
    pattern: &Regex,
    elapsed: Duration,
) -> Response {
    let raw_result = String::from_utf8_lossy(data).to_string();

    let prompt = pattern
        .find_iter(data)
        .last()
        .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string())
        .unwrap_or_default();

    let result = platform.normalize_output(&raw_result, command);

    match platform.detect_failure(&result).map(String::from) {
        Some(marker) => {
            Response::new(command, result, raw_result, prompt, elapsed).with_failure(marker)
        }
        None => Response::new(command, result, raw_result, prompt, elapsed),
    }
}

#[async_trait]
impl Shell for SshShell {
    async fn send_command(&mut self, command: &str, timeout: Duration) -> Result<Response> {
        let pattern = self.platform.prompt_pattern.clone();
        self.exchange(command, &pattern, timeout).await
    }

    async fn send_command_expecting(
        &mut self,
        command: &str,
        expected: &Regex,
        timeout: Duration,
    ) -> Result<Response> {
        self.exchange(command, expected, timeout).await
    }

    async fn write_channel(&mut self, text: &str) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        channel.write_raw(text.as_bytes()).await
    }

    async fn read_channel(&mut self) -> Result<String> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let data = channel.drain().await?;
        Ok(String::from_utf8_lossy(&data).to_string())
    }

    async fn enter_config_mode(&mut self) -> Result<String> {
        let command = self.platform.config_enter.clone().ok_or_else(|| {
            DriverError::InvalidConfig {
                message: format!("platform {} has no configuration mode", self.platform.name),
            }
        })?;
        let response = self.send_command(&command, self.timeout).await?;
        Ok(response.raw_result)
    }

    async fn exit_config_mode(&mut self) -> Result<String> {
        let command = self.platform.config_exit.clone().ok_or_else(|| {
            DriverError::InvalidConfig {
                message: format!("platform {} has no configuration mode", self.platform.name),
            }
        })?;
        let response = self.send_command(&command, self.timeout).await?;
        Ok(response.raw_result)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take()
            && let Err(e) = channel.close().await
        {
            warn!("closing shell channel: {e}");
        }
        if let Some(transport) = self.transport.take() {
            debug!("closing {} shell on {}", self.platform.name, transport.peer());
            transport.close().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.channel.as_ref().is_some_and(PtyChannel::is_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_install_outcome, parse_platform};
    use crate::platform::vendors::iosxr;

    #[test]
    fn test_show_platform_rows_survive_normalization() {
        let platform = iosxr::platform();
        let raw = "show platform\r\n\
\r\n\
Mon Oct 19 10:00:00.123 UTC\r\n\
Node              Type                       State             Config state\r\n\
--------------------------------------------------------------------------------\r\n\
0/RSP0/CPU0       A99-RSP-SE(Active)         IOS XR RUN        NSHUT\r\n\
0/RSP1/CPU0       A99-RSP-SE(Standby)        IOS XR RUN        NSHUT\r\n\
RP/0/RSP0/CPU0:pe1#";
        let response = build_response(
            &platform,
            "show platform",
            raw.as_bytes(),
            &platform.prompt_pattern,
            Duration::ZERO,
        );

        assert_eq!(response.prompt, "RP/0/RSP0/CPU0:pe1#");
        let nodes: Vec<String> = parse_platform(&response.result)
            .unwrap()
            .into_iter()
            .map(|e| e.node)
            .collect();
        assert_eq!(nodes, vec!["0/RSP0/CPU0", "0/RSP1/CPU0"]);
    }

    #[test]
    fn test_install_outcome_read_from_raw_output() {
        let platform = iosxr::platform();
        let raw = "install add source harddisk: a.rpm synchronous\r\n\
Install add operation 12 started\r\n\
Install operation 12 finished successfully\r\n\
RP/0/RSP0/CPU0:pe1#";
        let response = build_response(
            &platform,
            "install add source harddisk: a.rpm synchronous",
            raw.as_bytes(),
            &platform.prompt_pattern,
            Duration::ZERO,
        );

        let outcome = parse_install_outcome(&response.raw_result).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.request_id.as_deref(), Some("12"));
        assert!(!parse_install_outcome(&response.result).unwrap().succeeded);
    }

    #[test]
    fn test_failure_marker_flags_response() {
        let platform = iosxr::platform();
        let raw = "show plat\r\n          ^\r\n% Invalid input detected at '^' marker.\r\nRP/0/RSP0/CPU0:pe1#";
        let response = build_response(
            &platform,
            "show plat",
            raw.as_bytes(),
            &platform.prompt_pattern,
            Duration::ZERO,
        );
        assert_eq!(response.failure_message.as_deref(), Some("% Invalid input detected"));
    }
}
