//! Router session.

use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, warn};
use secrecy::ExposeSecret;

use super::{PASSWORD_PROMPT, ScpRequest, with_packages};
use crate::config::SessionConfig;
use crate::driver::{CommandExecutor, Mode, Shell};
use crate::error::{DriverError, Result};
use crate::parse::{
    self, INACTIVE_MARKER, InstallOutcome, ModuleSpaceReport, PREPARED_MARKER, PackageGroup,
    PlatformEntry,
};
use crate::relay::Relay;

/// Automation session on one router.
///
/// Owns the command executor and, when the router is reached through a
/// bastion, the relay. Every operation takes `&mut self`: commands are
/// strictly sequential.
pub struct DeviceSession {
    executor: CommandExecutor,
    relay: Option<Relay>,
    config: SessionConfig,
}

impl DeviceSession {
    pub(crate) fn new(executor: CommandExecutor, relay: Option<Relay>, config: SessionConfig) -> Self {
        Self {
            executor,
            relay,
            config,
        }
    }

    /// Session around an already open shell, without a relay.
    pub fn from_shell(shell: Box<dyn Shell>, config: SessionConfig) -> Self {
        Self::new(CommandExecutor::new(shell), None, config)
    }

    pub fn mode(&self) -> Mode {
        self.executor.mode()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The executor, for commands without a dedicated operation.
    pub fn executor(&mut self) -> &mut CommandExecutor {
        &mut self.executor
    }

    /// Local port of the bastion relay, if the session uses one.
    pub fn relay_port(&self) -> Option<u16> {
        self.relay.as_ref().map(Relay::local_port)
    }

    /// Run each command and concatenate a `#<command>` headed transcript.
    ///
    /// `timeout` bounds each command; `None` uses the configured log timeout.
    pub async fn collect_logs(&mut self, commands: &[&str], timeout: Option<Duration>) -> Result<String> {
        let timeout = timeout.unwrap_or(self.config.timeouts.log);
        let mut transcript = String::new();
        for command in commands {
            let output = self.executor.run(command, timeout).await?;
            transcript.push_str(&format!("\n#{command}\n{output}\n"));
        }
        Ok(transcript)
    }

    /// `admin dir <address> location <location>`
    pub async fn admin_dir(&mut self, address: &str, location: &str) -> Result<Vec<ModuleSpaceReport>> {
        let output = self.read(&format!("admin dir {address} location {location}")).await?;
        Ok(parse::parse_admin_dir(&output)?)
    }

    /// Modules from `admin dir` with less than `threshold_kb` free.
    pub async fn low_space_modules(
        &mut self,
        address: &str,
        location: &str,
        threshold_kb: u64,
    ) -> Result<Vec<String>> {
        let reports = self.admin_dir(address, location).await?;
        Ok(parse::free_space_below(&reports, threshold_kb)?)
    }

    /// Nodes whose harddisk has less than `threshold_gb` available.
    pub async fn show_media(&mut self, threshold_gb: f64) -> Result<Vec<String>> {
        self.media("show media location all", threshold_gb).await
    }

    /// Like [`show_media`](Self::show_media), from the admin plane.
    pub async fn admin_show_media(&mut self, threshold_gb: f64) -> Result<Vec<String>> {
        self.media("admin show media location all", threshold_gb).await
    }

    /// [`show_media`](Self::show_media) with the configured threshold.
    pub async fn show_media_default(&mut self) -> Result<Vec<String>> {
        let threshold = self.config.media_threshold_gb;
        self.show_media(threshold).await
    }

    async fn media(&mut self, command: &str, threshold_gb: f64) -> Result<Vec<String>> {
        let output = self.read(command).await?;
        let entries = parse::parse_media(&output, threshold_gb)?;
        Ok(parse::nodes_below_threshold(&entries))
    }

    pub async fn enter_admin(&mut self) -> Result<String> {
        let wait = self.config.timeouts.settle;
        self.executor.enter_admin(wait).await
    }

    /// Normal -> Admin -> Run on the route processor at `internal_ip`.
    pub async fn enter_run(&mut self, internal_ip: &str) -> Result<String> {
        let wait = self.config.timeouts.settle;
        let mut output = self.executor.enter_admin(wait).await?;
        output.push_str(&self.executor.enter_run(internal_ip, wait).await?);
        Ok(output)
    }

    /// Admin -> Normal.
    pub async fn exit_admin(&mut self) -> Result<String> {
        let from = self.executor.mode();
        if from != Mode::Admin {
            return Err(DriverError::InvalidModeTransition {
                from,
                action: "exit admin mode",
            }
            .into());
        }
        self.executor.exit(self.config.timeouts.settle).await
    }

    /// Run -> Normal.
    pub async fn exit_run(&mut self) -> Result<String> {
        self.executor.exit_run(self.config.timeouts.settle).await
    }

    /// `cd <address>`
    pub async fn change_directory(&mut self, address: &str) -> Result<String> {
        self.executor
            .run_timed(&format!("cd {address}"), self.config.timeouts.settle)
            .await
    }

    /// `ls [option]`
    pub async fn list_directory(&mut self, option: Option<&str>) -> Result<String> {
        let command = match option {
            Some(option) => format!("ls {option}"),
            None => "ls".to_string(),
        };
        self.executor.run_timed(&command, self.config.timeouts.settle).await
    }

    /// `rm <file> location <location>`
    pub async fn remove_file(&mut self, file: &str, location: &str) -> Result<String> {
        self.executor
            .run_and_confirm(&format!("rm {file} location {location}"), self.config.timeouts.settle)
            .await
    }

    /// `admin delete <file> location <location>`
    pub async fn admin_delete(&mut self, file: &str, location: &str) -> Result<String> {
        self.executor
            .run_and_confirm(
                &format!("admin delete {file} location {location}"),
                self.config.timeouts.confirm,
            )
            .await
    }

    /// `delete <file> location <location>`
    pub async fn delete_file(&mut self, file: &str, location: &str) -> Result<String> {
        self.executor
            .run_and_confirm(
                &format!("delete {file} location {location}"),
                self.config.timeouts.confirm,
            )
            .await
    }

    /// `install remove inactive [packages] synchronous`
    pub async fn install_remove_inactive(&mut self, packages: &[&str]) -> Result<String> {
        let command = with_packages("install remove inactive", packages, "synchronous");
        self.executor.run(&command, self.config.timeouts.install).await
    }

    /// Pull a file onto the router.
    pub async fn scp_download(&mut self, request: &ScpRequest) -> Result<String> {
        let timeouts = self.config.timeouts.clone();
        let mut output = self
            .executor
            .run_expecting(&request.download_command(), &PASSWORD_PROMPT, timeouts.scp_prompt)
            .await?;
        output.push_str(
            &self
                .executor
                .run_quiescent(request.password.expose_secret(), timeouts.scp_idle, timeouts.scp)
                .await?,
        );
        Ok(output)
    }

    /// File names listed by `dir <address>`.
    pub async fn dir_listing(&mut self, address: &str) -> Result<Vec<String>> {
        let output = self.read(&format!("dir {address}")).await?;
        Ok(parse::parse_dir_listing(&output)?)
    }

    /// Enter configuration mode, apply `lines`, commit and leave.
    pub async fn apply_config(&mut self, lines: &[&str]) -> Result<String> {
        self.executor.apply_config(lines, self.config.timeouts.read).await
    }

    /// `install add source <location> <packages> synchronous`
    pub async fn install_add(&mut self, location: &str, packages: &[&str]) -> Result<InstallOutcome> {
        let command = with_packages(&format!("install add source {location}"), packages, "synchronous");
        self.executor.run_install(&command, self.config.timeouts.install).await
    }

    /// Packages listed by `show install inactive`.
    pub async fn show_install_inactive(&mut self) -> Result<Vec<String>> {
        let output = self.read("show install inactive").await?;
        Ok(parse::parse_section(&output, INACTIVE_MARKER))
    }

    /// Per-node packages listed by `admin show install inactive`.
    pub async fn admin_show_install_inactive(&mut self) -> Result<Vec<PackageGroup>> {
        let output = self.read("admin show install inactive").await?;
        Ok(parse::parse_package_groups(&output)?)
    }

    /// `install prepare id <id> synchronous`
    pub async fn install_prepare_id(&mut self, install_id: &str) -> Result<InstallOutcome> {
        let command = format!("install prepare id {install_id} synchronous");
        self.executor.run_install(&command, self.config.timeouts.install).await
    }

    /// `install prepare <packages> synchronous`
    pub async fn install_prepare(&mut self, packages: &[&str]) -> Result<InstallOutcome> {
        let command = with_packages("install prepare", packages, "synchronous");
        self.executor.run_install(&command, self.config.timeouts.install).await
    }

    /// Packages listed under `Prepared Packages` by `show install prepare`.
    pub async fn show_install_prepare(&mut self) -> Result<Vec<String>> {
        let output = self.read("show install prepare").await?;
        Ok(parse::parse_section(&output, PREPARED_MARKER))
    }

    pub async fn show_platform(&mut self) -> Result<Vec<PlatformEntry>> {
        let output = self.read("show platform").await?;
        Ok(parse::parse_platform(&output)?)
    }

    /// Check `show platform` against the expected node -> state map.
    pub async fn verify_platform(&mut self, expected: &IndexMap<String, String>) -> Result<()> {
        let entries = self.show_platform().await?;
        parse::check_platform(&entries, expected)?;
        Ok(())
    }

    /// Checksum line of `show md5 file /<location>:/<file>`.
    pub async fn show_md5(&mut self, location: &str, file: &str) -> Result<String> {
        let output = self.read(&format!("show md5 file /{location}:/{file}")).await?;
        Ok(parse::parse_last_line(&output)?)
    }

    /// Unwind to Normal, close the shell, then the relay.
    ///
    /// The relay is closed even when closing the shell fails; the first error wins.
    pub async fn close(mut self) -> Result<()> {
        let shell_result = self.executor.close(self.config.timeouts.settle).await;
        if let Err(e) = &shell_result {
            warn!("closing device shell: {e}");
        }
        if let Some(relay) = self.relay.take() {
            debug!("closing relay on port {}", relay.local_port());
            relay.close().await?;
        }
        shell_result
    }

    async fn read(&mut self, command: &str) -> Result<String> {
        self.executor.run(command, self.config.timeouts.read).await
    }
}
