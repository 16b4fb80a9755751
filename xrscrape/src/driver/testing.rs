//! In-memory [`Shell`] replaying canned device output.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::bytes::Regex;

use super::Shell;
use super::response::Response;
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::platform::vendors::iosxr;

const PROMPT: &str = "RP/0/RSP0/CPU0:router#";

/// Everything the scripted shell was asked to do, in order.
#[derive(Debug, Default)]
pub(crate) struct Transcript {
    /// Prompt-driven commands (`send_command`, `send_command_expecting`).
    pub commands: Vec<String>,
    /// Raw writes, verbatim.
    pub written: Vec<String>,
    pub closed: bool,
}

/// Shell that answers from a script.
///
/// Prompt-driven commands look up their reply by command text; an unknown
/// command times out. Raw writes queue their reply (if any) for the next
/// `read_channel`. A reply registered several times is served in order, the
/// last one repeating.
pub(crate) struct ScriptedShell {
    platform: PlatformDefinition,
    command_replies: HashMap<String, VecDeque<String>>,
    write_replies: HashMap<String, VecDeque<String>>,
    pending: String,
    config_mode: bool,
    transcript: Arc<Mutex<Transcript>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self {
            platform: iosxr::platform(),
            command_replies: HashMap::new(),
            write_replies: HashMap::new(),
            pending: String::new(),
            config_mode: false,
            transcript: Arc::default(),
        }
    }

    /// Reply for a prompt-driven command.
    pub fn on_command(mut self, command: &str, output: &str) -> Self {
        self.command_replies
            .entry(command.to_string())
            .or_default()
            .push_back(output.to_string());
        self
    }

    /// Output that becomes readable after `text` is written as a line.
    pub fn on_write(mut self, text: &str, output: &str) -> Self {
        self.write_replies
            .entry(text.to_string())
            .or_default()
            .push_back(output.to_string());
        self
    }

    /// Handle for inspecting the transcript after the shell has been boxed.
    pub fn transcript(&self) -> Arc<Mutex<Transcript>> {
        Arc::clone(&self.transcript)
    }

    pub fn written(&self) -> Vec<String> {
        self.transcript.lock().unwrap().written.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.transcript.lock().unwrap().commands.clone()
    }

    fn next_reply(replies: &mut HashMap<String, VecDeque<String>>, key: &str) -> Option<String> {
        let queue = replies.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn reply(&mut self, command: &str, timeout: Duration) -> Result<Response> {
        self.transcript.lock().unwrap().commands.push(command.to_string());
        let output = Self::next_reply(&mut self.command_replies, command)
            .ok_or(ChannelError::PatternTimeout(timeout))?;
        let response = Response::new(command, output.clone(), output, PROMPT, Duration::ZERO);
        Ok(match self.platform.detect_failure(&response.result).map(String::from) {
            Some(marker) => response.with_failure(marker),
            None => response,
        })
    }
}

#[async_trait]
impl Shell for ScriptedShell {
    async fn send_command(&mut self, command: &str, timeout: Duration) -> Result<Response> {
        self.reply(command, timeout)
    }

    async fn send_command_expecting(
        &mut self,
        command: &str,
        _expected: &Regex,
        timeout: Duration,
    ) -> Result<Response> {
        self.reply(command, timeout)
    }

    async fn write_channel(&mut self, text: &str) -> Result<()> {
        self.transcript.lock().unwrap().written.push(text.to_string());
        let key = text.strip_suffix('\n').unwrap_or(text);
        if let Some(output) = Self::next_reply(&mut self.write_replies, key) {
            self.pending.push_str(&output);
        }
        Ok(())
    }

    async fn read_channel(&mut self) -> Result<String> {
        Ok(std::mem::take(&mut self.pending))
    }

    async fn enter_config_mode(&mut self) -> Result<String> {
        if self.config_mode {
            return Err(DriverError::InvalidConfig {
                message: "already in configuration mode".into(),
            }
            .into());
        }
        self.config_mode = true;
        self.transcript
            .lock()
            .unwrap()
            .commands
            .push("configure terminal".to_string());
        Ok("RP/0/RSP0/CPU0:router(config)#".to_string())
    }

    async fn exit_config_mode(&mut self) -> Result<String> {
        self.config_mode = false;
        self.transcript.lock().unwrap().commands.push("end".to_string());
        Ok(PROMPT.to_string())
    }

    async fn close(&mut self) -> Result<()> {
        self.transcript.lock().unwrap().closed = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.transcript.lock().unwrap().closed
    }
}
