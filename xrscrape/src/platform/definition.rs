//! Platform definition for a CLI flavour.

use regex::bytes::Regex;

/// Everything the shell needs to know about one CLI flavour.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "iosxr", "linux").
    pub name: String,

    /// Matches the prompt in any mode the synchronous strategy can wait on
    /// (exec and configuration).
    pub prompt_pattern: Regex,

    /// Command entering configuration mode.
    pub config_enter: Option<String>,

    /// Command leaving configuration mode.
    pub config_exit: Option<String>,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with a prompt pattern.
    pub fn new(name: impl Into<String>, prompt_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            prompt_pattern: Regex::new(prompt_pattern)?,
            config_enter: None,
            config_exit: None,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        })
    }

    /// Set the commands used to enter and leave configuration mode.
    pub fn with_config_mode(mut self, enter: impl Into<String>, exit: impl Into<String>) -> Self {
        self.config_enter = Some(enter.into());
        self.config_exit = Some(exit.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// First failure pattern contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Strip the command echo and the trailing prompt line from raw output.
    ///
    /// Only the echo line itself is removed; blank lines after it are part
    /// of the command output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let raw = raw.replace("\r\n", "\n");
        let output = raw.trim_start_matches(['\r', '\n']);
        let output = match output.strip_prefix(command) {
            Some(rest) => {
                let rest = rest.trim_start_matches('\r');
                rest.strip_prefix('\n').unwrap_or(rest)
            }
            None => output,
        };

        match output.rfind('\n') {
            Some(pos) => output[..pos].to_string(),
            None if self.prompt_pattern.is_match(output.as_bytes()) => String::new(),
            None => output.to_string(),
        }
    }
}
