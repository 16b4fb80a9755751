//! Linux platform definition, used for the bastion server shell.

use crate::platform::PlatformDefinition;

/// Platform name for Linux hosts.
pub const PLATFORM_NAME: &str = "linux";

/// Create the Linux platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, r"[$#]\s*$")
        .expect("static linux prompt pattern")
        .with_failure_pattern("command not found")
        .with_failure_pattern("No such file or directory")
        .with_failure_pattern("Permission denied")
        .with_failure_pattern("Operation not permitted")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_platform() {
        let p = platform();
        assert_eq!(p.name, "linux");
        assert!(p.config_enter.is_none());
    }

    #[test]
    fn test_prompt_match() {
        let p = platform();
        assert!(p.prompt_pattern.is_match(b"user@host:~$ "));
        assert!(p.prompt_pattern.is_match(b"root@host:~# "));
        assert!(!p.prompt_pattern.is_match(b"user@host's password:"));
    }

    #[test]
    fn test_failed_when_contains() {
        let p = platform();
        assert_eq!(
            p.detect_failure("ls: cannot access '/x': No such file or directory"),
            Some("No such file or directory")
        );
    }
}
