//! Cisco IOS-XR platform definition.
//!
//! Covers the exec and configuration prompts of the XR shell. The admin
//! (sysadmin VM) and run (nested linux shell) modes have no prompt the
//! synchronous strategy can rely on and are driven by the mode controller
//! with timed raw exchanges instead.
//!
//! # Prompt Examples
//!
//! ```text
//! RP/0/RSP0/CPU0:pe1#               # exec
//! RP/0/RSP0/CPU0:pe1(config)#       # configuration
//! RP/0/RSP0/CPU0:pe1(config-if)#    # configuration, nested context
//! ```

use crate::platform::PlatformDefinition;

/// Platform name for IOS-XR.
pub const PLATFORM_NAME: &str = "iosxr";

/// Create the IOS-XR platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(
        PLATFORM_NAME,
        r"(?m)^[\w./:\-]+:[\w.\-]+(?:\([\w.\-]+\))?#\s*$",
    )
    .expect("static IOS-XR prompt pattern")
    .with_config_mode("configure terminal", "end")
    .with_on_open_command("terminal length 0")
    .with_on_open_command("terminal width 511")
    .with_failure_pattern("% Invalid input detected")
    .with_failure_pattern("% Incomplete command")
    .with_failure_pattern("% Ambiguous command")
    .with_failure_pattern("% Failed to commit")
    .with_terminal_size(511, 24)
}
