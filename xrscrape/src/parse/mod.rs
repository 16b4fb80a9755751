//! Device output grammar.
//!
//! One parser per command family. Every parser is a pure function of the
//! captured text: no state is kept between calls and no command is issued.
//! The layouts below are the fixed IOS-XR output formats; column offsets and
//! marker strings live next to the parser that relies on them.
//!
//! Text that does not fit its grammar yields a [`ParseError`] carrying the
//! offending line instead of a panic or silently dropped data.

mod dir;
mod install;
mod media;
mod platform;

pub use dir::{ModuleSpaceReport, free_space_below, parse_admin_dir, parse_dir_listing};
pub use install::{
    INACTIVE_MARKER, InstallOutcome, PREPARED_MARKER, PackageGroup, parse_install_outcome,
    parse_package_groups, parse_section,
};
pub use media::{MediaSpaceEntry, nodes_below_threshold, parse_media};
pub use platform::{PlatformEntry, by_node, check_platform, parse_platform};

use crate::error::ParseError;

/// Last whitespace-separated token of a line.
pub(crate) fn last_token(line: &str) -> Option<&str> {
    line.split_whitespace().next_back()
}

/// Last non-empty line, verbatim (`show md5 file ...`).
pub fn parse_last_line(text: &str) -> Result<String, ParseError> {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(String::from)
        .ok_or_else(|| ParseError::new("last line", "", "empty output"))
}

/// Same elements regardless of order, counting duplicates.
pub fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        match b.iter().enumerate().position(|(i, y)| !used[i] && y == x) {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}
