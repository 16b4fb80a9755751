//! `show platform` fixed-width table.
//!
//! Column boundaries are byte offsets and assumed stable across releases:
//!
//! ```text
//! Node              Type                       State             Config state
//! 0         1         2         3         4         5         6         7
//! 0123456789012345678901234567890123456789012345678901234567890123456789012345678
//! ```

use std::ops::Range;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, ParseError};

const PARSER: &str = "show platform";
const HEADER_LINES: usize = 4;

const NODE: Range<usize> = 0..17;
const TYPE: Range<usize> = 18..44;
const STATE: Range<usize> = 45..62;
const CONFIG_STATE: Range<usize> = 63..79;

/// One row of `show platform`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub node: String,
    /// The `Type` column.
    pub kind: String,
    pub state: String,
    pub config_state: String,
}

/// Parse `show platform`, skipping the fixed header block.
pub fn parse_platform(text: &str) -> Result<Vec<PlatformEntry>, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < HEADER_LINES {
        return Err(ParseError::new(PARSER, text, "output shorter than the table header"));
    }

    let mut entries = Vec::new();
    for line in &lines[HEADER_LINES..] {
        if line.trim().is_empty() {
            continue;
        }
        let entry = PlatformEntry {
            node: column(line, NODE)?,
            kind: column(line, TYPE)?,
            state: column(line, STATE)?,
            config_state: column(line, CONFIG_STATE)?,
        };
        if entry.node.is_empty() {
            return Err(ParseError::new(PARSER, line, "row without a node column"));
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Slice `range` out of `line`, clamped to the line length, trimmed.
fn column(line: &str, range: Range<usize>) -> Result<String, ParseError> {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    line.get(start..end)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ParseError::new(PARSER, line, "column boundary inside a multi-byte character"))
}

/// Verify the node set and each node's state against `expected` (node -> state).
pub fn check_platform(
    entries: &[PlatformEntry],
    expected: &IndexMap<String, String>,
) -> Result<(), DriverError> {
    if entries.len() != expected.len() {
        return Err(DriverError::PlatformMismatch {
            message: format!("expected {} nodes, found {}", expected.len(), entries.len()),
        });
    }
    for entry in entries {
        match expected.get(&entry.node) {
            None => {
                return Err(DriverError::PlatformMismatch {
                    message: format!("unexpected node {}", entry.node),
                });
            }
            Some(state) if *state != entry.state => {
                return Err(DriverError::PlatformMismatch {
                    message: format!("{} is '{}', expected '{}'", entry.node, entry.state, state),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Index entries by node id, keeping table order.
pub fn by_node(entries: Vec<PlatformEntry>) -> IndexMap<String, PlatformEntry> {
    entries.into_iter().map(|e| (e.node.clone(), e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_PLATFORM: &str = "\
Mon Oct 19 10:00:00.123 UTC
Node              Type                       State             Config state
--------------------------------------------------------------------------------
0/RSP0/CPU0       A99-RSP-SE(Active)         IOS XR RUN        NSHUT
0/RSP1/CPU0       A99-RSP-SE(Standby)        IOS XR RUN        NSHUT
0/0/CPU0          A9K-8X100GE-SE             IOS XR RUN        NSHUT
0/FT0             ASR-9906-FAN               OPERATIONAL       NSHUT
";

    #[test]
    fn test_parse_platform() {
        let text = format!("\n{SHOW_PLATFORM}");
        let entries = parse_platform(&text).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries[1],
            PlatformEntry {
                node: "0/RSP1/CPU0".into(),
                kind: "A99-RSP-SE(Standby)".into(),
                state: "IOS XR RUN".into(),
                config_state: "NSHUT".into(),
            }
        );
        assert_eq!(entries[0].kind, "A99-RSP-SE(Active)");
        assert_eq!(entries[3].node, "0/FT0");
        assert_eq!(entries[3].state, "OPERATIONAL");
    }

    #[test]
    fn test_header_plus_n_rows() {
        let header = "a\nb\nc\nd\n";
        let row = "0/RP0/CPU0        NCS-55A1-24H(Active)       IOS XR RUN        NSHUT\n";
        for n in 0..4 {
            let text = format!("{header}{}", row.repeat(n));
            assert_eq!(parse_platform(&text).unwrap().len(), n);
        }
    }

    #[test]
    fn test_short_rows_are_clamped() {
        let text = "a\nb\nc\nd\n0/PM0             PWR-4.4KW-DC-V3\n";
        let entries = parse_platform(text).unwrap();
        assert_eq!(entries[0].kind, "PWR-4.4KW-DC-V3");
        assert_eq!(entries[0].state, "");
    }

    #[test]
    fn test_truncated_header_is_error() {
        assert!(parse_platform("Node Type\n----\n").is_err());
    }

    #[test]
    fn test_check_platform() {
        let entries = parse_platform(&format!("\n{SHOW_PLATFORM}")).unwrap();
        let mut expected = IndexMap::new();
        expected.insert("0/RSP0/CPU0".to_string(), "IOS XR RUN".to_string());
        expected.insert("0/RSP1/CPU0".to_string(), "IOS XR RUN".to_string());
        expected.insert("0/0/CPU0".to_string(), "IOS XR RUN".to_string());
        expected.insert("0/FT0".to_string(), "OPERATIONAL".to_string());
        assert!(check_platform(&entries, &expected).is_ok());

        expected.insert("0/FT0".to_string(), "IOS XR RUN".to_string());
        assert!(matches!(
            check_platform(&entries, &expected),
            Err(DriverError::PlatformMismatch { .. })
        ));

        expected.shift_remove("0/FT0");
        assert!(check_platform(&entries, &expected).is_err());
    }

    #[test]
    fn test_by_node_keeps_order() {
        let entries = parse_platform(&format!("\n{SHOW_PLATFORM}")).unwrap();
        let map = by_node(entries);
        let nodes: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(nodes, vec!["0/RSP0/CPU0", "0/RSP1/CPU0", "0/0/CPU0", "0/FT0"]);
    }
}
