//! Install command outputs: package groups, bracketed package sections and
//! the outcome line of `install ... synchronous`.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Marker preceding the package list of `show install inactive`.
pub const INACTIVE_MARKER: &str = "found";

/// Marker preceding the package list of `show install prepare`.
pub const PREPARED_MARKER: &str = "Prepared Packages";

/// Leading spaces that mark a package line in `admin show install inactive`.
const PACKAGE_INDENT: usize = 7;

const SUCCESS: &str = "successfully";

/// Inactive packages reported for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageGroup {
    pub node: String,
    pub packages: Vec<String>,
}

/// Result of an install operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    /// Install request id, when the outcome line carries one.
    pub request_id: Option<String>,
    pub succeeded: bool,
}

/// Parse `admin show install inactive`.
///
/// ```text
/// Node 0/RSP0 [RP]
///     Inactive Packages:
///        ncs5500-sysadmin-hostos-7.3.2.CSCvz12345
/// ```
pub fn parse_package_groups(text: &str) -> Result<Vec<PackageGroup>, ParseError> {
    const PARSER: &str = "admin show install inactive";

    let mut groups: Vec<PackageGroup> = Vec::new();
    for line in text.lines() {
        if line.contains("Node") {
            let node = line
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| ParseError::new(PARSER, line, "node line without a node id"))?;
            groups.push(PackageGroup {
                node: node.to_string(),
                packages: Vec::new(),
            });
            continue;
        }

        let package = line.trim();
        let indent = line.len() - line.trim_start_matches(' ').len();
        if package.is_empty() || indent < PACKAGE_INDENT {
            continue;
        }
        let group = groups
            .last_mut()
            .ok_or_else(|| ParseError::new(PARSER, line, "package listed before any node"))?;
        group.packages.push(package.to_string());
    }
    Ok(groups)
}

/// Lines after the first one containing `marker`, left-trimmed, up to the
/// next blank line.
///
/// Output without the marker yields an empty list.
pub fn parse_section(text: &str, marker: &str) -> Vec<String> {
    text.lines()
        .skip_while(|line| !line.contains(marker))
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .map(|line| line.trim_start().to_string())
        .collect()
}

/// Inspect the second-to-last line of an install command's output.
///
/// Two outcome shapes are accepted:
///
/// ```text
/// Install operation 8 finished successfully
/// Install add operation successfully id 123
/// ```
pub fn parse_install_outcome(text: &str) -> Result<InstallOutcome, ParseError> {
    const PARSER: &str = "install";

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(ParseError::new(PARSER, text, "output shorter than two lines"));
    }
    let line = lines[lines.len() - 2];
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [.., id, _, last] if *last == SUCCESS => Ok(InstallOutcome {
            request_id: Some(id.to_string()),
            succeeded: true,
        }),
        [.., success, "id", id] if *success == SUCCESS => Ok(InstallOutcome {
            request_id: Some(id.to_string()),
            succeeded: true,
        }),
        [.., last] if *last == SUCCESS => Ok(InstallOutcome {
            request_id: None,
            succeeded: true,
        }),
        _ => Ok(InstallOutcome {
            request_id: None,
            succeeded: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_INACTIVE: &str = "\
Mon Oct 19 10:00:00.123 UTC
Node 0/RSP0 [RP]
    Inactive Packages:
       ncs5500-sysadmin-hostos-7.3.2.CSCvz12345-1.0.0
       ncs5500-sysadmin-system-7.3.2-r732
Node 0/RSP1 [RP]
    Inactive Packages:
       ncs5500-sysadmin-hostos-7.3.2.CSCvz12345-1.0.0

Node 0/0 [LC]
";

    #[test]
    fn test_package_groups() {
        let groups = parse_package_groups(ADMIN_INACTIVE).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].node, "0/RSP0");
        assert_eq!(
            groups[0].packages,
            vec![
                "ncs5500-sysadmin-hostos-7.3.2.CSCvz12345-1.0.0",
                "ncs5500-sysadmin-system-7.3.2-r732"
            ]
        );
        assert_eq!(groups[1].packages.len(), 1);
        assert!(groups[2].packages.is_empty());
    }

    #[test]
    fn test_package_before_node_is_error() {
        let err = parse_package_groups("        orphan-pkg\n").unwrap_err();
        assert_eq!(err.line, "        orphan-pkg");
    }

    const SHOW_INACTIVE: &str = "\
Mon Oct 19 10:00:00.123 UTC
2 inactive package(s) found:
    ncs5500-mpls-te-rsvp-4.1.0.0-r732.x86_64
    ncs5500-k9sec-4.1.0.0-r732.x86_64
";

    #[test]
    fn test_inactive_section() {
        assert_eq!(
            parse_section(SHOW_INACTIVE, INACTIVE_MARKER),
            vec![
                "ncs5500-mpls-te-rsvp-4.1.0.0-r732.x86_64",
                "ncs5500-k9sec-4.1.0.0-r732.x86_64"
            ]
        );
    }

    #[test]
    fn test_prepared_section_stops_at_blank_line() {
        let text = "\
Prepare state: Prepared
Prepared Packages:
    ncs5500-k9sec-4.1.0.0-r732.x86_64

Activate Message:
    Some trailing text";
        assert_eq!(
            parse_section(text, PREPARED_MARKER),
            vec!["ncs5500-k9sec-4.1.0.0-r732.x86_64"]
        );
    }

    #[test]
    fn test_missing_marker_is_empty() {
        assert!(parse_section("No install operation in progress\n", PREPARED_MARKER).is_empty());
    }

    #[test]
    fn test_outcome_finished_successfully() {
        let text = "Install add started\nInstall operation 8 finished successfully\nrouter#";
        assert_eq!(
            parse_install_outcome(text).unwrap(),
            InstallOutcome {
                request_id: Some("8".into()),
                succeeded: true
            }
        );
    }

    #[test]
    fn test_outcome_successfully_id() {
        let text = "Install add started\nInstall add operation successfully id 123\nRP/0/RSP0/CPU0:router#";
        assert_eq!(
            parse_install_outcome(text).unwrap(),
            InstallOutcome {
                request_id: Some("123".into()),
                succeeded: true
            }
        );
    }

    #[test]
    fn test_outcome_failed() {
        let text = "Install add started\nInstall operation 9 failed\nrouter#";
        let outcome = parse_install_outcome(text).unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.request_id, None);
    }

    #[test]
    fn test_outcome_on_last_line_is_not_success() {
        let text = "Install add started\nInstall operation 8 finished successfully";
        assert!(!parse_install_outcome(text).unwrap().succeeded);
    }

    #[test]
    fn test_outcome_too_short_is_error() {
        assert!(parse_install_outcome("successfully").is_err());
    }
}
