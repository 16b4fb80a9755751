//! `admin dir` stanzas, the free-space filter and `dir <address>` listings.

use serde::{Deserialize, Serialize};

use super::last_token;
use crate::error::ParseError;

/// One module stanza of `admin dir <address> location all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpaceReport {
    /// Node id from the stanza header.
    pub node: String,
    /// Value of the `total` line.
    pub total_kb: u64,
    /// File names, in listing order.
    pub files: Vec<String>,
    /// The terminating `<n> kbytes total (<m> kbytes free)` line, verbatim.
    pub amount_line: String,
}

impl ModuleSpaceReport {
    /// Free KB, taken from the fourth token of the amount line.
    ///
    /// The token carries a leading `(` (or sign) which is dropped.
    pub fn free_kb(&self) -> Result<u64, ParseError> {
        let token = self.amount_line.split_whitespace().nth(3).ok_or_else(|| {
            ParseError::new(PARSER, &self.amount_line, "amount line has fewer than 4 tokens")
        })?;
        let digits = match token.chars().next() {
            Some(c) if !c.is_ascii_digit() => &token[c.len_utf8()..],
            _ => token,
        };
        digits.parse().map_err(|_| {
            ParseError::new(PARSER, &self.amount_line, format!("free space '{token}' is not a number"))
        })
    }
}

const PARSER: &str = "admin dir";

#[derive(Default)]
struct OpenStanza<'a> {
    node: Option<&'a str>,
    header: &'a str,
    total_kb: Option<u64>,
    files: Vec<&'a str>,
}

/// Parse `admin dir` output into one report per module stanza.
///
/// ```text
/// node: node0_RSP0_CPU0
/// ------------------------------------------------------------------
/// total 1440
/// -rw-r--r--. 1 root root  1234 Oct 19 10:00 ncs5500-mini-x.iso
/// 3899228 kbytes total (1204800 kbytes free)
/// ```
pub fn parse_admin_dir(text: &str) -> Result<Vec<ModuleSpaceReport>, ParseError> {
    let mut reports = Vec::new();
    let mut stanza = OpenStanza::default();

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if line.starts_with("node") {
            if stanza.total_kb.is_some() {
                return Err(ParseError::new(
                    PARSER,
                    stanza.header,
                    "stanza not terminated by a 'kbytes total' line",
                ));
            }
            let node = tokens
                .get(1)
                .copied()
                .ok_or_else(|| ParseError::new(PARSER, line, "node header without a node id"))?;
            stanza = OpenStanza {
                node: Some(node),
                header: line,
                ..OpenStanza::default()
            };
            continue;
        }

        if line.starts_with("total") {
            if stanza.node.is_none() {
                return Err(ParseError::new(PARSER, line, "'total' line outside a node stanza"));
            }
            let total = tokens
                .get(1)
                .and_then(|t| t.parse::<u64>().ok())
                .ok_or_else(|| ParseError::new(PARSER, line, "'total' line without a KB count"))?;
            stanza.total_kb = Some(total);
            continue;
        }

        let Some(total_kb) = stanza.total_kb else {
            continue;
        };
        if tokens.is_empty() {
            continue;
        }

        if tokens.get(1) == Some(&"kbytes") && tokens.get(2) == Some(&"total") {
            let files = stanza.files.iter().filter_map(|f| last_token(f)).map(String::from).collect();
            reports.push(ModuleSpaceReport {
                node: stanza.node.unwrap_or_default().to_string(),
                total_kb,
                files,
                amount_line: line.to_string(),
            });
            stanza = OpenStanza::default();
        } else {
            stanza.files.push(line);
        }
    }

    if stanza.total_kb.is_some() {
        return Err(ParseError::new(
            PARSER,
            stanza.header,
            "stanza not terminated by a 'kbytes total' line",
        ));
    }

    Ok(reports)
}

/// Nodes whose free space is strictly below `threshold_kb`.
pub fn free_space_below(
    reports: &[ModuleSpaceReport],
    threshold_kb: u64,
) -> Result<Vec<String>, ParseError> {
    let mut nodes = Vec::new();
    for report in reports {
        if report.free_kb()? < threshold_kb {
            nodes.push(report.node.clone());
        }
    }
    Ok(nodes)
}

/// File names from `dir <address>` output.
///
/// The final two lines (blank separator and `kbytes total` summary) are
/// dropped; everything after the `Directory of` header is a file line.
pub fn parse_dir_listing(text: &str) -> Result<Vec<String>, ParseError> {
    const PARSER: &str = "dir";

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(ParseError::new(PARSER, text, "listing shorter than its two summary lines"));
    }
    let body = &lines[..lines.len() - 2];

    let header = body.iter().position(|line| {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        tokens.len() >= 3 && tokens[0] == "Directory" && tokens[1] == "of"
    });
    let Some(header) = header else {
        return Err(ParseError::new(PARSER, "", "no 'Directory of' header"));
    };

    Ok(body[header + 1..]
        .iter()
        .filter_map(|line| last_token(line))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_DIR: &str = "\
Mon Oct 19 10:00:00.123 UTC

node: node0_RSP0_CPU0
------------------------------------------------------------------
total 1440
-rw-r--r--. 1 root root       1234 Oct 19 10:00 ncs5500-mini-x.iso
-rw-r--r--. 1 root root        512 Oct 18 09:12 admin-cli.log
drwx------. 2 root root      16384 Oct  1 00:00 lost+found
3899228 kbytes total (1204800 kbytes free)

node: node0_RSP1_CPU0
------------------------------------------------------------------
total 20
-rw-r--r--. 1 root root        512 Oct 18 09:12 admin-cli.log
3899228 kbytes total (3500000 kbytes free)
";

    #[test]
    fn test_stanzas_in_device_order() {
        let reports = parse_admin_dir(ADMIN_DIR).unwrap();
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].node, "node0_RSP0_CPU0");
        assert_eq!(reports[0].total_kb, 1440);
        assert_eq!(
            reports[0].files,
            vec!["ncs5500-mini-x.iso", "admin-cli.log", "lost+found"]
        );
        assert_eq!(reports[0].amount_line, "3899228 kbytes total (1204800 kbytes free)");

        assert_eq!(reports[1].node, "node0_RSP1_CPU0");
        assert_eq!(reports[1].files.len(), 1);
    }

    #[test]
    fn test_reparse_is_stable() {
        assert_eq!(parse_admin_dir(ADMIN_DIR).unwrap(), parse_admin_dir(ADMIN_DIR).unwrap());
    }

    #[test]
    fn test_empty_stanza() {
        let text = "node: node0_RP0_CPU0\ntotal 0\n100 kbytes total (90 kbytes free)\n";
        let reports = parse_admin_dir(text).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].files.is_empty());
    }

    #[test]
    fn test_unterminated_stanza_is_error() {
        let text = "node: node0_RP0_CPU0\ntotal 4\n-rw-r--r--. 1 root root 1 Oct 1 00:00 a\n";
        let err = parse_admin_dir(text).unwrap_err();
        assert_eq!(err.line, "node: node0_RP0_CPU0");
    }

    #[test]
    fn test_node_header_without_id_is_error() {
        let err = parse_admin_dir("node\ntotal 4\n").unwrap_err();
        assert_eq!(err.line, "node");
    }

    #[test]
    fn test_total_outside_stanza_is_error() {
        let err = parse_admin_dir("total 12\n").unwrap_err();
        assert_eq!(err.line, "total 12");
    }

    #[test]
    fn test_free_kb() {
        let reports = parse_admin_dir(ADMIN_DIR).unwrap();
        assert_eq!(reports[0].free_kb().unwrap(), 1_204_800);
        assert_eq!(reports[1].free_kb().unwrap(), 3_500_000);
    }

    #[test]
    fn test_free_space_below_threshold_is_strict() {
        let reports = parse_admin_dir(ADMIN_DIR).unwrap();
        assert_eq!(free_space_below(&reports, 2_000_000).unwrap(), vec!["node0_RSP0_CPU0"]);
        assert!(free_space_below(&reports, 1_204_800).unwrap().is_empty());
        assert_eq!(free_space_below(&reports, 1_204_801).unwrap(), vec!["node0_RSP0_CPU0"]);
        assert_eq!(free_space_below(&reports, 4_000_000).unwrap().len(), 2);
    }

    #[test]
    fn test_free_kb_malformed_amount_line() {
        let report = ModuleSpaceReport {
            node: "n".into(),
            total_kb: 0,
            files: vec![],
            amount_line: "12 kbytes total".into(),
        };
        assert!(report.free_kb().is_err());
    }

    const DIR: &str = "\
Mon Oct 19 10:00:00.123 UTC

Directory of harddisk:

   12 -rwxr--r--. 1  1048576 Oct 19 10:00 ncs5500-k9sec-rpm.tar
   13 -rwxr--r--. 1     2048 Oct 19 10:01 show_tech.tgz

31154688 kbytes total (29012332 kbytes free)";

    #[test]
    fn test_dir_listing() {
        assert_eq!(
            parse_dir_listing(DIR).unwrap(),
            vec!["ncs5500-k9sec-rpm.tar", "show_tech.tgz"]
        );
    }

    #[test]
    fn test_dir_listing_without_header_is_error() {
        assert!(parse_dir_listing("foo\nbar\n\nsummary").is_err());
        assert!(parse_dir_listing("x").is_err());
    }
}
