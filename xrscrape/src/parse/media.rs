//! `show media location all` and `admin show media location all`.
//!
//! Both listings are a sequence of per-node blocks. The exec flavour opens a
//! block with `Media info for node<X>:`, the admin flavour with
//! `Location : <X>`. Inside a block the `harddisk:` row reads
//! `harddisk: <size> <used> <percent> <avail>` and `<avail>` is a number
//! with a one-letter unit suffix.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

const PARSER: &str = "show media";

/// Availability of one node's harddisk partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSpaceEntry {
    pub node: String,
    /// Raw `<number><unit>` availability token.
    pub available: String,
    /// Unit is not `G`, or the value is below the threshold.
    pub below_threshold: bool,
}

/// Parse a media listing, flagging harddisks with less than `threshold_gb` free.
pub fn parse_media(text: &str, threshold_gb: f64) -> Result<Vec<MediaSpaceEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut node: Option<String> = None;

    for line in text.lines() {
        if line.starts_with("Media") {
            node = Some(media_header_node(line)?);
            continue;
        }
        if line.starts_with("Location :") {
            let id = line
                .split_whitespace()
                .nth(2)
                .ok_or_else(|| ParseError::new(PARSER, line, "location header without a node"))?;
            node = Some(id.to_string());
            continue;
        }
        if !line.starts_with("harddisk:") {
            continue;
        }

        let current = node
            .as_deref()
            .ok_or_else(|| ParseError::new(PARSER, line, "harddisk row before any node header"))?;
        let available = line
            .split_whitespace()
            .nth(4)
            .ok_or_else(|| ParseError::new(PARSER, line, "harddisk row without an availability column"))?;

        entries.push(MediaSpaceEntry {
            node: current.to_string(),
            available: available.to_string(),
            below_threshold: is_below(line, available, threshold_gb)?,
        });
    }

    Ok(entries)
}

/// Node ids of the flagged entries, in listing order.
pub fn nodes_below_threshold(entries: &[MediaSpaceEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.below_threshold)
        .map(|e| e.node.clone())
        .collect()
}

/// `Media info for node0_RSP0_CPU0:` -> `0_RSP0_CPU0`
fn media_header_node(line: &str) -> Result<String, ParseError> {
    let (_, rest) = line
        .split_once("node")
        .ok_or_else(|| ParseError::new(PARSER, line, "media header without a node"))?;
    let id = rest.trim_end();
    let id = id.strip_suffix(':').unwrap_or(id);
    if id.is_empty() {
        return Err(ParseError::new(PARSER, line, "media header without a node"));
    }
    Ok(id.to_string())
}

fn is_below(line: &str, available: &str, threshold_gb: f64) -> Result<bool, ParseError> {
    let Some(number) = available.strip_suffix('G') else {
        return Ok(true);
    };
    let value: f64 = number.parse().map_err(|_| {
        ParseError::new(PARSER, line, format!("availability '{available}' is not a number"))
    })?;
    Ok(value < threshold_gb)
}
