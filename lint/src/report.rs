//! Report parser: analyzer text output to structured findings.
//!
//! The analyzer emits one finding per line in the form
//! `path:<line>:<col>: <CODE>: <message>`. The path prefix is ignored; the
//! match anchors on the first `:<line>:<col>: <CODE>: ` fragment anywhere in
//! the line, so drive letters and colons inside paths are harmless. Lines
//! without that fragment (banners, score summaries, blank lines) are dropped.

use std::sync::OnceLock;

use codesense_types::{Finding, LintCode};
use regex::Regex;

fn report_line_regex() -> &'static Regex {
    static REPORT_LINE: OnceLock<Regex> = OnceLock::new();
    REPORT_LINE.get_or_init(|| {
        Regex::new(r":(\d+):(\d+):\s([A-Z]\d{4}):\s(.+)").expect("valid report line regex")
    })
}

/// Parse a full analyzer report into findings, preserving line order.
#[must_use]
pub fn parse_report(raw: &str) -> Vec<Finding> {
    raw.trim().lines().filter_map(parse_line).collect()
}

/// Parse a single report line. `None` means the line is not a finding.
#[must_use]
pub fn parse_line(line: &str) -> Option<Finding> {
    let caps = report_line_regex().captures(line)?;
    let line_no = caps[1].parse::<u32>().ok()?;
    let column = caps[2].parse::<u32>().ok()?;
    let code = LintCode::parse(&caps[3]).ok()?;
    let message = caps[4].trim();
    match Finding::new(line_no, column, code, message) {
        Ok(finding) => Some(finding),
        Err(e) => {
            tracing::debug!(line, "Dropping report line: {e}");
            None
        }
    }
}
