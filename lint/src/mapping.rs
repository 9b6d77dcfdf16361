//! Findings to editor annotations.

use codesense_types::{Annotation, Finding, Position, Range};

/// Map findings to point annotations, one per finding, in order.
///
/// The analyzer reports no end column, so each range is zero-width at the
/// start of the offending token: `(line - 1, column)`.
#[must_use]
pub fn map_findings(findings: &[Finding], source: &str) -> Vec<Annotation> {
    findings
        .iter()
        .map(|finding| to_annotation(finding, source))
        .collect()
}

fn to_annotation(finding: &Finding, source: &str) -> Annotation {
    // Finding guarantees line >= 1.
    let at = Position::new(finding.line() - 1, finding.column());
    Annotation::new(
        Range::point(at),
        finding.severity(),
        finding.message().to_string(),
        finding.code().clone(),
        source.to_string(),
    )
}
