//! Applies the fixes carried by findings to the text they were found in.
//!
//! Offsets in findings always refer to the original text. Accepted fixes are
//! applied from the end of the text towards the start, so an edit never moves
//! a span that has yet to be rewritten.

use crate::rules::Finding;
use std::ops::Range;

/// Outcome of a fix pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    pub text: String,
    /// Fixes that changed the text.
    pub applied: usize,
    /// Fixable findings dropped because an earlier finding claimed their span.
    pub skipped_overlap: usize,
    /// Fixes whose span no longer matched, or that declined to rewrite.
    pub skipped_stale: usize,
}

/// Apply every applicable fix in `findings` to `original`.
pub fn fix(original: &str, findings: &[Finding]) -> String {
    fix_with_report(original, findings).text
}

pub fn fix_with_report(original: &str, findings: &[Finding]) -> FixReport {
    let mut report = FixReport {
        text: original.to_string(),
        ..FixReport::default()
    };

    // Earlier findings (registration order) win overlapping spans.
    let mut accepted: Vec<&Finding> = Vec::new();
    for finding in findings.iter().filter(|f| f.is_fixable()) {
        let span = finding.span();
        if accepted.iter().any(|a| overlaps(&a.span(), &span)) {
            tracing::debug!(
                rule = %finding.rule_id,
                offset = finding.offset,
                "fix overlaps an earlier fix"
            );
            report.skipped_overlap += 1;
            continue;
        }
        accepted.push(finding);
    }

    // Back to front. At equal offsets the longer span goes first so that an
    // insertion at the same point lands in front of its rewrite.
    accepted.sort_by(|a, b| {
        b.offset
            .cmp(&a.offset)
            .then_with(|| b.span().end.cmp(&a.span().end))
    });

    for finding in accepted {
        let span = finding.span();
        if report.text.get(span.clone()) != Some(finding.matched.as_str()) {
            tracing::warn!(rule = %finding.rule_id, offset = finding.offset, "skipping stale fix");
            report.skipped_stale += 1;
            continue;
        }
        match finding.replacement() {
            Some(new) if new != finding.matched => {
                report.text.replace_range(span, &new);
                report.applied += 1;
            }
            Some(_) => {}
            None => report.skipped_stale += 1,
        }
    }

    report
}

/// Whether two spans claim any of the same text. An empty span (an insertion
/// point) only conflicts with a span that strictly contains it.
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    if a.is_empty() {
        return b.start < a.start && a.start < b.end;
    }
    if b.is_empty() {
        return a.start < b.start && b.start < a.end;
    }
    a.start < b.end && b.start < a.end
}
