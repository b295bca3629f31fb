//! Pure projections of a `ReportSummary` for display.
//!
//! Everything here is recomputed from the immutable result on every call —
//! no derived state is cached, so displayed counts can never drift from
//! the underlying findings.

use crate::models::{DiscussionQuestion, Finding, FindingStatus, ReportSummary};

/// Finding tallies by interpreted status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindingCounts {
    pub normal: usize,
    pub borderline: usize,
    pub abnormal: usize,
}

impl FindingCounts {
    pub fn total(&self) -> usize {
        self.normal + self.borderline + self.abnormal
    }
}

/// Count findings by status.
pub fn finding_counts(summary: &ReportSummary) -> FindingCounts {
    let mut counts = FindingCounts::default();
    for finding in &summary.findings {
        match finding.status {
            FindingStatus::Normal => counts.normal += 1,
            FindingStatus::Borderline => counts.borderline += 1,
            FindingStatus::Abnormal => counts.abnormal += 1,
        }
    }
    counts
}

/// Findings with the given status, original order preserved.
pub fn findings_with_status(
    summary: &ReportSummary,
    status: FindingStatus,
) -> Vec<&Finding> {
    summary
        .findings
        .iter()
        .filter(|f| f.status == status)
        .collect()
}

/// Discussion questions paired with their 1-based display number.
pub fn numbered_questions(summary: &ReportSummary) -> Vec<(usize, &DiscussionQuestion)> {
    summary
        .discussion_questions
        .iter()
        .enumerate()
        .map(|(i, q)| (i + 1, q))
        .collect()
}
