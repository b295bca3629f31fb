use serde::{Deserialize, Serialize};

/// Interpreted status of a single lab finding.
///
/// Drives presentation grouping and visual classification only — the
/// interpretation itself is made by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingStatus {
    Normal,
    Borderline,
    Abnormal,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Borderline => "BORDERLINE",
            Self::Abnormal => "ABNORMAL",
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lab test result with its interpreted status. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub test_name: String,
    pub value: String,
    pub reference_range: String,
    pub status: FindingStatus,
    pub explanation: String,
}

/// A medical term explained in plain language, ordered as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

/// A suggested question to raise with a healthcare provider.
///
/// Display numbering is 1-based (index + 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionQuestion {
    pub question: String,
    pub context: String,
}

/// The structured summary produced by one successful analysis call.
///
/// Produced atomically — never partially updated. The service may omit
/// any of the list sections, so they default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
    #[serde(default)]
    pub discussion_questions: Vec<DiscussionQuestion>,
    #[serde(default)]
    pub disclaimer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_status_serializes_uppercase() {
        let json = serde_json::to_string(&FindingStatus::Borderline).unwrap();
        assert_eq!(json, "\"BORDERLINE\"");
    }

    #[test]
    fn finding_status_round_trip() {
        for status in [
            FindingStatus::Normal,
            FindingStatus::Borderline,
            FindingStatus::Abnormal,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: FindingStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn finding_deserializes_camel_case_wire_names() {
        let json = r#"{
            "testName": "WBC",
            "value": "7.2",
            "referenceRange": "4.5-11.0",
            "status": "NORMAL",
            "explanation": "White blood cell count is within the expected range."
        }"#;
        let finding: Finding = serde_json::from_str(json).unwrap();
        assert_eq!(finding.test_name, "WBC");
        assert_eq!(finding.reference_range, "4.5-11.0");
        assert_eq!(finding.status, FindingStatus::Normal);
    }

    #[test]
    fn report_summary_parses_full_payload() {
        let json = r#"{
            "summary": "All values look normal.",
            "findings": [
                {"testName": "WBC", "value": "7.2", "referenceRange": "4.5-11.0",
                 "status": "NORMAL", "explanation": "Within range."}
            ],
            "glossary": [{"term": "WBC", "definition": "White blood cells."}],
            "discussionQuestions": [
                {"question": "Should I repeat this test?", "context": "Routine follow-up."}
            ],
            "disclaimer": "Not medical advice."
        }"#;
        let summary: ReportSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.findings.len(), 1);
        assert_eq!(summary.glossary.len(), 1);
        assert_eq!(summary.discussion_questions.len(), 1);
        assert_eq!(summary.disclaimer, "Not medical advice.");
    }

    #[test]
    fn report_summary_tolerates_missing_sections() {
        let json = r#"{"summary": "Short report."}"#;
        let summary: ReportSummary = serde_json::from_str(json).unwrap();
        assert!(summary.findings.is_empty());
        assert!(summary.glossary.is_empty());
        assert!(summary.discussion_questions.is_empty());
        assert!(summary.disclaimer.is_empty());
    }
}
