pub mod message;
pub mod report;

pub use message::{ChatMessage, ChatRole};
pub use report::{DiscussionQuestion, Finding, FindingStatus, GlossaryEntry, ReportSummary};
