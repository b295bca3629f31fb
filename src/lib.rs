//! LabClear — a client for understanding medical lab reports.
//!
//! The core is the client interaction state machine: input capture,
//! asynchronous analysis submission, result rendering, error recovery,
//! and multi-turn follow-up chat against a remote analysis service.
//! The terminal front end in `main.rs` is thin glue over this library.

pub mod client; // HTTP seam: AnalysisApi trait + reqwest client + mock
pub mod config;
pub mod conversation; // Follow-up thread: append-only log, serialized turns
pub mod input; // Staged file / draft text capture
pub mod models;
pub mod presentation; // Pure projections of a ReportSummary
pub mod session; // Idle → Submitting → Ready/Failed state machine
