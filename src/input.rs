//! Input capture for the two submission modes.
//!
//! The user stages either a document file or pasted text. Modes are
//! mutually exclusive for submission, but switching modes keeps the other
//! mode's staged input so nothing is lost by tabbing back and forth.
//! No network I/O happens here — `submission()` just produces the
//! normalized payload the session submits.

use thiserror::Error;

/// Minimum trimmed length pasted text must exceed before it can be
/// submitted. Guards against accidental near-empty submissions.
pub const MIN_TEXT_CHARS: usize = 10;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("the selected file is empty")]
    EmptyFile,
}

/// Which input mode is active. Only the active mode's input is eligible
/// for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    File,
    Text,
}

/// A file the user has selected but not yet submitted.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Normalized submission payload handed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Document { name: String, bytes: Vec<u8> },
    Text(String),
}

/// Staged user input, one file and one text draft at most.
#[derive(Debug, Default)]
pub struct InputCapture {
    mode: InputMode,
    staged_file: Option<StagedFile>,
    draft_text: String,
}

impl InputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Switch the active mode. The inactive mode's staged input is kept.
    pub fn switch_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Stage a file for submission, replacing any previously staged file.
    /// The only client-side content check is "non-empty".
    pub fn stage_file(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), InputError> {
        if bytes.is_empty() {
            return Err(InputError::EmptyFile);
        }
        self.staged_file = Some(StagedFile {
            name: name.into(),
            bytes,
        });
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.staged_file = None;
    }

    pub fn staged_file(&self) -> Option<&StagedFile> {
        self.staged_file.as_ref()
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    /// Whether the active mode's input is eligible for submission.
    pub fn can_submit(&self) -> bool {
        match self.mode {
            InputMode::File => self.staged_file.is_some(),
            InputMode::Text => self.draft_text.trim().chars().count() > MIN_TEXT_CHARS,
        }
    }

    /// The normalized payload for the active mode, or `None` when the
    /// submission gate is closed. Text is submitted trimmed.
    pub fn submission(&self) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }
        match self.mode {
            InputMode::File => self.staged_file.as_ref().map(|f| Submission::Document {
                name: f.name.clone(),
                bytes: f.bytes.clone(),
            }),
            InputMode::Text => Some(Submission::Text(self.draft_text.trim().to_string())),
        }
    }
}

/// Human-readable file size for the staged-file display.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
