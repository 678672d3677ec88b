//! Errors raised while starting or driving a practice session.

use thiserror::Error;

use crate::progress_io::ProgressError;

/// Session start failed; the shell falls back to the empty/disabled state.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The sentence list could not be fetched at all.
    #[error("Failed to read sentences from {location}: {reason}")]
    SentencesUnreachable { location: String, reason: String },
    /// The sentence list was fetched but is not a JSON array of strings.
    #[error("Sentence list at {location} is not a JSON array of strings: {reason}")]
    SentencesMalformed { location: String, reason: String },
    /// The progress store could not be read.
    #[error("Failed to read practice progress: {0}")]
    Progress(#[from] ProgressError),
}

/// A controller operation was called with an unusable argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No sentences are loaded")]
    Empty,
    #[error("Sentence index {index} is out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
