//! Session state and its pure transitions
//!
//! Every transition takes the current snapshot and returns a new one; the
//! controller layers the progress store and revision service on top.

use std::collections::BTreeSet;

use crate::types::revision::{Revision, RevisionOutcome};

/// Where the active sentence is in its submit cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Completed,
    Failed,
}

/// Identifies the request a completion belongs to.
///
/// A completion is only applied while both fields still match the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubmissionTicket {
    pub epoch: u64,
    pub index: usize,
}

/// Complete session snapshot
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    /// `None` before load and when the sentence list is empty
    pub active_index: Option<usize>,
    pub draft_translation: String,
    pub last_result: Option<RevisionOutcome>,
    /// Only ever grows during a session
    pub practiced_indices: BTreeSet<usize>,
    pub submission_in_flight: bool,
    /// Bumped on every navigation and every submit
    pub epoch: u64,
}

impl SessionState {
    /// Initial state right after a load
    pub fn loaded(sentence_count: usize, practiced_indices: BTreeSet<usize>) -> Self {
        SessionState {
            active_index: (sentence_count > 0).then_some(0),
            practiced_indices,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        if self.submission_in_flight {
            return SubmissionPhase::Submitting;
        }
        match &self.last_result {
            Some(RevisionOutcome::Revised(_)) => SubmissionPhase::Completed,
            Some(RevisionOutcome::Unavailable { .. }) => SubmissionPhase::Failed,
            None => SubmissionPhase::Idle,
        }
    }

    /// Move to `index`, discarding the draft, the result and any outstanding submit
    pub fn selected(&self, index: usize) -> Self {
        SessionState {
            active_index: Some(index),
            draft_translation: String::new(),
            last_result: None,
            practiced_indices: self.practiced_indices.clone(),
            submission_in_flight: false,
            epoch: self.epoch + 1,
        }
    }

    pub fn with_draft(&self, text: String) -> Self {
        SessionState {
            draft_translation: text,
            ..self.clone()
        }
    }

    /// Start a submit for the active sentence.
    ///
    /// Returns `None` when nothing is active or a submit is already outstanding.
    pub fn submitting(&self) -> Option<(Self, SubmissionTicket)> {
        let index = self.active_index?;
        if self.submission_in_flight {
            return None;
        }
        let next = SessionState {
            submission_in_flight: true,
            epoch: self.epoch + 1,
            ..self.clone()
        };
        let ticket = SubmissionTicket {
            epoch: next.epoch,
            index,
        };
        Some((next, ticket))
    }

    /// Whether a completion for `ticket` may still touch this state
    pub fn accepts(&self, ticket: SubmissionTicket) -> bool {
        self.submission_in_flight
            && self.epoch == ticket.epoch
            && self.active_index == Some(ticket.index)
    }

    /// Apply a successful revision. `None` if the ticket is stale.
    pub fn revised(&self, ticket: SubmissionTicket, revision: Revision) -> Option<Self> {
        if !self.accepts(ticket) {
            return None;
        }
        let mut practiced_indices = self.practiced_indices.clone();
        practiced_indices.insert(ticket.index);
        Some(SessionState {
            last_result: Some(RevisionOutcome::Revised(revision)),
            practiced_indices,
            submission_in_flight: false,
            ..self.clone()
        })
    }

    /// Apply a failure sentinel. `None` if the ticket is stale.
    pub fn failed(&self, ticket: SubmissionTicket, reason: String) -> Option<Self> {
        if !self.accepts(ticket) {
            return None;
        }
        Some(SessionState {
            last_result: Some(RevisionOutcome::Unavailable { reason }),
            submission_in_flight: false,
            ..self.clone()
        })
    }
}
