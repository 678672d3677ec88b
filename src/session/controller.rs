//! Practice session controller
//!
//! Owns the sentence list and the current [`SessionState`], and applies the
//! side effects (progress writes, revision requests) around each pure
//! transition. Every operation hands back the resulting snapshot.

use crate::progress_io::ProgressStore;
use crate::revision_service::{PromptSettings, RevisionError, RevisionRequest, RevisionService};
use crate::sentence_source::SentenceSource;
use crate::session::errors::{LoadError, SessionError};
use crate::session::state::{SessionState, SubmissionPhase, SubmissionTicket};
use crate::types::revision::Revision;

/// A submit that has been started but not yet answered
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub ticket: SubmissionTicket,
    pub request: RevisionRequest,
}

/// The service's answer for one pending submission
#[derive(Debug, Clone)]
pub struct CompletedSubmission {
    pub ticket: SubmissionTicket,
    pub result: Result<Revision, RevisionError>,
}

/// What happened to a completion handed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionApplied {
    Revised,
    Failed,
    /// The user moved on (or re-submitted) before the answer arrived
    Stale,
}

pub struct PracticeSession {
    sentences: Vec<String>,
    state: SessionState,
    store: Box<dyn ProgressStore>,
    prompt_settings: PromptSettings,
}

impl PracticeSession {
    /// Fetch the sentences and the stored progress and start at the first sentence
    pub fn load(
        source: &dyn SentenceSource,
        store: Box<dyn ProgressStore>,
    ) -> Result<Self, LoadError> {
        let sentences = source.fetch()?;
        let practiced = store.load()?;
        tracing::info!(
            "Loaded {} sentences from {} ({} practiced)",
            sentences.len(),
            source.location(),
            practiced.len()
        );
        Ok(Self {
            state: SessionState::loaded(sentences.len(), practiced),
            sentences,
            store,
            prompt_settings: PromptSettings::default(),
        })
    }

    pub fn with_prompt_settings(mut self, settings: PromptSettings) -> Self {
        self.prompt_settings = settings;
        self
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.state.phase()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn active_sentence(&self) -> Option<&str> {
        self.state
            .active_index
            .and_then(|i| self.sentences.get(i))
            .map(String::as_str)
    }

    pub fn is_practiced(&self, index: usize) -> bool {
        self.state.practiced_indices.contains(&index)
    }

    /// Practiced sentences that exist in the current list
    pub fn practiced_count(&self) -> usize {
        self.state
            .practiced_indices
            .range(..self.sentences.len())
            .count()
    }

    pub fn can_submit(&self) -> bool {
        self.state.active_index.is_some() && !self.state.submission_in_flight
    }

    pub fn can_advance(&self) -> bool {
        self.state
            .active_index
            .is_some_and(|i| i + 1 < self.sentences.len())
    }

    pub fn select_sentence(&mut self, index: usize) -> Result<SessionState, SessionError> {
        let len = self.sentences.len();
        if len == 0 {
            return Err(SessionError::Empty);
        }
        if index >= len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        if self.state.submission_in_flight {
            tracing::debug!("Leaving sentence with a submission outstanding; its answer will be dropped");
        }
        self.state = self.state.selected(index);
        Ok(self.snapshot())
    }

    pub fn update_draft(&mut self, text: impl Into<String>) -> SessionState {
        self.state = self.state.with_draft(text.into());
        self.snapshot()
    }

    /// Start a submit for the active sentence and current draft.
    ///
    /// Ignored (returns `None`) while another submit is outstanding or when
    /// no sentence is active.
    pub fn begin_submission(&mut self) -> Option<PendingSubmission> {
        let Some((next, ticket)) = self.state.submitting() else {
            tracing::debug!("Submit ignored: nothing active or a submission is in flight");
            return None;
        };
        let sentence = self.sentences.get(ticket.index)?;
        let request = RevisionRequest::for_translation(
            &self.prompt_settings,
            sentence,
            &next.draft_translation,
        );
        self.state = next;
        tracing::info!("Submitting translation for sentence {}", ticket.index);
        Some(PendingSubmission { ticket, request })
    }

    /// Apply a service answer if it still belongs to the active submit
    pub fn complete_submission(&mut self, completed: CompletedSubmission) -> SubmissionApplied {
        let CompletedSubmission { ticket, result } = completed;
        match result {
            Ok(revision) => {
                let Some(next) = self.state.revised(ticket, revision) else {
                    tracing::debug!("Dropping stale revision for sentence {}", ticket.index);
                    return SubmissionApplied::Stale;
                };
                self.state = next;
                if let Err(err) = self.store.save(&self.state.practiced_indices) {
                    tracing::warn!("Failed to persist practice progress: {err}");
                }
                tracing::info!("Revision received for sentence {}", ticket.index);
                SubmissionApplied::Revised
            }
            Err(err) => {
                let Some(next) = self.state.failed(ticket, err.to_string()) else {
                    tracing::debug!("Dropping stale failure for sentence {}: {err}", ticket.index);
                    return SubmissionApplied::Stale;
                };
                self.state = next;
                tracing::warn!("Revision failed for sentence {}: {err}", ticket.index);
                SubmissionApplied::Failed
            }
        }
    }

    /// Blocking submit: begin, call the service, complete.
    pub fn submit_translation(&mut self, service: &dyn RevisionService) -> SessionState {
        if let Some(pending) = self.begin_submission() {
            let result = service.revise(&pending.request);
            self.complete_submission(CompletedSubmission {
                ticket: pending.ticket,
                result,
            });
        }
        self.snapshot()
    }

    /// Select the next sentence; no-op at the last one or when empty
    pub fn advance(&mut self) -> SessionState {
        if let Some(next) = self.state.active_index.map(|i| i + 1) {
            if next < self.sentences.len() {
                self.state = self.state.selected(next);
            }
        }
        self.snapshot()
    }
}
