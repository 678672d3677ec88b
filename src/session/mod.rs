//! Practice session: state machine, controller and background submits.

pub mod controller;
pub mod errors;
pub mod state;
pub mod worker;

pub use controller::{CompletedSubmission, PendingSubmission, PracticeSession, SubmissionApplied};
pub use errors::{LoadError, SessionError};
pub use state::{SessionState, SubmissionPhase, SubmissionTicket};
pub use worker::RevisionWorker;
