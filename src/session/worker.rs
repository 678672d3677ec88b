//! Runs revision requests off the UI thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::revision_service::RevisionService;
use crate::session::controller::{CompletedSubmission, PendingSubmission};

pub struct RevisionWorker {
    service: Arc<dyn RevisionService>,
    tx: Sender<CompletedSubmission>,
    rx: Receiver<CompletedSubmission>,
}

impl RevisionWorker {
    pub fn new(service: Arc<dyn RevisionService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    /// Call the service on a background thread; the answer shows up in [`poll`](Self::poll).
    pub fn dispatch(&self, pending: PendingSubmission) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = service.revise(&pending.request);
            // Receiver gone means the window closed; nothing left to update.
            let _ = tx.send(CompletedSubmission {
                ticket: pending.ticket,
                result,
            });
        });
    }

    /// Drain finished submissions without blocking.
    pub fn poll(&self) -> Vec<CompletedSubmission> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision_service::{RevisionError, RevisionRequest};
    use crate::session::state::SubmissionTicket;
    use crate::types::revision::Revision;
    use std::time::{Duration, Instant};

    struct EchoService;

    impl RevisionService for EchoService {
        fn revise(&self, request: &RevisionRequest) -> Result<Revision, RevisionError> {
            Err(RevisionError::Transport(request.prompt.clone()))
        }
    }

    #[test]
    fn dispatched_submission_comes_back_tagged() {
        let worker = RevisionWorker::new(Arc::new(EchoService));
        let ticket = SubmissionTicket { epoch: 4, index: 2 };
        worker.dispatch(PendingSubmission {
            ticket,
            request: RevisionRequest { prompt: "hi".into() },
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut done = Vec::new();
        while done.is_empty() && Instant::now() < deadline {
            done = worker.poll();
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ticket, ticket);
        assert_eq!(done[0].result, Err(RevisionError::Transport("hi".into())));
    }
}
