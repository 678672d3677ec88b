// Declare all modules that are part of this library
pub mod config;
pub mod types {
    pub mod revision;
}
pub mod parsing;
pub mod http_client;
pub mod logging;
pub mod progress_io;
pub mod revision_service;
pub mod sentence_source;
pub mod session;

pub use config::Config;
pub use progress_io::{JsonFileProgressStore, MemoryProgressStore, ProgressStore};
pub use revision_service::{HttpRevisionService, RevisionService};
pub use session::{PracticeSession, SessionState};
