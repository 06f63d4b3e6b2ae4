use crate::import::types::ImportProgress;
use crate::models::Source;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::trace;

/// Fire-and-forget publisher of progress events.
///
/// Sends never block and never fail the caller: once every receiver is gone
/// events are silently dropped.
#[derive(Clone)]
pub struct ProgressDispatcher {
    tx: tokio_mpsc::UnboundedSender<ImportProgress>,
}

impl ProgressDispatcher {
    pub fn new(tx: tokio_mpsc::UnboundedSender<ImportProgress>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, progress: ImportProgress) {
        trace!("Progress: {:?}", progress);
        let _ = self.tx.send(progress);
    }

    pub fn add_fetching(&self, identity: &str, champion: &str, source: Source) {
        self.emit(ImportProgress::Fetching {
            identity: identity.to_string(),
            champion: champion.to_string(),
            source,
        });
    }

    /// Data for `identity` has arrived (the file is not written yet)
    pub fn add_fetched(&self, identity: &str) {
        self.emit(ImportProgress::Fetched {
            identity: identity.to_string(),
        });
    }

    pub fn task_failed(&self, identity: &str, error: &str) {
        self.emit(ImportProgress::Failed {
            identity: identity.to_string(),
            error: error.to_string(),
        });
    }

    pub fn task_cancelled(&self, identity: &str) {
        self.emit(ImportProgress::Cancelled {
            identity: identity.to_string(),
        });
    }

    /// Every unit of `source` has settled
    pub fn fetch_source_done(&self, source: Source) {
        self.emit(ImportProgress::SourceDone { source });
    }
}
