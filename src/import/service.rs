// # Import Service - Orchestrator
//
// Coordinates one import run across the selected sources:
// - FileSink: clears the builds subtree unless old builds are kept
// - SourceAdapter: resolves the source version, then fetches and writes its units
// - CancellationRegistry: one per source, so a source can be stopped on its own
//
// Progress flows through a single channel owned by the service; every run
// publishes into it and observers subscribe through `ImportProgressHandle`.

use crate::http::Fetcher;
use crate::import::block_builder::{ScoreSettings, DEFAULT_WEIGHT};
use crate::import::cancellation::CancellationRegistry;
use crate::import::file_sink::clear_builds;
use crate::import::progress::{ImportProgressHandle, ProgressDispatcher};
use crate::import::types::{
    ImportError, ImportProgress, ImportReport, ImportRequest, RunState, SourceReport,
    SourceVersion,
};
use crate::models::Source;
use crate::sources::{build_adapter, ImportContext, SourceAdapter};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Configuration for the per-source unit pools and item set ranking
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Units in flight per source
    pub max_concurrent_requests: usize,
    /// Win-rate weight for ranked sources
    pub score_weight: f64,
    pub score_settings: ScoreSettings,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            score_weight: DEFAULT_WEIGHT,
            score_settings: ScoreSettings::default(),
        }
    }
}

/// Import service owning the fetcher and the progress channel
pub struct ImportService {
    fetcher: Arc<dyn Fetcher>,
    config: ImportConfig,
    progress_tx: mpsc::UnboundedSender<ImportProgress>,
    progress_handle: ImportProgressHandle,
}

impl ImportService {
    /// Create the service; progress fan-out runs on `runtime_handle`
    pub fn new(
        runtime_handle: tokio::runtime::Handle,
        fetcher: Arc<dyn Fetcher>,
        config: ImportConfig,
    ) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let progress_handle = ImportProgressHandle::new(progress_rx, runtime_handle);

        Self {
            fetcher,
            config,
            progress_tx,
            progress_handle,
        }
    }

    pub fn progress(&self) -> &ImportProgressHandle {
        &self.progress_handle
    }

    /// Prepare a run for `request`. Nothing is fetched or written until `execute`.
    pub fn begin(&self, request: ImportRequest) -> ImportRun {
        let adapters: Vec<Arc<dyn SourceAdapter>> = request
            .sources
            .iter()
            .map(|&source| {
                let registry = Arc::new(CancellationRegistry::new(source));
                build_adapter(source, self.fetcher.clone(), registry, &self.config)
            })
            .collect();

        let (state_tx, _) = watch::channel(RunState::Idle);

        ImportRun {
            canceller: RunCanceller {
                adapters: Arc::new(adapters.clone()),
                requested: Arc::new(AtomicBool::new(false)),
            },
            adapters,
            request,
            dispatcher: ProgressDispatcher::new(self.progress_tx.clone()),
            max_concurrent: self.config.max_concurrent_requests,
            state_tx,
        }
    }
}

/// Cancels sources of one run; cloneable so it can outlive the borrow of the run
#[derive(Clone)]
pub struct RunCanceller {
    adapters: Arc<Vec<Arc<dyn SourceAdapter>>>,
    requested: Arc<AtomicBool>,
}

impl RunCanceller {
    /// Abort every outstanding and future call of `source`.
    /// Returns false if the source is not part of the run.
    pub fn cancel_source(&self, source: Source) -> bool {
        match self.adapters.iter().find(|a| a.source() == source) {
            Some(adapter) => {
                info!("Cancelling {}", source);
                self.requested.store(true, Ordering::SeqCst);
                adapter.cancel();
                true
            }
            None => {
                warn!("Cancel requested for {} which is not part of this run", source);
                false
            }
        }
    }

    pub fn cancel_all(&self) {
        info!("Cancelling all sources");
        self.requested.store(true, Ordering::SeqCst);
        for adapter in self.adapters.iter() {
            adapter.cancel();
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// One prepared import run
pub struct ImportRun {
    request: ImportRequest,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    canceller: RunCanceller,
    dispatcher: ProgressDispatcher,
    max_concurrent: usize,
    state_tx: watch::Sender<RunState>,
}

impl ImportRun {
    pub fn canceller(&self) -> RunCanceller {
        self.canceller.clone()
    }

    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: RunState) {
        info!("Import run: {:?}", state);
        self.state_tx.send_replace(state);
    }

    /// Clear, resolve versions, then import every source concurrently.
    /// Resolves once every source has settled.
    pub async fn execute(self) -> ImportReport {
        let target_dir = &self.request.target_dir;

        if !self.request.keep_old {
            self.set_state(RunState::Clearing);
            if let Err(e) = clear_builds(target_dir).await {
                error!("Failed to clear builds in {}: {}", target_dir.display(), e);
            }
        }

        self.set_state(RunState::Importing);

        let versions = join_all(self.adapters.iter().map(|a| a.get_version())).await;

        let runs = self
            .adapters
            .iter()
            .zip(versions)
            .map(|(adapter, version)| self.run_source(adapter.as_ref(), version));
        let sources = join_all(runs).await;

        let mut report = ImportReport {
            state: RunState::Importing,
            sources,
        };
        report.state = final_state(&report, self.canceller.is_requested());

        info!(
            "Import finished: {} written, {} failed, {} cancelled",
            report.succeeded(),
            report.failed(),
            report.cancelled()
        );
        self.set_state(report.state);
        report
    }

    async fn run_source(
        &self,
        adapter: &dyn SourceAdapter,
        version: Result<String, ImportError>,
    ) -> (Source, SourceReport) {
        let source = adapter.source();

        let version = match version {
            Ok(version) => version,
            Err(e) => {
                warn!("{}: no version, skipping source: {}", source, e);
                self.dispatcher.fetch_source_done(source);
                return (source, SourceReport::from_fatal(None, e));
            }
        };
        info!("{}: version {}", source, version);
        let version = SourceVersion::new(source, version);

        let ctx = ImportContext {
            target_dir: self.request.target_dir.clone(),
            item_map: self.request.item_map.clone(),
            version: version.clone(),
            dispatcher: self.dispatcher.clone(),
            max_concurrent: self.max_concurrent,
        };

        let report = match adapter.import(&ctx).await {
            Ok(outcomes) => SourceReport::from_outcomes(Some(version), outcomes),
            Err(e) => {
                warn!("{}: import aborted: {}", source, e);
                self.dispatcher.fetch_source_done(source);
                SourceReport::from_fatal(Some(version), e)
            }
        };

        info!(
            "{}: {} written, {} failed, {} cancelled",
            source,
            report.written.len(),
            report.failed.len(),
            report.cancelled
        );
        (source, report)
    }
}

/// Cancellation wins over failure, failure over completion
fn final_state(report: &ImportReport, cancel_requested: bool) -> RunState {
    if cancel_requested || report.cancelled() > 0 {
        RunState::Cancelled
    } else if report.failed() > 0 {
        RunState::PartiallyFailed
    } else {
        RunState::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ImportCause;
    use std::path::PathBuf;

    fn report(outcomes: Vec<Result<PathBuf, ImportError>>) -> ImportReport {
        ImportReport {
            state: RunState::Importing,
            sources: vec![(
                Source::OpGg,
                SourceReport::from_outcomes(
                    Some(SourceVersion::new(Source::OpGg, "10.16")),
                    outcomes,
                ),
            )],
        }
    }

    fn failure(cause: ImportCause) -> Result<PathBuf, ImportError> {
        Err(ImportError::new(Source::OpGg, Some("Ahri"), cause))
    }

    #[test]
    fn test_final_state() {
        let ok = report(vec![Ok(PathBuf::from("a.json"))]);
        assert_eq!(final_state(&ok, false), RunState::Completed);
        assert_eq!(final_state(&ok, true), RunState::Cancelled);

        let failed = report(vec![
            Ok(PathBuf::from("a.json")),
            failure(ImportCause::Network("timeout".into())),
        ]);
        assert_eq!(final_state(&failed, false), RunState::PartiallyFailed);

        let cancelled = report(vec![
            failure(ImportCause::Network("timeout".into())),
            failure(ImportCause::Cancelled),
        ]);
        assert_eq!(final_state(&cancelled, false), RunState::Cancelled);
    }

    #[test]
    fn test_fatal_source_counts_as_failure() {
        let report = ImportReport {
            state: RunState::Importing,
            sources: vec![(
                Source::LolQq,
                SourceReport::from_fatal(
                    None,
                    ImportError::for_source(Source::LolQq, ImportCause::Parse("bad".into())),
                ),
            )],
        };
        assert_eq!(report.failed(), 1);
        assert_eq!(final_state(&report, false), RunState::PartiallyFailed);
    }
}
