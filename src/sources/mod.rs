// # Sources
//
// Each third-party provider lives behind `SourceAdapter`. Adapters own their wire
// formats and URLs; the shared per-unit plumbing (progress events, cancellation,
// error wrapping, bounded concurrency, file writes) is composed in via `UnitRunner`.

mod lol_qq;
mod murderbridge;
mod op_gg;

pub use lol_qq::{parse_code, LolQq};
pub use murderbridge::MurderBridge;
pub use op_gg::OpGg;

use crate::http::{Fetcher, ImportCause};
use crate::import::cancellation::CancellationRegistry;
use crate::import::file_sink::save_to_file;
use crate::import::progress::ProgressDispatcher;
use crate::import::types::{ImportError, SourceVersion, UnitOutcome};
use crate::import::ImportConfig;
use crate::item_map::ItemMap;
use crate::models::{BuildFile, Source};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a source needs to run its units within one import run
#[derive(Clone)]
pub struct ImportContext {
    pub target_dir: PathBuf,
    pub item_map: Arc<ItemMap>,
    pub version: SourceVersion,
    pub dispatcher: ProgressDispatcher,
    /// Upper bound on units in flight for this source
    pub max_concurrent: usize,
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Data version the source currently publishes
    async fn get_version(&self) -> Result<String, ImportError>;

    /// Fetch, transform and write every build file of this source.
    ///
    /// `Err` means the unit list could not be built at all (roster unavailable).
    /// Individual unit failures are reported inside the returned outcomes.
    async fn import(&self, ctx: &ImportContext) -> Result<Vec<UnitOutcome>, ImportError>;

    /// Abort every in-flight call of this adapter. Writes already issued still finish.
    fn cancel(&self);
}

/// Create the adapter for `source`, bound to the run's cancellation registry
pub fn build_adapter(
    source: Source,
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<CancellationRegistry>,
    config: &ImportConfig,
) -> Arc<dyn SourceAdapter> {
    match source {
        Source::OpGg => Arc::new(OpGg::new(fetcher, registry)),
        Source::LolQq => Arc::new(LolQq::new(fetcher, registry)),
        Source::MurderBridge => Arc::new(
            MurderBridge::new(fetcher, registry)
                .with_scoring(config.score_weight, config.score_settings.clone()),
        ),
    }
}

/// Per-unit plumbing shared by every adapter
pub struct UnitRunner {
    source: Source,
    registry: Arc<CancellationRegistry>,
}

impl UnitRunner {
    pub fn new(registry: Arc<CancellationRegistry>) -> Self {
        Self {
            source: registry.source(),
            registry,
        }
    }

    pub fn identity(&self, unit_key: &str) -> String {
        self.source.identity(unit_key)
    }

    /// Run a source-level call (roster, version) under `identity`, without task events
    pub async fn call<T, F>(&self, identity: &str, call: F) -> Result<T, ImportError>
    where
        F: Future<Output = Result<T, ImportCause>>,
    {
        self.registry
            .run(identity, call)
            .await
            .map_err(|cause| ImportError::for_source(self.source, cause))
    }

    /// Run the network part of a unit, publishing its task events
    pub async fn fetch<T, F>(
        &self,
        dispatcher: &ProgressDispatcher,
        identity: &str,
        champion: &str,
        call: F,
    ) -> Result<T, ImportError>
    where
        F: Future<Output = Result<T, ImportCause>>,
    {
        dispatcher.add_fetching(identity, champion, self.source);

        match self.registry.run(identity, call).await {
            Ok(data) => {
                dispatcher.add_fetched(identity);
                Ok(data)
            }
            Err(ImportCause::Cancelled) => {
                dispatcher.task_cancelled(identity);
                Err(ImportError::new(
                    self.source,
                    Some(champion),
                    ImportCause::Cancelled,
                ))
            }
            Err(cause) => {
                warn!("{} failed: {}", identity, cause);
                dispatcher.task_failed(identity, &cause.to_string());
                Err(ImportError::new(self.source, Some(champion), cause))
            }
        }
    }

    pub async fn write(&self, ctx: &ImportContext, file: &BuildFile) -> UnitOutcome {
        save_to_file(&ctx.target_dir, file)
            .await
            .map_err(|cause| ImportError::new(self.source, Some(file.champion()), cause))
    }

    /// Drive `units` with at most `ctx.max_concurrent` in flight; waits for all of
    /// them whatever their outcome, then signals the source as done.
    pub async fn run_units<U, F, Fut>(
        &self,
        ctx: &ImportContext,
        units: Vec<U>,
        run_unit: F,
    ) -> Vec<UnitOutcome>
    where
        F: Fn(U) -> Fut,
        Fut: Future<Output = Vec<UnitOutcome>>,
    {
        let total = units.len();
        info!("{}: starting {} unit(s)", self.source, total);

        let outcomes: Vec<UnitOutcome> = stream::iter(units)
            .map(run_unit)
            .buffer_unordered(ctx.max_concurrent.max(1))
            .flat_map(stream::iter)
            .collect()
            .await;

        debug!(
            "{}: {} unit(s) settled with {} outcome(s)",
            self.source,
            total,
            outcomes.len()
        );
        ctx.dispatcher.fetch_source_done(self.source);
        outcomes
    }

    pub fn cancel(&self) {
        self.registry.cancel_all();
    }
}
