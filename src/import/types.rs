use crate::http::ImportCause;
use crate::item_map::ItemMap;
use crate::models::Source;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a unit of work (or of a whole source when fatal)
#[derive(Error, Debug)]
#[error("[{origin}] {}: {cause}", .champion.as_deref().unwrap_or("*"))]
pub struct ImportError {
    pub origin: Source,
    pub champion: Option<String>,
    pub cause: ImportCause,
}

impl ImportError {
    pub fn new(origin: Source, champion: Option<&str>, cause: ImportCause) -> Self {
        Self {
            origin,
            champion: champion.map(str::to_string),
            cause,
        }
    }

    /// Source-level failure not tied to one champion
    pub fn for_source(origin: Source, cause: ImportCause) -> Self {
        Self::new(origin, None, cause)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, ImportCause::Cancelled)
    }
}

/// Result of one build file: the written path, or why it was not written
pub type UnitOutcome = Result<PathBuf, ImportError>;

/// Progress updates during import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportProgress {
    Fetching {
        identity: String,
        champion: String,
        source: Source,
    },
    Fetched {
        identity: String,
    },
    Failed {
        identity: String,
        error: String,
    },
    Cancelled {
        identity: String,
    },
    SourceDone {
        source: Source,
    },
}

impl ImportProgress {
    pub fn identity(&self) -> Option<&str> {
        match self {
            ImportProgress::Fetching { identity, .. }
            | ImportProgress::Fetched { identity }
            | ImportProgress::Failed { identity, .. }
            | ImportProgress::Cancelled { identity } => Some(identity),
            ImportProgress::SourceDone { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Fetching,
    Fetched,
    Cancelled,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Fetched | TaskState::Cancelled | TaskState::Failed
        )
    }
}

/// One outstanding unit of network work, as seen by observers
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTask {
    pub identity: String,
    pub champion: String,
    pub source: Source,
    state: TaskState,
}

impl FetchTask {
    pub fn new(identity: String, champion: String, source: Source) -> Self {
        Self {
            identity,
            champion,
            source,
            state: TaskState::Pending,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Move to `next`. Returns false (and keeps the current state) once terminal.
    pub fn transition(&mut self, next: TaskState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }
}

/// Data version a source published, resolved once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVersion {
    pub source: Source,
    pub version: String,
}

impl SourceVersion {
    pub fn new(source: Source, version: impl Into<String>) -> Self {
        Self {
            source,
            version: version.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.version
    }
}

/// Lifecycle of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Clearing,
    Importing,
    Completed,
    PartiallyFailed,
    Cancelled,
}

/// Everything the caller decides for one import run
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub sources: BTreeSet<Source>,
    pub target_dir: PathBuf,
    pub keep_old: bool,
    pub item_map: Arc<ItemMap>,
}

/// Settled result of one source
#[derive(Debug, Default)]
pub struct SourceReport {
    /// Unset when the version lookup itself failed
    pub version: Option<SourceVersion>,
    pub written: Vec<PathBuf>,
    pub failed: Vec<ImportError>,
    pub cancelled: usize,
    /// Set when the source could not build its unit list at all
    pub fatal: Option<ImportError>,
}

impl SourceReport {
    pub fn from_outcomes(version: Option<SourceVersion>, outcomes: Vec<UnitOutcome>) -> Self {
        let mut report = SourceReport {
            version,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(path) => report.written.push(path),
                Err(e) if e.is_cancelled() => report.cancelled += 1,
                Err(e) => report.failed.push(e),
            }
        }
        report
    }

    pub fn from_fatal(version: Option<SourceVersion>, error: ImportError) -> Self {
        let mut report = SourceReport {
            version,
            ..Default::default()
        };
        if error.is_cancelled() {
            report.cancelled += 1;
        }
        report.fatal = Some(error);
        report
    }
}

/// Aggregate `{succeeded, failed, cancelled}` report of a run
#[derive(Debug)]
pub struct ImportReport {
    pub state: RunState,
    pub sources: Vec<(Source, SourceReport)>,
}

impl ImportReport {
    pub fn source(&self, source: Source) -> Option<&SourceReport> {
        self.sources
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, r)| r)
    }

    pub fn succeeded(&self) -> usize {
        self.sources.iter().map(|(_, r)| r.written.len()).sum()
    }

    /// Failed units plus fatally failed sources, cancellations excluded
    pub fn failed(&self) -> usize {
        self.sources
            .iter()
            .map(|(_, r)| {
                r.failed.len()
                    + r.fatal
                        .as_ref()
                        .map(|e| usize::from(!e.is_cancelled()))
                        .unwrap_or(0)
            })
            .sum()
    }

    pub fn cancelled(&self) -> usize {
        self.sources.iter().map(|(_, r)| r.cancelled).sum()
    }
}
