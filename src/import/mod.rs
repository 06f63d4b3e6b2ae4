// # Import Module
//
// Build import pipeline with focused, testable components:
//
// - **BlockBuilder**: Turns ranked items into Starters / Boots / Core blocks
// - **FileSink**: Writes build files into the game's champion config tree
// - **CancellationRegistry**: Per-source abort handles for in-flight calls
// - **Progress**: Event dispatcher, filtered subscriptions and a task board
// - **ImportService**: Orchestrates clear, version lookup and source imports
//
// Public API:
// - `ImportService`: Create the service and begin runs
// - `ImportRun` / `RunCanceller`: Execute a run, watch its state, cancel sources
// - `ImportRequest`: What to import and where
// - `ImportProgress`: Real-time progress updates

pub mod block_builder;
pub mod cancellation;
pub mod file_sink;
pub mod progress;
mod service;
pub(crate) mod types;

// Public API exports
pub use progress::{ImportProgressHandle, ProgressDispatcher, TaskBoard};
pub use service::{ImportConfig, ImportRun, ImportService, RunCanceller};
pub use types::{
    FetchTask, ImportError, ImportProgress, ImportReport, ImportRequest, RunState, SourceReport,
    SourceVersion, TaskState, UnitOutcome,
};
