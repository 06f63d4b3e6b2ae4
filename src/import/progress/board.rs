use crate::import::types::{FetchTask, ImportProgress, TaskState};
use crate::models::Source;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Observer-side view of every task of a run, folded from progress events
#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: HashMap<String, FetchTask>,
    done_sources: BTreeSet<Source>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, progress: &ImportProgress) {
        match progress {
            ImportProgress::Fetching {
                identity,
                champion,
                source,
            } => {
                let task = self.tasks.entry(identity.clone()).or_insert_with(|| {
                    FetchTask::new(identity.clone(), champion.clone(), *source)
                });
                task.transition(TaskState::Fetching);
            }
            ImportProgress::Fetched { identity } => self.settle(identity, TaskState::Fetched),
            ImportProgress::Failed { identity, .. } => self.settle(identity, TaskState::Failed),
            ImportProgress::Cancelled { identity } => self.settle(identity, TaskState::Cancelled),
            ImportProgress::SourceDone { source } => {
                self.done_sources.insert(*source);
            }
        }
    }

    fn settle(&mut self, identity: &str, state: TaskState) {
        match self.tasks.get_mut(identity) {
            Some(task) => {
                task.transition(state);
            }
            None => warn!("Progress for unknown task {}", identity),
        }
    }

    pub fn task(&self, identity: &str) -> Option<&FetchTask> {
        self.tasks.get(identity)
    }

    pub fn count(&self, state: TaskState) -> usize {
        self.tasks.values().filter(|t| t.state() == state).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_source_done(&self, source: Source) -> bool {
        self.done_sources.contains(&source)
    }
}
