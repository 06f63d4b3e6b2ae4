use crate::import::types::ImportProgress;
use crate::models::Source;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

type SubscriptionId = u64;

/// Receiving end of one subscription
pub type ProgressReceiver = tokio_mpsc::UnboundedReceiver<ImportProgress>;

/// Filter criteria for progress subscriptions
#[derive(Debug, Clone)]
enum SubscriptionFilter {
    All,
    Source { source: Source },
    Task { identity: String },
}

impl SubscriptionFilter {
    fn matches(&self, progress: &ImportProgress) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Source { source } => match progress {
                ImportProgress::Fetching { source: s, .. } => s == source,
                ImportProgress::SourceDone { source: s } => s == source,
                other => other
                    .identity()
                    .map(|id| belongs_to(id, *source))
                    .unwrap_or(false),
            },
            SubscriptionFilter::Task { identity } => {
                progress.identity() == Some(identity.as_str())
            }
        }
    }
}

/// Identities are `<source prefix>-<unit key>`
fn belongs_to(identity: &str, source: Source) -> bool {
    identity
        .strip_prefix(source.identity_prefix())
        .map(|rest| rest.starts_with('-'))
        .unwrap_or(false)
}

struct Subscription {
    filter: SubscriptionFilter,
    tx: tokio_mpsc::UnboundedSender<ImportProgress>,
}

type Subscriptions = Arc<Mutex<HashMap<SubscriptionId, Subscription>>>;

fn lock(subscriptions: &Subscriptions) -> MutexGuard<'_, HashMap<SubscriptionId, Subscription>> {
    subscriptions.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle for subscribing to import progress updates
#[derive(Clone)]
pub struct ImportProgressHandle {
    subscriptions: Subscriptions,
    next_id: Arc<AtomicU64>,
}

impl ImportProgressHandle {
    /// Create a new progress handle and spawn background task to process progress updates
    pub fn new(
        mut progress_rx: tokio_mpsc::UnboundedReceiver<ImportProgress>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Subscriptions = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let mut subs = lock(&subscriptions_clone);
                let mut to_remove = Vec::new();

                for (id, subscription) in subs.iter() {
                    if subscription.filter.matches(&progress) {
                        // Receiver was dropped
                        if subscription.tx.send(progress.clone()).is_err() {
                            to_remove.push(*id);
                        }
                    }
                }

                for id in to_remove {
                    subs.remove(&id);
                }
            }
            info!("Progress channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn subscribe(&self, filter: SubscriptionFilter) -> ProgressReceiver {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscriptions).insert(id, Subscription { filter, tx });
        rx
    }

    /// Every progress event of every source
    pub fn subscribe_all(&self) -> ProgressReceiver {
        self.subscribe(SubscriptionFilter::All)
    }

    /// Events belonging to one source, including its `SourceDone`
    pub fn subscribe_source(&self, source: Source) -> ProgressReceiver {
        self.subscribe(SubscriptionFilter::Source { source })
    }

    /// Events of a single task identity
    pub fn subscribe_task(&self, identity: String) -> ProgressReceiver {
        self.subscribe(SubscriptionFilter::Task { identity })
    }
}
