use crate::http::ImportCause;
use crate::models::Source;
use futures::future::{abortable, AbortHandle, Aborted};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    handles: HashMap<String, AbortHandle>,
    cancelled: bool,
}

/// Abort handles for one source's outstanding network calls within one run.
///
/// Every call is registered under its task identity for as long as it is in
/// flight. Once `cancel_all` has been called, new calls fail immediately.
pub struct CancellationRegistry {
    source: Source,
    state: Mutex<RegistryState>,
}

/// Removes the identity from the registry when the call settles or is dropped
struct Registration<'a> {
    registry: &'a CancellationRegistry,
    identity: &'a str,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.lock().handles.remove(self.identity);
    }
}

impl CancellationRegistry {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drive `call` under `identity`; resolves `Err(Cancelled)` if it is aborted.
    pub async fn run<T, F>(&self, identity: &str, call: F) -> Result<T, ImportCause>
    where
        F: Future<Output = Result<T, ImportCause>>,
    {
        let (call, handle) = abortable(call);
        {
            let mut state = self.lock();
            if state.cancelled {
                debug!("{} already cancelled, skipping {}", self.source, identity);
                return Err(ImportCause::Cancelled);
            }
            state.handles.insert(identity.to_string(), handle);
        }

        let _registration = Registration {
            registry: self,
            identity,
        };

        match call.await {
            Ok(result) => result,
            Err(Aborted) => Err(ImportCause::Cancelled),
        }
    }

    /// Abort the call registered under `identity`. Returns false if none is in flight.
    pub fn cancel(&self, identity: &str) -> bool {
        match self.lock().handles.remove(identity) {
            Some(handle) => {
                handle.abort();
                debug!("Cancelled {}", identity);
                true
            }
            None => false,
        }
    }

    /// Abort every outstanding call and refuse new ones
    pub fn cancel_all(&self) {
        let handles: Vec<AbortHandle> = {
            let mut state = self.lock();
            state.cancelled = true;
            state.handles.drain().map(|(_, h)| h).collect()
        };

        info!(
            "Cancelling {}: {} call(s) in flight",
            self.source,
            handles.len()
        );
        for handle in handles {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Number of calls currently in flight
    pub fn outstanding(&self) -> usize {
        self.lock().handles.len()
    }
}
