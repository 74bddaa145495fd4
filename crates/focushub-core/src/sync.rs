//! Fire-and-forget persistence bookkeeping.
//!
//! Controllers mutate their in-memory state first and hand the backend call
//! to [`PendingSyncs`]. Nobody waits on the result unless they call
//! [`PendingSyncs::drain`], which the CLI does before exiting.
//!
//! Calls queued on one [`PendingSyncs`] run one after another in the order
//! they were spawned, so a write to a record never overtakes the create that
//! made it, and [`IdMap`] lets the later write find the server id.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinSet;

/// Server id assigned to a record that was created with a local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRemap {
    pub local: String,
    pub server: String,
}

/// Outcome of creates issued with a local id, shared with queued calls.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    settled: Arc<Mutex<HashMap<String, Option<String>>>>,
}

impl IdMap {
    /// Record how the create for `local` ended. `None` means it failed.
    pub fn settle(&self, local: &str, server: Option<&str>) {
        self.lock()
            .insert(local.to_string(), server.map(str::to_string));
    }

    /// Id to address on the backend, or `None` when the record never made it
    /// there.
    pub fn resolve(&self, id: &str) -> Option<String> {
        match self.lock().get(id) {
            None => Some(id.to_string()),
            Some(server) => server.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Option<String>>> {
        self.settled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-flight backend calls issued by one controller.
#[derive(Debug, Default)]
pub struct PendingSyncs {
    set: JoinSet<Option<IdRemap>>,
    tail: Option<oneshot::Receiver<()>>,
    ids: IdMap,
}

impl PendingSyncs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> IdMap {
        self.ids.clone()
    }

    /// Spawn a backend call behind every call spawned before it. Must be
    /// called from within a Tokio runtime.
    pub fn spawn<F>(&mut self, call: F)
    where
        F: Future<Output = Option<IdRemap>> + Send + 'static,
    {
        let (done, next) = oneshot::channel();
        let previous = self.tail.replace(next);
        self.set.spawn(async move {
            if let Some(previous) = previous {
                // An aborted predecessor drops its sender; carry on regardless.
                let _ = previous.await;
            }
            let out = call.await;
            let _ = done.send(());
            out
        });
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Wait for every in-flight call and collect id remaps from creates.
    pub async fn drain(&mut self) -> Vec<IdRemap> {
        let mut remaps = Vec::new();
        while let Some(joined) = self.set.join_next().await {
            match joined {
                Ok(Some(remap)) => remaps.push(remap),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "backend sync task failed"),
            }
        }
        self.tail = None;
        remaps
    }
}
