//! Generic snapshot-to-local-state bridge.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::warn;

use brightfold_store::{
    CollectionEvent, CollectionPath, DocEvent, DocPath, Document, DocumentStore, StoreError,
    WatchTarget,
};

/// Error surfaced when a subscription fails outside the normal call stack.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subscription error: {message}")]
pub struct SyncError {
    pub message: String,
}

/// Local view of a synchronized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState<T> {
    /// No scope bound, or a rebind is in flight and no snapshot has arrived.
    Idle,
    /// In step with the most recent remote snapshot.
    Live(T),
    /// The subscription failed; the last live value (if any) is retained so
    /// the UI can keep rendering while surfacing the error.
    Degraded {
        last: Option<T>,
        error: SyncError,
    },
}

struct Shared<T> {
    state: SyncState<T>,
    /// Bumped on every rebind/unbind. A delivery task applies a snapshot
    /// only if its generation is still current, so an event pulled off the
    /// channel just before teardown can never be applied after it.
    generation: u64,
}

struct ActiveWatch {
    target: WatchTarget,
    task: JoinHandle<()>,
}

/// Keeps a local value consistent with a remote document or collection.
///
/// Every snapshot fully replaces the local value - merge semantics belong to
/// the aggregate repositories, not this layer. The mapping closure converts
/// the raw snapshot into the aggregate type (typically via the repository's
/// decode function).
pub struct SyncController<T> {
    shared: Arc<Mutex<Shared<T>>>,
    active: Option<ActiveWatch>,
}

impl<T> Default for SyncController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SyncController<T> {
    /// Create an unbound controller in the [`SyncState::Idle`] state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: SyncState::Idle,
                generation: 0,
            })),
            active: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        match self.shared.lock() {
            Ok(shared) => shared,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The target of the currently bound subscription, if any.
    #[must_use]
    pub fn target(&self) -> Option<&WatchTarget> {
        self.active.as_ref().map(|active| &active.target)
    }

    /// Tear down the active subscription and return to [`SyncState::Idle`].
    ///
    /// Runs synchronously: after this returns, no snapshot from the old
    /// subscription can be applied, even one already pulled off the channel.
    pub fn unbind(&mut self) {
        let mut shared = self.lock();
        shared.generation += 1;
        shared.state = SyncState::Idle;
        drop(shared);

        if let Some(active) = self.active.take() {
            active.task.abort();
        }
    }
}

impl<T: Send + 'static> SyncController<T> {
    /// Bind to a single document, replacing any previous binding.
    ///
    /// The previous subscription is torn down before the new one is
    /// established; the state passes through [`SyncState::Idle`] so no
    /// stale-scope value is ever visible under the new binding.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the subscription cannot be established.
    pub fn bind_doc<S, F>(&mut self, store: &S, path: &DocPath, map: F) -> Result<(), StoreError>
    where
        S: DocumentStore,
        F: Fn(Option<Value>) -> T + Send + 'static,
    {
        self.unbind();

        let watch = store.watch_doc(path)?;
        let generation = self.lock().generation;
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            // The handle lives inside the task so aborting the task also
            // detaches the watcher.
            let _handle = watch.handle;
            let mut events = watch.events;
            while let Some(event) = events.recv().await {
                let next = match event {
                    DocEvent::Snapshot(value) => Delivery::Snapshot(map(value)),
                    DocEvent::Error(message) => Delivery::Error(message),
                };
                if !apply(&shared, generation, next) {
                    break;
                }
            }
        });

        self.active = Some(ActiveWatch {
            target: WatchTarget::Doc(path.clone()),
            task,
        });
        Ok(())
    }

    /// Bind to a collection, replacing any previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the subscription cannot be established.
    pub fn bind_collection<S, F>(
        &mut self,
        store: &S,
        path: &CollectionPath,
        map: F,
    ) -> Result<(), StoreError>
    where
        S: DocumentStore,
        F: Fn(Vec<Document>) -> T + Send + 'static,
    {
        self.unbind();

        let watch = store.watch_collection(path)?;
        let generation = self.lock().generation;
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let _handle = watch.handle;
            let mut events = watch.events;
            while let Some(event) = events.recv().await {
                let next = match event {
                    CollectionEvent::Snapshot(docs) => Delivery::Snapshot(map(docs)),
                    CollectionEvent::Error(message) => Delivery::Error(message),
                };
                if !apply(&shared, generation, next) {
                    break;
                }
            }
        });

        self.active = Some(ActiveWatch {
            target: WatchTarget::Collection(path.clone()),
            task,
        });
        Ok(())
    }
}

impl<T: Clone> SyncController<T> {
    /// The full sync state, including degradation info.
    #[must_use]
    pub fn state(&self) -> SyncState<T> {
        self.lock().state.clone()
    }

    /// The most recent usable value: the live value, or the retained one
    /// while degraded. `None` when idle.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        match &self.lock().state {
            SyncState::Idle => None,
            SyncState::Live(value) => Some(value.clone()),
            SyncState::Degraded { last, .. } => last.clone(),
        }
    }
}

impl<T> Drop for SyncController<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.abort();
        }
    }
}

enum Delivery<T> {
    Snapshot(T),
    Error(String),
}

/// Apply a delivery if `generation` is still current. Returns `false` when
/// the binding has been superseded and the task should stop.
fn apply<T>(shared: &Arc<Mutex<Shared<T>>>, generation: u64, delivery: Delivery<T>) -> bool {
    let mut shared = match shared.lock() {
        Ok(shared) => shared,
        Err(poisoned) => poisoned.into_inner(),
    };
    if shared.generation != generation {
        return false;
    }
    match delivery {
        Delivery::Snapshot(value) => {
            shared.state = SyncState::Live(value);
        }
        Delivery::Error(message) => {
            warn!(error = %message, "subscription degraded");
            let last = match std::mem::replace(&mut shared.state, SyncState::Idle) {
                SyncState::Live(value) => Some(value),
                SyncState::Degraded { last, .. } => last,
                SyncState::Idle => None,
            };
            shared.state = SyncState::Degraded {
                last,
                error: SyncError { message },
            };
        }
    }
    true
}
