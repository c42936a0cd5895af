//! In-memory document store.
//!
//! [`MemoryStore`] implements the full [`DocumentStore`] contract, including
//! change subscriptions, against a process-local map. It backs every test in
//! the workspace and doubles as the reference implementation for the
//! adapter's semantics: snapshot delivery order, merge-write behavior, and
//! watcher teardown.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::path::{CollectionPath, DocPath};
use crate::query::{Direction, Query};
use crate::subscription::{
    CollectionEvent, CollectionWatch, DocEvent, DocWatch, Unwatch, WatchHandle, WatchId,
    WatchTarget,
};
use crate::value;
use crate::{Document, DocumentStore, StoreError, WriteMode};

/// An in-memory [`DocumentStore`].
///
/// Cloning is cheap and clones share the same underlying state, so a test
/// can hand one clone to a repository and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    next_watch_id: AtomicU64,
}

#[derive(Debug, Default)]
struct State {
    docs: BTreeMap<DocPath, Value>,
    doc_watchers: HashMap<DocPath, Vec<(WatchId, mpsc::UnboundedSender<DocEvent>)>>,
    collection_watchers:
        HashMap<CollectionPath, Vec<(WatchId, mpsc::UnboundedSender<CollectionEvent>)>>,
}

impl State {
    fn collection_docs(&self, collection: &CollectionPath) -> Vec<Document> {
        self.docs
            .iter()
            .filter(|(path, _)| collection.contains(path))
            .map(|(path, doc_value)| Document {
                path: path.clone(),
                value: doc_value.clone(),
            })
            .collect()
    }

    /// Push the current state of `path` to its watchers and the watchers of
    /// its parent collection. Watchers whose receiver is gone are pruned.
    fn notify(&mut self, path: &DocPath) {
        let doc_value = self.docs.get(path).cloned();
        if let Some(watchers) = self.doc_watchers.get_mut(path) {
            watchers.retain(|(_, sender)| {
                sender.send(DocEvent::Snapshot(doc_value.clone())).is_ok()
            });
        }

        let parent = path.parent();
        if self.collection_watchers.contains_key(&parent) {
            let docs = self.collection_docs(&parent);
            if let Some(watchers) = self.collection_watchers.get_mut(&parent) {
                watchers.retain(|(_, sender)| {
                    sender.send(CollectionEvent::Snapshot(docs.clone())).is_ok()
                });
            }
        }
    }
}

impl Unwatch for Inner {
    fn unwatch(&self, id: WatchId) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        for watchers in state.doc_watchers.values_mut() {
            watchers.retain(|(watch_id, _)| *watch_id != id);
        }
        for watchers in state.collection_watchers.values_mut() {
            watchers.retain(|(watch_id, _)| *watch_id != id);
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.inner.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn registry(&self) -> Weak<dyn Unwatch> {
        let registry: Arc<dyn Unwatch> = self.inner.clone();
        Arc::downgrade(&registry)
    }

    fn next_watch_id(&self) -> WatchId {
        WatchId(self.inner.next_watch_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().docs.get(path).cloned())
    }

    async fn set(&self, path: &DocPath, new: Value, mode: WriteMode) -> Result<(), StoreError> {
        let mut state = self.lock();
        match mode {
            WriteMode::Merge if state.docs.contains_key(path) => {
                if let Some(existing) = state.docs.get_mut(path) {
                    value::merge(existing, new);
                }
            }
            _ => {
                state.docs.insert(path.clone(), new);
            }
        }
        state.notify(path);
        Ok(())
    }

    async fn update<F>(&self, path: &DocPath, f: F) -> Result<Option<Value>, StoreError>
    where
        F: FnOnce(Option<Value>) -> Option<Value> + Send,
    {
        let mut state = self.lock();
        let current = state.docs.get(path).cloned();
        let next = f(current);
        match &next {
            Some(next_value) => {
                state.docs.insert(path.clone(), next_value.clone());
            }
            None => {
                state.docs.remove(path);
            }
        }
        state.notify(path);
        Ok(next)
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.docs.remove(path).is_some() {
            state.notify(path);
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let state = self.lock();
        let mut docs = state.collection_docs(&query.collection);
        drop(state);

        if let Some(order_by) = &query.order_by {
            docs.sort_by(|a, b| {
                let a_field = value::field(&a.value, &order_by.field).unwrap_or(&Value::Null);
                let b_field = value::field(&b.value, &order_by.field).unwrap_or(&Value::Null);
                let ordering = value::compare(a_field, b_field);
                match order_by.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        Ok(docs)
    }

    fn watch_doc(&self, path: &DocPath) -> Result<DocWatch, StoreError> {
        let id = self.next_watch_id();
        let (sender, events) = mpsc::unbounded_channel();

        let mut state = self.lock();
        // Initial snapshot before registration so it is always the first event.
        let initial = state.docs.get(path).cloned();
        if sender.send(DocEvent::Snapshot(initial)).is_err() {
            debug!(path = %path, "doc watch receiver dropped before registration");
        }
        state
            .doc_watchers
            .entry(path.clone())
            .or_default()
            .push((id, sender));
        drop(state);

        Ok(DocWatch {
            handle: WatchHandle::new(id, WatchTarget::Doc(path.clone()), self.registry()),
            events,
        })
    }

    fn watch_collection(&self, path: &CollectionPath) -> Result<CollectionWatch, StoreError> {
        let id = self.next_watch_id();
        let (sender, events) = mpsc::unbounded_channel();

        let mut state = self.lock();
        let initial = state.collection_docs(path);
        if sender.send(CollectionEvent::Snapshot(initial)).is_err() {
            debug!(path = %path, "collection watch receiver dropped before registration");
        }
        state
            .collection_watchers
            .entry(path.clone())
            .or_default()
            .push((id, sender));
        drop(state);

        Ok(CollectionWatch {
            handle: WatchHandle::new(id, WatchTarget::Collection(path.clone()), self.registry()),
            events,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart_path(store: &str, user: &str) -> DocPath {
        CollectionPath::root("stores")
            .unwrap()
            .doc(store)
            .unwrap()
            .collection("carts")
            .unwrap()
            .doc(user)
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_absent_is_none_not_error() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        assert_eq!(store.get(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_replace_then_get() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        store
            .set(&path, json!({"items": []}), WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"items": []})));
    }

    #[tokio::test]
    async fn test_set_merge_keeps_unrelated_fields() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        store
            .set(
                &path,
                json!({"status": "pending", "note": "hello"}),
                WriteMode::Replace,
            )
            .await
            .unwrap();
        store
            .set(&path, json!({"status": "paid"}), WriteMode::Merge)
            .await
            .unwrap();
        assert_eq!(
            store.get(&path).await.unwrap(),
            Some(json!({"status": "paid", "note": "hello"}))
        );
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        store.delete(&path).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_counter_increments() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "counter");
        for _ in 0..3 {
            store
                .update(&path, |current| {
                    let next = current
                        .as_ref()
                        .and_then(|v| v.get("n"))
                        .and_then(Value::as_i64)
                        .unwrap_or(0)
                        + 1;
                    Some(json!({"n": next}))
                })
                .await
                .unwrap();
        }
        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"n": 3})));
    }

    #[tokio::test]
    async fn test_query_order_desc_with_limit() {
        let store = MemoryStore::new();
        let orders = CollectionPath::root("orders").unwrap();
        for (id, created_at) in [
            ("a", "2026-01-01T00:00:00Z"),
            ("b", "2026-01-03T00:00:00Z"),
            ("c", "2026-01-02T00:00:00Z"),
        ] {
            store
                .set(
                    &orders.doc(id).unwrap(),
                    json!({"created_at": created_at}),
                    WriteMode::Replace,
                )
                .await
                .unwrap();
        }

        let query = Query::collection(orders)
            .order_by("created_at", Direction::Descending)
            .limit(1);
        let docs = store.query(&query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs.first().unwrap().path.id(), "b");
    }

    #[tokio::test]
    async fn test_query_excludes_nested_subcollections() {
        let store = MemoryStore::new();
        let orders = CollectionPath::root("orders").unwrap();
        let order = orders.doc("o-1").unwrap();
        let event = order.collection("events").unwrap().doc("e-1").unwrap();
        store
            .set(&order, json!({"n": 1}), WriteMode::Replace)
            .await
            .unwrap();
        store
            .set(&event, json!({"n": 2}), WriteMode::Replace)
            .await
            .unwrap();

        let docs = store.query(&Query::collection(orders)).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_watch_doc_initial_then_changes() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        let mut watch = store.watch_doc(&path).unwrap();

        assert_eq!(watch.events.recv().await, Some(DocEvent::Snapshot(None)));

        store
            .set(&path, json!({"items": [1]}), WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(
            watch.events.recv().await,
            Some(DocEvent::Snapshot(Some(json!({"items": [1]}))))
        );

        store.delete(&path).await.unwrap();
        assert_eq!(watch.events.recv().await, Some(DocEvent::Snapshot(None)));
    }

    #[tokio::test]
    async fn test_watch_handle_carries_target() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        let watch = store.watch_doc(&path).unwrap();
        assert_eq!(watch.handle.target(), &WatchTarget::Doc(path));
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_delivery() {
        let store = MemoryStore::new();
        let path = cart_path("s-1", "u-1");
        let mut watch = store.watch_doc(&path).unwrap();
        assert_eq!(watch.events.recv().await, Some(DocEvent::Snapshot(None)));

        watch.handle.unsubscribe();
        store
            .set(&path, json!({"items": [1]}), WriteMode::Replace)
            .await
            .unwrap();

        // Sender side was detached, so the channel is closed and empty.
        assert_eq!(watch.events.recv().await, None);
    }

    #[tokio::test]
    async fn test_watch_collection_sees_membership_changes() {
        let store = MemoryStore::new();
        let orders = CollectionPath::root("orders").unwrap();
        let mut watch = store.watch_collection(&orders).unwrap();

        assert_eq!(
            watch.events.recv().await,
            Some(CollectionEvent::Snapshot(vec![]))
        );

        store
            .set(&orders.doc("o-1").unwrap(), json!({"n": 1}), WriteMode::Replace)
            .await
            .unwrap();
        let Some(CollectionEvent::Snapshot(docs)) = watch.events.recv().await else {
            panic!("expected snapshot");
        };
        assert_eq!(docs.len(), 1);
    }
}
