//! Watch handles and snapshot events.
//!
//! A subscription is represented by a [`WatchHandle`] tagged with the watched
//! target, plus an event receiver. The handle detaches the watcher when
//! dropped, which is what makes teardown-before-resubscribe on scope change
//! enforceable: dropping the old handle synchronously stops delivery before
//! a new watch is registered.

use std::sync::Weak;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::Document;
use crate::path::{CollectionPath, DocPath};

/// What a subscription is attached to.
///
/// Carried by every [`WatchHandle`] so tests (and debugging) can assert which
/// scope a subscription belongs to instead of juggling anonymous callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    Doc(DocPath),
    Collection(CollectionPath),
}

/// Identifier of a registered watcher inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub(crate) u64);

/// Store-side registry a handle reports back to on drop.
pub(crate) trait Unwatch: Send + Sync {
    fn unwatch(&self, id: WatchId);
}

/// An active subscription.
///
/// Dropping the handle detaches the watcher; the paired event receiver then
/// yields `None` once drained. [`WatchHandle::unsubscribe`] is an explicit
/// spelling of the same thing.
#[derive(Debug)]
pub struct WatchHandle {
    id: WatchId,
    target: WatchTarget,
    registry: Weak<dyn Unwatch>,
}

impl WatchHandle {
    pub(crate) fn new(id: WatchId, target: WatchTarget, registry: Weak<dyn Unwatch>) -> Self {
        Self {
            id,
            target,
            registry,
        }
    }

    /// The target this subscription is attached to.
    #[must_use]
    pub const fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Detach the watcher. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unwatch(self.id);
        }
    }
}

/// Event pushed for a single-document subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    /// The document's state at this point: `None` if it does not exist.
    Snapshot(Option<Value>),
    /// The subscription failed outside the normal call stack. Delivery may
    /// stop after this event; the subscriber decides whether to rebind.
    Error(String),
}

/// Event pushed for a collection subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    /// All direct documents of the collection at this point.
    Snapshot(Vec<Document>),
    /// The subscription failed outside the normal call stack.
    Error(String),
}

/// A single-document subscription: handle plus event stream.
#[derive(Debug)]
pub struct DocWatch {
    pub handle: WatchHandle,
    pub events: mpsc::UnboundedReceiver<DocEvent>,
}

/// A collection subscription: handle plus event stream.
#[derive(Debug)]
pub struct CollectionWatch {
    pub handle: WatchHandle,
    pub events: mpsc::UnboundedReceiver<CollectionEvent>,
}
