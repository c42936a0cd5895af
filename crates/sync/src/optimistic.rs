//! Two-phase optimistic mutation.
//!
//! A mutation is staged locally before the remote write is issued, so the
//! UI reflects it without waiting for the round trip. The staged value is
//! committed when the write acknowledges, or reverted to the last-confirmed
//! value when it fails - a failed write never leaves phantom state behind.

use tracing::warn;

/// Local aggregate copy with an optional staged (unacknowledged) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticCell<T> {
    confirmed: T,
    pending: Option<T>,
}

impl<T> OptimisticCell<T> {
    /// Create a cell whose confirmed value is `initial`.
    pub const fn new(initial: T) -> Self {
        Self {
            confirmed: initial,
            pending: None,
        }
    }

    /// The value the UI should render: the staged value if a write is in
    /// flight, otherwise the confirmed one.
    pub const fn current(&self) -> &T {
        match &self.pending {
            Some(pending) => pending,
            None => &self.confirmed,
        }
    }

    /// The last value acknowledged by the store (or delivered by it).
    pub const fn confirmed(&self) -> &T {
        &self.confirmed
    }

    /// Whether a staged value is awaiting acknowledgement.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Stage a mutation locally ahead of its persist call.
    pub fn stage(&mut self, next: T) -> &T {
        self.pending = Some(next);
        self.current()
    }

    /// Promote the staged value after the persist call acknowledged.
    /// No-op if nothing is staged.
    pub fn commit(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.confirmed = pending;
        }
    }

    /// Discard the staged value after a persist failure, restoring the
    /// last-confirmed value. No-op if nothing is staged.
    pub fn revert(&mut self) -> &T {
        if self.pending.take().is_some() {
            warn!("optimistic mutation reverted after persist failure");
        }
        &self.confirmed
    }

    /// Accept an authoritative remote snapshot.
    ///
    /// The remote copy always wins: it becomes the confirmed value and any
    /// staged value is dropped (its write either already round-tripped into
    /// this snapshot or lost a last-write-wins race).
    pub fn confirm_remote(&mut self, value: T) {
        self.confirmed = value;
        self.pending = None;
    }
}

impl<T: Clone> OptimisticCell<T> {
    /// Run one full two-phase mutation: stage `next`, run the persist
    /// future, then commit on success or revert on failure.
    ///
    /// # Errors
    ///
    /// Propagates the persist error after reverting to the last-confirmed
    /// value.
    pub async fn write<F, Fut, E>(&mut self, next: T, persist: F) -> Result<(), E>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.stage(next.clone());
        match persist(next).await {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(error) => {
                self.revert();
                Err(error)
            }
        }
    }
}

impl<T: Default> Default for OptimisticCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
