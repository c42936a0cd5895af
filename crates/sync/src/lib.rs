//! Brightfold Sync - Realtime sync controller and optimistic mutation.
//!
//! Two pieces bridge remote document state to local aggregate state:
//!
//! - [`SyncController`] subscribes to a document or collection and keeps a
//!   local value in step with every pushed snapshot. Rebinding to a new
//!   scope tears the old subscription down first, so one tenant's updates
//!   can never land in another tenant's state.
//! - [`OptimisticCell`] holds the two-phase local copy: a mutation is staged
//!   immediately (the UI reflects it without waiting for the round trip),
//!   then committed on persist acknowledgement or reverted to the
//!   last-confirmed value on failure.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod controller;
pub mod optimistic;

pub use controller::{SyncController, SyncError, SyncState};
pub use optimistic::OptimisticCell;
