//! Brightfold Core - Shared types library.
//!
//! This crate provides common types used across all Brightfold data-layer
//! components:
//! - `store` - Document store adapter and in-memory implementation
//! - `sync` - Realtime sync controller and optimistic mutation
//! - `commerce` - Cart and order aggregates
//! - `finance` - Expense records and analytics
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no store
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe keys, money, emails,
//!   statuses, categories, and tenancy scopes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
