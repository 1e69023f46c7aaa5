// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Versioned document storage for the Forecourt provisioning service.
//!
//! Every entity lives as a JSON document in a named [`Collection`],
//! carrying a version that increases by one on each write. The store
//! offers three write paths:
//!
//! - Plain [`DocumentStore::put`] for uncontended writes.
//! - [`DocumentStore::run_transaction`] for read-then-write flows that
//!   must observe a consistent snapshot. Commits verify every read
//!   version and retry the closure on conflict.
//! - [`DocumentStore::commit_batch`] for bounded bulk maintenance
//!   writes with merge-patch support.

pub mod batch;
pub mod document;
pub mod error;
pub mod pool;
pub mod store;
pub mod testing;
pub mod txn;

pub use batch::{WriteBatch, MAX_BATCH_OPS};
pub use document::{Collection, Document};
pub use error::{Result, StoreError};
pub use pool::create_pool;
pub use store::{DocumentStore, MAX_TXN_ATTEMPTS};
pub use txn::Transaction;
