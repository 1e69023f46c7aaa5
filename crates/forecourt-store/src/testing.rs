// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test support for crates that sit on top of the store.

use sqlx::sqlite::SqlitePoolOptions;

use crate::store::DocumentStore;

/// Create an in-memory store with the schema applied.
///
/// The pool is pinned to a single connection because SQLite gives
/// every new `:memory:` connection its own private database.
pub async fn create_test_store() -> DocumentStore {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect(":memory:")
		.await
		.expect("Failed to open in-memory database");

	let store = DocumentStore::new(pool);
	store.migrate().await.expect("Failed to apply schema");
	store
}
