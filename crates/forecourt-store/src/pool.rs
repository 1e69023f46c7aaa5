// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite connection pool construction.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error::Result;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a connection pool for the store database.
///
/// WAL mode keeps readers unblocked while a commit is in flight, and
/// the busy timeout absorbs write-lock contention between concurrent
/// commit attempts.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)?
		.create_if_missing(true)
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(BUSY_TIMEOUT);

	let pool = SqlitePoolOptions::new()
		.max_connections(MAX_CONNECTIONS)
		.connect_with(options)
		.await?;

	Ok(pool)
}
