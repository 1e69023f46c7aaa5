// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The versioned document store.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::batch::WriteBatch;
use crate::document::{Collection, Document, WriteOp};
use crate::error::{Result, StoreError};
use crate::pool::create_pool;
use crate::txn::Transaction;

/// Maximum commit attempts for one [`DocumentStore::run_transaction`] call.
pub const MAX_TXN_ATTEMPTS: u32 = 5;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
	collection TEXT NOT NULL,
	id TEXT NOT NULL,
	version INTEGER NOT NULL DEFAULT 1,
	body TEXT NOT NULL,
	PRIMARY KEY (collection, id)
)
"#;

const UPSERT_SQL: &str = "INSERT INTO documents (collection, id, version, body) VALUES (?, ?, 1, ?) \
	ON CONFLICT (collection, id) DO UPDATE SET version = documents.version + 1, body = excluded.body";

/// Document storage over SQLite, with optimistic read-then-write
/// transactions and bounded write batches.
///
/// Cloning is cheap; clones share the underlying pool.
#[derive(Clone)]
pub struct DocumentStore {
	pool: SqlitePool,
}

impl DocumentStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Open a store at the given database URL and apply the schema.
	pub async fn connect(database_url: &str) -> Result<Self> {
		let pool = create_pool(database_url).await?;
		let store = Self::new(pool);
		store.migrate().await?;
		Ok(store)
	}

	/// Apply the schema. Safe to call repeatedly.
	pub async fn migrate(&self) -> Result<()> {
		sqlx::query(SCHEMA).execute(&self.pool).await?;
		Ok(())
	}

	/// Read a single document.
	pub async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
		let row = sqlx::query("SELECT version, body FROM documents WHERE collection = ? AND id = ?")
			.bind(collection.name())
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => Ok(Some(Self::row_to_document(collection, id.to_string(), &row)?)),
			None => Ok(None),
		}
	}

	/// Read a single document and deserialize its body.
	pub async fn get_as<T: DeserializeOwned>(
		&self,
		collection: Collection,
		id: &str,
	) -> Result<Option<T>> {
		match self.get(collection, id).await? {
			Some(doc) => Ok(Some(doc.deserialize()?)),
			None => Ok(None),
		}
	}

	/// Upsert a document outside any transaction, bumping its version.
	pub async fn put<T: Serialize>(&self, collection: Collection, id: &str, entity: &T) -> Result<()> {
		self.put_value(collection, id, serde_json::to_value(entity)?).await
	}

	/// Upsert a raw JSON body outside any transaction.
	pub async fn put_value(&self, collection: Collection, id: &str, body: Value) -> Result<()> {
		let body_text = serde_json::to_string(&body)?;
		sqlx::query(UPSERT_SQL)
			.bind(collection.name())
			.bind(id)
			.bind(body_text)
			.execute(&self.pool)
			.await?;
		Ok(())
	}

	/// List every document in a collection, ordered by id.
	pub async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
		let rows = sqlx::query("SELECT id, version, body FROM documents WHERE collection = ? ORDER BY id")
			.bind(collection.name())
			.fetch_all(&self.pool)
			.await?;

		Self::rows_to_documents(collection, rows)
	}

	/// List document ids only, in stable id order.
	///
	/// The stable order is what lets a chunked sweep cover every
	/// document exactly once.
	pub async fn list_ids(&self, collection: Collection) -> Result<Vec<String>> {
		let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM documents WHERE collection = ? ORDER BY id")
			.bind(collection.name())
			.fetch_all(&self.pool)
			.await?;
		Ok(ids)
	}

	/// Count the documents in a collection.
	pub async fn count(&self, collection: Collection) -> Result<u64> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
			.bind(collection.name())
			.fetch_one(&self.pool)
			.await?;
		Ok(count as u64)
	}

	/// Find documents whose top-level JSON field equals a string value.
	pub async fn query_field_eq(
		&self,
		collection: Collection,
		field: &str,
		value: &str,
	) -> Result<Vec<Document>> {
		let path = format!("$.{field}");
		let rows = sqlx::query(
			"SELECT id, version, body FROM documents \
			WHERE collection = ? AND json_extract(body, ?) = ? ORDER BY id",
		)
		.bind(collection.name())
		.bind(path)
		.bind(value)
		.fetch_all(&self.pool)
		.await?;

		Self::rows_to_documents(collection, rows)
	}

	/// Run a read-then-write transaction, retrying on version conflict.
	///
	/// The closure may run several times, so it must be safe to
	/// repeat. Errors returned by the closure abort the transaction
	/// immediately and are never retried; only commit-time conflicts
	/// trigger another attempt. A transaction that buffered no writes
	/// commits trivially without verification.
	#[tracing::instrument(level = "debug", skip_all)]
	pub async fn run_transaction<T, F>(&self, operation: F) -> Result<T>
	where
		F: for<'t> Fn(&'t mut Transaction) -> BoxFuture<'t, Result<T>>,
	{
		let mut attempt = 1u32;
		loop {
			let mut txn = Transaction::new(self.clone());
			let value = operation(&mut txn).await?;

			match self.commit(txn).await {
				Ok(()) => return Ok(value),
				Err(StoreError::Conflict { collection, .. }) if attempt < MAX_TXN_ATTEMPTS => {
					tracing::debug!(attempt, collection, "transaction conflict, retrying");
					attempt += 1;
				}
				Err(err) => return Err(err),
			}
		}
	}

	/// Apply a write batch in a single database transaction.
	///
	/// Returns the number of operations in the batch. Batches skip
	/// version verification; see [`WriteBatch`].
	#[tracing::instrument(level = "debug", skip_all)]
	pub async fn commit_batch(&self, batch: WriteBatch) -> Result<usize> {
		let ops = batch.into_ops();
		if ops.is_empty() {
			return Ok(0);
		}

		let mut conn = self.pool.acquire().await?;
		sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

		match Self::apply_ops(&mut conn, &ops).await {
			Ok(()) => {
				sqlx::query("COMMIT").execute(&mut *conn).await?;
				tracing::debug!(ops = ops.len(), "write batch committed");
				Ok(ops.len())
			}
			Err(err) => {
				// Surface the apply error even if rollback also fails.
				let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
				Err(err)
			}
		}
	}

	async fn commit(&self, txn: Transaction) -> Result<()> {
		let (reads, writes) = txn.into_parts();
		if writes.is_empty() {
			return Ok(());
		}

		let mut conn = self.pool.acquire().await?;
		sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

		let applied = match Self::verify_reads(&mut conn, &reads).await {
			Ok(()) => Self::apply_ops(&mut conn, &writes).await,
			Err(err) => Err(err),
		};

		match applied {
			Ok(()) => {
				sqlx::query("COMMIT").execute(&mut *conn).await?;
				Ok(())
			}
			Err(err) => {
				let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
				Err(err)
			}
		}
	}

	async fn verify_reads(
		conn: &mut SqliteConnection,
		reads: &HashMap<(Collection, String), i64>,
	) -> Result<()> {
		for ((collection, id), expected) in reads {
			let current: Option<i64> =
				sqlx::query_scalar("SELECT version FROM documents WHERE collection = ? AND id = ?")
					.bind(collection.name())
					.bind(id.as_str())
					.fetch_optional(&mut *conn)
					.await?;

			if current.unwrap_or(0) != *expected {
				return Err(StoreError::Conflict {
					collection: collection.name(),
					id: id.clone(),
				});
			}
		}
		Ok(())
	}

	async fn apply_ops(conn: &mut SqliteConnection, ops: &[WriteOp]) -> Result<()> {
		for op in ops {
			match op {
				WriteOp::Set { collection, id, body } => {
					let body_text = serde_json::to_string(body)?;
					sqlx::query(UPSERT_SQL)
						.bind(collection.name())
						.bind(id.as_str())
						.bind(body_text)
						.execute(&mut *conn)
						.await?;
				}
				WriteOp::Merge { collection, id, patch } => {
					let patch_text = serde_json::to_string(patch)?;
					sqlx::query(
						"UPDATE documents SET version = version + 1, body = json_patch(body, ?) \
						WHERE collection = ? AND id = ?",
					)
					.bind(patch_text)
					.bind(collection.name())
					.bind(id.as_str())
					.execute(&mut *conn)
					.await?;
				}
				WriteOp::Delete { collection, id } => {
					sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
						.bind(collection.name())
						.bind(id.as_str())
						.execute(&mut *conn)
						.await?;
				}
			}
		}
		Ok(())
	}

	fn rows_to_documents(collection: Collection, rows: Vec<SqliteRow>) -> Result<Vec<Document>> {
		let mut docs = Vec::with_capacity(rows.len());
		for row in &rows {
			let id: String = row.try_get("id")?;
			docs.push(Self::row_to_document(collection, id, row)?);
		}
		Ok(docs)
	}

	fn row_to_document(collection: Collection, id: String, row: &SqliteRow) -> Result<Document> {
		let version: i64 = row.try_get("version")?;
		let body_text: String = row.try_get("body")?;
		let body: Value = serde_json::from_str(&body_text)?;

		Ok(Document {
			collection,
			id,
			version,
			body,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_store;
	use serde_json::json;
	use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
	use std::sync::Arc;

	mod documents {
		use super::*;
		use serde::Deserialize;

		#[tokio::test]
		async fn put_then_get_round_trips() {
			let store = create_test_store().await;
			store
				.put_value(Collection::Users, "u1", json!({"email": "a@b.example"}))
				.await
				.unwrap();

			let doc = store.get(Collection::Users, "u1").await.unwrap().unwrap();
			assert_eq!(doc.version, 1);
			assert_eq!(doc.body["email"], json!("a@b.example"));
		}

		#[tokio::test]
		async fn get_missing_returns_none() {
			let store = create_test_store().await;
			assert!(store.get(Collection::Users, "nope").await.unwrap().is_none());
		}

		#[tokio::test]
		async fn rewrites_bump_the_version() {
			let store = create_test_store().await;
			store.put_value(Collection::Users, "u1", json!({"n": 1})).await.unwrap();
			store.put_value(Collection::Users, "u1", json!({"n": 2})).await.unwrap();
			store.put_value(Collection::Users, "u1", json!({"n": 3})).await.unwrap();

			let doc = store.get(Collection::Users, "u1").await.unwrap().unwrap();
			assert_eq!(doc.version, 3);
			assert_eq!(doc.body["n"], json!(3));
		}

		#[tokio::test]
		async fn get_as_deserializes_the_body() {
			#[derive(Deserialize)]
			struct Probe {
				email: String,
			}

			let store = create_test_store().await;
			store
				.put_value(Collection::Users, "u1", json!({"email": "a@b.example"}))
				.await
				.unwrap();

			let probe: Probe = store.get_as(Collection::Users, "u1").await.unwrap().unwrap();
			assert_eq!(probe.email, "a@b.example");
		}

		#[tokio::test]
		async fn list_and_count_cover_one_collection() {
			let store = create_test_store().await;
			store.put_value(Collection::Users, "b", json!({})).await.unwrap();
			store.put_value(Collection::Users, "a", json!({})).await.unwrap();
			store.put_value(Collection::Dealerships, "d", json!({})).await.unwrap();

			let docs = store.list(Collection::Users).await.unwrap();
			let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
			assert_eq!(ids, vec!["a", "b"]);

			assert_eq!(store.list_ids(Collection::Users).await.unwrap(), vec!["a", "b"]);
			assert_eq!(store.count(Collection::Users).await.unwrap(), 2);
			assert_eq!(store.count(Collection::EnrollmentLinks).await.unwrap(), 0);
		}

		#[tokio::test]
		async fn query_field_eq_matches_top_level_fields() {
			let store = create_test_store().await;
			store
				.put_value(Collection::Users, "u1", json!({"email": "a@b.example"}))
				.await
				.unwrap();
			store
				.put_value(Collection::Users, "u2", json!({"email": "c@d.example"}))
				.await
				.unwrap();
			store
				.put_value(Collection::Users, "u3", json!({"email": "a@b.example"}))
				.await
				.unwrap();

			let matches = store
				.query_field_eq(Collection::Users, "email", "a@b.example")
				.await
				.unwrap();
			let ids: Vec<&str> = matches.iter().map(|d| d.id.as_str()).collect();
			assert_eq!(ids, vec!["u1", "u3"]);

			let none = store
				.query_field_eq(Collection::Users, "email", "x@y.example")
				.await
				.unwrap();
			assert!(none.is_empty());
		}
	}

	mod transactions {
		use super::*;

		#[tokio::test]
		async fn concurrent_counter_increments_all_apply() {
			let store = create_test_store().await;
			store
				.put_value(Collection::SystemSettings, "counter", json!({"n": 0}))
				.await
				.unwrap();

			let mut handles = Vec::new();
			for _ in 0..4 {
				let store = store.clone();
				handles.push(tokio::spawn(async move {
					store
						.run_transaction(|txn| {
							Box::pin(async move {
								let doc = txn
									.get(Collection::SystemSettings, "counter")
									.await?
									.unwrap();
								let n = doc.body["n"].as_i64().unwrap();
								txn.set_value(
									Collection::SystemSettings,
									"counter",
									json!({"n": n + 1}),
								)?;
								Ok(())
							})
						})
						.await
				}));
			}
			for handle in handles {
				handle.await.unwrap().unwrap();
			}

			let doc = store
				.get(Collection::SystemSettings, "counter")
				.await
				.unwrap()
				.unwrap();
			assert_eq!(doc.body["n"], json!(4));
		}

		#[tokio::test]
		async fn concurrent_commits_on_a_file_backed_store() {
			let dir = tempfile::tempdir().unwrap();
			let url = format!("sqlite://{}", dir.path().join("store.db").display());
			let store = DocumentStore::connect(&url).await.unwrap();
			store
				.put_value(Collection::SystemSettings, "counter", json!({"n": 0}))
				.await
				.unwrap();

			let mut handles = Vec::new();
			for _ in 0..5 {
				let store = store.clone();
				handles.push(tokio::spawn(async move {
					store
						.run_transaction(|txn| {
							Box::pin(async move {
								let doc = txn
									.get(Collection::SystemSettings, "counter")
									.await?
									.unwrap();
								let n = doc.body["n"].as_i64().unwrap();
								txn.set_value(
									Collection::SystemSettings,
									"counter",
									json!({"n": n + 1}),
								)?;
								Ok(())
							})
						})
						.await
				}));
			}
			for handle in handles {
				handle.await.unwrap().unwrap();
			}

			let doc = store
				.get(Collection::SystemSettings, "counter")
				.await
				.unwrap()
				.unwrap();
			assert_eq!(doc.body["n"], json!(5));
		}

		#[tokio::test]
		async fn a_document_appearing_after_an_absent_read_conflicts() {
			let store = create_test_store().await;
			let writer = store.clone();
			let seeded = Arc::new(AtomicBool::new(false));

			let saw_ghost = store
				.run_transaction(|txn| {
					let writer = writer.clone();
					let seeded = seeded.clone();
					Box::pin(async move {
						let ghost = txn.get(Collection::Users, "ghost").await?;
						// Create the document out of band on the first
						// attempt only, after it was read as absent.
						if !seeded.swap(true, Ordering::SeqCst) {
							writer
								.put_value(Collection::Users, "ghost", json!({"here": true}))
								.await?;
						}
						txn.set_value(
							Collection::Users,
							"observer",
							json!({"sawGhost": ghost.is_some()}),
						)?;
						Ok(ghost.is_some())
					})
				})
				.await
				.unwrap();

			// The first attempt read absence, was invalidated, and the
			// retry observed the new document.
			assert!(saw_ghost);
			let observer = store.get(Collection::Users, "observer").await.unwrap().unwrap();
			assert_eq!(observer.body["sawGhost"], json!(true));
		}

		#[tokio::test]
		async fn persistent_conflicts_exhaust_to_an_error() {
			let store = create_test_store().await;
			store.put_value(Collection::Users, "u1", json!({"v": 0})).await.unwrap();

			let writer = store.clone();
			let attempts = Arc::new(AtomicU32::new(0));
			let counting = attempts.clone();

			let result: Result<()> = store
				.run_transaction(|txn| {
					let writer = writer.clone();
					let counting = counting.clone();
					Box::pin(async move {
						counting.fetch_add(1, Ordering::SeqCst);
						let _ = txn.get(Collection::Users, "u1").await?;
						// Invalidate the read on every attempt.
						writer.put_value(Collection::Users, "u1", json!({"bump": true})).await?;
						txn.set_value(Collection::Users, "u1", json!({"v": 1}))?;
						Ok(())
					})
				})
				.await;

			assert!(matches!(result, Err(StoreError::Conflict { .. })));
			assert_eq!(attempts.load(Ordering::SeqCst), MAX_TXN_ATTEMPTS);
		}

		#[tokio::test]
		async fn closure_errors_abort_without_retry_or_write() {
			let store = create_test_store().await;
			let attempts = Arc::new(AtomicU32::new(0));
			let counting = attempts.clone();

			let result: Result<()> = store
				.run_transaction(|txn| {
					let counting = counting.clone();
					Box::pin(async move {
						counting.fetch_add(1, Ordering::SeqCst);
						txn.set_value(Collection::Users, "u1", json!({}))?;
						Err(StoreError::Internal("rejected".to_string()))
					})
				})
				.await;

			assert!(matches!(result, Err(StoreError::Internal(_))));
			assert_eq!(attempts.load(Ordering::SeqCst), 1);
			assert!(store.get(Collection::Users, "u1").await.unwrap().is_none());
		}

		#[tokio::test]
		async fn read_only_transactions_skip_verification() {
			let store = create_test_store().await;
			store.put_value(Collection::Users, "u1", json!({"n": 1})).await.unwrap();
			let writer = store.clone();

			let n = store
				.run_transaction(|txn| {
					let writer = writer.clone();
					Box::pin(async move {
						let doc = txn.get(Collection::Users, "u1").await?.unwrap();
						// An out-of-band bump does not disturb a
						// transaction with nothing to write.
						writer.put_value(Collection::Users, "u1", json!({"n": 2})).await?;
						Ok(doc.body["n"].clone())
					})
				})
				.await
				.unwrap();

			assert_eq!(n, json!(1));
		}
	}

	mod batches {
		use super::*;

		#[tokio::test]
		async fn batch_applies_sets_merges_and_deletes() {
			let store = create_test_store().await;
			store.put_value(Collection::Users, "a", json!({"x": 1})).await.unwrap();
			store.put_value(Collection::Users, "b", json!({"x": 2})).await.unwrap();

			let mut batch = WriteBatch::new();
			batch.set_value(Collection::Users, "c", json!({"x": 3})).unwrap();
			batch.merge(Collection::Users, "a", json!({"y": 9})).unwrap();
			batch.delete(Collection::Users, "b").unwrap();

			assert_eq!(store.commit_batch(batch).await.unwrap(), 3);

			let a = store.get(Collection::Users, "a").await.unwrap().unwrap();
			assert_eq!(a.body, json!({"x": 1, "y": 9}));
			assert_eq!(a.version, 2);

			assert!(store.get(Collection::Users, "b").await.unwrap().is_none());

			let c = store.get(Collection::Users, "c").await.unwrap().unwrap();
			assert_eq!(c.version, 1);
		}

		#[tokio::test]
		async fn batch_merge_skips_missing_documents() {
			let store = create_test_store().await;

			let mut batch = WriteBatch::new();
			batch.merge(Collection::Users, "ghost", json!({"y": 1})).unwrap();
			store.commit_batch(batch).await.unwrap();

			assert!(store.get(Collection::Users, "ghost").await.unwrap().is_none());
		}

		#[tokio::test]
		async fn merge_overwrites_only_patched_fields() {
			let store = create_test_store().await;
			store
				.put_value(
					Collection::Users,
					"u1",
					json!({"level": 4, "badge": "gold", "certified": true}),
				)
				.await
				.unwrap();

			let mut batch = WriteBatch::new();
			batch
				.merge(Collection::Users, "u1", json!({"badge": "platinum"}))
				.unwrap();
			store.commit_batch(batch).await.unwrap();

			let doc = store.get(Collection::Users, "u1").await.unwrap().unwrap();
			assert_eq!(
				doc.body,
				json!({"level": 4, "badge": "platinum", "certified": true})
			);
		}

		#[tokio::test]
		async fn empty_batch_is_a_no_op() {
			let store = create_test_store().await;
			assert_eq!(store.commit_batch(WriteBatch::new()).await.unwrap(), 0);
		}
	}
}
