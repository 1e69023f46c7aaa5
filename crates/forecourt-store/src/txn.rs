// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-then-write transactions with optimistic concurrency.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::document::{Collection, Document, WriteOp};
use crate::error::{Result, StoreError};
use crate::store::DocumentStore;

/// A single attempt at a read-then-write transaction.
///
/// Reads record the version of every document they touch, with 0
/// standing in for "absent". Writes are buffered and applied by the
/// store at commit, which first re-checks every recorded version and
/// fails with [`StoreError::Conflict`] when any changed.
///
/// All reads must happen before the first write; a read after a write
/// fails with [`StoreError::ReadAfterWrite`]. The restriction is what
/// makes the recorded versions a consistent snapshot to verify.
pub struct Transaction {
	store: DocumentStore,
	reads: HashMap<(Collection, String), i64>,
	writes: Vec<WriteOp>,
}

impl Transaction {
	pub(crate) fn new(store: DocumentStore) -> Self {
		Self {
			store,
			reads: HashMap::new(),
			writes: Vec::new(),
		}
	}

	/// Read a document and record its version in the read set.
	///
	/// Absence is recorded too, so a document that appears between
	/// read and commit invalidates the transaction just like a
	/// modified one.
	pub async fn get(&mut self, collection: Collection, id: &str) -> Result<Option<Document>> {
		if !self.writes.is_empty() {
			return Err(StoreError::ReadAfterWrite);
		}

		let doc = self.store.get(collection, id).await?;
		let version = doc.as_ref().map(|d| d.version).unwrap_or(0);
		// The first read of a document fixes the version the commit
		// will verify; later reads of the same id do not overwrite it.
		self.reads.entry((collection, id.to_string())).or_insert(version);

		Ok(doc)
	}

	/// Read a document and deserialize its body.
	pub async fn get_as<T: DeserializeOwned>(
		&mut self,
		collection: Collection,
		id: &str,
	) -> Result<Option<T>> {
		match self.get(collection, id).await? {
			Some(doc) => Ok(Some(doc.deserialize()?)),
			None => Ok(None),
		}
	}

	/// Buffer a full-document write.
	pub fn set<T: Serialize>(&mut self, collection: Collection, id: &str, entity: &T) -> Result<()> {
		self.set_value(collection, id, serde_json::to_value(entity)?)
	}

	/// Buffer a full-document write of a raw JSON body.
	pub fn set_value(&mut self, collection: Collection, id: &str, body: Value) -> Result<()> {
		self.writes.push(WriteOp::Set {
			collection,
			id: id.to_string(),
			body,
		});
		Ok(())
	}

	/// Buffer a document deletion.
	pub fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
		self.writes.push(WriteOp::Delete {
			collection,
			id: id.to_string(),
		});
		Ok(())
	}

	/// Number of writes buffered so far.
	pub fn pending_writes(&self) -> usize {
		self.writes.len()
	}

	pub(crate) fn into_parts(self) -> (HashMap<(Collection, String), i64>, Vec<WriteOp>) {
		(self.reads, self.writes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_store;
	use serde_json::json;

	#[tokio::test]
	async fn reads_record_versions_including_absence() {
		let store = create_test_store().await;
		store
			.put_value(Collection::Users, "present", json!({"ok": true}))
			.await
			.unwrap();

		let mut txn = Transaction::new(store);
		txn.get(Collection::Users, "present").await.unwrap();
		txn.get(Collection::Users, "missing").await.unwrap();

		let (reads, writes) = txn.into_parts();
		assert_eq!(reads[&(Collection::Users, "present".to_string())], 1);
		assert_eq!(reads[&(Collection::Users, "missing".to_string())], 0);
		assert!(writes.is_empty());
	}

	#[tokio::test]
	async fn first_read_of_a_document_wins() {
		let store = create_test_store().await;
		store
			.put_value(Collection::Users, "u1", json!({"n": 1}))
			.await
			.unwrap();

		let mut txn = Transaction::new(store.clone());
		txn.get(Collection::Users, "u1").await.unwrap();

		// Out-of-band bump between two reads of the same document.
		store
			.put_value(Collection::Users, "u1", json!({"n": 2}))
			.await
			.unwrap();
		txn.get(Collection::Users, "u1").await.unwrap();

		let (reads, _) = txn.into_parts();
		assert_eq!(reads[&(Collection::Users, "u1".to_string())], 1);
	}

	#[tokio::test]
	async fn a_read_after_a_write_is_rejected() {
		let store = create_test_store().await;

		let mut txn = Transaction::new(store);
		txn.set_value(Collection::Users, "u1", json!({})).unwrap();

		let result = txn.get(Collection::Users, "u1").await;
		assert!(matches!(result, Err(StoreError::ReadAfterWrite)));
	}

	#[tokio::test]
	async fn writes_are_buffered_not_applied() {
		let store = create_test_store().await;

		let mut txn = Transaction::new(store.clone());
		txn.set_value(Collection::Users, "u1", json!({"x": 1})).unwrap();
		txn.delete(Collection::Users, "u2").unwrap();
		assert_eq!(txn.pending_writes(), 2);

		// Nothing lands until the store commits the transaction.
		assert!(store.get(Collection::Users, "u1").await.unwrap().is_none());
	}
}
