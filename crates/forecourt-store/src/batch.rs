// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded write batches.

use serde::Serialize;
use serde_json::Value;

use crate::document::{Collection, WriteOp};
use crate::error::{Result, StoreError};

/// Upper bound on operations in a single batch commit.
pub const MAX_BATCH_OPS: usize = 500;

/// A bounded set of writes applied atomically by the store.
///
/// Batches do no version checking; they are for bulk maintenance
/// writes where last-writer-wins (or a merge patch) is the intended
/// semantics. Use [`crate::Transaction`] when reads need protecting.
#[derive(Default)]
pub struct WriteBatch {
	ops: Vec<WriteOp>,
}

impl WriteBatch {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queue a full-document upsert.
	pub fn set<T: Serialize>(&mut self, collection: Collection, id: &str, entity: &T) -> Result<()> {
		self.set_value(collection, id, serde_json::to_value(entity)?)
	}

	/// Queue a full-document upsert of a raw JSON body.
	pub fn set_value(&mut self, collection: Collection, id: &str, body: Value) -> Result<()> {
		self.push(WriteOp::Set {
			collection,
			id: id.to_string(),
			body,
		})
	}

	/// Queue an RFC 7386 merge patch against an existing document.
	///
	/// Documents missing at apply time are skipped, which lets a
	/// sweep computed from a snapshot tolerate concurrent deletions.
	pub fn merge(&mut self, collection: Collection, id: &str, patch: Value) -> Result<()> {
		self.push(WriteOp::Merge {
			collection,
			id: id.to_string(),
			patch,
		})
	}

	/// Queue a document deletion.
	pub fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
		self.push(WriteOp::Delete {
			collection,
			id: id.to_string(),
		})
	}

	pub fn len(&self) -> usize {
		self.ops.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ops.is_empty()
	}

	fn push(&mut self, op: WriteOp) -> Result<()> {
		if self.ops.len() >= MAX_BATCH_OPS {
			return Err(StoreError::BatchTooLarge {
				size: self.ops.len() + 1,
				max: MAX_BATCH_OPS,
			});
		}
		self.ops.push(op);
		Ok(())
	}

	pub(crate) fn into_ops(self) -> Vec<WriteOp> {
		self.ops
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn queues_operations_up_to_the_limit() {
		let mut batch = WriteBatch::new();
		for i in 0..MAX_BATCH_OPS {
			batch
				.set_value(Collection::Users, &format!("u{i}"), json!({"i": i}))
				.unwrap();
		}
		assert_eq!(batch.len(), MAX_BATCH_OPS);
	}

	#[test]
	fn rejects_the_operation_past_the_limit() {
		let mut batch = WriteBatch::new();
		for i in 0..MAX_BATCH_OPS {
			batch
				.set_value(Collection::Users, &format!("u{i}"), json!({}))
				.unwrap();
		}

		let result = batch.merge(Collection::Users, "overflow", json!({}));
		assert!(matches!(
			result,
			Err(StoreError::BatchTooLarge { size, max })
				if size == MAX_BATCH_OPS + 1 && max == MAX_BATCH_OPS
		));
		assert_eq!(batch.len(), MAX_BATCH_OPS);
	}

	#[test]
	fn empty_batch_reports_empty() {
		let batch = WriteBatch::new();
		assert!(batch.is_empty());
		assert_eq!(batch.len(), 0);
	}
}
