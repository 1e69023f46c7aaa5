// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store error types.

/// Errors produced by the document store.
///
/// `Conflict` deliberately leaves the document id out of its display
/// text. Some collections use capability tokens as ids, and error
/// messages end up in logs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A read document changed (or appeared) between read and commit.
	#[error("Version conflict in {collection}")]
	Conflict {
		collection: &'static str,
		id: String,
	},

	/// A transaction tried to read after buffering its first write.
	#[error("Transaction reads must precede writes")]
	ReadAfterWrite,

	#[error("Write batch of {size} operations exceeds the limit of {max}")]
	BatchTooLarge { size: usize, max: usize },

	#[error("Store error: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
