// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Documents, collections, and buffered write operations.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// The closed set of collections the service stores.
///
/// Collection names double as the storage key prefix, so they are
/// stable wire identifiers and must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
	Users,
	Dealerships,
	EnrollmentLinks,
	EmailInvitations,
	SystemSettings,
}

impl Collection {
	/// Stable storage name for this collection.
	pub const fn name(&self) -> &'static str {
		match self {
			Collection::Users => "users",
			Collection::Dealerships => "dealerships",
			Collection::EnrollmentLinks => "enrollmentLinks",
			Collection::EmailInvitations => "emailInvitations",
			Collection::SystemSettings => "systemSettings",
		}
	}

	/// Every collection, in declaration order.
	pub const fn all() -> [Collection; 5] {
		[
			Collection::Users,
			Collection::Dealerships,
			Collection::EnrollmentLinks,
			Collection::EmailInvitations,
			Collection::SystemSettings,
		]
	}
}

impl std::fmt::Display for Collection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// A stored document together with its concurrency version.
///
/// Versions start at 1 on first write and increase by exactly one on
/// every subsequent write. Version 0 is reserved for "absent" and
/// never appears on a stored row.
#[derive(Debug, Clone)]
pub struct Document {
	pub collection: Collection,
	pub id: String,
	pub version: i64,
	pub body: Value,
}

impl Document {
	/// Deserialize the document body into an entity type.
	pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
		Ok(serde_json::from_value(self.body.clone())?)
	}
}

/// A write buffered inside a transaction or batch, applied at commit.
#[derive(Debug, Clone)]
pub(crate) enum WriteOp {
	/// Full-document upsert. Creates the row at version 1 or bumps the
	/// existing version.
	Set {
		collection: Collection,
		id: String,
		body: Value,
	},
	/// RFC 7386 merge into an existing document, bumping its version.
	/// Missing documents are skipped rather than created.
	Merge {
		collection: Collection,
		id: String,
		patch: Value,
	},
	Delete {
		collection: Collection,
		id: String,
	},
}
