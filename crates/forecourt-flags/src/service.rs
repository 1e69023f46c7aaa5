// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The global program flag and its user backfill.
//!
//! One singleton document in `systemSettings` records whether the SaaS
//! PPP training program is rolled out. Flipping it sweeps every user
//! document in batches, re-asserting the enablement flag and filling
//! missing state defaults. The sweep goes through merge writes, so a
//! user claiming an enrollment mid-sweep keeps whatever the claim
//! granted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use forecourt_auth::identity::IdentityVerifier;
use forecourt_auth::matrix;
use forecourt_auth::program::{backfill_patch, SystemSetting};
use forecourt_auth::types::{TrainingProgram, UserId};
use forecourt_auth::user::User;
use forecourt_store::{Collection, DocumentStore, WriteBatch};

use crate::error::{ProgramFlagError, Result};

/// Users patched per batch commit during a backfill sweep.
pub const DEFAULT_BACKFILL_BATCH: usize = 400;

/// The program the global rollout flag governs.
const GOVERNED_PROGRAM: TrainingProgram = TrainingProgram::SaasPpp;

/// The flag as read back, including who last changed it. A flag nobody
/// has ever written reads as disabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFlagState {
	pub enabled: bool,
	pub updated_at: Option<DateTime<Utc>>,
	pub updated_by: Option<UserId>,
}

/// Summary of one flag change and the sweep it triggered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagUpdate {
	pub enabled: bool,
	pub updated_count: u64,
	pub batches: u32,
}

/// Reads and writes the global program flag.
#[derive(Clone)]
pub struct ProgramFlagService {
	store: DocumentStore,
	verifier: Arc<dyn IdentityVerifier>,
	batch_size: usize,
}

impl ProgramFlagService {
	pub fn new(store: DocumentStore, verifier: Arc<dyn IdentityVerifier>) -> Self {
		Self::with_batch_size(store, verifier, DEFAULT_BACKFILL_BATCH)
	}

	pub fn with_batch_size(
		store: DocumentStore,
		verifier: Arc<dyn IdentityVerifier>,
		batch_size: usize,
	) -> Self {
		Self {
			store,
			verifier,
			batch_size,
		}
	}

	/// Read the flag. Any verified identity may look.
	#[instrument(level = "debug", skip_all)]
	pub async fn get_flag(&self, credential: &str) -> Result<ProgramFlagState> {
		self.verifier.verify(credential).await?;

		let setting = self
			.store
			.get_as::<SystemSetting>(Collection::SystemSettings, GOVERNED_PROGRAM.key())
			.await?;

		Ok(match setting {
			Some(setting) => ProgramFlagState {
				enabled: setting.enabled,
				updated_at: Some(setting.updated_at),
				updated_by: Some(setting.updated_by),
			},
			None => ProgramFlagState {
				enabled: false,
				updated_at: None,
				updated_by: None,
			},
		})
	}

	/// Flip the flag and sweep the user population.
	///
	/// The singleton is written first, so readers observe the new value
	/// while the sweep is still running.
	#[instrument(level = "info", skip(self, credential))]
	pub async fn set_flag(&self, enabled: bool, credential: &str) -> Result<FlagUpdate> {
		let actor = self.require_actor(credential).await?;
		if !matrix::can_manage_program_flags(actor.role) {
			return Err(ProgramFlagError::Forbidden("role cannot manage program flags"));
		}

		let setting = SystemSetting {
			enabled,
			updated_at: Utc::now(),
			updated_by: actor.id,
		};
		self.store
			.put(Collection::SystemSettings, GOVERNED_PROGRAM.key(), &setting)
			.await?;

		let (updated_count, batches) = self.backfill(enabled).await?;

		tracing::info!(
			enabled,
			updated_count,
			batches,
			updated_by = %actor.id,
			"program flag updated"
		);
		Ok(FlagUpdate {
			enabled,
			updated_count,
			batches,
		})
	}

	async fn require_actor(&self, credential: &str) -> Result<User> {
		let identity = self.verifier.verify(credential).await?;
		self.store
			.get_as::<User>(Collection::Users, &identity.subject_id.to_string())
			.await?
			.ok_or(ProgramFlagError::Forbidden("caller has no provisioned account"))
	}

	/// Patch every user document to the flag's value, in batches.
	///
	/// Each patch re-asserts the enablement field and fills state
	/// defaults write-if-absent; fields the user already holds with the
	/// right type never appear in the patch. Documents that vanish
	/// mid-sweep or hold a non-object body are skipped.
	async fn backfill(&self, enabled: bool) -> Result<(u64, u32)> {
		let ids = self.store.list_ids(Collection::Users).await?;
		let mut updated_count = 0u64;
		let mut batches = 0u32;

		for chunk in ids.chunks(self.batch_size) {
			let mut batch = WriteBatch::default();
			for id in chunk {
				let Some(doc) = self.store.get(Collection::Users, id).await? else {
					continue;
				};
				let Some(fields) = doc.body.as_object() else {
					continue;
				};
				let patch = backfill_patch(fields, GOVERNED_PROGRAM, enabled);
				batch.merge(Collection::Users, id, Value::Object(patch))?;
				updated_count += 1;
			}
			if batch.is_empty() {
				continue;
			}
			let ops = self.store.commit_batch(batch).await?;
			batches += 1;
			tracing::debug!(batch = batches, ops, "backfill batch committed");
		}

		Ok((updated_count, batches))
	}
}
