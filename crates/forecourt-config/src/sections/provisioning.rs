// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProvisioningConfigLayer {
	pub trial_days: Option<i64>,
	pub link_ttl_days: Option<i64>,
	pub invitation_ttl_days: Option<i64>,
	pub backfill_batch_size: Option<usize>,
}

impl ProvisioningConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.trial_days.is_some() {
			self.trial_days = other.trial_days;
		}
		if other.link_ttl_days.is_some() {
			self.link_ttl_days = other.link_ttl_days;
		}
		if other.invitation_ttl_days.is_some() {
			self.invitation_ttl_days = other.invitation_ttl_days;
		}
		if other.backfill_batch_size.is_some() {
			self.backfill_batch_size = other.backfill_batch_size;
		}
	}

	pub fn finalize(self) -> ProvisioningConfig {
		ProvisioningConfig {
			trial_days: self.trial_days.unwrap_or(14),
			link_ttl_days: self.link_ttl_days.unwrap_or(30),
			invitation_ttl_days: self.invitation_ttl_days.unwrap_or(7),
			backfill_batch_size: self.backfill_batch_size.unwrap_or(400),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvisioningConfig {
	pub trial_days: i64,
	pub link_ttl_days: i64,
	pub invitation_ttl_days: i64,
	pub backfill_batch_size: usize,
}

impl Default for ProvisioningConfig {
	fn default() -> Self {
		Self {
			trial_days: 14,
			link_ttl_days: 30,
			invitation_ttl_days: 7,
			backfill_batch_size: 400,
		}
	}
}
