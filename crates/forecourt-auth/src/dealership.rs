// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dealership (tenant) entity. Read-only to this subsystem; creation
//! and editing belong to the tenant-management surface.

use serde::{Deserialize, Serialize};

use crate::types::{DealershipId, TrainingProgram};

/// Operating status of a dealership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealershipStatus {
	Active,
	Deactivated,
}

/// A dealership document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dealership {
	#[serde(rename = "dealershipId")]
	pub id: DealershipId,
	pub name: String,
	pub status: DealershipStatus,
	#[serde(default)]
	pub enable_ppp_protocol: bool,
	#[serde(default)]
	pub enable_saas_ppp_training: bool,
}

impl Dealership {
	pub fn is_active(&self) -> bool {
		self.status == DealershipStatus::Active
	}

	/// Programs this dealership has switched on for its staff.
	pub fn enabled_programs(&self) -> Vec<TrainingProgram> {
		let mut programs = Vec::new();
		if self.enable_ppp_protocol {
			programs.push(TrainingProgram::Ppp);
		}
		if self.enable_saas_ppp_training {
			programs.push(TrainingProgram::SaasPpp);
		}
		programs
	}
}
