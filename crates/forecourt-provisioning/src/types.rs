// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Requests and structured results for provisioning operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forecourt_auth::types::{DealershipId, Role, RoleSet, UserId};
use forecourt_auth::user::DEFAULT_TRIAL_DAYS;

/// Default lifetime of a freshly minted enrollment link.
pub const DEFAULT_LINK_TTL_DAYS: i64 = 30;

/// Default lifetime of a freshly minted email invitation.
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

/// Direct account creation request (bootstrap mode and self-serve
/// administrative signup).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
	pub email: String,
	pub name: String,
	pub role: Role,
}

/// Result of a successful enrollment or invitation claim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
	pub user_id: UserId,
	pub dealership_id: DealershipId,
	/// The role the account carries after the claim, which for an
	/// administrative account may differ from the role granted.
	pub role: Role,
	/// Whether the claim created the account rather than merging into
	/// an existing one.
	pub created: bool,
}

/// Public preview of an enrollment link, for the enrollment landing
/// page. Only valid links preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPreview {
	pub dealership_id: DealershipId,
	pub dealership_name: String,
	pub allowed_roles: RoleSet,
	pub expires_at: DateTime<Utc>,
}

/// Public preview of an email invitation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPreview {
	pub email: String,
	pub role: Role,
	pub dealership_id: DealershipId,
	pub dealership_name: String,
	pub expires_at: DateTime<Utc>,
}

/// Tunable timings for provisioning.
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
	/// Trial window for non-administrative accounts, in days.
	pub trial_days: i64,
	pub link_ttl_days: i64,
	pub invitation_ttl_days: i64,
}

impl Default for ProvisioningSettings {
	fn default() -> Self {
		Self {
			trial_days: DEFAULT_TRIAL_DAYS,
			link_ttl_days: DEFAULT_LINK_TTL_DAYS,
			invitation_ttl_days: DEFAULT_INVITATION_TTL_DAYS,
		}
	}
}
