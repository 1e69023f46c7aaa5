// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enrollment tokens: multi-use links, single-use email invitations,
//! and their lifecycle validation.
//!
//! Tokens are opaque random strings and double as the document key for
//! the record they name. They are capabilities: code handling them must
//! never write them to logs.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::types::{DealershipId, Role, UserId};
use crate::user::normalize_email;

/// Raw length of a minted token in bytes; hex-encoded on the wire.
pub const TOKEN_BYTES: usize = 32;

/// Mint a fresh opaque token. 256 bits of randomness keeps tokens
/// unguessable and collision-free as document keys.
pub fn mint_token() -> String {
	let mut bytes = [0u8; TOKEN_BYTES];
	rand::thread_rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}

/// A multi-use enrollment link for one dealership.
///
/// Claims increment `usage_count`; a link stays usable until it is
/// deactivated or expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentLink {
	pub token: String,
	pub dealership_id: DealershipId,
	pub allowed_roles: BTreeSet<Role>,
	pub active: bool,
	pub expires_at: DateTime<Utc>,
	#[serde(default)]
	pub usage_count: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_used_at: Option<DateTime<Utc>>,
	pub inviter_id: UserId,
	pub created_at: DateTime<Utc>,
}

impl EnrollmentLink {
	/// Mint a new link valid for `ttl_days`.
	pub fn new(
		dealership_id: DealershipId,
		allowed_roles: BTreeSet<Role>,
		inviter_id: UserId,
		now: DateTime<Utc>,
		ttl_days: i64,
	) -> Self {
		Self {
			token: mint_token(),
			dealership_id,
			allowed_roles,
			active: true,
			expires_at: now + Duration::days(ttl_days),
			usage_count: 0,
			last_used_at: None,
			inviter_id,
			created_at: now,
		}
	}

	/// Record one successful claim. The link stays usable.
	pub fn record_use(&mut self, now: DateTime<Utc>) {
		self.usage_count += 1;
		self.last_used_at = Some(now);
	}

	pub fn deactivate(&mut self) {
		self.active = false;
	}
}

/// A single-use invitation bound to an email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailInvitation {
	pub token: String,
	pub email: String,
	pub role: Role,
	pub dealership_id: DealershipId,
	#[serde(default)]
	pub claimed: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub claimed_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub claimed_by: Option<UserId>,
	pub expires_at: DateTime<Utc>,
	pub inviter_id: UserId,
	pub created_at: DateTime<Utc>,
}

impl EmailInvitation {
	/// Mint a new invitation valid for `ttl_days`. The bound email is
	/// stored normalized.
	pub fn new(
		email: &str,
		role: Role,
		dealership_id: DealershipId,
		inviter_id: UserId,
		now: DateTime<Utc>,
		ttl_days: i64,
	) -> Self {
		Self {
			token: mint_token(),
			email: normalize_email(email),
			role,
			dealership_id,
			claimed: false,
			claimed_at: None,
			claimed_by: None,
			expires_at: now + Duration::days(ttl_days),
			inviter_id,
			created_at: now,
		}
	}

	/// Mark the invitation claimed. Callers must have validated first;
	/// the claim write is atomic with the user write at the store layer.
	pub fn claim(&mut self, user_id: UserId, now: DateTime<Utc>) {
		self.claimed = true;
		self.claimed_at = Some(now);
		self.claimed_by = Some(user_id);
	}
}

/// Why a token failed lifecycle validation. Surfaced verbatim as the
/// rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
	/// Deactivated, or a link that can grant no role at all.
	Inactive,
	Expired,
	AlreadyClaimed,
	EmailMismatch,
}

impl TokenRejection {
	pub fn as_str(&self) -> &'static str {
		match self {
			TokenRejection::Inactive => "inactive",
			TokenRejection::Expired => "expired",
			TokenRejection::AlreadyClaimed => "already_claimed",
			TokenRejection::EmailMismatch => "email_mismatch",
		}
	}
}

impl fmt::Display for TokenRejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Validate an enrollment link for claiming at `now`.
///
/// Checks run in a fixed order and the first failure wins: active,
/// unexpired, grants at least one role. Existence is the caller's
/// concern. A token expires exactly at its expiry instant.
pub fn validate_link(link: &EnrollmentLink, now: DateTime<Utc>) -> Result<(), TokenRejection> {
	if !link.active {
		return Err(TokenRejection::Inactive);
	}
	if now >= link.expires_at {
		return Err(TokenRejection::Expired);
	}
	if link.allowed_roles.is_empty() {
		return Err(TokenRejection::Inactive);
	}
	Ok(())
}

/// Validate an email invitation for claiming at `now` by the holder of
/// `verified_email`.
///
/// Order: unexpired, unclaimed, bound email matches the verified
/// address case-insensitively.
pub fn validate_invitation(
	invitation: &EmailInvitation,
	now: DateTime<Utc>,
	verified_email: &str,
) -> Result<(), TokenRejection> {
	if now >= invitation.expires_at {
		return Err(TokenRejection::Expired);
	}
	if invitation.claimed {
		return Err(TokenRejection::AlreadyClaimed);
	}
	if normalize_email(&invitation.email) != normalize_email(verified_email) {
		return Err(TokenRejection::EmailMismatch);
	}
	Ok(())
}
