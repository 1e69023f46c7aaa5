// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared test fixtures for the enrollment domain.
//!
//! Kept as a normal module (not `cfg(test)`) so every crate in the
//! workspace reuses the same fixtures from its own tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;

use crate::dealership::{Dealership, DealershipStatus};
use crate::error::AuthError;
use crate::identity::{IdentityVerifier, VerifiedIdentity};
use crate::token::{EmailInvitation, EnrollmentLink};
use crate::types::{DealershipId, Role, UserId};
use crate::user::{User, DEFAULT_TRIAL_DAYS};

/// Identity verifier backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityVerifier {
	identities: HashMap<String, VerifiedIdentity>,
}

impl StaticIdentityVerifier {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `token` as a valid credential for the given subject.
	pub fn with_identity(mut self, token: &str, subject_id: UserId, email: &str) -> Self {
		self.identities
			.insert(token.to_string(), VerifiedIdentity::new(subject_id, email));
		self
	}

	/// Register a credential carrying a `name` claim.
	pub fn with_named_identity(
		mut self,
		token: &str,
		subject_id: UserId,
		email: &str,
		name: &str,
	) -> Self {
		let mut identity = VerifiedIdentity::new(subject_id, email);
		identity
			.claims
			.insert("name".to_string(), serde_json::Value::String(name.to_string()));
		self.identities.insert(token.to_string(), identity);
		self
	}
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
	async fn verify(&self, bearer_token: &str) -> Result<VerifiedIdentity, AuthError> {
		if bearer_token.trim().is_empty() {
			return Err(AuthError::MissingCredential);
		}
		self.identities
			.get(bearer_token)
			.cloned()
			.ok_or_else(|| AuthError::InvalidCredential("unknown test token".to_string()))
	}
}

/// An active dealership with both training programs enabled.
pub fn make_dealership(name: &str) -> Dealership {
	Dealership {
		id: DealershipId::generate(),
		name: name.to_string(),
		status: DealershipStatus::Active,
		enable_ppp_protocol: true,
		enable_saas_ppp_training: true,
	}
}

/// A freshly provisioned user with a unique email.
pub fn make_user(role: Role) -> User {
	let id = UserId::generate();
	User::provision(
		id,
		&format!("user-{}@example.com", id.as_uuid().simple()),
		"Test User",
		role,
		Utc::now(),
		DEFAULT_TRIAL_DAYS,
	)
}

/// A week-long link granting `roles` for `dealership_id`.
pub fn make_link(dealership_id: DealershipId, roles: &[Role], inviter: UserId) -> EnrollmentLink {
	EnrollmentLink::new(
		dealership_id,
		roles.iter().copied().collect(),
		inviter,
		Utc::now(),
		7,
	)
}

/// A week-long invitation for `email`.
pub fn make_invitation(
	email: &str,
	role: Role,
	dealership_id: DealershipId,
	inviter: UserId,
) -> EmailInvitation {
	EmailInvitation::new(email, role, dealership_id, inviter, Utc::now(), 7)
}
