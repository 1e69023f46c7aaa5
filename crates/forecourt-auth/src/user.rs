// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User account entity and profile validation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DealershipId, Role, SubscriptionStatus, UserId};

/// Default trial window, in days, for non-administrative signups.
pub const DEFAULT_TRIAL_DAYS: i64 = 14;

/// Per-skill rolling performance stats, maintained by the training
/// surface. Provisioning only ever creates the empty map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillStats {
	pub sessions: u32,
	pub rolling_average: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_session_at: Option<DateTime<Utc>>,
}

/// A user account document.
///
/// Top-level fields are camelCase. Training-program state lives in the
/// flattened `program_state` map as snake_case keys prefixed by the
/// program (`ppp_enabled`, `saas_ppp_level`, ...); the flattened map
/// also preserves fields written by other parts of the platform, so a
/// read-modify-write cycle never drops them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	#[serde(rename = "userId")]
	pub id: UserId,
	pub email: String,
	pub name: String,
	pub role: Role,
	#[serde(default)]
	pub dealership_ids: BTreeSet<DealershipId>,
	pub subscription_status: SubscriptionStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trial_ends_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub skill_stats: BTreeMap<String, SkillStats>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(flatten)]
	pub program_state: Map<String, Value>,
}

impl User {
	/// Synthesize a brand-new account.
	///
	/// Administrative tiers start `active` with no trial window; every
	/// other role starts `trialing` with the window anchored at `now`.
	/// Dealership membership and program state are granted by the
	/// claim, not here.
	pub fn provision(
		id: UserId,
		email: &str,
		name: &str,
		role: Role,
		now: DateTime<Utc>,
		trial_days: i64,
	) -> Self {
		let (subscription_status, trial_ends_at) = if role.is_administrative() {
			(SubscriptionStatus::Active, None)
		} else {
			(
				SubscriptionStatus::Trialing,
				Some(now + Duration::days(trial_days)),
			)
		};

		Self {
			id,
			email: normalize_email(email),
			name: name.trim().to_string(),
			role,
			dealership_ids: BTreeSet::new(),
			subscription_status,
			trial_ends_at,
			skill_stats: BTreeMap::new(),
			created_at: now,
			updated_at: now,
			program_state: Map::new(),
		}
	}

	/// Add a dealership to the membership set.
	///
	/// The set only ever grows. Returns whether it changed.
	pub fn grant_dealership(&mut self, dealership_id: DealershipId) -> bool {
		self.dealership_ids.insert(dealership_id)
	}

	pub fn is_member_of(&self, dealership_id: DealershipId) -> bool {
		self.dealership_ids.contains(&dealership_id)
	}

	/// Apply a newly granted role.
	///
	/// Administrative tiers are sticky: an existing Owner or General
	/// Manager keeps their role regardless of what the enrollment
	/// granted. Returns whether the role changed.
	pub fn adopt_role(&mut self, granted: Role) -> bool {
		if self.role.is_administrative() || self.role == granted {
			return false;
		}
		self.role = granted;
		true
	}

	/// Bump the modification timestamp.
	pub fn touch(&mut self, now: DateTime<Utc>) {
		self.updated_at = now;
	}
}

/// Lowercase and trim an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Minimal structural check for an email address.
///
/// This subsystem never delivers mail, so the check only rejects
/// obviously broken input rather than enforcing the full RFC grammar.
pub fn is_valid_email(email: &str) -> bool {
	let email = email.trim();
	if email.is_empty() || email.contains(char::is_whitespace) {
		return false;
	}
	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn at(secs: i64) -> DateTime<Utc> {
		DateTime::from_timestamp(secs, 0).unwrap()
	}

	mod provisioning {
		use super::*;

		#[test]
		fn administrative_roles_start_active_without_trial() {
			let now = Utc::now();
			let user = User::provision(
				UserId::generate(),
				"owner@dealership.com",
				"Pat Owner",
				Role::Owner,
				now,
				DEFAULT_TRIAL_DAYS,
			);

			assert_eq!(user.subscription_status, SubscriptionStatus::Active);
			assert!(user.trial_ends_at.is_none());
			assert!(user.dealership_ids.is_empty());
			assert!(user.program_state.is_empty());
		}

		#[test]
		fn operational_roles_start_trialing_with_window() {
			let now = at(1_700_000_000);
			let user = User::provision(
				UserId::generate(),
				"sales@dealership.com",
				"Sam Seller",
				Role::SalesConsultant,
				now,
				DEFAULT_TRIAL_DAYS,
			);

			assert_eq!(user.subscription_status, SubscriptionStatus::Trialing);
			assert_eq!(user.trial_ends_at, Some(now + Duration::days(14)));
		}

		#[test]
		fn email_is_normalized_on_creation() {
			let user = User::provision(
				UserId::generate(),
				"  Mixed.Case@Example.COM ",
				"Mixed Case",
				Role::ServiceAdvisor,
				Utc::now(),
				DEFAULT_TRIAL_DAYS,
			);
			assert_eq!(user.email, "mixed.case@example.com");
		}
	}

	mod merging {
		use super::*;

		#[test]
		fn dealership_grant_is_idempotent() {
			let mut user = User::provision(
				UserId::generate(),
				"a@b.co",
				"A",
				Role::SalesConsultant,
				Utc::now(),
				DEFAULT_TRIAL_DAYS,
			);
			let dealership = DealershipId::generate();

			assert!(user.grant_dealership(dealership));
			assert!(!user.grant_dealership(dealership));
			assert_eq!(user.dealership_ids.len(), 1);
			assert!(user.is_member_of(dealership));
		}

		#[test]
		fn administrative_role_is_never_downgraded() {
			let mut user = User::provision(
				UserId::generate(),
				"gm@b.co",
				"G M",
				Role::GeneralManager,
				Utc::now(),
				DEFAULT_TRIAL_DAYS,
			);

			assert!(!user.adopt_role(Role::SalesConsultant));
			assert_eq!(user.role, Role::GeneralManager);
		}

		#[test]
		fn operational_role_adopts_the_granted_one() {
			let mut user = User::provision(
				UserId::generate(),
				"p@b.co",
				"P",
				Role::PartsConsultant,
				Utc::now(),
				DEFAULT_TRIAL_DAYS,
			);

			assert!(user.adopt_role(Role::SalesConsultant));
			assert_eq!(user.role, Role::SalesConsultant);
			assert!(!user.adopt_role(Role::SalesConsultant));
		}
	}

	mod wire_format {
		use super::*;
		use serde_json::json;

		#[test]
		fn field_names_are_camel_case_with_snake_case_program_state() {
			let mut user = User::provision(
				UserId::generate(),
				"w@b.co",
				"W",
				Role::SalesConsultant,
				Utc::now(),
				DEFAULT_TRIAL_DAYS,
			);
			user.program_state.insert("ppp_enabled".to_string(), json!(true));
			user.program_state.insert("ppp_level".to_string(), json!(1));

			let value = serde_json::to_value(&user).unwrap();
			let object = value.as_object().unwrap();

			assert!(object.contains_key("userId"));
			assert!(object.contains_key("dealershipIds"));
			assert!(object.contains_key("subscriptionStatus"));
			assert!(object.contains_key("trialEndsAt"));
			assert!(object.contains_key("skillStats"));
			assert_eq!(object["ppp_enabled"], json!(true));
			assert_eq!(object["ppp_level"], json!(1));
		}

		#[test]
		fn unknown_fields_survive_a_round_trip() {
			let raw = json!({
				"userId": UserId::generate(),
				"email": "r@b.co",
				"name": "R",
				"role": "Sales Consultant",
				"dealershipIds": [],
				"subscriptionStatus": "trialing",
				"createdAt": "2025-03-01T00:00:00Z",
				"updatedAt": "2025-03-01T00:00:00Z",
				"legacy_crm_id": "X-42",
				"ppp_badge": "bronze"
			});

			let user: User = serde_json::from_value(raw).unwrap();
			assert_eq!(user.program_state["legacy_crm_id"], json!("X-42"));
			assert_eq!(user.program_state["ppp_badge"], json!("bronze"));

			let back = serde_json::to_value(&user).unwrap();
			assert_eq!(back["legacy_crm_id"], json!("X-42"));
			assert_eq!(back["ppp_badge"], json!("bronze"));
		}
	}

	mod email {
		use super::*;

		#[test]
		fn accepts_ordinary_addresses() {
			assert!(is_valid_email("sales@dealership.com"));
			assert!(is_valid_email("first.last+tag@sub.domain.io"));
		}

		#[test]
		fn rejects_broken_addresses() {
			assert!(!is_valid_email(""));
			assert!(!is_valid_email("   "));
			assert!(!is_valid_email("no-at-sign.com"));
			assert!(!is_valid_email("@missing-local.com"));
			assert!(!is_valid_email("spaces in@local.com"));
			assert!(!is_valid_email("user@nodot"));
			assert!(!is_valid_email("user@.leading.dot"));
		}
	}

	proptest! {
		#[test]
		fn normalization_is_idempotent(email in ".{0,60}") {
			let once = normalize_email(&email);
			prop_assert_eq!(normalize_email(&once), once.clone());
		}

		#[test]
		fn validation_never_panics(email in ".{0,60}") {
			let _ = is_valid_email(&email);
		}
	}
}
