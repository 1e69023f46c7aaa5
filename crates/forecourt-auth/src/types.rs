// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identifier and role types for the enrollment domain.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a strongly-typed UUID wrapper.
macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(
			Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create from an existing UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random identifier.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Consume and return the inner UUID.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Borrow the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok(Self(Uuid::parse_str(s)?))
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user account.");
define_id_type!(DealershipId, "Unique identifier for a dealership (tenant).");

/// A set of roles, e.g. the roles an enrollment link may grant.
pub type RoleSet = BTreeSet<Role>;

/// Error returned when a role label does not match any known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// Platform roles, declared from most to least privileged.
///
/// The set is closed: role strings arriving over the wire that match no
/// label here are rejected at the boundary and never stored. The stored
/// labels are display strings ("Sales Consultant") and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
	#[serde(rename = "Owner")]
	Owner,
	#[serde(rename = "General Manager")]
	GeneralManager,
	#[serde(rename = "Sales Manager")]
	SalesManager,
	#[serde(rename = "Parts Manager")]
	PartsManager,
	#[serde(rename = "Sales Consultant")]
	SalesConsultant,
	#[serde(rename = "Parts Consultant")]
	PartsConsultant,
	#[serde(rename = "Service Advisor")]
	ServiceAdvisor,
}

impl Role {
	/// All roles, in privilege order.
	pub fn all() -> [Role; 7] {
		[
			Role::Owner,
			Role::GeneralManager,
			Role::SalesManager,
			Role::PartsManager,
			Role::SalesConsultant,
			Role::PartsConsultant,
			Role::ServiceAdvisor,
		]
	}

	/// The stored label for this role.
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Owner => "Owner",
			Role::GeneralManager => "General Manager",
			Role::SalesManager => "Sales Manager",
			Role::PartsManager => "Parts Manager",
			Role::SalesConsultant => "Sales Consultant",
			Role::PartsConsultant => "Parts Consultant",
			Role::ServiceAdvisor => "Service Advisor",
		}
	}

	/// Administrative tiers hold cross-dealership authority and are
	/// never downgraded once granted.
	pub fn is_administrative(&self) -> bool {
		matches!(self, Role::Owner | Role::GeneralManager)
	}

	/// The operational role a scoped manager supervises, if any.
	pub fn supervised_role(&self) -> Option<Role> {
		match self {
			Role::SalesManager => Some(Role::SalesConsultant),
			Role::PartsManager => Some(Role::PartsConsultant),
			_ => None,
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Owner" => Ok(Role::Owner),
			"General Manager" => Ok(Role::GeneralManager),
			"Sales Manager" => Ok(Role::SalesManager),
			"Parts Manager" => Ok(Role::PartsManager),
			"Sales Consultant" => Ok(Role::SalesConsultant),
			"Parts Consultant" => Ok(Role::PartsConsultant),
			"Service Advisor" => Ok(Role::ServiceAdvisor),
			other => Err(UnknownRole(other.to_string())),
		}
	}
}

/// Billing state carried on a user account.
///
/// Provisioning only ever writes `Active` (administrative tiers) or
/// `Trialing`; the remaining states are written by the billing surface
/// and must round-trip through this service untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
	Active,
	Trialing,
	Expired,
	Canceled,
}

impl SubscriptionStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			SubscriptionStatus::Active => "active",
			SubscriptionStatus::Trialing => "trialing",
			SubscriptionStatus::Expired => "expired",
			SubscriptionStatus::Canceled => "canceled",
		}
	}
}

impl fmt::Display for SubscriptionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Training programs whose per-user state this service provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingProgram {
	/// The PPP sales protocol curriculum.
	#[serde(rename = "ppp")]
	Ppp,
	/// The SaaS PPP training curriculum, additionally gated by a global
	/// system flag.
	#[serde(rename = "saas_ppp")]
	SaasPpp,
}

impl TrainingProgram {
	pub fn all() -> [TrainingProgram; 2] {
		[TrainingProgram::Ppp, TrainingProgram::SaasPpp]
	}

	/// Stable key prefixing every state field of this program.
	pub fn key(&self) -> &'static str {
		match self {
			TrainingProgram::Ppp => "ppp",
			TrainingProgram::SaasPpp => "saas_ppp",
		}
	}

	/// Field name for one of this program's state values.
	pub fn state_field(&self, suffix: &str) -> String {
		format!("{}_{}", self.key(), suffix)
	}

	/// Field name of the per-user enablement flag.
	pub fn enabled_field(&self) -> String {
		self.state_field("enabled")
	}
}

impl fmt::Display for TrainingProgram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.key())
	}
}
