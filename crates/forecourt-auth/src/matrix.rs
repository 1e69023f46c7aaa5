// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization matrix: who may enroll whom.
//!
//! Pure decision table over roles. The engine supplies the membership
//! context for scoped roles; nothing here touches the store. Matches
//! are exhaustive so adding a role forces a decision in this file.

use tracing::instrument;

use crate::types::{Role, RoleSet};

/// Roles `actor` may grant through enrollment links and invitations.
///
/// Administrative tiers may enroll across any dealership; scoped
/// managers only enroll their supervised consultants, and only within
/// dealerships they belong to (the engine enforces membership).
#[instrument(level = "debug")]
pub fn enrollable_roles(actor: Role) -> RoleSet {
	match actor {
		Role::Owner => Role::all().into_iter().collect(),
		Role::GeneralManager => Role::all()
			.into_iter()
			.filter(|role| *role != Role::Owner)
			.collect(),
		Role::SalesManager => [Role::SalesConsultant].into_iter().collect(),
		Role::PartsManager => [Role::PartsConsultant].into_iter().collect(),
		Role::SalesConsultant | Role::PartsConsultant | Role::ServiceAdvisor => RoleSet::new(),
	}
}

/// Whether `actor` may grant `requested`.
pub fn can_enroll(actor: Role, requested: Role) -> bool {
	enrollable_roles(actor).contains(&requested)
}

/// Whether an account with `requested` role may be created through the
/// unauthenticated bootstrap path. Only administrative tiers qualify,
/// and only while the store holds zero users (the engine checks the
/// count fresh on every request).
pub fn can_create_user_without_auth(requested: Role) -> bool {
	requested.is_administrative()
}

/// Whether `actor` may read and flip global program flags.
pub fn can_manage_program_flags(actor: Role) -> bool {
	actor.is_administrative()
}

/// Scoped actors only act within dealerships they belong to;
/// administrative tiers span every tenant.
pub fn requires_dealership_membership(actor: Role) -> bool {
	!actor.is_administrative()
}
