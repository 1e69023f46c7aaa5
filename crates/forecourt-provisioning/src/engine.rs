// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The provisioning engine.
//!
//! Orchestrates identity verification, token lifecycle validation, the
//! authorization matrix, and the document store into the account and
//! claim flows. Each claim runs as one store transaction: every read
//! precedes every write, and the token-usage write commits atomically
//! with the user write or not at all. Validation failures are detected
//! before any write and are never retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use forecourt_auth::dealership::Dealership;
use forecourt_auth::identity::{IdentityVerifier, VerifiedIdentity};
use forecourt_auth::matrix;
use forecourt_auth::program::enable_program;
use forecourt_auth::token::{validate_invitation, validate_link, EmailInvitation, EnrollmentLink};
use forecourt_auth::types::{DealershipId, Role, UserId};
use forecourt_auth::user::{is_valid_email, normalize_email, User};
use forecourt_store::{Collection, DocumentStore, Transaction};

use crate::error::{rejection_error, ProvisioningError, Result};
use crate::types::{
	ClaimOutcome, CreateUserRequest, EnrollmentPreview, InvitationPreview, ProvisioningSettings,
};

/// Transaction closures layer two results: the outer one belongs to the
/// store and drives conflict retries, the inner one is the domain's and
/// aborts the transaction without retrying.
type TxnOutcome<T> = forecourt_store::Result<std::result::Result<T, ProvisioningError>>;

/// The provisioning engine. Cloning shares the store and verifier.
#[derive(Clone)]
pub struct ProvisioningEngine {
	store: DocumentStore,
	verifier: Arc<dyn IdentityVerifier>,
	settings: ProvisioningSettings,
}

impl ProvisioningEngine {
	pub fn new(store: DocumentStore, verifier: Arc<dyn IdentityVerifier>) -> Self {
		Self::with_settings(store, verifier, ProvisioningSettings::default())
	}

	pub fn with_settings(
		store: DocumentStore,
		verifier: Arc<dyn IdentityVerifier>,
		settings: ProvisioningSettings,
	) -> Self {
		Self {
			store,
			verifier,
			settings,
		}
	}

	/// Create an account directly, outside any enrollment flow.
	///
	/// With no credential this is bootstrap mode: it succeeds only
	/// while the store holds no users at all. With a credential, a
	/// verified subject who has no account document yet may provision
	/// one. Both paths are limited to administrative roles; everyone
	/// else arrives through an enrollment claim.
	#[instrument(level = "info", skip(self, request, credential), fields(role = %request.role))]
	pub async fn create_user(
		&self,
		request: CreateUserRequest,
		credential: Option<&str>,
	) -> Result<User> {
		if !is_valid_email(&request.email) {
			return Err(ProvisioningError::BadInput("malformed email address".to_string()));
		}
		if request.name.trim().is_empty() {
			return Err(ProvisioningError::BadInput("name must not be empty".to_string()));
		}
		if !matrix::can_create_user_without_auth(request.role) {
			return Err(ProvisioningError::RoleNotAllowed {
				requested: request.role,
			});
		}

		let identity = match credential {
			Some(credential) => Some(self.authenticate(credential).await?),
			None => None,
		};

		// The bootstrap predicate is computed fresh on every request.
		if identity.is_none() && self.store.count(Collection::Users).await? > 0 {
			return Err(ProvisioningError::Unauthenticated);
		}

		let email = normalize_email(&request.email);
		if let Some(identity) = &identity {
			if identity.email != email {
				return Err(ProvisioningError::BadInput(
					"email does not match the verified identity".to_string(),
				));
			}
		}
		if !self
			.store
			.query_field_eq(Collection::Users, "email", &email)
			.await?
			.is_empty()
		{
			return Err(ProvisioningError::AlreadyClaimed("account"));
		}

		let user_id = identity
			.as_ref()
			.map(|identity| identity.subject_id)
			.unwrap_or_else(UserId::generate);
		let user = User::provision(
			user_id,
			&email,
			&request.name,
			request.role,
			Utc::now(),
			self.settings.trial_days,
		);

		let created = self
			.store
			.run_transaction(move |txn| {
				let user = user.clone();
				Box::pin(async move { Self::create_user_txn(txn, user).await })
			})
			.await??;

		tracing::info!(
			user_id = %created.id,
			bootstrap = identity.is_none(),
			"user created"
		);
		Ok(created)
	}

	/// Claim a multi-use enrollment link.
	#[instrument(level = "info", skip(self, token, credential), fields(requested_role = %requested_role))]
	pub async fn claim_enrollment(
		&self,
		token: &str,
		requested_role: Role,
		credential: &str,
	) -> Result<ClaimOutcome> {
		let identity = self.authenticate(credential).await?;
		let now = Utc::now();

		let engine = self.clone();
		let token = token.to_string();
		let outcome = self
			.store
			.run_transaction(move |txn| {
				let engine = engine.clone();
				let token = token.clone();
				let identity = identity.clone();
				Box::pin(async move {
					engine
						.claim_enrollment_txn(txn, &token, requested_role, &identity, now)
						.await
				})
			})
			.await??;

		tracing::info!(
			user_id = %outcome.user_id,
			dealership_id = %outcome.dealership_id,
			created = outcome.created,
			"enrollment link claimed"
		);
		Ok(outcome)
	}

	/// Claim a single-use email invitation.
	#[instrument(level = "info", skip(self, token, credential))]
	pub async fn claim_invitation(&self, token: &str, credential: &str) -> Result<ClaimOutcome> {
		let identity = self.authenticate(credential).await?;
		let now = Utc::now();

		let engine = self.clone();
		let token = token.to_string();
		let outcome = self
			.store
			.run_transaction(move |txn| {
				let engine = engine.clone();
				let token = token.clone();
				let identity = identity.clone();
				Box::pin(async move { engine.claim_invitation_txn(txn, &token, &identity, now).await })
			})
			.await??;

		tracing::info!(
			user_id = %outcome.user_id,
			dealership_id = %outcome.dealership_id,
			created = outcome.created,
			"invitation claimed"
		);
		Ok(outcome)
	}

	/// Mint an enrollment link for a dealership.
	///
	/// The link grants exactly the roles the matrix lets the actor
	/// enroll. Scoped actors must belong to the dealership.
	#[instrument(level = "info", skip(self, credential), fields(dealership_id = %dealership_id))]
	pub async fn create_enrollment_link(
		&self,
		dealership_id: DealershipId,
		credential: &str,
	) -> Result<EnrollmentLink> {
		let actor = self.require_actor(credential).await?;
		let allowed_roles = matrix::enrollable_roles(actor.role);
		if allowed_roles.is_empty() {
			return Err(ProvisioningError::Forbidden("role cannot enroll anyone"));
		}
		self.check_dealership_scope(&actor, dealership_id)?;

		let dealership = self.load_dealership(dealership_id).await?;
		if !dealership.is_active() {
			return Err(ProvisioningError::Inactive("dealership"));
		}

		let link = EnrollmentLink::new(
			dealership_id,
			allowed_roles,
			actor.id,
			Utc::now(),
			self.settings.link_ttl_days,
		);
		self.store
			.put(Collection::EnrollmentLinks, &link.token, &link)
			.await?;

		tracing::info!(
			dealership_id = %dealership_id,
			inviter_id = %actor.id,
			roles = link.allowed_roles.len(),
			"enrollment link created"
		);
		Ok(link)
	}

	/// Deactivate an enrollment link so further claims reject.
	///
	/// Allowed for the link's inviter and for administrative tiers.
	/// Deactivating an already-inactive link is a no-op.
	#[instrument(level = "info", skip(self, token, credential))]
	pub async fn deactivate_enrollment_link(&self, token: &str, credential: &str) -> Result<()> {
		let actor = self.require_actor(credential).await?;
		let actor_id = actor.id;

		let token = token.to_string();
		self.store
			.run_transaction(move |txn| {
				let token = token.clone();
				let actor = actor.clone();
				Box::pin(async move { Self::deactivate_link_txn(txn, &token, &actor).await })
			})
			.await??;

		tracing::info!(actor_id = %actor_id, "enrollment link deactivated");
		Ok(())
	}

	/// List the enrollment links minted for a dealership, newest first.
	#[instrument(level = "debug", skip(self, credential), fields(dealership_id = %dealership_id))]
	pub async fn list_enrollment_links(
		&self,
		dealership_id: DealershipId,
		credential: &str,
	) -> Result<Vec<EnrollmentLink>> {
		let actor = self.require_actor(credential).await?;
		if matrix::enrollable_roles(actor.role).is_empty() {
			return Err(ProvisioningError::Forbidden("role cannot enroll anyone"));
		}
		self.check_dealership_scope(&actor, dealership_id)?;

		let docs = self
			.store
			.query_field_eq(
				Collection::EnrollmentLinks,
				"dealershipId",
				&dealership_id.to_string(),
			)
			.await?;

		let mut links = Vec::with_capacity(docs.len());
		for doc in &docs {
			links.push(doc.deserialize::<EnrollmentLink>()?);
		}
		links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(links)
	}

	/// Mint a single-use invitation bound to an email address.
	#[instrument(level = "info", skip(self, email, credential), fields(dealership_id = %dealership_id, role = %role))]
	pub async fn create_invitation(
		&self,
		email: &str,
		role: Role,
		dealership_id: DealershipId,
		credential: &str,
	) -> Result<EmailInvitation> {
		if !is_valid_email(email) {
			return Err(ProvisioningError::BadInput("malformed email address".to_string()));
		}

		let actor = self.require_actor(credential).await?;
		if !matrix::can_enroll(actor.role, role) {
			return Err(ProvisioningError::RoleNotAllowed { requested: role });
		}
		self.check_dealership_scope(&actor, dealership_id)?;

		let dealership = self.load_dealership(dealership_id).await?;
		if !dealership.is_active() {
			return Err(ProvisioningError::Inactive("dealership"));
		}

		let invitation = EmailInvitation::new(
			email,
			role,
			dealership_id,
			actor.id,
			Utc::now(),
			self.settings.invitation_ttl_days,
		);
		self.store
			.put(Collection::EmailInvitations, &invitation.token, &invitation)
			.await?;

		tracing::info!(
			dealership_id = %dealership_id,
			inviter_id = %actor.id,
			role = %role,
			"invitation created"
		);
		Ok(invitation)
	}

	/// Public preview of an enrollment link, for the landing page.
	/// Only currently claimable links preview; everything else surfaces
	/// the same rejection a claim would.
	#[instrument(level = "debug", skip_all)]
	pub async fn enrollment_preview(&self, token: &str) -> Result<EnrollmentPreview> {
		let now = Utc::now();
		let link = self
			.store
			.get_as::<EnrollmentLink>(Collection::EnrollmentLinks, token)
			.await?
			.ok_or(ProvisioningError::NotFound("enrollment link"))?;
		validate_link(&link, now).map_err(|rejection| rejection_error(rejection, "enrollment link"))?;

		let dealership = self.load_dealership(link.dealership_id).await?;
		if !dealership.is_active() {
			return Err(ProvisioningError::Inactive("dealership"));
		}

		Ok(EnrollmentPreview {
			dealership_id: link.dealership_id,
			dealership_name: dealership.name,
			allowed_roles: link.allowed_roles,
			expires_at: link.expires_at,
		})
	}

	/// Public preview of an email invitation.
	#[instrument(level = "debug", skip_all)]
	pub async fn invitation_preview(&self, token: &str) -> Result<InvitationPreview> {
		let now = Utc::now();
		let invitation = self
			.store
			.get_as::<EmailInvitation>(Collection::EmailInvitations, token)
			.await?
			.ok_or(ProvisioningError::NotFound("invitation"))?;
		// Previews have no authenticated caller, so the email check is
		// run against the invitation's own address; expiry and claim
		// state still apply.
		validate_invitation(&invitation, now, &invitation.email)
			.map_err(|rejection| rejection_error(rejection, "invitation"))?;

		let dealership = self.load_dealership(invitation.dealership_id).await?;
		if !dealership.is_active() {
			return Err(ProvisioningError::Inactive("dealership"));
		}

		Ok(InvitationPreview {
			email: invitation.email,
			role: invitation.role,
			dealership_id: invitation.dealership_id,
			dealership_name: dealership.name,
			expires_at: invitation.expires_at,
		})
	}

	async fn authenticate(&self, credential: &str) -> Result<VerifiedIdentity> {
		Ok(self.verifier.verify(credential).await?)
	}

	/// Verify the credential and load the caller's account document.
	async fn require_actor(&self, credential: &str) -> Result<User> {
		let identity = self.authenticate(credential).await?;
		self.store
			.get_as::<User>(Collection::Users, &identity.subject_id.to_string())
			.await?
			.ok_or(ProvisioningError::Forbidden("caller has no provisioned account"))
	}

	/// Scoped roles act only within their own dealerships;
	/// administrative tiers act across any tenant.
	fn check_dealership_scope(&self, actor: &User, dealership_id: DealershipId) -> Result<()> {
		if matrix::requires_dealership_membership(actor.role) && !actor.is_member_of(dealership_id) {
			return Err(ProvisioningError::Forbidden(
				"actor does not belong to this dealership",
			));
		}
		Ok(())
	}

	async fn load_dealership(&self, dealership_id: DealershipId) -> Result<Dealership> {
		self.store
			.get_as::<Dealership>(Collection::Dealerships, &dealership_id.to_string())
			.await?
			.ok_or(ProvisioningError::NotFound("dealership"))
	}

	async fn create_user_txn(txn: &mut Transaction, user: User) -> TxnOutcome<User> {
		let key = user.id.to_string();
		if txn.get(Collection::Users, &key).await?.is_some() {
			return Ok(Err(ProvisioningError::AlreadyClaimed("account")));
		}
		txn.set(Collection::Users, &key, &user)?;
		Ok(Ok(user))
	}

	async fn claim_enrollment_txn(
		&self,
		txn: &mut Transaction,
		token: &str,
		requested_role: Role,
		identity: &VerifiedIdentity,
		now: DateTime<Utc>,
	) -> TxnOutcome<ClaimOutcome> {
		// Reads first; the store rejects any read after the first write.
		let Some(mut link) = txn
			.get_as::<EnrollmentLink>(Collection::EnrollmentLinks, token)
			.await?
		else {
			return Ok(Err(ProvisioningError::NotFound("enrollment link")));
		};
		let Some(dealership) = txn
			.get_as::<Dealership>(Collection::Dealerships, &link.dealership_id.to_string())
			.await?
		else {
			return Ok(Err(ProvisioningError::NotFound("dealership")));
		};
		let user_key = identity.subject_id.to_string();
		let existing = txn.get_as::<User>(Collection::Users, &user_key).await?;

		if let Err(rejection) = validate_link(&link, now) {
			return Ok(Err(rejection_error(rejection, "enrollment link")));
		}
		if !dealership.is_active() {
			return Ok(Err(ProvisioningError::Inactive("dealership")));
		}
		if !link.allowed_roles.contains(&requested_role) {
			return Ok(Err(ProvisioningError::RoleNotAllowed {
				requested: requested_role,
			}));
		}

		let created = existing.is_none();
		let mut user = match existing {
			Some(user) => user,
			None => User::provision(
				identity.subject_id,
				&identity.email,
				&identity.display_name(),
				requested_role,
				now,
				self.settings.trial_days,
			),
		};

		user.grant_dealership(link.dealership_id);
		user.adopt_role(requested_role);
		for program in dealership.enabled_programs() {
			enable_program(&mut user.program_state, program);
		}
		user.touch(now);

		link.record_use(now);

		// The usage write commits atomically with the user write.
		txn.set(Collection::Users, &user_key, &user)?;
		txn.set(Collection::EnrollmentLinks, token, &link)?;

		Ok(Ok(ClaimOutcome {
			user_id: user.id,
			dealership_id: link.dealership_id,
			role: user.role,
			created,
		}))
	}

	async fn claim_invitation_txn(
		&self,
		txn: &mut Transaction,
		token: &str,
		identity: &VerifiedIdentity,
		now: DateTime<Utc>,
	) -> TxnOutcome<ClaimOutcome> {
		let Some(mut invitation) = txn
			.get_as::<EmailInvitation>(Collection::EmailInvitations, token)
			.await?
		else {
			return Ok(Err(ProvisioningError::NotFound("invitation")));
		};
		let Some(dealership) = txn
			.get_as::<Dealership>(Collection::Dealerships, &invitation.dealership_id.to_string())
			.await?
		else {
			return Ok(Err(ProvisioningError::NotFound("dealership")));
		};
		let user_key = identity.subject_id.to_string();
		let existing = txn.get_as::<User>(Collection::Users, &user_key).await?;

		if let Err(rejection) = validate_invitation(&invitation, now, &identity.email) {
			return Ok(Err(rejection_error(rejection, "invitation")));
		}
		if !dealership.is_active() {
			return Ok(Err(ProvisioningError::Inactive("dealership")));
		}

		let granted_role = invitation.role;
		let created = existing.is_none();
		let mut user = match existing {
			Some(user) => user,
			None => User::provision(
				identity.subject_id,
				&identity.email,
				&identity.display_name(),
				granted_role,
				now,
				self.settings.trial_days,
			),
		};

		user.grant_dealership(invitation.dealership_id);
		user.adopt_role(granted_role);
		for program in dealership.enabled_programs() {
			enable_program(&mut user.program_state, program);
		}
		user.touch(now);

		invitation.claim(user.id, now);

		txn.set(Collection::Users, &user_key, &user)?;
		txn.set(Collection::EmailInvitations, token, &invitation)?;

		Ok(Ok(ClaimOutcome {
			user_id: user.id,
			dealership_id: invitation.dealership_id,
			role: user.role,
			created,
		}))
	}

	async fn deactivate_link_txn(
		txn: &mut Transaction,
		token: &str,
		actor: &User,
	) -> TxnOutcome<()> {
		let Some(mut link) = txn
			.get_as::<EnrollmentLink>(Collection::EnrollmentLinks, token)
			.await?
		else {
			return Ok(Err(ProvisioningError::NotFound("enrollment link")));
		};
		if link.inviter_id != actor.id && !actor.role.is_administrative() {
			return Ok(Err(ProvisioningError::Forbidden(
				"only the inviter or an administrator may deactivate a link",
			)));
		}
		if link.active {
			link.deactivate();
			txn.set(Collection::EnrollmentLinks, token, &link)?;
		}
		Ok(Ok(()))
	}
}
