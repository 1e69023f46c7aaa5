// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning error taxonomy.

use forecourt_auth::error::AuthError;
use forecourt_auth::token::TokenRejection;
use forecourt_auth::types::Role;
use forecourt_store::StoreError;

pub use forecourt_auth::error::StatusClass;

/// Errors surfaced by provisioning operations.
///
/// Every variant has a stable machine-readable reason code and maps to
/// a coarse status class for whatever transport sits in front of the
/// engine.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("authentication required")]
	Unauthenticated,

	#[error("invalid credential: {0}")]
	InvalidCredential(String),

	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("{0} has expired")]
	Expired(&'static str),

	#[error("{0} is inactive")]
	Inactive(&'static str),

	#[error("{0} has already been claimed")]
	AlreadyClaimed(&'static str),

	#[error("invitation is bound to a different email address")]
	EmailMismatch,

	#[error("role {requested} cannot be granted here")]
	RoleNotAllowed { requested: Role },

	#[error("forbidden: {0}")]
	Forbidden(&'static str),

	#[error("invalid request: {0}")]
	BadInput(String),

	#[error("concurrent writes exhausted the retry budget")]
	Conflict,

	#[error("store unavailable: {0}")]
	Unavailable(String),

	#[error("internal error: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;

impl ProvisioningError {
	/// Stable machine-readable reason code.
	pub fn reason_code(&self) -> &'static str {
		match self {
			ProvisioningError::Unauthenticated => "unauthenticated",
			ProvisioningError::InvalidCredential(_) => "invalid_credential",
			ProvisioningError::NotFound(_) => "not_found",
			ProvisioningError::Expired(_) => "expired",
			ProvisioningError::Inactive(_) => "inactive",
			ProvisioningError::AlreadyClaimed(_) => "already_claimed",
			ProvisioningError::EmailMismatch => "email_mismatch",
			ProvisioningError::RoleNotAllowed { .. } => "role_not_allowed",
			ProvisioningError::Forbidden(_) => "forbidden",
			ProvisioningError::BadInput(_) => "bad_input",
			ProvisioningError::Conflict => "conflict",
			ProvisioningError::Unavailable(_) => "unavailable",
			ProvisioningError::Internal(_) => "internal",
		}
	}

	/// Coarse status class for transport layers.
	pub fn status(&self) -> StatusClass {
		match self {
			ProvisioningError::Unauthenticated | ProvisioningError::InvalidCredential(_) => {
				StatusClass::Unauthorized
			}
			ProvisioningError::Forbidden(_) | ProvisioningError::RoleNotAllowed { .. } => {
				StatusClass::Forbidden
			}
			ProvisioningError::NotFound(_) => StatusClass::NotFound,
			ProvisioningError::Expired(_)
			| ProvisioningError::Inactive(_)
			| ProvisioningError::AlreadyClaimed(_)
			| ProvisioningError::EmailMismatch
			| ProvisioningError::BadInput(_) => StatusClass::BadInput,
			ProvisioningError::Conflict => StatusClass::Conflict,
			ProvisioningError::Unavailable(_) | ProvisioningError::Internal(_) => {
				StatusClass::Internal
			}
		}
	}
}

impl From<AuthError> for ProvisioningError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::MissingCredential => ProvisioningError::Unauthenticated,
			AuthError::InvalidCredential(reason) => ProvisioningError::InvalidCredential(reason),
			AuthError::CredentialExpired => {
				ProvisioningError::InvalidCredential("credential expired".to_string())
			}
			AuthError::Configuration(reason) => ProvisioningError::Internal(reason),
		}
	}
}

impl From<StoreError> for ProvisioningError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::Conflict { .. } => ProvisioningError::Conflict,
			StoreError::Sqlx(err) => ProvisioningError::Unavailable(err.to_string()),
			other => ProvisioningError::Internal(other.to_string()),
		}
	}
}

/// Map a token lifecycle rejection onto the operation error, naming the
/// kind of token in the message.
pub fn rejection_error(rejection: TokenRejection, token_kind: &'static str) -> ProvisioningError {
	match rejection {
		TokenRejection::Inactive => ProvisioningError::Inactive(token_kind),
		TokenRejection::Expired => ProvisioningError::Expired(token_kind),
		TokenRejection::AlreadyClaimed => ProvisioningError::AlreadyClaimed(token_kind),
		TokenRejection::EmailMismatch => ProvisioningError::EmailMismatch,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reason_codes_are_snake_case_variant_names() {
		assert_eq!(ProvisioningError::Unauthenticated.reason_code(), "unauthenticated");
		assert_eq!(
			ProvisioningError::InvalidCredential("x".to_string()).reason_code(),
			"invalid_credential"
		);
		assert_eq!(ProvisioningError::NotFound("link").reason_code(), "not_found");
		assert_eq!(ProvisioningError::Expired("link").reason_code(), "expired");
		assert_eq!(ProvisioningError::Inactive("link").reason_code(), "inactive");
		assert_eq!(
			ProvisioningError::AlreadyClaimed("invitation").reason_code(),
			"already_claimed"
		);
		assert_eq!(ProvisioningError::EmailMismatch.reason_code(), "email_mismatch");
		assert_eq!(
			ProvisioningError::RoleNotAllowed { requested: Role::Owner }.reason_code(),
			"role_not_allowed"
		);
		assert_eq!(ProvisioningError::Forbidden("nope").reason_code(), "forbidden");
		assert_eq!(ProvisioningError::BadInput("x".to_string()).reason_code(), "bad_input");
		assert_eq!(ProvisioningError::Conflict.reason_code(), "conflict");
		assert_eq!(
			ProvisioningError::Unavailable("down".to_string()).reason_code(),
			"unavailable"
		);
		assert_eq!(ProvisioningError::Internal("bug".to_string()).reason_code(), "internal");
	}

	#[test]
	fn status_classes_group_the_taxonomy() {
		assert_eq!(ProvisioningError::Unauthenticated.status(), StatusClass::Unauthorized);
		assert_eq!(
			ProvisioningError::InvalidCredential("x".to_string()).status(),
			StatusClass::Unauthorized
		);
		assert_eq!(ProvisioningError::Forbidden("nope").status(), StatusClass::Forbidden);
		assert_eq!(
			ProvisioningError::RoleNotAllowed { requested: Role::Owner }.status(),
			StatusClass::Forbidden
		);
		assert_eq!(ProvisioningError::NotFound("link").status(), StatusClass::NotFound);
		assert_eq!(ProvisioningError::Expired("link").status(), StatusClass::BadInput);
		assert_eq!(ProvisioningError::Inactive("link").status(), StatusClass::BadInput);
		assert_eq!(
			ProvisioningError::AlreadyClaimed("invitation").status(),
			StatusClass::BadInput
		);
		assert_eq!(ProvisioningError::EmailMismatch.status(), StatusClass::BadInput);
		assert_eq!(ProvisioningError::Conflict.status(), StatusClass::Conflict);
		assert_eq!(
			ProvisioningError::Unavailable("down".to_string()).status(),
			StatusClass::Internal
		);
	}

	#[test]
	fn auth_errors_map_to_credential_failures() {
		assert!(matches!(
			ProvisioningError::from(AuthError::MissingCredential),
			ProvisioningError::Unauthenticated
		));
		assert!(matches!(
			ProvisioningError::from(AuthError::CredentialExpired),
			ProvisioningError::InvalidCredential(_)
		));
	}

	#[test]
	fn store_conflicts_map_to_conflict() {
		let err = StoreError::Conflict {
			collection: "users",
			id: "u1".to_string(),
		};
		assert!(matches!(ProvisioningError::from(err), ProvisioningError::Conflict));
	}

	#[test]
	fn rejections_carry_the_token_kind() {
		let err = rejection_error(TokenRejection::Expired, "enrollment link");
		assert_eq!(err.to_string(), "enrollment link has expired");

		let err = rejection_error(TokenRejection::AlreadyClaimed, "invitation");
		assert_eq!(err.to_string(), "invitation has already been claimed");
	}
}
