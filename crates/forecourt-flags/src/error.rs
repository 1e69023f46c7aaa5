// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Program-flag error taxonomy.

use forecourt_auth::error::AuthError;
use forecourt_store::StoreError;

pub use forecourt_auth::error::StatusClass;

/// Errors surfaced by program-flag operations.
#[derive(Debug, thiserror::Error)]
pub enum ProgramFlagError {
	#[error("authentication required")]
	Unauthenticated,

	#[error("invalid credential: {0}")]
	InvalidCredential(String),

	#[error("forbidden: {0}")]
	Forbidden(&'static str),

	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("concurrent writes exhausted the retry budget")]
	Conflict,

	#[error("store unavailable: {0}")]
	Unavailable(String),

	#[error("internal error: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, ProgramFlagError>;

impl ProgramFlagError {
	/// Stable machine-readable reason code.
	pub fn reason_code(&self) -> &'static str {
		match self {
			ProgramFlagError::Unauthenticated => "unauthenticated",
			ProgramFlagError::InvalidCredential(_) => "invalid_credential",
			ProgramFlagError::Forbidden(_) => "forbidden",
			ProgramFlagError::NotFound(_) => "not_found",
			ProgramFlagError::Conflict => "conflict",
			ProgramFlagError::Unavailable(_) => "unavailable",
			ProgramFlagError::Internal(_) => "internal",
		}
	}

	/// Coarse status class for transport layers.
	pub fn status(&self) -> StatusClass {
		match self {
			ProgramFlagError::Unauthenticated | ProgramFlagError::InvalidCredential(_) => {
				StatusClass::Unauthorized
			}
			ProgramFlagError::Forbidden(_) => StatusClass::Forbidden,
			ProgramFlagError::NotFound(_) => StatusClass::NotFound,
			ProgramFlagError::Conflict => StatusClass::Conflict,
			ProgramFlagError::Unavailable(_) | ProgramFlagError::Internal(_) => StatusClass::Internal,
		}
	}
}

impl From<AuthError> for ProgramFlagError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::MissingCredential => ProgramFlagError::Unauthenticated,
			AuthError::InvalidCredential(reason) => ProgramFlagError::InvalidCredential(reason),
			AuthError::CredentialExpired => {
				ProgramFlagError::InvalidCredential("credential expired".to_string())
			}
			AuthError::Configuration(reason) => ProgramFlagError::Internal(reason),
		}
	}
}

impl From<StoreError> for ProgramFlagError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::Conflict { .. } => ProgramFlagError::Conflict,
			StoreError::Sqlx(err) => ProgramFlagError::Unavailable(err.to_string()),
			other => ProgramFlagError::Internal(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reason_codes_are_snake_case_variant_names() {
		assert_eq!(ProgramFlagError::Unauthenticated.reason_code(), "unauthenticated");
		assert_eq!(ProgramFlagError::Forbidden("nope").reason_code(), "forbidden");
		assert_eq!(ProgramFlagError::Conflict.reason_code(), "conflict");
		assert_eq!(
			ProgramFlagError::Unavailable("down".to_string()).reason_code(),
			"unavailable"
		);
	}

	#[test]
	fn status_classes_group_the_taxonomy() {
		assert_eq!(ProgramFlagError::Unauthenticated.status(), StatusClass::Unauthorized);
		assert_eq!(
			ProgramFlagError::InvalidCredential("x".to_string()).status(),
			StatusClass::Unauthorized
		);
		assert_eq!(ProgramFlagError::Forbidden("nope").status(), StatusClass::Forbidden);
		assert_eq!(ProgramFlagError::NotFound("flag").status(), StatusClass::NotFound);
		assert_eq!(ProgramFlagError::Conflict.status(), StatusClass::Conflict);
		assert_eq!(
			ProgramFlagError::Internal("bug".to_string()).status(),
			StatusClass::Internal
		);
	}

	#[test]
	fn auth_and_store_errors_map_in() {
		assert!(matches!(
			ProgramFlagError::from(AuthError::MissingCredential),
			ProgramFlagError::Unauthenticated
		));
		let conflict = StoreError::Conflict {
			collection: "users",
			id: "u1".to_string(),
		};
		assert!(matches!(ProgramFlagError::from(conflict), ProgramFlagError::Conflict));
	}
}
