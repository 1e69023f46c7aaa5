// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity verification errors and the shared status classes.

use serde::Serialize;

/// Errors surfaced while verifying a caller's credential.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("No credential presented")]
	MissingCredential,

	#[error("Invalid credential: {0}")]
	InvalidCredential(String),

	#[error("Credential has expired")]
	CredentialExpired,

	#[error("Identity verifier misconfigured: {0}")]
	Configuration(String),
}

/// Coarse outcome class attached to every operation error.
///
/// A transport adapter maps these onto its own status codes; the engine
/// crates only reason in these classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
	Unauthorized,
	Forbidden,
	NotFound,
	Conflict,
	BadInput,
	Internal,
}

impl StatusClass {
	pub fn as_str(&self) -> &'static str {
		match self {
			StatusClass::Unauthorized => "unauthorized",
			StatusClass::Forbidden => "forbidden",
			StatusClass::NotFound => "not-found",
			StatusClass::Conflict => "conflict",
			StatusClass::BadInput => "bad-input",
			StatusClass::Internal => "internal",
		}
	}
}

impl std::fmt::Display for StatusClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}
