// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller identity verification.
//!
//! Proof of identity is delegated: the engine crates accept any
//! [`IdentityVerifier`] and treat its output as authoritative. The
//! bundled [`HmacIdentityVerifier`] verifies self-contained signed
//! bearer tokens offline; deployments fronted by an external identity
//! provider implement the trait against that provider instead.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::error::AuthError;
use crate::types::UserId;
use crate::user::normalize_email;

type HmacSha256 = Hmac<Sha256>;

/// Format tag leading every signed bearer token.
const TOKEN_PREFIX: &str = "fct1";

/// A verified caller identity.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
	pub subject_id: UserId,
	pub email: String,
	/// Extra claims the verifier chose to expose (for example `name`).
	pub claims: Map<String, Value>,
}

impl VerifiedIdentity {
	pub fn new(subject_id: UserId, email: &str) -> Self {
		Self {
			subject_id,
			email: normalize_email(email),
			claims: Map::new(),
		}
	}

	/// Human display name: the `name` claim when present, otherwise the
	/// local part of the email address.
	pub fn display_name(&self) -> String {
		if let Some(name) = self.claims.get("name").and_then(Value::as_str) {
			let name = name.trim();
			if !name.is_empty() {
				return name.to_string();
			}
		}
		self.email.split('@').next().unwrap_or_default().to_string()
	}
}

/// Verifies bearer credentials and produces the caller's identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
	async fn verify(&self, bearer_token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// Offline verifier for HMAC-SHA256 signed bearer tokens.
///
/// Token layout: `fct1.<subject-uuid>.<hex(email)>.<expiry-unix>.<hex(mac)>`
/// where the MAC covers everything before it. The signature is checked
/// before the expiry so malformed-but-expired probes learn nothing.
#[derive(Clone)]
pub struct HmacIdentityVerifier {
	secret: Vec<u8>,
}

impl HmacIdentityVerifier {
	pub fn new(secret: impl Into<Vec<u8>>) -> Self {
		Self {
			secret: secret.into(),
		}
	}

	/// Issue a signed token for a subject.
	///
	/// Used by operator tooling and tests; production callers normally
	/// arrive with tokens minted by the deployment's token service.
	pub fn issue(
		&self,
		subject_id: UserId,
		email: &str,
		ttl: Duration,
	) -> Result<String, AuthError> {
		let expiry = (Utc::now() + ttl).timestamp();
		let payload = format!(
			"{TOKEN_PREFIX}.{}.{}.{}",
			subject_id,
			hex::encode(normalize_email(email).as_bytes()),
			expiry
		);
		let mac = self.mac_for(payload.as_bytes())?;
		Ok(format!("{payload}.{}", hex::encode(mac.finalize().into_bytes())))
	}

	fn mac_for(&self, data: &[u8]) -> Result<HmacSha256, AuthError> {
		let mut mac = HmacSha256::new_from_slice(&self.secret)
			.map_err(|e| AuthError::Configuration(e.to_string()))?;
		mac.update(data);
		Ok(mac)
	}
}

#[async_trait]
impl IdentityVerifier for HmacIdentityVerifier {
	async fn verify(&self, bearer_token: &str) -> Result<VerifiedIdentity, AuthError> {
		let token = bearer_token.trim();
		if token.is_empty() {
			return Err(AuthError::MissingCredential);
		}

		let parts: Vec<&str> = token.split('.').collect();
		let [prefix, subject, email_hex, expiry, signature] = parts.as_slice() else {
			return Err(AuthError::InvalidCredential("malformed token".to_string()));
		};
		if *prefix != TOKEN_PREFIX {
			return Err(AuthError::InvalidCredential(
				"unknown token format".to_string(),
			));
		}

		let payload = &token[..token.len() - signature.len() - 1];
		let signature = hex::decode(signature)
			.map_err(|_| AuthError::InvalidCredential("malformed signature".to_string()))?;
		self.mac_for(payload.as_bytes())?
			.verify_slice(&signature)
			.map_err(|_| AuthError::InvalidCredential("signature mismatch".to_string()))?;

		let expiry: i64 = expiry
			.parse()
			.map_err(|_| AuthError::InvalidCredential("malformed expiry".to_string()))?;
		if Utc::now().timestamp() >= expiry {
			return Err(AuthError::CredentialExpired);
		}

		let subject_id: UserId = subject
			.parse()
			.map_err(|_| AuthError::InvalidCredential("malformed subject".to_string()))?;
		let email_bytes = hex::decode(email_hex)
			.map_err(|_| AuthError::InvalidCredential("malformed email".to_string()))?;
		let email = String::from_utf8(email_bytes)
			.map_err(|_| AuthError::InvalidCredential("malformed email".to_string()))?;

		Ok(VerifiedIdentity::new(subject_id, &email))
	}
}
