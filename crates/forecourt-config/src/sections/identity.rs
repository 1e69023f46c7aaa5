// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity verification configuration.
//!
//! The service verifies bearer credentials offline with an HMAC secret
//! shared with the deployment's token issuer. The secret normally
//! arrives through `FORECOURT_IDENTITY_SECRET` (or the `_FILE`
//! variant); carrying it in the TOML file works but leaves the value on
//! disk unprotected.

use serde::Deserialize;

use crate::secret::SecretString;

/// Identity configuration (runtime, fully resolved).
///
/// `secret` stays `None` in deployments that wire a non-HMAC verifier.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
	pub secret: Option<SecretString>,
}

/// Identity configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfigLayer {
	#[serde(default)]
	pub secret: Option<SecretString>,
}

impl IdentityConfigLayer {
	pub fn merge(&mut self, other: IdentityConfigLayer) {
		if other.secret.is_some() {
			self.secret = other.secret;
		}
	}

	pub fn finalize(self) -> IdentityConfig {
		IdentityConfig {
			secret: self.secret,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_has_no_secret() {
		let config = IdentityConfigLayer::default().finalize();
		assert!(config.secret.is_none());
	}

	#[test]
	fn test_debug_output_redacts_the_secret() {
		let config = IdentityConfigLayer {
			secret: Some(SecretString::new("0123456789abcdef0123456789abcdef")),
		}
		.finalize();
		let rendered = format!("{config:?}");
		assert!(rendered.contains("[REDACTED]"));
		assert!(!rendered.contains("0123456789abcdef"));
	}
}
