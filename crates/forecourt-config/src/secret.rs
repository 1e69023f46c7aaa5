// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret values that never leak through logs or debug output.

use std::fmt;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ConfigError;

/// Placeholder printed wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// An owned secret string, zeroed on drop.
///
/// `Debug` prints the placeholder and there is no `Display` impl, so a
/// secret cannot end up in a log line without an explicit
/// [`expose_secret`](Self::expose_secret) call at the use site.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Access the underlying value.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Self)
	}
}

/// Load a secret from `<name>` or from the file named by `<name>_FILE`.
/// Setting both is rejected as ambiguous. A trailing newline in the
/// file is stripped.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, ConfigError> {
	let file_key = format!("{name}_FILE");
	let direct = std::env::var(name).ok().filter(|v| !v.is_empty());
	let file = std::env::var(&file_key).ok().filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(ConfigError::Secret(format!(
			"both {name} and {file_key} are set"
		))),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let content = std::fs::read_to_string(&path)
				.map_err(|e| ConfigError::Secret(format!("{file_key} ({path}): {e}")))?;
			Ok(Some(SecretString::new(
				content.trim_end_matches(['\r', '\n']).to_string(),
			)))
		}
		(None, None) => Ok(None),
	}
}
