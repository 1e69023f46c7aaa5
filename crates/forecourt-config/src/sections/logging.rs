// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging configuration section.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
	pub json: Option<bool>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.json.is_some() {
			self.json = other.json;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| "info".to_string()),
			json: self.json.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
	/// Filter directive, e.g. `info` or `forecourt_store=debug,info`.
	pub level: String,
	/// Emit JSON lines instead of the human-readable format.
	pub json: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			json: false,
		}
	}
}

impl LoggingConfig {
	/// Install the global subscriber. `RUST_LOG` overrides the
	/// configured level. Calling this twice is a no-op.
	pub fn init(&self) {
		let filter = EnvFilter::try_from_default_env()
			.or_else(|_| EnvFilter::try_new(&self.level))
			.unwrap_or_else(|_| EnvFilter::new("info"));

		if self.json {
			let _ = tracing_subscriber::fmt()
				.with_env_filter(filter)
				.json()
				.try_init();
		} else {
			let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
		}
	}
}
