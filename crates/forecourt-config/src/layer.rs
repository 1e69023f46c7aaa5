// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The partial configuration layer produced by each source.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, IdentityConfigLayer, LoggingConfigLayer, ProvisioningConfigLayer,
};

/// One source's contribution to the configuration. Every field is
/// optional; merging later layers over earlier ones resolves the stack.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub identity: Option<IdentityConfigLayer>,
	#[serde(default)]
	pub provisioning: Option<ProvisioningConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServiceConfigLayer {
	/// Merge `other` over this layer, section by section.
	pub fn merge(&mut self, other: ServiceConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.identity, other.identity, IdentityConfigLayer::merge);
		merge_section(
			&mut self.provisioning,
			other.provisioning,
			ProvisioningConfigLayer::merge,
		);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl Fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = ServiceConfigLayer::default();
		let overlay = ServiceConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.database.unwrap().url.as_deref(), Some("sqlite::memory:"));
	}

	#[test]
	fn test_merge_overlays_field_by_field() {
		let mut base = ServiceConfigLayer {
			provisioning: Some(ProvisioningConfigLayer {
				trial_days: Some(14),
				link_ttl_days: Some(30),
				..Default::default()
			}),
			..Default::default()
		};
		let overlay = ServiceConfigLayer {
			provisioning: Some(ProvisioningConfigLayer {
				trial_days: Some(7),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(overlay);

		let provisioning = base.provisioning.unwrap();
		assert_eq!(provisioning.trial_days, Some(7));
		assert_eq!(provisioning.link_ttl_days, Some(30));
	}

	#[test]
	fn test_merge_ignores_empty_overlay() {
		let mut base = ServiceConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("debug".to_string()),
				json: None,
			}),
			..Default::default()
		};
		base.merge(ServiceConfigLayer::default());
		assert_eq!(base.logging.unwrap().level.as_deref(), Some("debug"));
	}

	#[test]
	fn test_deserializes_from_toml_tables() {
		let toml_str = r#"
[database]
url = "sqlite:/var/lib/forecourt/data.db"

[provisioning]
trial_days = 21
"#;
		let layer: ServiceConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(
			layer.database.unwrap().url.as_deref(),
			Some("sqlite:/var/lib/forecourt/data.db")
		);
		assert_eq!(layer.provisioning.unwrap().trial_days, Some(21));
		assert!(layer.logging.is_none());
	}
}
