// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Forecourt service.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`FORECOURT_*`)
//!
//! # Usage
//!
//! ```ignore
//! use forecourt_config::load_config;
//!
//! let config = load_config()?;
//! config.logging.init();
//! let pool = forecourt_store::create_pool(&config.database.url).await?;
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServiceConfigLayer;
pub use secret::{load_secret_env, SecretString, REDACTED};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
	pub database: DatabaseConfig,
	pub identity: IdentityConfig,
	pub provisioning: ProvisioningConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`FORECOURT_*`)
/// 2. Config file (`/etc/forecourt/service.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServiceConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServiceConfig, ConfigError> {
	let mut merged = ServiceConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServiceConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServiceConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServiceConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layers into resolved config.
fn finalize(layer: ServiceConfigLayer) -> Result<ServiceConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let identity = layer.identity.unwrap_or_default().finalize();
	let provisioning = layer.provisioning.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&identity, &provisioning)?;

	info!(
		database = %database.url,
		identity_secret_configured = identity.secret.is_some(),
		trial_days = provisioning.trial_days,
		link_ttl_days = provisioning.link_ttl_days,
		invitation_ttl_days = provisioning.invitation_ttl_days,
		backfill_batch_size = provisioning.backfill_batch_size,
		log_level = %logging.level,
		"service configuration loaded"
	);

	Ok(ServiceConfig {
		database,
		identity,
		provisioning,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	identity: &IdentityConfig,
	provisioning: &ProvisioningConfig,
) -> Result<(), ConfigError> {
	if let Some(secret) = &identity.secret {
		if secret.expose_secret().len() < 32 {
			return Err(ConfigError::Validation(
				"FORECOURT_IDENTITY_SECRET must be at least 32 bytes".to_string(),
			));
		}
	}
	if provisioning.trial_days < 0 {
		return Err(ConfigError::Validation(
			"trial_days must not be negative".to_string(),
		));
	}
	if provisioning.link_ttl_days < 1 || provisioning.invitation_ttl_days < 1 {
		return Err(ConfigError::Validation(
			"token ttl_days must be at least 1".to_string(),
		));
	}
	if provisioning.backfill_batch_size == 0 {
		return Err(ConfigError::Validation(
			"backfill_batch_size must be at least 1".to_string(),
		));
	}

	Ok(())
}
