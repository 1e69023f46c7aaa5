// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections, one module per concern.

pub mod database;
pub mod identity;
pub mod logging;
pub mod provisioning;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use identity::{IdentityConfig, IdentityConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use provisioning::{ProvisioningConfig, ProvisioningConfigLayer};
