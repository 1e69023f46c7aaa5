// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account provisioning and enrollment flows.
//!
//! This crate ties identity verification, enrollment tokens, and the
//! authorization matrix to the document store: direct account creation
//! (including first-run bootstrap), multi-use enrollment links, and
//! single-use email invitations, each claim committed as one atomic
//! transaction.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::ProvisioningEngine;
pub use error::{ProvisioningError, Result, StatusClass};
pub use types::{
	ClaimOutcome, CreateUserRequest, EnrollmentPreview, InvitationPreview, ProvisioningSettings,
};
