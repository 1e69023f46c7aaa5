// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity, roles, and enrollment-domain types for the Forecourt
//! platform.
//!
//! This crate is the pure core of the enrollment subsystem:
//! - Typed identifiers and the closed [`Role`] enum
//! - [`User`] and [`Dealership`] document entities
//! - Enrollment tokens and their lifecycle validation
//! - The authorization matrix deciding who may enroll whom
//! - Training-program state defaults and the write-if-absent merge
//! - The [`IdentityVerifier`] seam to the external identity provider
//!
//! Nothing here performs I/O beyond the async verifier trait; storage
//! and orchestration live in `forecourt-store`,
//! `forecourt-provisioning`, and `forecourt-flags`.

pub mod dealership;
pub mod error;
pub mod identity;
pub mod matrix;
pub mod program;
pub mod testing;
pub mod token;
pub mod types;
pub mod user;

pub use dealership::{Dealership, DealershipStatus};
pub use error::{AuthError, StatusClass};
pub use identity::{HmacIdentityVerifier, IdentityVerifier, VerifiedIdentity};
pub use program::SystemSetting;
pub use token::{
	validate_invitation, validate_link, EmailInvitation, EnrollmentLink, TokenRejection,
};
pub use types::{DealershipId, Role, RoleSet, SubscriptionStatus, TrainingProgram, UserId};
pub use user::{SkillStats, User, DEFAULT_TRIAL_DAYS};
