// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Global training-program flags.
//!
//! One singleton document governs whether the SaaS PPP program is
//! rolled out platform-wide. Writing it triggers a batched backfill
//! sweep that brings every user document in line without clobbering
//! individual progress.

pub mod error;
pub mod service;

pub use error::{ProgramFlagError, Result, StatusClass};
pub use service::{FlagUpdate, ProgramFlagService, ProgramFlagState, DEFAULT_BACKFILL_BATCH};
