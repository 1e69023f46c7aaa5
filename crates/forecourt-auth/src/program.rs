// Copyright (c) 2025 Forecourt Systems <engineering@forecourt.systems>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Training-program state defaults and the write-if-absent merge.
//!
//! Program state is stored flattened on the user document as
//! `<program>_<field>` entries. Both the provisioning path and the
//! global-flag backfill go through the same per-field merge: a default
//! is written only when the field is missing or holds a value of the
//! wrong JSON type, so progress a user has already made is never reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{TrainingProgram, UserId};

/// Global flag document for one training program, keyed by the program
/// key in the `systemSettings` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSetting {
	pub enabled: bool,
	pub updated_at: DateTime<Utc>,
	pub updated_by: UserId,
}

/// Default state fields for a program, excluding the enablement flag.
pub fn default_state(program: TrainingProgram) -> Vec<(String, Value)> {
	vec![
		(program.state_field("level"), json!(1)),
		(program.state_field("lessons_passed"), json!(0)),
		(program.state_field("progress_percentage"), json!(0)),
		(program.state_field("badge"), json!("none")),
		(program.state_field("abandonment_counter"), json!(0)),
		(program.state_field("certified"), json!(false)),
	]
}

/// Whether `key` needs its default written: it is absent from `fields`
/// or its current value has a different JSON type than the default.
pub fn needs_default(fields: &Map<String, Value>, key: &str, default: &Value) -> bool {
	match fields.get(key) {
		None => true,
		Some(existing) => !same_json_kind(existing, default),
	}
}

fn same_json_kind(a: &Value, b: &Value) -> bool {
	matches!(
		(a, b),
		(Value::Null, Value::Null)
			| (Value::Bool(_), Value::Bool(_))
			| (Value::Number(_), Value::Number(_))
			| (Value::String(_), Value::String(_))
			| (Value::Array(_), Value::Array(_))
			| (Value::Object(_), Value::Object(_))
	)
}

/// Write-if-absent application of a program's default state.
///
/// Returns the number of fields written.
pub fn apply_defaults(fields: &mut Map<String, Value>, program: TrainingProgram) -> usize {
	let mut written = 0;
	for (key, default) in default_state(program) {
		if needs_default(fields, &key, &default) {
			fields.insert(key, default);
			written += 1;
		}
	}
	written
}

/// Enable a program for a user as part of an enrollment claim.
///
/// A claim can only raise the enablement flag; programs the dealership
/// does not enable are left untouched, so enablement granted by an
/// earlier claim survives later ones. Remaining state is defaulted
/// write-if-absent.
pub fn enable_program(fields: &mut Map<String, Value>, program: TrainingProgram) {
	fields.insert(program.enabled_field(), Value::Bool(true));
	apply_defaults(fields, program);
}

/// Compute the backfill patch for one user document.
///
/// Re-asserts the enablement flag to the flag's value and fills any
/// missing or wrongly typed state field with its default. Fields the
/// user already holds with the right type are not part of the patch, so
/// applying it never clobbers progress.
pub fn backfill_patch(
	fields: &Map<String, Value>,
	program: TrainingProgram,
	enabled: bool,
) -> Map<String, Value> {
	let mut patch = Map::new();
	patch.insert(program.enabled_field(), Value::Bool(enabled));
	for (key, default) in default_state(program) {
		if needs_default(fields, &key, &default) {
			patch.insert(key, default);
		}
	}
	patch
}

/// Read a program's enablement flag off a user document.
pub fn program_enabled(fields: &Map<String, Value>, program: TrainingProgram) -> bool {
	fields
		.get(&program.enabled_field())
		.and_then(Value::as_bool)
		.unwrap_or(false)
}
