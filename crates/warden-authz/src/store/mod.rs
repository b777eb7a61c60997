// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interfaces to the policy store and the digital-object source, with
//! in-memory and filesystem implementations.

mod fs;
mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::EvaluationCtx;
use crate::error::{ObjectSourceError, StoreError};
use crate::policy::parser::parse_policy;
use crate::policy::CombiningAlgorithms;

pub use fs::{FsObjectSource, FsPolicyStore};
pub use memory::{MemoryObjectSource, MemoryPolicyStore};

/// Persistent home of raw policy documents.
pub trait PolicyStore: Send + Sync {
	/// Documents that could apply to the request, keyed by policy id.
	///
	/// The store decides relevance from its own index; returning every policy
	/// is always correct.
	fn candidate_policies(
		&self,
		ctx: &EvaluationCtx<'_>,
	) -> Result<BTreeMap<String, Vec<u8>>, StoreError>;

	/// Stores a new policy. Without an explicit id the document's own
	/// `PolicyId`/`PolicySetId` is used. Returns the id stored under.
	fn add_policy(&self, id: Option<&str>, document: &[u8]) -> Result<String, StoreError>;

	fn update_policy(&self, id: &str, document: &[u8]) -> Result<(), StoreError>;

	fn delete_policy(&self, id: &str) -> Result<(), StoreError>;

	fn list_policies(&self) -> Result<Vec<String>, StoreError>;

	fn get_policy(&self, id: &str) -> Result<Vec<u8>, StoreError>;
}

/// One asserted relationship of a digital object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
	pub subject: String,
	pub predicate: String,
	pub object: String,
	#[serde(default)]
	pub is_literal: bool,
}

/// Supplies datastream content and relationship tuples for objects.
pub trait ObjectSource: Send + Sync {
	fn datastream_content(
		&self,
		pid: &str,
		datastream_id: &str,
	) -> Result<Option<Vec<u8>>, ObjectSourceError>;

	fn datastream_mime_type(
		&self,
		_pid: &str,
		_datastream_id: &str,
	) -> Result<Option<String>, ObjectSourceError> {
		Ok(None)
	}

	/// Relationships asserted by `pid`, optionally only those with `predicate`.
	fn relationships(
		&self,
		pid: &str,
		predicate: Option<&str>,
	) -> Result<Vec<Relationship>, ObjectSourceError>;
}

/// Policy ids become file names, so they may not traverse or hide.
pub fn validate_policy_id(id: &str) -> Result<(), StoreError> {
	if id.is_empty()
		|| id.starts_with('.')
		|| id.contains('/')
		|| id.contains('\\')
		|| id.chars().any(char::is_control)
	{
		return Err(StoreError::InvalidId(id.to_string()));
	}
	Ok(())
}

pub(crate) fn validate_pid(pid: &str) -> Result<(), ObjectSourceError> {
	if pid.is_empty()
		|| pid.starts_with('.')
		|| pid.contains('/')
		|| pid.contains('\\')
		|| pid.chars().any(char::is_control)
	{
		return Err(ObjectSourceError::InvalidPid(pid.to_string()));
	}
	Ok(())
}

/// Resolves the id a document is stored under and checks it parses.
pub(crate) fn admit_document(id: Option<&str>, document: &[u8]) -> Result<String, StoreError> {
	let tree = parse_policy(document, &CombiningAlgorithms::standard())?;
	let id = id.map_or_else(|| tree.id().to_string(), str::to_string);
	validate_policy_id(&id)?;
	Ok(id)
}

pub(crate) fn filter_relationships(
	relationships: &[Relationship],
	predicate: Option<&str>,
) -> Vec<Relationship> {
	relationships
		.iter()
		.filter(|r| predicate.map_or(true, |p| r.predicate == p))
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn policy_ids_cannot_escape_the_store() {
		assert!(validate_policy_id("permit-public").is_ok());
		assert!(validate_policy_id("urn:demo:policy:1").is_ok());
		for bad in ["", ".hidden", "../etc", "a/b", "a\\b", "a\nb"] {
			assert!(validate_policy_id(bad).is_err(), "{bad:?} accepted");
		}
	}

	#[test]
	fn relationship_filter_keeps_matching_predicate() {
		let rels = vec![
			Relationship {
				subject: "demo:1".into(),
				predicate: "info:rel/isMemberOf".into(),
				object: "demo:collection".into(),
				is_literal: false,
			},
			Relationship {
				subject: "demo:1".into(),
				predicate: "info:rel/owner".into(),
				object: "alice".into(),
				is_literal: true,
			},
		];
		assert_eq!(filter_relationships(&rels, Some("info:rel/owner")).len(), 1);
		assert_eq!(filter_relationships(&rels, None).len(), 2);
	}
}
