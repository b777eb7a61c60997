// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy decision point configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLICY_DIR: &str = "/var/lib/warden/policies";
pub const DEFAULT_RIGHTS_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdpConfig {
	/// Directory of `<policy-id>.xml` documents.
	pub policy_dir: PathBuf,
	/// Policy-combining algorithm (URN or bare name) applied when several
	/// top-level policies match. `None` makes that situation Indeterminate.
	pub top_level_combining_algorithm: Option<String>,
	/// Whether each object's rights datastream joins the candidate policies.
	pub rights_metadata_policies: bool,
	/// How many objects' parsed rights policies stay cached.
	pub rights_cache_capacity: usize,
}

impl Default for PdpConfig {
	fn default() -> Self {
		Self {
			policy_dir: PathBuf::from(DEFAULT_POLICY_DIR),
			top_level_combining_algorithm: None,
			rights_metadata_policies: true,
			rights_cache_capacity: DEFAULT_RIGHTS_CACHE_CAPACITY,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PdpConfigLayer {
	#[serde(default)]
	pub policy_dir: Option<PathBuf>,
	#[serde(default)]
	pub top_level_combining_algorithm: Option<String>,
	#[serde(default)]
	pub rights_metadata_policies: Option<bool>,
	#[serde(default)]
	pub rights_cache_capacity: Option<usize>,
}

impl PdpConfigLayer {
	pub fn merge(&mut self, other: PdpConfigLayer) {
		if other.policy_dir.is_some() {
			self.policy_dir = other.policy_dir;
		}
		if other.top_level_combining_algorithm.is_some() {
			self.top_level_combining_algorithm = other.top_level_combining_algorithm;
		}
		if other.rights_metadata_policies.is_some() {
			self.rights_metadata_policies = other.rights_metadata_policies;
		}
		if other.rights_cache_capacity.is_some() {
			self.rights_cache_capacity = other.rights_cache_capacity;
		}
	}

	pub fn finalize(self) -> PdpConfig {
		PdpConfig {
			policy_dir: self
				.policy_dir
				.unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_DIR)),
			top_level_combining_algorithm: self
				.top_level_combining_algorithm
				.filter(|s| !s.trim().is_empty()),
			rights_metadata_policies: self.rights_metadata_policies.unwrap_or(true),
			rights_cache_capacity: self
				.rights_cache_capacity
				.unwrap_or(DEFAULT_RIGHTS_CACHE_CAPACITY),
		}
	}
}
