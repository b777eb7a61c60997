// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Digital object storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OBJECTS_ROOT: &str = "/var/lib/warden/objects";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectsConfig {
	/// Root holding one directory per object pid.
	pub root: PathBuf,
}

impl Default for ObjectsConfig {
	fn default() -> Self {
		Self {
			root: PathBuf::from(DEFAULT_OBJECTS_ROOT),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectsConfigLayer {
	#[serde(default)]
	pub root: Option<PathBuf>,
}

impl ObjectsConfigLayer {
	pub fn merge(&mut self, other: ObjectsConfigLayer) {
		if other.root.is_some() {
			self.root = other.root;
		}
	}

	pub fn finalize(self) -> ObjectsConfig {
		ObjectsConfig {
			root: self
				.root
				.unwrap_or_else(|| PathBuf::from(DEFAULT_OBJECTS_ROOT)),
		}
	}
}
