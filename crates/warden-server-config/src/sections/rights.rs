// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rights-metadata configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_RIGHTS_DATASTREAM: &str = "rightsMetadata";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsConfig {
	/// Datastream holding each object's rights document.
	pub datastream_id: String,
	/// Request action id to rights access type (`discover`, `read`, `edit`).
	pub action_aliases: BTreeMap<String, String>,
}

impl Default for RightsConfig {
	fn default() -> Self {
		Self {
			datastream_id: DEFAULT_RIGHTS_DATASTREAM.to_string(),
			action_aliases: default_action_aliases(),
		}
	}
}

/// Aliases for the actions the built-in routes emit.
pub fn default_action_aliases() -> BTreeMap<String, String> {
	[
		("list-relationships", "discover"),
		("get-datastream-content", "read"),
	]
	.into_iter()
	.map(|(k, v)| (k.to_string(), v.to_string()))
	.collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RightsConfigLayer {
	#[serde(default)]
	pub datastream_id: Option<String>,
	#[serde(default)]
	pub action_aliases: Option<BTreeMap<String, String>>,
}

impl RightsConfigLayer {
	/// Alias tables from later layers extend earlier ones key by key.
	pub fn merge(&mut self, other: RightsConfigLayer) {
		if other.datastream_id.is_some() {
			self.datastream_id = other.datastream_id;
		}
		if let Some(aliases) = other.action_aliases {
			self.action_aliases
				.get_or_insert_with(BTreeMap::new)
				.extend(aliases);
		}
	}

	pub fn finalize(self) -> RightsConfig {
		let mut action_aliases = default_action_aliases();
		action_aliases.extend(self.action_aliases.unwrap_or_default());
		RightsConfig {
			datastream_id: self
				.datastream_id
				.unwrap_or_else(|| DEFAULT_RIGHTS_DATASTREAM.to_string()),
			action_aliases,
		}
	}
}
