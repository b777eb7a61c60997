// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute finder chain configuration.
//!
//! Each entry names a registered finder module by key; the order of the list
//! is the order finders are consulted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One (category, attribute id) pair a finder is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignatorConfig {
	pub category: String,
	pub attribute_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderConfig {
	pub module: String,
	#[serde(default)]
	pub designators: Vec<DesignatorConfig>,
	#[serde(default)]
	pub options: BTreeMap<String, String>,
}

impl FinderConfig {
	pub fn new(module: impl Into<String>) -> Self {
		Self {
			module: module.into(),
			designators: Vec::new(),
			options: BTreeMap::new(),
		}
	}
}

pub fn default_finders() -> Vec<FinderConfig> {
	vec![
		FinderConfig::new("current-environment"),
		FinderConfig::new("rights-metadata"),
	]
}

pub(crate) fn validate_finders(finders: &[FinderConfig]) -> Result<(), String> {
	for (index, finder) in finders.iter().enumerate() {
		if finder.module.trim().is_empty() {
			return Err(format!("finders[{index}] has an empty module key"));
		}
		if let Some(d) = finder.designators.iter().find(|d| d.attribute_id.trim().is_empty()) {
			return Err(format!(
				"finders[{index}] ({}) has a {} designator without an attribute id",
				finder.module, d.category
			));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Doc {
		finders: Vec<FinderConfig>,
	}

	#[test]
	fn test_deserialize_finder_list() {
		let doc: Doc = toml::from_str(
			r#"
[[finders]]
module = "relationship"
designators = [{ category = "resource", attribute_id = "urn:example:collection" }]
options = { "urn:example:collection" = "info:fedora/fedora-system:def/relations-external#isMemberOf" }

[[finders]]
module = "current-environment"
"#,
		)
		.unwrap();
		assert_eq!(doc.finders.len(), 2);
		assert_eq!(doc.finders[0].module, "relationship");
		assert_eq!(doc.finders[0].designators[0].category, "resource");
		assert_eq!(doc.finders[0].options.len(), 1);
		assert!(doc.finders[1].options.is_empty());
	}

	#[test]
	fn test_validation_rejects_blank_entries() {
		assert!(validate_finders(&default_finders()).is_ok());
		assert!(validate_finders(&[FinderConfig::new(" ")]).is_err());

		let mut scoped = FinderConfig::new("relationship");
		scoped.designators.push(DesignatorConfig {
			category: "resource".to_string(),
			attribute_id: String::new(),
		});
		assert!(validate_finders(&[scoped]).is_err());
	}
}
