// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! String-keyed construction of finders from configuration.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeBag, AttributeDesignator, Category};
use crate::context::EvaluationCtx;
use crate::error::{AuthzError, FinderError};
use crate::rights::RightsMetadataLoader;
use crate::store::ObjectSource;

use super::{
	AttributeFinder, AttributeFinderChain, CurrentEnvironmentFinder, RelationshipAttributeFinder,
	RightsMetadataAttributeFinder,
};

/// Restricts a finder to listed (category, attribute id) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignatorScope {
	pub category: Category,
	pub attribute_id: String,
}

/// One configured finder: its module key, optional designator scope and
/// free-form options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderSpec {
	pub module: String,
	#[serde(default)]
	pub designators: Vec<DesignatorScope>,
	#[serde(default)]
	pub options: BTreeMap<String, String>,
}

impl FinderSpec {
	pub fn new(module: impl Into<String>) -> Self {
		Self {
			module: module.into(),
			..Self::default()
		}
	}

	pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.options.insert(key.into(), value.into());
		self
	}

	pub fn with_designator(mut self, category: Category, attribute_id: impl Into<String>) -> Self {
		self.designators.push(DesignatorScope {
			category,
			attribute_id: attribute_id.into(),
		});
		self
	}
}

/// Shared collaborators handed to every finder constructor.
#[derive(Clone)]
pub struct FinderDeps {
	pub object_source: Arc<dyn ObjectSource>,
	pub rights_datastream: String,
}

impl FinderDeps {
	pub fn new(object_source: Arc<dyn ObjectSource>, rights_datastream: impl Into<String>) -> Self {
		Self {
			object_source,
			rights_datastream: rights_datastream.into(),
		}
	}
}

impl fmt::Debug for FinderDeps {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FinderDeps")
			.field("rights_datastream", &self.rights_datastream)
			.finish_non_exhaustive()
	}
}

pub type FinderConstructor =
	fn(&FinderSpec, &FinderDeps) -> Result<Arc<dyn AttributeFinder>, AuthzError>;

/// Table from stable module keys to finder constructors.
pub struct FinderRegistry {
	constructors: HashMap<String, FinderConstructor>,
	aliases: HashMap<String, String>,
}

impl Default for FinderRegistry {
	fn default() -> Self {
		Self::with_defaults()
	}
}

impl FinderRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self {
			constructors: HashMap::new(),
			aliases: HashMap::new(),
		}
	}

	/// Registry with `relationship`, `rights-metadata` and `current-environment`.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register("relationship", build_relationship);
		registry.register("rights-metadata", build_rights_metadata);
		registry.register("current-environment", build_current_environment);
		registry
	}

	pub fn register(&mut self, key: impl Into<String>, constructor: FinderConstructor) {
		self.constructors.insert(key.into(), constructor);
	}

	/// Lets an older configuration name refer to a registered key.
	pub fn register_alias(
		&mut self,
		alias: impl Into<String>,
		key: impl Into<String>,
	) -> Result<(), AuthzError> {
		let key = key.into();
		if !self.constructors.contains_key(&key) {
			return Err(AuthzError::Configuration(format!(
				"alias target finder module {key} is not registered"
			)));
		}
		self.aliases.insert(alias.into(), key);
		Ok(())
	}

	pub fn keys(&self) -> Vec<&str> {
		let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
		keys.sort_unstable();
		keys
	}

	fn resolve(&self, module: &str) -> Option<FinderConstructor> {
		let key = self.aliases.get(module).map(String::as_str).unwrap_or(module);
		self.constructors.get(key).copied()
	}

	pub fn build(
		&self,
		spec: &FinderSpec,
		deps: &FinderDeps,
	) -> Result<Arc<dyn AttributeFinder>, AuthzError> {
		let constructor = self.resolve(&spec.module).ok_or_else(|| {
			AuthzError::Configuration(format!("unknown attribute finder module: {}", spec.module))
		})?;
		let finder = constructor(spec, deps)?;
		if spec.designators.is_empty() {
			return Ok(finder);
		}
		Ok(Arc::new(ScopedFinder {
			inner: finder,
			scope: spec.designators.clone(),
		}))
	}

	/// Builds every spec in order. Any unknown module fails the whole chain.
	pub fn build_chain(
		&self,
		specs: &[FinderSpec],
		deps: &FinderDeps,
	) -> Result<AttributeFinderChain, AuthzError> {
		let finders = specs
			.iter()
			.map(|spec| self.build(spec, deps))
			.collect::<Result<Vec<_>, _>>()?;
		let chain = AttributeFinderChain::new(finders);
		tracing::info!(finders = ?chain.names(), "attribute finder chain built");
		Ok(chain)
	}
}

impl fmt::Debug for FinderRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FinderRegistry")
			.field("keys", &self.keys())
			.field("aliases", &self.aliases)
			.finish()
	}
}

struct ScopedFinder {
	inner: Arc<dyn AttributeFinder>,
	scope: Vec<DesignatorScope>,
}

impl AttributeFinder for ScopedFinder {
	fn name(&self) -> &str {
		self.inner.name()
	}

	fn supports_designator(&self, designator: &AttributeDesignator) -> bool {
		self.scope
			.iter()
			.any(|s| s.category == designator.category && s.attribute_id == designator.attribute_id)
			&& self.inner.supports_designator(designator)
	}

	fn find_attribute(
		&self,
		designator: &AttributeDesignator,
		ctx: &EvaluationCtx<'_>,
	) -> Result<Option<AttributeBag>, FinderError> {
		self.inner.find_attribute(designator, ctx)
	}
}

/// Options map attribute ids to relationship predicates.
fn build_relationship(
	spec: &FinderSpec,
	deps: &FinderDeps,
) -> Result<Arc<dyn AttributeFinder>, AuthzError> {
	if spec.options.is_empty() {
		return Err(AuthzError::Configuration(
			"relationship finder needs at least one attribute-id = predicate option".into(),
		));
	}
	if let Some((id, _)) = spec.options.iter().find(|(_, p)| p.trim().is_empty()) {
		return Err(AuthzError::Configuration(format!(
			"relationship finder option {id} has an empty predicate"
		)));
	}
	Ok(Arc::new(RelationshipAttributeFinder::new(
		deps.object_source.clone(),
		spec.options.clone(),
	)))
}

/// Optional `datastream` option overrides the configured rights datastream.
fn build_rights_metadata(
	spec: &FinderSpec,
	deps: &FinderDeps,
) -> Result<Arc<dyn AttributeFinder>, AuthzError> {
	let datastream = spec
		.options
		.get("datastream")
		.cloned()
		.unwrap_or_else(|| deps.rights_datastream.clone());
	let loader = RightsMetadataLoader::new(deps.object_source.clone(), datastream);
	Ok(Arc::new(RightsMetadataAttributeFinder::new(loader)))
}

fn build_current_environment(
	spec: &FinderSpec,
	_deps: &FinderDeps,
) -> Result<Arc<dyn AttributeFinder>, AuthzError> {
	if let Some(key) = spec.options.keys().next() {
		return Err(AuthzError::Configuration(format!(
			"current-environment finder takes no options (got {key})"
		)));
	}
	Ok(Arc::new(CurrentEnvironmentFinder::new()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attribute::ids;
	use crate::store::MemoryObjectSource;

	fn deps() -> FinderDeps {
		FinderDeps::new(Arc::new(MemoryObjectSource::new()), "rightsMetadata")
	}

	#[test]
	fn builds_default_modules_in_order() {
		let registry = FinderRegistry::with_defaults();
		let chain = registry
			.build_chain(
				&[
					FinderSpec::new("current-environment"),
					FinderSpec::new("relationship").with_option("urn:test:memberOf", "info:rel/isMemberOf"),
					FinderSpec::new("rights-metadata"),
				],
				&deps(),
			)
			.unwrap();
		assert_eq!(
			chain.names(),
			vec!["current-environment", "relationship", "rights-metadata"]
		);
	}

	#[test]
	fn unknown_module_fails_closed() {
		let registry = FinderRegistry::with_defaults();
		let err = registry
			.build_chain(&[FinderSpec::new("ldap")], &deps())
			.unwrap_err();
		assert!(matches!(err, AuthzError::Configuration(msg) if msg.contains("ldap")));
	}

	#[test]
	fn invalid_options_are_configuration_errors() {
		let registry = FinderRegistry::with_defaults();
		assert!(registry.build(&FinderSpec::new("relationship"), &deps()).is_err());
		assert!(registry
			.build(
				&FinderSpec::new("current-environment").with_option("tz", "UTC"),
				&deps()
			)
			.is_err());
	}

	#[test]
	fn aliases_resolve_to_registered_keys() {
		let mut registry = FinderRegistry::with_defaults();
		registry
			.register_alias("EnvironmentAttributeModule", "current-environment")
			.unwrap();
		assert!(registry
			.build(&FinderSpec::new("EnvironmentAttributeModule"), &deps())
			.is_ok());
		assert!(registry.register_alias("Legacy", "missing").is_err());
	}

	#[test]
	fn designator_scope_narrows_support() {
		let registry = FinderRegistry::with_defaults();
		let finder = registry
			.build(
				&FinderSpec::new("current-environment")
					.with_designator(Category::Environment, ids::CURRENT_DATE),
				&deps(),
			)
			.unwrap();
		assert!(finder.supports_designator(&AttributeDesignator::environment(ids::CURRENT_DATE)));
		assert!(!finder.supports_designator(&AttributeDesignator::environment(ids::CURRENT_TIME)));
	}

	#[test]
	fn custom_constructors_can_be_registered() {
		fn build_none(
			_spec: &FinderSpec,
			_deps: &FinderDeps,
		) -> Result<Arc<dyn AttributeFinder>, AuthzError> {
			Ok(Arc::new(CurrentEnvironmentFinder))
		}

		let mut registry = FinderRegistry::new();
		registry.register("custom", build_none);
		assert_eq!(registry.keys(), vec!["custom"]);
		assert!(registry.build(&FinderSpec::new("custom"), &deps()).is_ok());
	}
}
