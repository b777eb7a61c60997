// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute finders: pluggable resolvers consulted when neither the request
//! nor the transport supplies an attribute.
//!
//! Finders run in registration order. The first one to produce a non-empty
//! bag wins; a finder that fails is logged and skipped so an unavailable
//! attribute source degrades to "no value" instead of aborting the decision.

mod environment;
mod registry;
mod relationship;
mod rights;

use std::sync::Arc;

use crate::attribute::{AttributeBag, AttributeDesignator};
use crate::context::EvaluationCtx;
use crate::error::FinderError;

pub use environment::CurrentEnvironmentFinder;
pub use registry::{DesignatorScope, FinderConstructor, FinderDeps, FinderRegistry, FinderSpec};
pub use relationship::RelationshipAttributeFinder;
pub use rights::RightsMetadataAttributeFinder;

pub trait AttributeFinder: Send + Sync {
	/// Short name used in logs.
	fn name(&self) -> &str;

	fn supports_designator(&self, designator: &AttributeDesignator) -> bool;

	/// `Ok(None)` or an empty bag means this finder has no value.
	fn find_attribute(
		&self,
		designator: &AttributeDesignator,
		ctx: &EvaluationCtx<'_>,
	) -> Result<Option<AttributeBag>, FinderError>;
}

/// Ordered, immutable list of finders shared by every decision.
#[derive(Clone, Default)]
pub struct AttributeFinderChain {
	finders: Vec<Arc<dyn AttributeFinder>>,
}

impl AttributeFinderChain {
	pub fn new(finders: Vec<Arc<dyn AttributeFinder>>) -> Self {
		Self { finders }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn with_finder<F: AttributeFinder + 'static>(mut self, finder: Arc<F>) -> Self {
		self.finders.push(finder);
		self
	}

	pub fn push(&mut self, finder: Arc<dyn AttributeFinder>) {
		self.finders.push(finder);
	}

	pub fn len(&self) -> usize {
		self.finders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.finders.is_empty()
	}

	pub fn names(&self) -> Vec<&str> {
		self.finders.iter().map(|f| f.name()).collect()
	}

	/// First non-empty value any supporting finder produces.
	pub fn find(
		&self,
		designator: &AttributeDesignator,
		ctx: &EvaluationCtx<'_>,
	) -> Option<AttributeBag> {
		for finder in self
			.finders
			.iter()
			.filter(|f| f.supports_designator(designator))
		{
			match finder.find_attribute(designator, ctx) {
				Ok(Some(bag)) if !bag.is_empty() => {
					tracing::debug!(
						finder = finder.name(),
						category = %designator.category,
						attribute_id = %designator.attribute_id,
						values = bag.len(),
						"attribute resolved by finder"
					);
					return Some(bag);
				}
				Ok(_) => {}
				Err(e) => {
					tracing::warn!(
						finder = finder.name(),
						category = %designator.category,
						attribute_id = %designator.attribute_id,
						error = %e,
						"attribute finder failed; treating as no value"
					);
				}
			}
		}
		None
	}
}

impl std::fmt::Debug for AttributeFinderChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AttributeFinderChain")
			.field("finders", &self.names())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;
	use crate::attribute::{ids, AttributeValue};
	use crate::request::RequestCtx;

	enum Behaviour {
		Value(&'static str),
		Nothing,
		Empty,
		Fail,
	}

	struct ScriptedFinder {
		name: &'static str,
		behaviour: Behaviour,
		calls: AtomicUsize,
		only: Option<&'static str>,
	}

	impl ScriptedFinder {
		fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
			Arc::new(Self {
				name,
				behaviour,
				calls: AtomicUsize::new(0),
				only: None,
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	impl AttributeFinder for ScriptedFinder {
		fn name(&self) -> &str {
			self.name
		}

		fn supports_designator(&self, designator: &AttributeDesignator) -> bool {
			self.only.map_or(true, |id| designator.attribute_id == id)
		}

		fn find_attribute(
			&self,
			_designator: &AttributeDesignator,
			_ctx: &EvaluationCtx<'_>,
		) -> Result<Option<AttributeBag>, FinderError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			match self.behaviour {
				Behaviour::Value(v) => Ok(Some(AttributeBag::single(AttributeValue::string(v)))),
				Behaviour::Nothing => Ok(None),
				Behaviour::Empty => Ok(Some(AttributeBag::empty())),
				Behaviour::Fail => Err(FinderError::Other("backend offline".into())),
			}
		}
	}

	fn resource_attribute(chain: &AttributeFinderChain) -> AttributeBag {
		let request = RequestCtx::default();
		let ctx = EvaluationCtx::new(&request, &(), chain);
		ctx.get_resource_attribute("urn:test:collection")
	}

	#[test]
	fn second_finder_answers_when_first_has_nothing() {
		let first = ScriptedFinder::new("first", Behaviour::Nothing);
		let second = ScriptedFinder::new("second", Behaviour::Value("foo:bar"));
		let chain = AttributeFinderChain::empty()
			.with_finder(first.clone())
			.with_finder(second.clone());

		assert_eq!(resource_attribute(&chain).first_text(), Some("foo:bar"));
		assert_eq!(first.calls(), 1);
		assert_eq!(second.calls(), 1);
	}

	#[test]
	fn first_answer_short_circuits() {
		let first = ScriptedFinder::new("first", Behaviour::Value("x"));
		let second = ScriptedFinder::new("second", Behaviour::Value("y"));
		let chain = AttributeFinderChain::empty()
			.with_finder(first.clone())
			.with_finder(second.clone());

		assert_eq!(resource_attribute(&chain).first_text(), Some("x"));
		assert_eq!(second.calls(), 0);
	}

	#[test]
	fn empty_bag_does_not_short_circuit() {
		let first = ScriptedFinder::new("first", Behaviour::Empty);
		let second = ScriptedFinder::new("second", Behaviour::Value("y"));
		let chain = AttributeFinderChain::empty()
			.with_finder(first)
			.with_finder(second);

		assert_eq!(resource_attribute(&chain).first_text(), Some("y"));
	}

	#[test]
	fn failing_finder_is_skipped() {
		let failing = ScriptedFinder::new("failing", Behaviour::Fail);
		let healthy = ScriptedFinder::new("healthy", Behaviour::Value("ok"));
		let chain = AttributeFinderChain::empty()
			.with_finder(failing.clone())
			.with_finder(healthy);

		assert_eq!(resource_attribute(&chain).first_text(), Some("ok"));
		assert_eq!(failing.calls(), 1);
	}

	#[test]
	fn failure_alone_yields_no_value() {
		let chain =
			AttributeFinderChain::empty().with_finder(ScriptedFinder::new("failing", Behaviour::Fail));
		assert!(resource_attribute(&chain).is_empty());
	}

	#[test]
	fn unsupported_designators_are_not_offered() {
		let scoped = Arc::new(ScriptedFinder {
			name: "scoped",
			behaviour: Behaviour::Value("v"),
			calls: AtomicUsize::new(0),
			only: Some(ids::SUBJECT_ROLE),
		});
		let chain = AttributeFinderChain::empty().with_finder(scoped.clone());

		assert!(resource_attribute(&chain).is_empty());
		assert_eq!(scoped.calls(), 0);
	}

	#[test]
	fn debug_lists_finder_names() {
		let chain = AttributeFinderChain::empty()
			.with_finder(ScriptedFinder::new("a", Behaviour::Nothing))
			.with_finder(ScriptedFinder::new("b", Behaviour::Nothing));
		assert_eq!(format!("{chain:?}"), r#"AttributeFinderChain { finders: ["a", "b"] }"#);
	}
}
