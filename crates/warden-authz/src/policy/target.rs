// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::attribute::{AttributeDesignator, AttributeValue};
use crate::context::EvaluationCtx;
use crate::decision::{MatchResult, Status};
use crate::error::PolicyParseError;

use super::expression::{Function, Pattern};

/// Compares a literal against the values of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatch {
	pub function: Function,
	pub value: AttributeValue,
	pub designator: AttributeDesignator,
	/// Set for `string-regexp-match` matches built through [`TargetMatch::new`].
	pub pattern: Option<Pattern>,
}

impl TargetMatch {
	pub fn new(
		function: Function,
		value: AttributeValue,
		designator: AttributeDesignator,
	) -> Result<Self, PolicyParseError> {
		let pattern = match function {
			Function::RegexpMatch => Pattern::compile(&value)?,
			_ => None,
		};
		Ok(Self {
			function,
			value,
			designator,
			pattern,
		})
	}

	fn apply(&self, candidate: &AttributeValue) -> Result<bool, Status> {
		match &self.pattern {
			Some(pattern) => pattern.is_match(candidate),
			None => self.function.apply_match(&self.value, candidate),
		}
	}

	/// Match when the function holds for the literal and any value of the bag.
	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> MatchResult {
		let bag = match ctx.resolve(&self.designator) {
			Ok(bag) => bag,
			Err(status) => return MatchResult::Indeterminate(status),
		};

		let mut error: Option<Status> = None;
		for candidate in &bag {
			match self.apply(candidate) {
				Ok(true) => return MatchResult::Match,
				Ok(false) => {}
				Err(status) => {
					error.get_or_insert(status);
				}
			}
		}
		match error {
			Some(status) => MatchResult::Indeterminate(status),
			None => MatchResult::NoMatch,
		}
	}
}

/// Alternatives (any-of) of conjunctions (all-of) for one category.
///
/// A section with no alternatives matches every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSection {
	pub alternatives: Vec<Vec<TargetMatch>>,
}

impl TargetSection {
	pub fn any() -> Self {
		Self::default()
	}

	pub fn is_any(&self) -> bool {
		self.alternatives.is_empty()
	}

	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> MatchResult {
		if self.alternatives.is_empty() {
			return MatchResult::Match;
		}

		let mut indeterminate: Option<Status> = None;
		for alternative in &self.alternatives {
			match all_of(alternative, ctx) {
				MatchResult::Match => return MatchResult::Match,
				MatchResult::NoMatch => {}
				MatchResult::Indeterminate(status) => {
					indeterminate.get_or_insert(status);
				}
			}
		}
		match indeterminate {
			Some(status) => MatchResult::Indeterminate(status),
			None => MatchResult::NoMatch,
		}
	}
}

fn all_of(matches: &[TargetMatch], ctx: &EvaluationCtx<'_>) -> MatchResult {
	let mut indeterminate: Option<Status> = None;
	for m in matches {
		match m.evaluate(ctx) {
			MatchResult::Match => {}
			MatchResult::NoMatch => return MatchResult::NoMatch,
			MatchResult::Indeterminate(status) => {
				indeterminate.get_or_insert(status);
			}
		}
	}
	match indeterminate {
		Some(status) => MatchResult::Indeterminate(status),
		None => MatchResult::Match,
	}
}

/// Applicability predicate of a rule, policy or policy set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
	pub subjects: TargetSection,
	pub resources: TargetSection,
	pub actions: TargetSection,
	pub environments: TargetSection,
}

impl Target {
	/// The wildcard target.
	pub fn any() -> Self {
		Self::default()
	}

	pub fn is_any(&self) -> bool {
		self.subjects.is_any()
			&& self.resources.is_any()
			&& self.actions.is_any()
			&& self.environments.is_any()
	}

	/// Any section NoMatch wins over any section Indeterminate.
	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> MatchResult {
		let mut indeterminate: Option<Status> = None;
		for section in [&self.subjects, &self.resources, &self.actions, &self.environments] {
			match section.evaluate(ctx) {
				MatchResult::Match => {}
				MatchResult::NoMatch => return MatchResult::NoMatch,
				MatchResult::Indeterminate(status) => {
					indeterminate.get_or_insert(status);
				}
			}
		}
		match indeterminate {
			Some(status) => MatchResult::Indeterminate(status),
			None => MatchResult::Match,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attribute::{ids, DataType};
	use crate::finder::AttributeFinderChain;
	use crate::request::RequestCtx;

	fn string_match(designator: AttributeDesignator, value: &str) -> TargetMatch {
		TargetMatch {
			function: Function::Equal(DataType::String),
			value: AttributeValue::string(value),
			designator,
			pattern: None,
		}
	}

	fn subject_is(value: &str) -> TargetMatch {
		string_match(AttributeDesignator::subject(ids::SUBJECT_ID), value)
	}

	fn action_is(value: &str) -> TargetMatch {
		string_match(AttributeDesignator::action(ids::ACTION_ID), value)
	}

	fn with_ctx<R>(f: impl FnOnce(&EvaluationCtx<'_>) -> R) -> R {
		let request = RequestCtx::builder()
			.subject_string(ids::SUBJECT_ID, "alice")
			.action_string(ids::ACTION_ID, "read")
			.build();
		let chain = AttributeFinderChain::empty();
		let ctx = EvaluationCtx::new(&request, &(), &chain);
		f(&ctx)
	}

	fn missing_required() -> TargetMatch {
		string_match(
			AttributeDesignator::resource(ids::RESOURCE_ID).required(),
			"demo:1",
		)
	}

	#[test]
	fn wildcard_target_matches() {
		with_ctx(|ctx| assert_eq!(Target::any().evaluate(ctx), MatchResult::Match));
		assert!(Target::any().is_any());
	}

	#[test]
	fn any_of_alternatives() {
		let section = TargetSection {
			alternatives: vec![vec![subject_is("bob")], vec![subject_is("alice")]],
		};
		with_ctx(|ctx| assert_eq!(section.evaluate(ctx), MatchResult::Match));
	}

	#[test]
	fn all_of_within_alternative() {
		let section = TargetSection {
			alternatives: vec![vec![subject_is("alice"), action_is("write")]],
		};
		with_ctx(|ctx| assert_eq!(section.evaluate(ctx), MatchResult::NoMatch));
	}

	#[test]
	fn missing_required_attribute_is_indeterminate() {
		let target = Target {
			resources: TargetSection {
				alternatives: vec![vec![missing_required()]],
			},
			..Target::default()
		};
		with_ctx(|ctx| assert!(matches!(target.evaluate(ctx), MatchResult::Indeterminate(_))));
	}

	#[test]
	fn no_match_beats_indeterminate_across_sections() {
		let target = Target {
			subjects: TargetSection {
				alternatives: vec![vec![subject_is("bob")]],
			},
			resources: TargetSection {
				alternatives: vec![vec![missing_required()]],
			},
			..Target::default()
		};
		with_ctx(|ctx| assert_eq!(target.evaluate(ctx), MatchResult::NoMatch));
	}

	#[test]
	fn absent_optional_attribute_does_not_match() {
		let m = string_match(AttributeDesignator::resource(ids::RESOURCE_ID), "demo:1");
		with_ctx(|ctx| assert_eq!(m.evaluate(ctx), MatchResult::NoMatch));
	}
}
