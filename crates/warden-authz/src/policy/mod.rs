// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy trees: rules, policies, policy sets and rights-metadata policies.
//!
//! Trees are immutable once built and shared as `Arc<PolicyTree>` across
//! concurrent decisions; all per-request state lives in the
//! [`EvaluationCtx`].

pub mod combining;
pub mod expression;
pub mod parser;
pub mod target;
pub(crate) mod xml;

use std::fmt;
use std::sync::Arc;

use crate::context::EvaluationCtx;
use crate::decision::{Decision, DecisionResult, MatchResult, Status};
use crate::error::PolicyParseError;
use crate::rights::RightsMetadataPolicy;

pub use combining::{CombiningAlgorithm, CombiningAlgorithms};
pub use expression::{Expression, Function, Pattern};
pub use parser::{parse_policy, PolicyParser};
pub use target::{Target, TargetMatch, TargetSection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
	Permit,
	Deny,
}

impl Effect {
	pub fn parse(s: &str) -> Result<Self, PolicyParseError> {
		match s {
			"Permit" => Ok(Effect::Permit),
			"Deny" => Ok(Effect::Deny),
			other => Err(PolicyParseError::InvalidEffect(other.to_string())),
		}
	}

	pub fn decision(&self) -> Decision {
		match self {
			Effect::Permit => Decision::Permit,
			Effect::Deny => Decision::Deny,
		}
	}
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.decision().as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
	pub id: String,
	pub effect: Effect,
	pub description: Option<String>,
	pub target: Target,
	pub condition: Option<Expression>,
}

impl Rule {
	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> DecisionResult {
		match self.target.evaluate(ctx) {
			MatchResult::Match => {}
			MatchResult::NoMatch => return DecisionResult::not_applicable(),
			MatchResult::Indeterminate(status) => return DecisionResult::indeterminate(status),
		}

		let Some(condition) = &self.condition else {
			return effect_result(self.effect);
		};
		match condition.evaluate_condition(ctx) {
			Ok(true) => effect_result(self.effect),
			Ok(false) => DecisionResult::not_applicable(),
			Err(status) => {
				tracing::debug!(rule_id = %self.id, status = %status, "rule condition indeterminate");
				DecisionResult::indeterminate(status)
			}
		}
	}
}

fn effect_result(effect: Effect) -> DecisionResult {
	match effect {
		Effect::Permit => DecisionResult::permit(),
		Effect::Deny => DecisionResult::deny(),
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
	pub id: String,
	pub description: Option<String>,
	pub target: Target,
	pub rule_combining: CombiningAlgorithm,
	pub rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
pub struct PolicySet {
	pub id: String,
	pub description: Option<String>,
	pub target: Target,
	pub policy_combining: CombiningAlgorithm,
	pub children: Vec<Arc<PolicyTree>>,
}

impl PolicySet {
	/// Child ids in evaluation order.
	pub fn child_ids(&self) -> Vec<&str> {
		self.children.iter().map(|c| c.id()).collect()
	}
}

/// A parsed, shareable policy.
#[derive(Debug, Clone)]
pub enum PolicyTree {
	Policy(Policy),
	PolicySet(PolicySet),
	RightsMetadata(RightsMetadataPolicy),
}

impl PolicyTree {
	pub fn id(&self) -> &str {
		match self {
			PolicyTree::Policy(p) => &p.id,
			PolicyTree::PolicySet(s) => &s.id,
			PolicyTree::RightsMetadata(r) => r.id(),
		}
	}

	pub fn as_policy_set(&self) -> Option<&PolicySet> {
		match self {
			PolicyTree::PolicySet(s) => Some(s),
			_ => None,
		}
	}

	pub fn match_target(&self, ctx: &EvaluationCtx<'_>) -> MatchResult {
		match self {
			PolicyTree::Policy(p) => p.target.evaluate(ctx),
			PolicyTree::PolicySet(s) => s.target.evaluate(ctx),
			PolicyTree::RightsMetadata(r) => r.match_target(ctx),
		}
	}

	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> DecisionResult {
		if let PolicyTree::RightsMetadata(r) = self {
			return r.evaluate(ctx);
		}

		match self.match_target(ctx) {
			MatchResult::Match => {}
			MatchResult::NoMatch => return DecisionResult::not_applicable(),
			MatchResult::Indeterminate(status) => return DecisionResult::indeterminate(status),
		}

		match self {
			PolicyTree::Policy(p) => p.rule_combining.combine_rules(&p.rules, ctx),
			PolicyTree::PolicySet(s) => s.policy_combining.combine_policies(&s.children, ctx),
			PolicyTree::RightsMetadata(_) => DecisionResult::indeterminate(Status::processing_error(
				"rights metadata policy reached generic evaluation",
			)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attribute::{ids, AttributeDesignator, AttributeValue, DataType};
	use crate::finder::AttributeFinderChain;
	use crate::request::RequestCtx;

	fn subject_target(subject: &str) -> Target {
		Target {
			subjects: TargetSection {
				alternatives: vec![vec![TargetMatch {
					function: Function::Equal(DataType::String),
					value: AttributeValue::string(subject),
					designator: AttributeDesignator::subject(ids::SUBJECT_ID),
					pattern: None,
				}]],
			},
			..Target::any()
		}
	}

	fn permit_policy(id: &str, subject: &str) -> Policy {
		Policy {
			id: id.into(),
			description: None,
			target: subject_target(subject),
			rule_combining: CombiningAlgorithm::DenyOverrides,
			rules: vec![Rule {
				id: "permit".into(),
				effect: Effect::Permit,
				description: None,
				target: Target::any(),
				condition: None,
			}],
		}
	}

	fn evaluate(tree: &PolicyTree, subject: &str) -> Decision {
		let request = RequestCtx::builder()
			.subject_string(ids::SUBJECT_ID, subject)
			.build();
		let chain = AttributeFinderChain::empty();
		let ctx = EvaluationCtx::new(&request, &(), &chain);
		tree.evaluate(&ctx).decision
	}

	#[test]
	fn policy_applies_only_when_target_matches() {
		let tree = PolicyTree::Policy(permit_policy("p", "alice"));
		assert_eq!(evaluate(&tree, "alice"), Decision::Permit);
		assert_eq!(evaluate(&tree, "bob"), Decision::NotApplicable);
	}

	#[test]
	fn policy_set_combines_children() {
		let set = PolicyTree::PolicySet(PolicySet {
			id: "set".into(),
			description: None,
			target: Target::any(),
			policy_combining: CombiningAlgorithm::FirstApplicable,
			children: vec![
				Arc::new(PolicyTree::Policy(permit_policy("a", "alice"))),
				Arc::new(PolicyTree::Policy(permit_policy("b", "bob"))),
			],
		});
		assert_eq!(evaluate(&set, "bob"), Decision::Permit);
		assert_eq!(evaluate(&set, "carol"), Decision::NotApplicable);
		assert_eq!(set.as_policy_set().unwrap().child_ids(), vec!["a", "b"]);
	}

	#[test]
	fn effect_parsing_is_case_sensitive() {
		assert_eq!(Effect::parse("Permit").unwrap(), Effect::Permit);
		assert!(Effect::parse("permit").is_err());
		assert_eq!(Effect::Deny.to_string(), "Deny");
	}
}
