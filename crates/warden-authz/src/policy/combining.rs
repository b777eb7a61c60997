// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Combining algorithms and their URN registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::EvaluationCtx;
use crate::decision::{Decision, DecisionResult, MatchResult, Status};
use crate::error::PolicyParseError;

use super::{Effect, PolicyTree, Rule};

const RULE_1_0: &str = "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:";
const RULE_1_1: &str = "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:";
const POLICY_1_0: &str = "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:";
const POLICY_1_1: &str = "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombiningAlgorithm {
	DenyOverrides,
	OrderedDenyOverrides,
	PermitOverrides,
	OrderedPermitOverrides,
	FirstApplicable,
	/// Policy combining only.
	OnlyOneApplicable,
}

impl CombiningAlgorithm {
	pub const ALL: [CombiningAlgorithm; 6] = [
		CombiningAlgorithm::DenyOverrides,
		CombiningAlgorithm::OrderedDenyOverrides,
		CombiningAlgorithm::PermitOverrides,
		CombiningAlgorithm::OrderedPermitOverrides,
		CombiningAlgorithm::FirstApplicable,
		CombiningAlgorithm::OnlyOneApplicable,
	];

	pub fn name(&self) -> &'static str {
		match self {
			CombiningAlgorithm::DenyOverrides => "deny-overrides",
			CombiningAlgorithm::OrderedDenyOverrides => "ordered-deny-overrides",
			CombiningAlgorithm::PermitOverrides => "permit-overrides",
			CombiningAlgorithm::OrderedPermitOverrides => "ordered-permit-overrides",
			CombiningAlgorithm::FirstApplicable => "first-applicable",
			CombiningAlgorithm::OnlyOneApplicable => "only-one-applicable",
		}
	}

	fn is_ordered(&self) -> bool {
		matches!(
			self,
			CombiningAlgorithm::OrderedDenyOverrides | CombiningAlgorithm::OrderedPermitOverrides
		)
	}

	pub fn supports_rules(&self) -> bool {
		!matches!(self, CombiningAlgorithm::OnlyOneApplicable)
	}

	pub fn rule_urn(&self) -> Option<String> {
		if !self.supports_rules() {
			return None;
		}
		let prefix = if self.is_ordered() { RULE_1_1 } else { RULE_1_0 };
		Some(format!("{prefix}{}", self.name()))
	}

	pub fn policy_urn(&self) -> String {
		let prefix = if self.is_ordered() { POLICY_1_1 } else { POLICY_1_0 };
		format!("{prefix}{}", self.name())
	}

	/// Combines rule outcomes. Rules are evaluated in document order, so the
	/// ordered variants coincide with their unordered forms.
	pub fn combine_rules(&self, rules: &[Rule], ctx: &EvaluationCtx<'_>) -> DecisionResult {
		match self {
			CombiningAlgorithm::DenyOverrides | CombiningAlgorithm::OrderedDenyOverrides => {
				rule_overrides(rules, ctx, Effect::Deny)
			}
			CombiningAlgorithm::PermitOverrides | CombiningAlgorithm::OrderedPermitOverrides => {
				rule_overrides(rules, ctx, Effect::Permit)
			}
			CombiningAlgorithm::FirstApplicable => {
				first_applicable(rules.iter().map(|r| r.evaluate(ctx)))
			}
			CombiningAlgorithm::OnlyOneApplicable => DecisionResult::indeterminate(
				Status::processing_error("only-one-applicable cannot combine rules"),
			),
		}
	}

	pub fn combine_policies(
		&self,
		policies: &[Arc<PolicyTree>],
		ctx: &EvaluationCtx<'_>,
	) -> DecisionResult {
		match self {
			CombiningAlgorithm::DenyOverrides | CombiningAlgorithm::OrderedDenyOverrides => {
				policy_deny_overrides(policies, ctx)
			}
			CombiningAlgorithm::PermitOverrides | CombiningAlgorithm::OrderedPermitOverrides => {
				policy_permit_overrides(policies, ctx)
			}
			CombiningAlgorithm::FirstApplicable => {
				first_applicable(policies.iter().map(|p| p.evaluate(ctx)))
			}
			CombiningAlgorithm::OnlyOneApplicable => only_one_applicable(policies, ctx),
		}
	}
}

impl fmt::Display for CombiningAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Rule deny-overrides and permit-overrides. An Indeterminate rule whose
/// effect is the overriding one makes the combination Indeterminate unless
/// another rule produced the overriding decision outright.
fn rule_overrides(rules: &[Rule], ctx: &EvaluationCtx<'_>, overriding: Effect) -> DecisionResult {
	let overriding_decision = overriding.decision();
	let mut potential: Option<Status> = None;
	let mut error: Option<Status> = None;
	let mut other_seen = false;

	for rule in rules {
		let result = rule.evaluate(ctx);
		match result.decision {
			d if d == overriding_decision => return result,
			Decision::NotApplicable => {}
			Decision::Indeterminate => {
				if rule.effect == overriding {
					potential.get_or_insert(result.status.clone());
				}
				error.get_or_insert(result.status);
			}
			_ => other_seen = true,
		}
	}

	if let Some(status) = potential {
		return DecisionResult::indeterminate(status);
	}
	if other_seen {
		return match overriding {
			Effect::Deny => DecisionResult::permit(),
			Effect::Permit => DecisionResult::deny(),
		};
	}
	match error {
		Some(status) => DecisionResult::indeterminate(status),
		None => DecisionResult::not_applicable(),
	}
}

fn first_applicable(results: impl Iterator<Item = DecisionResult>) -> DecisionResult {
	for result in results {
		if result.decision != Decision::NotApplicable {
			return result;
		}
	}
	DecisionResult::not_applicable()
}

/// Any Deny or Indeterminate child yields Deny.
fn policy_deny_overrides(policies: &[Arc<PolicyTree>], ctx: &EvaluationCtx<'_>) -> DecisionResult {
	let mut permit_seen = false;
	for policy in policies {
		match policy.evaluate(ctx).decision {
			Decision::Deny | Decision::Indeterminate => return DecisionResult::deny(),
			Decision::Permit => permit_seen = true,
			Decision::NotApplicable => {}
		}
	}
	if permit_seen {
		DecisionResult::permit()
	} else {
		DecisionResult::not_applicable()
	}
}

fn policy_permit_overrides(
	policies: &[Arc<PolicyTree>],
	ctx: &EvaluationCtx<'_>,
) -> DecisionResult {
	let mut deny_seen = false;
	let mut error: Option<Status> = None;
	for policy in policies {
		let result = policy.evaluate(ctx);
		match result.decision {
			Decision::Permit => return result,
			Decision::Deny => deny_seen = true,
			Decision::Indeterminate => {
				error.get_or_insert(result.status);
			}
			Decision::NotApplicable => {}
		}
	}
	if deny_seen {
		return DecisionResult::deny();
	}
	match error {
		Some(status) => DecisionResult::indeterminate(status),
		None => DecisionResult::not_applicable(),
	}
}

fn only_one_applicable(policies: &[Arc<PolicyTree>], ctx: &EvaluationCtx<'_>) -> DecisionResult {
	let mut selected: Option<&Arc<PolicyTree>> = None;
	for policy in policies {
		match policy.match_target(ctx) {
			MatchResult::NoMatch => {}
			MatchResult::Indeterminate(status) => return DecisionResult::indeterminate(status),
			MatchResult::Match => {
				if selected.is_some() {
					return DecisionResult::indeterminate(Status::processing_error(
						"more than one policy is applicable",
					));
				}
				selected = Some(policy);
			}
		}
	}
	match selected {
		Some(policy) => policy.evaluate(ctx),
		None => DecisionResult::not_applicable(),
	}
}

/// Immutable URN → algorithm table shared across the process.
#[derive(Debug, Clone)]
pub struct CombiningAlgorithms {
	rule: HashMap<String, CombiningAlgorithm>,
	policy: HashMap<String, CombiningAlgorithm>,
}

impl Default for CombiningAlgorithms {
	fn default() -> Self {
		Self::standard()
	}
}

impl CombiningAlgorithms {
	pub fn standard() -> Self {
		let mut rule = HashMap::new();
		let mut policy = HashMap::new();
		for alg in CombiningAlgorithm::ALL {
			if let Some(urn) = alg.rule_urn() {
				rule.insert(urn, alg);
			}
			policy.insert(alg.policy_urn(), alg);
		}
		Self { rule, policy }
	}

	pub fn rule_algorithm(&self, urn: &str) -> Result<CombiningAlgorithm, PolicyParseError> {
		if let Some(alg) = self.rule.get(urn) {
			return Ok(*alg);
		}
		if self.policy.contains_key(urn) {
			return Err(PolicyParseError::PolicyOnlyAlgorithm(urn.to_string()));
		}
		Err(PolicyParseError::UnknownCombiningAlgorithm(urn.to_string()))
	}

	pub fn policy_algorithm(&self, urn: &str) -> Result<CombiningAlgorithm, PolicyParseError> {
		self.policy
			.get(urn)
			.copied()
			.ok_or_else(|| PolicyParseError::UnknownCombiningAlgorithm(urn.to_string()))
	}

	/// Accepts a policy-combining URN or a bare algorithm name.
	pub fn resolve_policy_algorithm(
		&self,
		name_or_urn: &str,
	) -> Result<CombiningAlgorithm, PolicyParseError> {
		if let Ok(alg) = self.policy_algorithm(name_or_urn) {
			return Ok(alg);
		}
		CombiningAlgorithm::ALL
			.into_iter()
			.find(|alg| alg.name() == name_or_urn)
			.ok_or_else(|| PolicyParseError::UnknownCombiningAlgorithm(name_or_urn.to_string()))
	}
}
