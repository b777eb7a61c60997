// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::context::{EvaluationCtx, TransportContext};
use crate::decision::DecisionResult;
use crate::error::AuthzError;
use crate::finder::AttributeFinderChain;
use crate::manager::{PolicyLookup, PolicyManager};
use crate::request::RequestCtx;

/// Turns a request into a decision. Enforcement points depend on this trait
/// rather than on a concrete decision point.
pub trait ContextHandler: Send + Sync {
	fn evaluate(
		&self,
		request: &RequestCtx,
		transport: &dyn TransportContext,
	) -> Result<DecisionResult, AuthzError>;
}

pub struct PolicyDecisionPoint {
	manager: PolicyManager,
	finders: Arc<AttributeFinderChain>,
}

impl PolicyDecisionPoint {
	pub fn new(manager: PolicyManager, finders: Arc<AttributeFinderChain>) -> Self {
		Self { manager, finders }
	}

	pub fn manager(&self) -> &PolicyManager {
		&self.manager
	}

	pub fn finders(&self) -> &AttributeFinderChain {
		&self.finders
	}

	/// Decides one request. Never fails; problems surface as Indeterminate.
	#[instrument(
		level = "debug",
		skip(self, request, transport),
		fields(
			subject = ?request.subject_id(),
			resource = ?request.resource_id(),
			action = ?request.action_id()
		)
	)]
	pub fn decide(&self, request: &RequestCtx, transport: &dyn TransportContext) -> DecisionResult {
		let ctx = EvaluationCtx::new(request, transport, &self.finders);
		self.decide_in(&ctx)
	}

	/// Decides within a caller-built context, e.g. one fixed to a known instant.
	pub fn decide_in(&self, ctx: &EvaluationCtx<'_>) -> DecisionResult {
		let result = match self.manager.get_policy(ctx) {
			PolicyLookup::Applicable(policy) => {
				tracing::debug!(policy_id = %policy.id(), "evaluating applicable policy");
				policy.evaluate(ctx)
			}
			PolicyLookup::NotApplicable => DecisionResult::not_applicable(),
			PolicyLookup::Indeterminate(status) => DecisionResult::indeterminate(status),
		};
		let result = result.with_resource_id(ctx.request().resource_id());
		tracing::debug!(decision = %result.decision, "decision reached");
		result
	}
}

impl ContextHandler for PolicyDecisionPoint {
	fn evaluate(
		&self,
		request: &RequestCtx,
		transport: &dyn TransportContext,
	) -> Result<DecisionResult, AuthzError> {
		Ok(self.decide(request, transport))
	}
}

impl fmt::Debug for PolicyDecisionPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PolicyDecisionPoint")
			.field("manager", &self.manager)
			.field("finders", &self.finders)
			.finish()
	}
}
