// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transport-neutral enforcement: ask for decisions and require Permit.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use warden_authz::{ContextHandler, RequestCtx, TransportAttributes};

use crate::error::PepError;
use crate::handler::{OperationHandler, OperationInput, ResponseFacts};

/// Enforces decisions from a shared [`ContextHandler`].
#[derive(Clone)]
pub struct PolicyEnforcementPoint {
	handler: Arc<dyn ContextHandler>,
}

impl PolicyEnforcementPoint {
	pub fn new(handler: Arc<dyn ContextHandler>) -> Self {
		Self { handler }
	}

	/// Allows only when every request is permitted.
	///
	/// The first non-Permit result becomes [`PepError::Denied`]; an evaluation
	/// failure becomes [`PepError::Evaluation`] and never allows.
	#[instrument(level = "debug", skip_all, fields(requests = requests.len(), authenticated = authenticated))]
	pub fn decide(
		&self,
		requests: &[RequestCtx],
		transport: &TransportAttributes,
		authenticated: bool,
	) -> Result<(), PepError> {
		for request in requests {
			let result = self.handler.evaluate(request, transport)?;
			if result.decision.is_permit() {
				continue;
			}

			info!(
				subject = request.subject_id().unwrap_or("anonymous"),
				resource = result.resource_id.as_deref().unwrap_or("-"),
				action = request.action_id().unwrap_or("-"),
				decision = %result.decision,
				status = ?result.status.message,
				"authorization denied"
			);
			return Err(PepError::Denied {
				decision: result.decision,
				reason: result.status.message,
				authenticated,
			});
		}
		Ok(())
	}

	/// The inbound check for an operation.
	pub fn enforce(
		&self,
		handler: &dyn OperationHandler,
		input: &OperationInput,
		transport: &TransportAttributes,
	) -> Result<(), PepError> {
		if handler.unrestricted() {
			debug!(operation = %input.operation, "unrestricted operation");
			return Ok(());
		}

		let requests = handler.build_requests(input)?;
		if requests.is_empty() {
			return Err(PepError::Internal(format!(
				"handler '{}' produced no requests for {}",
				handler.name(),
				input.operation
			)));
		}
		self.decide(&requests, transport, input.is_authenticated())
	}

	/// The response pass, for handlers that inspect what they are about to release.
	pub fn enforce_response(
		&self,
		handler: &dyn OperationHandler,
		input: &OperationInput,
		facts: &ResponseFacts,
		transport: &TransportAttributes,
	) -> Result<(), PepError> {
		if handler.unrestricted() || !handler.inspects_response() {
			return Ok(());
		}
		let requests = handler.response_requests(input, facts)?;
		self.decide(&requests, transport, input.is_authenticated())
	}
}

impl fmt::Debug for PolicyEnforcementPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PolicyEnforcementPoint").finish_non_exhaustive()
	}
}
