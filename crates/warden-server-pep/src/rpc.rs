// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enforcement for RPC messages.
//!
//! An RPC call is checked twice: once inbound before the operation runs and
//! once outbound before its response is returned. The outbound pass only
//! evaluates for handlers that inspect responses.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use warden_authz::TransportAttributes;

use crate::enforce::PolicyEnforcementPoint;
use crate::error::PepError;
use crate::handler::{Api, OperationInput, ResponseFacts, RpcRoutes};
use crate::identity::AuthenticatedSubject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	Inbound,
	Outbound,
}

/// One RPC message as seen by the enforcer.
#[derive(Debug, Clone)]
pub struct MessageContext {
	pub service: String,
	pub operation: String,
	pub direction: Direction,
	pub subject: Option<AuthenticatedSubject>,
	pub params: BTreeMap<String, Vec<String>>,
	pub transaction_id: String,
	pub client_address: Option<String>,
	/// Present on outbound messages.
	pub response: Option<ResponseFacts>,
}

impl MessageContext {
	pub fn inbound(service: impl Into<String>, operation: impl Into<String>) -> Self {
		Self {
			service: service.into(),
			operation: operation.into(),
			direction: Direction::Inbound,
			subject: None,
			params: BTreeMap::new(),
			transaction_id: uuid::Uuid::new_v4().to_string(),
			client_address: None,
			response: None,
		}
	}

	pub fn with_subject(mut self, subject: Option<AuthenticatedSubject>) -> Self {
		self.subject = subject;
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.entry(name.into()).or_default().push(value.into());
		self
	}

	pub fn with_client_address(mut self, address: impl Into<String>) -> Self {
		self.client_address = Some(address.into());
		self
	}

	/// The same call, turned around to carry its response.
	pub fn outbound(&self, response: ResponseFacts) -> Self {
		Self {
			direction: Direction::Outbound,
			response: Some(response),
			..self.clone()
		}
	}

	pub fn qualified_name(&self) -> String {
		format!("{}.{}", self.service, self.operation)
	}

	fn transport(&self) -> TransportAttributes {
		let transport = TransportAttributes::new()
			.with_transaction_id(self.transaction_id.clone())
			.with_authenticated(self.subject.is_some());
		match &self.client_address {
			Some(address) => transport.with_client_address(address.clone()),
			None => transport,
		}
	}
}

/// Applies the enforcement point to RPC messages.
#[derive(Clone)]
pub struct RpcEnforcer {
	pep: PolicyEnforcementPoint,
	routes: Arc<RpcRoutes>,
}

impl RpcEnforcer {
	pub fn new(pep: PolicyEnforcementPoint, routes: Arc<RpcRoutes>) -> Self {
		Self { pep, routes }
	}

	/// Runs the check for the message's direction. Blocking.
	#[instrument(
		level = "debug",
		skip_all,
		fields(operation = %message.qualified_name(), direction = ?message.direction)
	)]
	pub fn handle(&self, message: &MessageContext) -> Result<(), PepError> {
		let Some(binding) = self.routes.resolve(&message.service, &message.operation) else {
			error!(operation = %message.qualified_name(), "no enforcement handler for RPC operation");
			return Err(PepError::MissingHandler(message.qualified_name()));
		};

		let input = OperationInput {
			api: Api::Rpc,
			operation: message.qualified_name(),
			action: binding.action.clone(),
			subject: message.subject.clone(),
			params: message.params.clone(),
		};
		let transport = message.transport();

		match message.direction {
			Direction::Inbound => self.pep.enforce(binding.handler.as_ref(), &input, &transport),
			Direction::Outbound => {
				let Some(facts) = &message.response else {
					debug!("outbound message without response facts");
					return Err(PepError::Internal(format!(
						"outbound {} carries no response",
						message.qualified_name()
					)));
				};
				self.pep
					.enforce_response(binding.handler.as_ref(), &input, facts, &transport)
			}
		}
	}
}

impl fmt::Debug for RpcEnforcer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RpcEnforcer")
			.field("routes", &self.routes.len())
			.finish()
	}
}
