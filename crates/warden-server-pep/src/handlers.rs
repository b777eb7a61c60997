// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in operation handlers.

use warden_authz::{attribute::ids, RequestCtx, RequestCtxBuilder, REPOSITORY_PID};

use crate::error::PepError;
use crate::handler::{OperationHandler, OperationInput, ResponseFacts};

fn object_resource(builder: RequestCtxBuilder, pid: &str) -> RequestCtxBuilder {
	builder
		.resource_string(ids::RESOURCE_ID, pid)
		.resource_string(ids::OBJECT_PID, pid)
}

fn datastream_request(input: &OperationInput) -> Result<RequestCtxBuilder, PepError> {
	let pid = input.require_param("pid")?;
	let dsid = input.require_param("dsid")?;
	Ok(object_resource(input.request_builder(), pid).resource_string(ids::DATASTREAM_ID, dsid))
}

/// Operations on the repository as a whole, including policy administration.
pub struct RepositoryOperation;

impl OperationHandler for RepositoryOperation {
	fn name(&self) -> &'static str {
		"repository-operation"
	}

	fn build_requests(&self, input: &OperationInput) -> Result<Vec<RequestCtx>, PepError> {
		let mut builder = object_resource(input.request_builder(), REPOSITORY_PID);
		if let Some(policy_id) = input.param("id") {
			builder = builder.resource_string(ids::POLICY_ID, policy_id);
		}
		Ok(vec![builder.build()])
	}
}

/// Operations addressed to one object by `pid`.
pub struct ObjectOperation;

impl OperationHandler for ObjectOperation {
	fn name(&self) -> &'static str {
		"object-operation"
	}

	fn build_requests(&self, input: &OperationInput) -> Result<Vec<RequestCtx>, PepError> {
		let pid = input.require_param("pid")?;
		Ok(vec![object_resource(input.request_builder(), pid).build()])
	}
}

/// Operations addressed to one datastream by `pid` and `dsid`.
pub struct DatastreamOperation;

impl OperationHandler for DatastreamOperation {
	fn name(&self) -> &'static str {
		"datastream-operation"
	}

	fn build_requests(&self, input: &OperationInput) -> Result<Vec<RequestCtx>, PepError> {
		Ok(vec![datastream_request(input)?.build()])
	}
}

/// Datastream dissemination. Checked again once the content type is known.
pub struct DatastreamContent;

impl OperationHandler for DatastreamContent {
	fn name(&self) -> &'static str {
		"datastream-content"
	}

	fn build_requests(&self, input: &OperationInput) -> Result<Vec<RequestCtx>, PepError> {
		Ok(vec![datastream_request(input)?.build()])
	}

	fn inspects_response(&self) -> bool {
		true
	}

	fn response_requests(
		&self,
		input: &OperationInput,
		facts: &ResponseFacts,
	) -> Result<Vec<RequestCtx>, PepError> {
		// Failed responses carry no content worth protecting.
		if !(200..300).contains(&facts.status) {
			return Ok(Vec::new());
		}
		let mut builder = datastream_request(input)?;
		if let Some(content_type) = &facts.content_type {
			builder = builder.resource_string(ids::DATASTREAM_MIME_TYPE, content_type.clone());
		}
		Ok(vec![builder.build()])
	}
}

/// One request per pid in the `pids` parameter. Every pid must be permitted.
pub struct BatchObjectOperation;

impl OperationHandler for BatchObjectOperation {
	fn name(&self) -> &'static str {
		"batch-object-operation"
	}

	fn build_requests(&self, input: &OperationInput) -> Result<Vec<RequestCtx>, PepError> {
		let pids: Vec<&str> = input
			.param_values("pids")
			.iter()
			.flat_map(|value| value.split(','))
			.map(str::trim)
			.filter(|pid| !pid.is_empty())
			.collect();
		if pids.is_empty() {
			return Err(PepError::BadRequest("missing parameter 'pids'".to_string()));
		}
		Ok(pids
			.into_iter()
			.map(|pid| object_resource(input.request_builder(), pid).build())
			.collect())
	}
}

/// Operations not subject to policy.
pub struct Unrestricted;

impl OperationHandler for Unrestricted {
	fn name(&self) -> &'static str {
		"unrestricted"
	}

	fn build_requests(&self, _input: &OperationInput) -> Result<Vec<RequestCtx>, PepError> {
		Ok(Vec::new())
	}

	fn unrestricted(&self) -> bool {
		true
	}
}
