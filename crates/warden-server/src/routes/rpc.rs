// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON RPC endpoint.
//!
//! `POST /rpc` carries `{service, operation, params}`. The call is checked
//! inbound before it runs and outbound before its result is returned; either
//! check failing yields a fault instead of a result.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
	extract::{ConnectInfo, State},
	http::{Extensions, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_server_pep::{
	AuthenticatedSubject, MessageContext, PepError, ResponseFacts, RpcFault,
};

use crate::api::AppState;
use crate::error::ServerError;
use crate::routes::{describe, objects};

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
	pub service: String,
	pub operation: String,
	#[serde(default)]
	pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
	pub result: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcFaultResponse {
	pub fault: RpcFault,
}

/// An operation's result with the content type the outbound pass inspects.
struct OperationResult {
	value: Value,
	content_type: Option<String>,
}

impl OperationResult {
	fn json(value: impl Serialize) -> Result<Self, ServerError> {
		Ok(Self {
			value: serde_json::to_value(value)
				.map_err(|e| ServerError::Internal(format!("failed to encode result: {e}")))?,
			content_type: Some("application/json".to_string()),
		})
	}
}

#[derive(Serialize)]
struct DatastreamResult {
	pid: String,
	dsid: String,
	content_type: String,
	content_base64: String,
}

/// POST /rpc
pub async fn handle_rpc(
	State(state): State<AppState>,
	extensions: Extensions,
	Json(request): Json<RpcRequest>,
) -> Response {
	let subject = extensions.get::<AuthenticatedSubject>().cloned();
	let mut message = MessageContext::inbound(request.service, request.operation).with_subject(subject);
	if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
		message = message.with_client_address(addr.ip().to_string());
	}
	for (name, value) in &request.params {
		for text in param_strings(value) {
			message = message.with_param(name.clone(), text);
		}
	}

	match super::blocking(move || call(&state, message)).await {
		Ok(result) => Json(RpcResponse { result }).into_response(),
		Err(ServerError::Enforcement(err)) => fault_response(err),
		Err(err) => err.into_response(),
	}
}

fn call(state: &AppState, inbound: MessageContext) -> Result<Value, ServerError> {
	state.rpc.handle(&inbound)?;

	let result = dispatch(state, &inbound)?;
	let facts = ResponseFacts {
		status: StatusCode::OK.as_u16(),
		content_type: result.content_type.clone(),
		content_length: None,
	};
	state.rpc.handle(&inbound.outbound(facts))?;
	Ok(result.value)
}

fn dispatch(state: &AppState, message: &MessageContext) -> Result<OperationResult, ServerError> {
	let param = |name: &str| {
		message
			.params
			.get(name)
			.and_then(|values| values.first())
			.map(String::as_str)
			.ok_or_else(|| ServerError::BadRequest(format!("missing parameter '{name}'")))
	};
	let optional = |name: &str| {
		message
			.params
			.get(name)
			.and_then(|values| values.first())
			.map(String::as_str)
	};

	match (message.service.as_str(), message.operation.as_str()) {
		("repository", "describe") => OperationResult::json(describe::describe_repository(state)?),
		("objects", "getRelationships") => OperationResult::json(objects::load_relationships(
			state.objects.as_ref(),
			param("pid")?,
			optional("predicate"),
		)?),
		("objects", "getRelationshipsBatch") => {
			let pids = message.params.get("pids").map(Vec::as_slice).unwrap_or(&[]);
			let responses = pids
				.iter()
				.flat_map(|value| value.split(','))
				.map(str::trim)
				.filter(|pid| !pid.is_empty())
				.map(|pid| {
					objects::load_relationships(state.objects.as_ref(), pid, optional("predicate"))
				})
				.collect::<Result<Vec<_>, _>>()?;
			OperationResult::json(responses)
		}
		("objects", "getDatastreamContent") => {
			let (pid, dsid) = (param("pid")?, param("dsid")?);
			let datastream = objects::load_datastream(state.objects.as_ref(), pid, dsid)?;
			let content_type = datastream.content_type.clone();
			let mut result = OperationResult::json(DatastreamResult {
				pid: pid.to_string(),
				dsid: dsid.to_string(),
				content_type: datastream.content_type,
				content_base64: base64::engine::general_purpose::STANDARD
					.encode(&datastream.content),
			})?;
			result.content_type = Some(content_type);
			Ok(result)
		}
		("policies", "list") => OperationResult::json(state.store.list_policies()?),
		(service, operation) => Err(ServerError::NotFound(format!(
			"RPC operation {service}.{operation} is not implemented"
		))),
	}
}

/// JSON parameters as the strings handlers read. Arrays contribute each element.
fn param_strings(value: &Value) -> Vec<String> {
	match value {
		Value::Null => Vec::new(),
		Value::String(s) => vec![s.clone()],
		Value::Array(items) => items.iter().flat_map(param_strings).collect(),
		other => vec![other.to_string()],
	}
}

fn fault_response(err: PepError) -> Response {
	let status = err.status_code();
	(status, Json(RpcFaultResponse { fault: err.fault() })).into_response()
}
