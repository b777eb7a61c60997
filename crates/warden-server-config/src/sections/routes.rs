// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enforcement route tables.
//!
//! Routes bind an inbound operation to an enforcement handler key and the
//! action id the handler reports to the decision point.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestRouteConfig {
	pub method: String,
	/// Path template, e.g. `/objects/{pid}/relationships`.
	pub path: String,
	pub handler: String,
	#[serde(default)]
	pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRouteConfig {
	pub service: String,
	pub operation: String,
	pub handler: String,
	#[serde(default)]
	pub action: Option<String>,
}

fn rest(method: &str, path: &str, handler: &str, action: &str) -> RestRouteConfig {
	RestRouteConfig {
		method: method.to_string(),
		path: path.to_string(),
		handler: handler.to_string(),
		action: (!action.is_empty()).then(|| action.to_string()),
	}
}

fn rpc(service: &str, operation: &str, handler: &str, action: &str) -> RpcRouteConfig {
	RpcRouteConfig {
		service: service.to_string(),
		operation: operation.to_string(),
		handler: handler.to_string(),
		action: Some(action.to_string()),
	}
}

/// Routes covering every endpoint the server exposes.
pub fn default_rest_routes() -> Vec<RestRouteConfig> {
	vec![
		rest("GET", "/describe", "repository-operation", "describe-repository"),
		rest(
			"GET",
			"/objects/{pid}/relationships",
			"object-operation",
			"list-relationships",
		),
		rest(
			"GET",
			"/objects/{pid}/datastreams/{dsid}/content",
			"datastream-content",
			"get-datastream-content",
		),
		rest("GET", "/policies", "repository-operation", "list-policies"),
		rest("GET", "/policies/{id}", "repository-operation", "get-policy"),
		rest("PUT", "/policies/{id}", "repository-operation", "put-policy"),
		rest("DELETE", "/policies/{id}", "repository-operation", "delete-policy"),
		rest("POST", "/rpc", "unrestricted", ""),
	]
}

pub fn default_rpc_routes() -> Vec<RpcRouteConfig> {
	vec![
		rpc("repository", "describe", "repository-operation", "describe-repository"),
		rpc("objects", "getRelationships", "object-operation", "list-relationships"),
		rpc(
			"objects",
			"getRelationshipsBatch",
			"batch-object-operation",
			"list-relationships",
		),
		rpc(
			"objects",
			"getDatastreamContent",
			"datastream-content",
			"get-datastream-content",
		),
		rpc("policies", "list", "repository-operation", "list-policies"),
	]
}

pub(crate) fn validate_rest_routes(routes: &[RestRouteConfig]) -> Result<(), String> {
	let mut seen = HashSet::new();
	for route in routes {
		if !route.path.starts_with('/') {
			return Err(format!("REST route path {} must start with '/'", route.path));
		}
		if route.handler.trim().is_empty() {
			return Err(format!("REST route {} {} has no handler", route.method, route.path));
		}
		let key = (route.method.to_ascii_uppercase(), route.path.clone());
		if !seen.insert(key) {
			return Err(format!(
				"duplicate REST route {} {}",
				route.method.to_ascii_uppercase(),
				route.path
			));
		}
	}
	Ok(())
}

pub(crate) fn validate_rpc_routes(routes: &[RpcRouteConfig]) -> Result<(), String> {
	let mut seen = HashSet::new();
	for route in routes {
		if route.handler.trim().is_empty() {
			return Err(format!(
				"RPC route {}.{} has no handler",
				route.service, route.operation
			));
		}
		if !seen.insert((route.service.as_str(), route.operation.as_str())) {
			return Err(format!(
				"duplicate RPC route {}.{}",
				route.service, route.operation
			));
		}
	}
	Ok(())
}
