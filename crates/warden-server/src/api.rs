// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router construction.
//!
//! Layers run outermost first: identity extraction, then policy enforcement,
//! then the route handler.

use std::sync::Arc;

use axum::{
	middleware::from_fn_with_state,
	routing::{get, post},
	Router,
};
use warden_authz::{ObjectSource, PolicyDecisionPoint, PolicyStore};
use warden_server_pep::{identity_layer, RpcEnforcer};

use crate::bootstrap::Services;
use crate::routes;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<dyn PolicyStore>,
	pub objects: Arc<dyn ObjectSource>,
	pub pdp: Arc<PolicyDecisionPoint>,
	pub rpc: RpcEnforcer,
}

pub fn create_app_state(services: &Services) -> AppState {
	AppState {
		store: services.store.clone(),
		objects: services.objects.clone(),
		pdp: services.pdp.clone(),
		rpc: services.rpc.clone(),
	}
}

pub fn create_router(services: &Services) -> Router {
	Router::new()
		.route("/describe", get(routes::describe::describe))
		.route(
			"/objects/{pid}/relationships",
			get(routes::objects::relationships),
		)
		.route(
			"/objects/{pid}/datastreams/{dsid}/content",
			get(routes::objects::datastream_content),
		)
		.route("/policies", get(routes::policies::list_policies))
		.route(
			"/policies/{id}",
			get(routes::policies::get_policy)
				.put(routes::policies::put_policy)
				.delete(routes::policies::delete_policy),
		)
		.route("/rpc", post(routes::rpc::handle_rpc))
		.layer(services.enforcement_layer())
		.layer(from_fn_with_state(services.identity.clone(), identity_layer))
		.with_state(create_app_state(services))
}
