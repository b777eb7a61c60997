// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wires resolved configuration into the decision and enforcement services.
//!
//! Every string-keyed name in the configuration (finder modules, handler
//! keys, combining algorithms, rights access types) is resolved here, so an
//! unknown name stops the server at startup instead of failing requests.

use std::sync::Arc;

use tracing::info;
use warden_authz::{
	AccessType, ActionAliases, AuthzError, Category, CombiningAlgorithms, FinderDeps,
	FinderRegistry, FinderSpec, FsObjectSource, FsPolicyStore, ObjectSource, PolicyDecisionPoint,
	PolicyManager, PolicyStore, RightsMetadataLoader,
};
use warden_server_config::{
	FinderConfig, RestRouteConfig, RightsConfig, RpcRouteConfig, ServerConfig,
};
use warden_server_pep::{
	HandlerRegistry, IdentityHeaders, PolicyEnforcementLayer, PolicyEnforcementPoint, RestRoutes,
	RpcEnforcer, RpcRoutes,
};

use crate::error::ServerError;

/// Everything the router needs, constructed once per process.
#[derive(Clone)]
pub struct Services {
	pub store: Arc<dyn PolicyStore>,
	pub objects: Arc<dyn ObjectSource>,
	pub pdp: Arc<PolicyDecisionPoint>,
	pub pep: PolicyEnforcementPoint,
	pub rest_routes: Arc<RestRoutes>,
	pub rpc: RpcEnforcer,
	pub identity: Arc<IdentityHeaders>,
	pub realm: String,
	pub max_buffered_response_bytes: usize,
}

impl Services {
	pub fn enforcement_layer(&self) -> PolicyEnforcementLayer {
		PolicyEnforcementLayer::new(self.pep.clone(), self.rest_routes.clone())
			.with_realm(&self.realm)
			.with_max_buffered_response_bytes(self.max_buffered_response_bytes)
	}
}

/// Builds services over the configured policy directory and object root.
pub fn build_services(config: &ServerConfig) -> Result<Services, ServerError> {
	let store = Arc::new(FsPolicyStore::open(&config.pdp.policy_dir)?);
	let objects = Arc::new(FsObjectSource::new(&config.objects.root));
	build_services_with(config, store, objects)
}

/// Builds services over caller-supplied collaborators.
pub fn build_services_with(
	config: &ServerConfig,
	store: Arc<dyn PolicyStore>,
	objects: Arc<dyn ObjectSource>,
) -> Result<Services, ServerError> {
	let deps = FinderDeps::new(objects.clone(), config.rights.datastream_id.clone());
	let finders =
		FinderRegistry::with_defaults().build_chain(&finder_specs(&config.finders)?, &deps)?;
	let manager = policy_manager(config, store.clone(), objects.clone())?;

	let pdp = Arc::new(PolicyDecisionPoint::new(manager, Arc::new(finders)));
	let pep = PolicyEnforcementPoint::new(pdp.clone());

	let handlers = HandlerRegistry::with_builtins();
	let rest_routes = Arc::new(rest_routes(&handlers, &config.rest_routes)?);
	let rpc_routes = Arc::new(rpc_routes(&handlers, &config.rpc_routes)?);

	info!(
		policy_dir = %config.pdp.policy_dir.display(),
		finders = pdp.finders().len(),
		rest_routes = rest_routes.len(),
		rpc_routes = rpc_routes.len(),
		top_level_algorithm = ?config.pdp.top_level_combining_algorithm,
		"decision and enforcement services ready"
	);

	Ok(Services {
		store,
		objects,
		pdp,
		rpc: RpcEnforcer::new(pep.clone(), rpc_routes),
		pep,
		rest_routes,
		identity: Arc::new(IdentityHeaders {
			remote_user: config.identity.remote_user_header.clone(),
			roles: config.identity.roles_header.clone(),
		}),
		realm: config.identity.realm.clone(),
		max_buffered_response_bytes: config.http.max_buffered_response_bytes,
	})
}

fn policy_manager(
	config: &ServerConfig,
	store: Arc<dyn PolicyStore>,
	objects: Arc<dyn ObjectSource>,
) -> Result<PolicyManager, ServerError> {
	let mut manager = PolicyManager::new(store, Arc::new(CombiningAlgorithms::standard()));
	if let Some(algorithm) = &config.pdp.top_level_combining_algorithm {
		manager = manager.with_top_level_algorithm(algorithm)?;
	}
	if config.pdp.rights_metadata_policies {
		let loader = RightsMetadataLoader::new(objects, config.rights.datastream_id.clone());
		manager = manager
			.with_rights_metadata(loader, Arc::new(action_aliases(&config.rights)?))
			.with_rights_cache_capacity(config.pdp.rights_cache_capacity);
	}
	Ok(manager)
}

pub fn finder_specs(finders: &[FinderConfig]) -> Result<Vec<FinderSpec>, AuthzError> {
	let mut specs = Vec::with_capacity(finders.len());
	for finder in finders {
		let mut spec = FinderSpec::new(finder.module.clone());
		spec.options = finder.options.clone();
		for designator in &finder.designators {
			let category = Category::parse(&designator.category).ok_or_else(|| {
				AuthzError::Configuration(format!(
					"finder {} names unknown category '{}'",
					finder.module, designator.category
				))
			})?;
			spec = spec.with_designator(category, designator.attribute_id.clone());
		}
		specs.push(spec);
	}
	Ok(specs)
}

/// Action ids that map to rights access types, on top of the access types' own names.
pub fn action_aliases(rights: &RightsConfig) -> Result<ActionAliases, AuthzError> {
	let mut aliases = ActionAliases::standard();
	for (action, access) in &rights.action_aliases {
		let access = AccessType::parse(access).ok_or_else(|| {
			AuthzError::Configuration(format!(
				"rights alias {action} names unknown access type '{access}'"
			))
		})?;
		aliases.insert(action.clone(), access);
	}
	Ok(aliases)
}

fn rest_routes(
	handlers: &HandlerRegistry,
	routes: &[RestRouteConfig],
) -> Result<RestRoutes, ServerError> {
	let mut table = RestRoutes::new();
	for route in routes {
		let binding = handlers.bind(&route.handler, route.action.clone())?;
		table.add(&route.method, &route.path, binding)?;
	}
	Ok(table)
}

fn rpc_routes(
	handlers: &HandlerRegistry,
	routes: &[RpcRouteConfig],
) -> Result<RpcRoutes, ServerError> {
	let mut table = RpcRoutes::new();
	for route in routes {
		let binding = handlers.bind(&route.handler, route.action.clone())?;
		table.add(&route.service, &route.operation, binding)?;
	}
	Ok(table)
}
