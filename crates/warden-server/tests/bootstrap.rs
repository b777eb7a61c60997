// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup wiring: unknown names in configuration stop the server before it
//! serves anything.

use std::sync::Arc;

use warden_authz::{AuthzError, MemoryObjectSource, MemoryPolicyStore, PolicyStore};
use warden_server::bootstrap::{finder_specs, Services};
use warden_server::{build_services, build_services_with, ServerError};
use warden_server_config::{
	default_rest_routes, DesignatorConfig, FinderConfig, RestRouteConfig, ServerConfig,
};
use warden_server_pep::PepError;

const POLICY: &str = r#"<Policy PolicyId="p1" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
	<Target/>
	<Rule RuleId="deny" Effect="Deny"/>
</Policy>"#;

fn build(config: &ServerConfig) -> Result<Services, ServerError> {
	build_services_with(
		config,
		Arc::new(MemoryPolicyStore::new()),
		Arc::new(MemoryObjectSource::new()),
	)
}

fn build_err(config: &ServerConfig) -> ServerError {
	match build(config) {
		Ok(_) => panic!("expected configuration to be rejected"),
		Err(e) => e,
	}
}

#[test]
fn default_configuration_builds() {
	let services = build(&ServerConfig::default()).unwrap();
	assert_eq!(services.rest_routes.len(), default_rest_routes().len());
	assert_eq!(
		services.pdp.finders().names(),
		vec!["current-environment", "rights-metadata"]
	);
	assert_eq!(services.realm, "warden");
}

#[test]
fn rights_cache_capacity_reaches_the_manager() {
	let mut config = ServerConfig::default();
	config.pdp.rights_cache_capacity = 32;

	let services = build(&config).unwrap();
	assert_eq!(services.pdp.manager().rights_cache().capacity(), Some(32));
}

#[test]
fn unknown_route_handler_is_rejected() {
	let mut config = ServerConfig::default();
	config.rest_routes.push(RestRouteConfig {
		method: "GET".to_string(),
		path: "/objects/{pid}/history".to_string(),
		handler: "no-such-handler".to_string(),
		action: None,
	});

	let err = build_err(&config);
	assert!(matches!(
		err,
		ServerError::Enforcement(PepError::Configuration(_))
	));
}

#[test]
fn unknown_finder_module_is_rejected() {
	let mut config = ServerConfig::default();
	config.finders.push(FinderConfig::new("ldap"));

	assert!(matches!(build_err(&config), ServerError::Authz(_)));
}

#[test]
fn unknown_designator_category_is_rejected() {
	let mut finder = FinderConfig::new("current-environment");
	finder.designators.push(DesignatorConfig {
		category: "weather".to_string(),
		attribute_id: "urn:example:forecast".to_string(),
	});

	let err = finder_specs(&[finder]).unwrap_err();
	assert!(matches!(err, AuthzError::Configuration(ref m) if m.contains("weather")));
}

#[test]
fn unknown_rights_access_type_is_rejected() {
	let mut config = ServerConfig::default();
	config
		.rights
		.action_aliases
		.insert("purge-object".to_string(), "destroy".to_string());

	assert!(matches!(
		build_err(&config),
		ServerError::Authz(AuthzError::Configuration(_))
	));
}

#[test]
fn rights_aliases_are_ignored_when_rights_policies_are_off() {
	let mut config = ServerConfig::default();
	config.pdp.rights_metadata_policies = false;
	config
		.rights
		.action_aliases
		.insert("purge-object".to_string(), "destroy".to_string());

	assert!(build(&config).is_ok());
}

#[test]
fn unknown_top_level_algorithm_is_rejected() {
	let mut config = ServerConfig::default();
	config.pdp.top_level_combining_algorithm = Some("majority-vote".to_string());

	assert!(matches!(
		build_err(&config),
		ServerError::Authz(AuthzError::Configuration(_))
	));
}

#[test]
fn filesystem_store_loads_existing_policies() {
	let policies = tempfile::tempdir().unwrap();
	let objects = tempfile::tempdir().unwrap();
	std::fs::write(policies.path().join("p1.xml"), POLICY).unwrap();
	std::fs::write(policies.path().join("notes.txt"), "not a policy").unwrap();

	let mut config = ServerConfig::default();
	config.pdp.policy_dir = policies.path().to_path_buf();
	config.objects.root = objects.path().to_path_buf();

	let services = build_services(&config).unwrap();
	assert_eq!(services.store.list_policies().unwrap(), vec!["p1".to_string()]);
}
