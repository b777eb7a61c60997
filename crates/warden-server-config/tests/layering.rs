// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::path::PathBuf;

use warden_server_config::{
	load_from_sources, ConfigError, ConfigSource, DefaultsSource, HttpConfigLayer,
	PdpConfigLayer, Precedence, ServerConfigLayer, TomlSource,
};

/// Stands in for the environment so tests do not race on process state.
struct FixedSource {
	precedence: Precedence,
	layer: ServerConfigLayer,
}

impl ConfigSource for FixedSource {
	fn name(&self) -> &'static str {
		"fixed"
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(contents.as_bytes()).unwrap();
	file
}

#[test]
fn environment_overrides_file_overrides_defaults() {
	let file = config_file(
		r#"
[http]
host = "10.0.0.1"
port = 8181

[pdp]
policy_dir = "/srv/warden/policies"
top_level_combining_algorithm = "first-applicable"
"#,
	);

	let env = FixedSource {
		precedence: Precedence::Environment,
		layer: ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9999),
				..Default::default()
			}),
			..Default::default()
		},
	};

	// Registered out of order; precedence decides.
	let config = load_from_sources(vec![
		Box::new(env),
		Box::new(TomlSource::new(file.path())),
		Box::new(DefaultsSource),
	])
	.unwrap();

	assert_eq!(config.http.host, "10.0.0.1");
	assert_eq!(config.http.port, 9999);
	assert_eq!(config.pdp.policy_dir, PathBuf::from("/srv/warden/policies"));
	assert_eq!(
		config.pdp.top_level_combining_algorithm.as_deref(),
		Some("first-applicable")
	);
	assert_eq!(config.objects.root, PathBuf::from("/var/lib/warden/objects"));
}

#[test]
fn file_route_tables_replace_defaults() {
	let file = config_file(
		r#"
[[rest_routes]]
method = "GET"
path = "/objects/{pid}/relationships"
handler = "object-operation"
action = "list-relationships"

[[rpc_routes]]
service = "objects"
operation = "getRelationships"
handler = "object-operation"
action = "list-relationships"

[[finders]]
module = "relationship"
options = { "urn:example:collection" = "info:warden/isMemberOf" }
"#,
	);

	let config = load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(file.path())),
	])
	.unwrap();

	assert_eq!(config.rest_routes.len(), 1);
	assert_eq!(config.rpc_routes.len(), 1);
	assert_eq!(config.finders.len(), 1);
	assert_eq!(config.finders[0].module, "relationship");
}

#[test]
fn zero_port_from_any_layer_fails_validation() {
	let env = FixedSource {
		precedence: Precedence::Environment,
		layer: ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(0),
				..Default::default()
			}),
			..Default::default()
		},
	};
	let err = load_from_sources(vec![Box::new(DefaultsSource), Box::new(env)]).unwrap_err();
	assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn duplicate_rpc_routes_fail_validation() {
	let file = config_file(
		r#"
[[rpc_routes]]
service = "objects"
operation = "getRelationships"
handler = "object-operation"

[[rpc_routes]]
service = "objects"
operation = "getRelationships"
handler = "unrestricted"
"#,
	);
	let err = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap_err();
	assert!(err.to_string().contains("duplicate RPC route objects.getRelationships"));
}

#[test]
fn later_pdp_layer_keeps_earlier_fields() {
	let low = FixedSource {
		precedence: Precedence::ConfigFile,
		layer: ServerConfigLayer {
			pdp: Some(PdpConfigLayer {
				rights_metadata_policies: Some(false),
				..Default::default()
			}),
			..Default::default()
		},
	};
	let high = FixedSource {
		precedence: Precedence::Environment,
		layer: ServerConfigLayer {
			pdp: Some(PdpConfigLayer {
				policy_dir: Some(PathBuf::from("/tmp/policies")),
				..Default::default()
			}),
			..Default::default()
		},
	};
	let config = load_from_sources(vec![Box::new(high), Box::new(low)]).unwrap();
	assert!(!config.pdp.rights_metadata_policies);
	assert_eq!(config.pdp.policy_dir, PathBuf::from("/tmp/policies"));
}
