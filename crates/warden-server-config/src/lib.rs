// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Warden authorization server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub logging: LoggingConfig,
	pub pdp: PdpConfig,
	pub objects: ObjectsConfig,
	pub rights: RightsConfig,
	pub identity: IdentityConfig,
	pub finders: Vec<FinderConfig>,
	pub rest_routes: Vec<RestRouteConfig>,
	pub rpc_routes: Vec<RpcRouteConfig>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			http: HttpConfig::default(),
			logging: LoggingConfig::default(),
			pdp: PdpConfig::default(),
			objects: ObjectsConfig::default(),
			rights: RightsConfig::default(),
			identity: IdentityConfig::default(),
			finders: default_finders(),
			rest_routes: default_rest_routes(),
			rpc_routes: default_rpc_routes(),
		}
	}
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_SERVER_*`)
/// 2. Config file (`/etc/warden/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		pdp: layer.pdp.unwrap_or_default().finalize(),
		objects: layer.objects.unwrap_or_default().finalize(),
		rights: layer.rights.unwrap_or_default().finalize(),
		identity: layer.identity.unwrap_or_default().finalize(),
		finders: layer.finders.unwrap_or_else(default_finders),
		rest_routes: layer.rest_routes.unwrap_or_else(default_rest_routes),
		rpc_routes: layer.rpc_routes.unwrap_or_else(default_rpc_routes),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		policy_dir = %config.pdp.policy_dir.display(),
		objects_root = %config.objects.root.display(),
		top_level_algorithm = ?config.pdp.top_level_combining_algorithm,
		finders = config.finders.len(),
		rest_routes = config.rest_routes.len(),
		rpc_routes = config.rpc_routes.len(),
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.http.port == 0 {
		return Err(ConfigError::validation(
			"http.port must be non-zero (WARDEN_SERVER_HTTP_PORT)",
		));
	}
	if config.http.max_buffered_response_bytes == 0 {
		return Err(ConfigError::validation(
			"http.max_buffered_response_bytes must be non-zero",
		));
	}
	if config.pdp.rights_cache_capacity == 0 {
		return Err(ConfigError::validation(
			"pdp.rights_cache_capacity must be non-zero",
		));
	}
	if config.rights.datastream_id.trim().is_empty() {
		return Err(ConfigError::validation("rights.datastream_id must not be empty"));
	}

	sections::validate_finders(&config.finders).map_err(ConfigError::Validation)?;
	sections::validate_rest_routes(&config.rest_routes).map_err(ConfigError::Validation)?;
	sections::validate_rpc_routes(&config.rpc_routes).map_err(ConfigError::Validation)?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_valid() {
		assert!(validate_config(&ServerConfig::default()).is_ok());
	}

	#[test]
	fn test_zero_port_rejected() {
		let config = ServerConfig {
			http: HttpConfig {
				port: 0,
				..Default::default()
			},
			..Default::default()
		};
		let err = validate_config(&config).unwrap_err();
		assert!(err.to_string().contains("http.port"));
	}

	#[test]
	fn test_zero_rights_cache_capacity_rejected() {
		let mut config = ServerConfig::default();
		config.pdp.rights_cache_capacity = 0;
		let err = validate_config(&config).unwrap_err();
		assert!(err.to_string().contains("rights_cache_capacity"));
	}

	#[test]
	fn test_duplicate_routes_rejected() {
		let mut config = ServerConfig::default();
		let first = config.rest_routes[0].clone();
		config.rest_routes.push(first);
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
				..Default::default()
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}

	#[test]
	fn test_finalize_empty_layer_matches_default() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config, ServerConfig::default());
	}
}
