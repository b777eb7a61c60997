// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	HttpConfigLayer, LoggingConfigLayer, ObjectsConfigLayer, PdpConfigLayer, RightsConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/warden/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			logging: Some(load_logging_from_env()),
			pdp: Some(load_pdp_from_env()?),
			objects: Some(load_objects_from_env()),
			rights: Some(load_rights_from_env()),
			identity: None,
			finders: None,
			rest_routes: None,
			rpc_routes: None,
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
	match env_var(name) {
		Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
		Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
		Some(v) => Err(ConfigError::invalid_value(
			name,
			format!("invalid boolean value '{v}'"),
		)),
		None => Ok(None),
	}
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::invalid_value(name, format!("invalid u16 value '{v}'"))),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::invalid_value(name, format!("invalid usize value '{v}'"))),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("WARDEN_SERVER_HTTP_HOST"),
		port: env_u16("WARDEN_SERVER_HTTP_PORT")?,
		max_buffered_response_bytes: env_usize("WARDEN_SERVER_HTTP_MAX_BUFFERED_RESPONSE_BYTES")?,
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("WARDEN_SERVER_LOG_LEVEL"),
	}
}

fn load_pdp_from_env() -> Result<PdpConfigLayer, ConfigError> {
	Ok(PdpConfigLayer {
		policy_dir: env_var("WARDEN_SERVER_PDP_POLICY_DIR").map(PathBuf::from),
		top_level_combining_algorithm: env_var("WARDEN_SERVER_PDP_COMBINING_ALGORITHM"),
		rights_metadata_policies: env_bool("WARDEN_SERVER_PDP_RIGHTS_METADATA_POLICIES")?,
		rights_cache_capacity: env_usize("WARDEN_SERVER_PDP_RIGHTS_CACHE_CAPACITY")?,
	})
}

fn load_objects_from_env() -> ObjectsConfigLayer {
	ObjectsConfigLayer {
		root: env_var("WARDEN_SERVER_OBJECTS_ROOT").map(PathBuf::from),
	}
}

fn load_rights_from_env() -> RightsConfigLayer {
	RightsConfigLayer {
		datastream_id: env_var("WARDEN_SERVER_RIGHTS_DATASTREAM"),
		action_aliases: None,
	}
}
