// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BUFFERED_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// HTTP configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Upper bound on a response body held back for a second enforcement pass.
	pub max_buffered_response_bytes: usize,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 8080,
			max_buffered_response_bytes: DEFAULT_MAX_BUFFERED_RESPONSE_BYTES,
		}
	}
}

/// HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub max_buffered_response_bytes: Option<usize>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.max_buffered_response_bytes.is_some() {
			self.max_buffered_response_bytes = other.max_buffered_response_bytes;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let defaults = HttpConfig::default();
		HttpConfig {
			host: self.host.unwrap_or(defaults.host),
			port: self.port.unwrap_or(defaults.port),
			max_buffered_response_bytes: self
				.max_buffered_response_bytes
				.unwrap_or(defaults.max_buffered_response_bytes),
		}
	}
}
