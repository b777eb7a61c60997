// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller identity configuration.
//!
//! Authentication happens upstream; the server trusts the headers named here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
	pub remote_user_header: String,
	/// Comma-separated role list.
	pub roles_header: String,
	/// Realm announced in `WWW-Authenticate` challenges.
	pub realm: String,
}

impl Default for IdentityConfig {
	fn default() -> Self {
		Self {
			remote_user_header: "x-remote-user".to_string(),
			roles_header: "x-remote-roles".to_string(),
			realm: "warden".to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityConfigLayer {
	#[serde(default)]
	pub remote_user_header: Option<String>,
	#[serde(default)]
	pub roles_header: Option<String>,
	#[serde(default)]
	pub realm: Option<String>,
}

impl IdentityConfigLayer {
	pub fn merge(&mut self, other: IdentityConfigLayer) {
		if other.remote_user_header.is_some() {
			self.remote_user_header = other.remote_user_header;
		}
		if other.roles_header.is_some() {
			self.roles_header = other.roles_header;
		}
		if other.realm.is_some() {
			self.realm = other.realm;
		}
	}

	pub fn finalize(self) -> IdentityConfig {
		let defaults = IdentityConfig::default();
		IdentityConfig {
			remote_user_header: self
				.remote_user_header
				.map(|h| h.to_ascii_lowercase())
				.unwrap_or(defaults.remote_user_header),
			roles_header: self
				.roles_header
				.map(|h| h.to_ascii_lowercase())
				.unwrap_or(defaults.roles_header),
			realm: self.realm.unwrap_or(defaults.realm),
		}
	}
}
