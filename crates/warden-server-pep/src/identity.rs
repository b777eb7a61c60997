// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller identity as asserted by a trusted fronting proxy.

use std::sync::Arc;

use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, Request},
	middleware::Next,
	response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::trace;
use warden_authz::{attribute::ids, RequestCtxBuilder};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSubject {
	pub login: String,
	#[serde(default)]
	pub roles: Vec<String>,
}

impl AuthenticatedSubject {
	pub fn new(login: impl Into<String>) -> Self {
		Self {
			login: login.into(),
			roles: Vec::new(),
		}
	}

	pub fn with_roles<I, S>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.roles = roles.into_iter().map(Into::into).collect();
		self
	}

	/// Adds the subject-id and role attributes to a request under construction.
	pub fn describe(&self, builder: RequestCtxBuilder) -> RequestCtxBuilder {
		let builder = builder.subject_string(ids::SUBJECT_ID, self.login.clone());
		if self.roles.is_empty() {
			builder
		} else {
			builder.subject_strings(ids::SUBJECT_ROLE, self.roles.iter().cloned())
		}
	}
}

/// Header names carrying the asserted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHeaders {
	pub remote_user: String,
	pub roles: String,
}

impl Default for IdentityHeaders {
	fn default() -> Self {
		Self {
			remote_user: "x-remote-user".to_string(),
			roles: "x-remote-roles".to_string(),
		}
	}
}

/// Reads the caller from the remote-user header. Roles are comma separated.
///
/// A missing or blank remote-user header means the caller is anonymous.
pub fn identity_from_headers(
	headers: &HeaderMap,
	names: &IdentityHeaders,
) -> Option<AuthenticatedSubject> {
	let login = headers
		.get(names.remote_user.as_str())?
		.to_str()
		.ok()?
		.trim();
	if login.is_empty() {
		return None;
	}

	let roles = headers
		.get_all(names.roles.as_str())
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(','))
		.map(str::trim)
		.filter(|role| !role.is_empty())
		.map(str::to_string)
		.collect::<Vec<_>>();

	Some(AuthenticatedSubject::new(login).with_roles(roles))
}

/// Middleware placing the caller's [`AuthenticatedSubject`] in request extensions.
pub async fn identity_layer(
	State(names): State<Arc<IdentityHeaders>>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	match identity_from_headers(request.headers(), &names) {
		Some(subject) => {
			trace!(login = %subject.login, roles = subject.roles.len(), "request identity");
			request.extensions_mut().insert(subject);
		}
		None => trace!("anonymous request"),
	}
	next.run(request).await
}
