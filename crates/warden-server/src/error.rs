// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use warden_authz::{AuthzError, ObjectSourceError, StoreError};
use warden_server_config::ConfigError;
use warden_server_pep::{ErrorResponse, PepError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Authz(#[from] AuthzError),
	#[error(transparent)]
	Enforcement(#[from] PepError),
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Objects(#[from] ObjectSourceError),
	#[error("not found: {0}")]
	NotFound(String),
	#[error("bad request: {0}")]
	BadRequest(String),
	#[error("internal error: {0}")]
	Internal(String),
}

impl ServerError {
	fn parts(&self) -> (StatusCode, &'static str, String) {
		match self {
			ServerError::Store(StoreError::NotFound(id)) => (
				StatusCode::NOT_FOUND,
				"not_found",
				format!("policy {id} not found"),
			),
			ServerError::Store(StoreError::AlreadyExists(id)) => (
				StatusCode::CONFLICT,
				"conflict",
				format!("policy {id} already exists"),
			),
			ServerError::Store(e @ (StoreError::InvalidId(_) | StoreError::InvalidDocument(_))) => {
				(StatusCode::BAD_REQUEST, "invalid_policy", e.to_string())
			}
			ServerError::Objects(e @ ObjectSourceError::InvalidPid(_)) => {
				(StatusCode::BAD_REQUEST, "bad_request", e.to_string())
			}
			ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
			ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
			ServerError::Config(_)
			| ServerError::Authz(_)
			| ServerError::Store(StoreError::Io { .. })
			| ServerError::Objects(_)
			| ServerError::Internal(_) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal_error",
				"Internal server error".to_string(),
			),
			ServerError::Enforcement(e) => (e.status_code(), "enforcement", e.to_string()),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		if let ServerError::Enforcement(e) = self {
			return e.into_response();
		}

		let (status, error, message) = self.parts();
		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}
		(
			status,
			Json(ErrorResponse {
				error: error.to_string(),
				message,
			}),
		)
			.into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn store_errors_map_to_client_statuses() {
		let cases = [
			(StoreError::NotFound("p".into()), StatusCode::NOT_FOUND),
			(StoreError::AlreadyExists("p".into()), StatusCode::CONFLICT),
			(StoreError::InvalidId("../p".into()), StatusCode::BAD_REQUEST),
		];
		for (err, status) in cases {
			assert_eq!(ServerError::from(err).into_response().status(), status);
		}
	}

	#[test]
	fn internal_errors_hide_details() {
		let (status, _, message) =
			ServerError::Internal("/var/lib/warden/objects unreadable".into()).parts();
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(!message.contains("/var/lib"));
	}
}
