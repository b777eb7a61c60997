// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enforcement failures and their transport mappings.

use axum::{
	http::{header, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_authz::{AuthzError, Decision};

pub const DEFAULT_REALM: &str = "warden";

#[derive(Debug, Error)]
pub enum PepError {
	/// A non-Permit decision. Anonymous callers get a challenge, authenticated
	/// callers a flat refusal.
	#[error("authorization denied: {}", .decision.as_str().to_uppercase())]
	Denied {
		decision: Decision,
		reason: Option<String>,
		authenticated: bool,
	},

	#[error("no policy enforcement handler defined for {0}")]
	MissingHandler(String),

	#[error("bad request: {0}")]
	BadRequest(String),

	#[error("enforcement configuration error: {0}")]
	Configuration(String),

	#[error("evaluation failed: {0}")]
	Evaluation(#[from] AuthzError),

	#[error("internal enforcement error: {0}")]
	Internal(String),
}

/// Fault returned to RPC callers in place of a response message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFault {
	pub code: String,
	pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl PepError {
	pub fn denied(decision: Decision, authenticated: bool) -> Self {
		PepError::Denied {
			decision,
			reason: None,
			authenticated,
		}
	}

	/// True when the caller should be asked to authenticate.
	pub fn is_challenge(&self) -> bool {
		matches!(
			self,
			PepError::Denied {
				authenticated: false,
				..
			}
		)
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			PepError::Denied {
				authenticated: false,
				..
			} => StatusCode::UNAUTHORIZED,
			PepError::Denied { .. } => StatusCode::FORBIDDEN,
			PepError::BadRequest(_) => StatusCode::BAD_REQUEST,
			PepError::MissingHandler(_)
			| PepError::Configuration(_)
			| PepError::Evaluation(_)
			| PepError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_type(&self) -> &'static str {
		match self {
			PepError::Denied {
				authenticated: false,
				..
			} => "unauthorized",
			PepError::Denied { .. } => "forbidden",
			PepError::BadRequest(_) => "bad_request",
			PepError::MissingHandler(_) | PepError::Configuration(_) => "configuration_error",
			PepError::Evaluation(_) | PepError::Internal(_) => "internal_error",
		}
	}

	pub fn fault(&self) -> RpcFault {
		let code = match self {
			PepError::Denied {
				authenticated: false,
				..
			} => "Client.Unauthenticated",
			PepError::Denied { .. } => "Client.Unauthorized",
			PepError::BadRequest(_) => "Client.BadRequest",
			PepError::MissingHandler(_) | PepError::Configuration(_) => "Server.Configuration",
			PepError::Evaluation(_) | PepError::Internal(_) => "Server.Internal",
		};
		RpcFault {
			code: code.to_string(),
			reason: self.public_message(),
		}
	}

	/// Message safe to show the caller. Internal details stay in the logs.
	fn public_message(&self) -> String {
		match self {
			PepError::Denied { .. } | PepError::BadRequest(_) => self.to_string(),
			PepError::MissingHandler(_) | PepError::Configuration(_) => {
				"Authorization is not configured for this operation".to_string()
			}
			PepError::Evaluation(_) | PepError::Internal(_) => {
				"Authorization could not be evaluated".to_string()
			}
		}
	}

	/// Render as an HTTP response, challenging with `realm` on 401.
	pub fn into_response_with_realm(self, realm: &str) -> Response {
		let status = self.status_code();
		let body = ErrorResponse {
			error: self.error_type().to_string(),
			message: self.public_message(),
		};
		let mut response = (status, Json(body)).into_response();
		if status == StatusCode::UNAUTHORIZED {
			if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
				response
					.headers_mut()
					.insert(header::WWW_AUTHENTICATE, value);
			}
		}
		response
	}
}

impl IntoResponse for PepError {
	fn into_response(self) -> Response {
		self.into_response_with_realm(DEFAULT_REALM)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn anonymous_denial_is_a_challenge() {
		let err = PepError::denied(Decision::Deny, false);
		assert!(err.is_challenge());
		assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(err.fault().code, "Client.Unauthenticated");

		let response = err.into_response_with_realm("archive");
		assert_eq!(
			response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
			"Basic realm=\"archive\""
		);
	}

	#[test]
	fn authenticated_denial_is_forbidden_with_uppercased_decision() {
		let err = PepError::denied(Decision::NotApplicable, true);
		assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
		assert_eq!(err.to_string(), "authorization denied: NOTAPPLICABLE");
		assert_eq!(err.fault().code, "Client.Unauthorized");

		let response = err.into_response();
		assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
	}

	#[test]
	fn server_side_failures_map_to_500() {
		for err in [
			PepError::MissingHandler("GET /nowhere".into()),
			PepError::Configuration("unknown handler".into()),
			PepError::Internal("join error".into()),
		] {
			assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
			assert!(err.fault().code.starts_with("Server."));
		}
		assert_eq!(
			PepError::BadRequest("missing pid".into()).fault().code,
			"Client.BadRequest"
		);
	}

	#[test]
	fn internal_details_are_not_exposed() {
		let fault = PepError::Internal("/var/lib/warden secret path".into()).fault();
		assert!(!fault.reason.contains("/var/lib"));
	}
}
