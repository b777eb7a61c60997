// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tower layer enforcing policy on REST routes.
//!
//! Every request is resolved against [`RestRoutes`]; a request with no route
//! is refused with a 500 rather than passed through. Decisions run on the
//! blocking pool. For handlers that inspect the response, the inner
//! service's body is buffered (bounded) and released only after the
//! response pass permits it.
//!
//! # Example
//!
//! ```ignore
//! let layer = PolicyEnforcementLayer::new(pep, Arc::new(routes)).with_realm("warden");
//! let app = Router::new()
//!     .route("/objects/{pid}/relationships", get(relationships))
//!     .layer(layer);
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
	body::Body,
	extract::{ConnectInfo, Query},
	http::{header, Request},
	response::Response,
};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{error, warn};
use uuid::Uuid;
use warden_authz::TransportAttributes;

use crate::enforce::PolicyEnforcementPoint;
use crate::error::{PepError, DEFAULT_REALM};
use crate::handler::{Api, OperationInput, ResponseFacts, RestMatch, RestRoutes};
use crate::identity::AuthenticatedSubject;

pub const DEFAULT_MAX_BUFFERED_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
struct Enforcement {
	pep: PolicyEnforcementPoint,
	routes: Arc<RestRoutes>,
	realm: Arc<str>,
	max_buffered_response_bytes: usize,
}

/// Layer applying [`PolicyEnforcementService`] to a router.
#[derive(Clone)]
pub struct PolicyEnforcementLayer {
	enforcement: Enforcement,
}

impl PolicyEnforcementLayer {
	pub fn new(pep: PolicyEnforcementPoint, routes: Arc<RestRoutes>) -> Self {
		Self {
			enforcement: Enforcement {
				pep,
				routes,
				realm: Arc::from(DEFAULT_REALM),
				max_buffered_response_bytes: DEFAULT_MAX_BUFFERED_RESPONSE_BYTES,
			},
		}
	}

	/// Realm named in the `WWW-Authenticate` challenge.
	pub fn with_realm(mut self, realm: &str) -> Self {
		self.enforcement.realm = Arc::from(realm);
		self
	}

	pub fn with_max_buffered_response_bytes(mut self, limit: usize) -> Self {
		self.enforcement.max_buffered_response_bytes = limit;
		self
	}
}

impl<S> Layer<S> for PolicyEnforcementLayer {
	type Service = PolicyEnforcementService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		PolicyEnforcementService {
			inner,
			enforcement: self.enforcement.clone(),
		}
	}
}

/// Service wrapper for [`PolicyEnforcementLayer`].
#[derive(Clone)]
pub struct PolicyEnforcementService<S> {
	inner: S,
	enforcement: Enforcement,
}

impl<S> Service<Request<Body>> for PolicyEnforcementService<S>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
	S::Error: Send + 'static,
{
	type Response = Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Response, S::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request<Body>) -> Self::Future {
		// Keep the service that was polled ready; leave a fresh clone behind.
		let clone = self.inner.clone();
		let inner = std::mem::replace(&mut self.inner, clone);
		let enforcement = self.enforcement.clone();
		Box::pin(async move { enforcement.run(inner, request).await })
	}
}

impl Enforcement {
	async fn run<S>(self, mut inner: S, request: Request<Body>) -> Result<Response, S::Error>
	where
		S: Service<Request<Body>, Response = Response>,
	{
		let method = request.method().as_str().to_string();
		let path = request.uri().path().to_string();

		let Some(found) = self.routes.resolve(&method, &path) else {
			error!(%method, %path, "no enforcement handler for request");
			return Ok(self.reject(PepError::MissingHandler(format!("{method} {path}"))));
		};

		let input = match operation_input(&request, &found) {
			Ok(input) => input,
			Err(err) => return Ok(self.reject(err)),
		};
		let transport = transport_attributes(&request, input.is_authenticated());
		let handler = found.binding.handler;

		let inbound = {
			let pep = self.pep.clone();
			let handler = handler.clone();
			let input = input.clone();
			let transport = transport.clone();
			on_blocking_pool(move || pep.enforce(handler.as_ref(), &input, &transport)).await
		};
		if let Err(err) = inbound {
			return Ok(self.reject(err));
		}

		let response = inner.call(request).await?;
		if !handler.inspects_response() {
			return Ok(response);
		}

		let (parts, body) = response.into_parts();
		let bytes = match axum::body::to_bytes(body, self.max_buffered_response_bytes).await {
			Ok(bytes) => bytes,
			Err(e) => {
				error!(
					operation = %input.operation,
					limit = self.max_buffered_response_bytes,
					error = %e,
					"response could not be buffered for inspection"
				);
				return Ok(self.reject(PepError::Internal(format!(
					"response body could not be buffered: {e}"
				))));
			}
		};

		let facts = ResponseFacts {
			status: parts.status.as_u16(),
			content_type: parts
				.headers
				.get(header::CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_string),
			content_length: Some(bytes.len()),
		};
		let pep = self.pep.clone();
		let outbound = on_blocking_pool(move || {
			pep.enforce_response(handler.as_ref(), &input, &facts, &transport)
		})
		.await;
		if let Err(err) = outbound {
			return Ok(self.reject(err));
		}

		Ok(Response::from_parts(parts, Body::from(bytes)))
	}

	fn reject(&self, err: PepError) -> Response {
		if err.status_code().is_server_error() {
			error!(error = %err, "enforcement failed");
		} else if let PepError::BadRequest(message) = &err {
			warn!(%message, "rejected malformed request");
		}
		err.into_response_with_realm(&self.realm)
	}
}

async fn on_blocking_pool<F>(decide: F) -> Result<(), PepError>
where
	F: FnOnce() -> Result<(), PepError> + Send + 'static,
{
	tokio::task::spawn_blocking(decide)
		.await
		.map_err(|e| PepError::Internal(format!("decision task failed: {e}")))?
}

fn operation_input(request: &Request<Body>, found: &RestMatch) -> Result<OperationInput, PepError> {
	let subject = request.extensions().get::<AuthenticatedSubject>().cloned();
	let mut input = OperationInput::new(Api::Rest, found.operation.clone())
		.with_action(found.binding.action.clone())
		.with_subject(subject);

	let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
		.map_err(|e| PepError::BadRequest(format!("invalid query string: {e}")))?;
	for (name, value) in query {
		input.add_param(name, value);
	}
	// Path parameters win over query parameters of the same name.
	for (name, value) in &found.params {
		input.params.insert(name.clone(), vec![value.clone()]);
	}
	Ok(input)
}

fn transport_attributes(request: &Request<Body>, authenticated: bool) -> TransportAttributes {
	let transport = TransportAttributes::new()
		.with_transaction_id(Uuid::new_v4().to_string())
		.with_authenticated(authenticated);
	match request.extensions().get::<ConnectInfo<SocketAddr>>() {
		Some(ConnectInfo(addr)) => transport.with_client_address(addr.ip().to_string()),
		None => transport,
	}
}
