// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy enforcement for the Warden server.
//!
//! Both transports share one contract: resolve an [`OperationHandler`] for
//! the operation, let it build the decision requests, and allow the
//! operation only when every decision is Permit.
//!
//! - REST: [`PolicyEnforcementLayer`], a tower layer over the axum router
//! - RPC: [`RpcEnforcer`], applied to each inbound and outbound message
//!
//! A missing handler is never an allow. Denials surface as a challenge (401)
//! for anonymous callers and as forbidden (403) for authenticated ones;
//! evaluation failures are a 500.

pub mod enforce;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod identity;
pub mod rest;
pub mod rpc;

pub use enforce::PolicyEnforcementPoint;
pub use error::{ErrorResponse, PepError, RpcFault, DEFAULT_REALM};
pub use handler::{
	Api, HandlerRegistry, OperationHandler, OperationInput, PathTemplate, ResponseFacts,
	RestMatch, RestRoutes, RouteBinding, RpcRoutes,
};
pub use identity::{identity_from_headers, identity_layer, AuthenticatedSubject, IdentityHeaders};
pub use rest::{PolicyEnforcementLayer, PolicyEnforcementService, DEFAULT_MAX_BUFFERED_RESPONSE_BYTES};
pub use rpc::{Direction, MessageContext, RpcEnforcer};
