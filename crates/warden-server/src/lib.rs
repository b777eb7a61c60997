// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden authorization server.
//!
//! Hosts the policy decision point behind an HTTP surface: protected object
//! routes guarded by the REST enforcement layer, a JSON RPC endpoint
//! enforced per message, and policy administration.

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod version;

pub use api::{create_app_state, create_router, AppState};
pub use bootstrap::{build_services, build_services_with, Services};
pub use error::ServerError;
