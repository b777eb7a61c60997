// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy administration routes.
//!
//! Writes go to the store first and then drop the parsed copy, so the next
//! decision re-reads the document.

use axum::{
	body::Bytes,
	extract::{Path, State},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use warden_authz::StoreError;

use crate::api::AppState;
use crate::error::ServerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PolicyListResponse {
	pub policies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PolicyWriteResponse {
	pub id: String,
	pub created: bool,
}

/// GET /policies
pub async fn list_policies(
	State(state): State<AppState>,
) -> Result<Json<PolicyListResponse>, ServerError> {
	let policies = super::blocking(move || Ok(state.store.list_policies()?)).await?;
	Ok(Json(PolicyListResponse { policies }))
}

/// GET /policies/{id}
pub async fn get_policy(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Response, ServerError> {
	let document = super::blocking(move || Ok(state.store.get_policy(&id)?)).await?;
	Ok(([(header::CONTENT_TYPE, "application/xml")], document).into_response())
}

/// PUT /policies/{id}: creates or replaces.
pub async fn put_policy(
	State(state): State<AppState>,
	Path(id): Path<String>,
	body: Bytes,
) -> Result<Response, ServerError> {
	let response = super::blocking(move || {
		let created = match state.store.update_policy(&id, &body) {
			Ok(()) => false,
			Err(StoreError::NotFound(_)) => {
				state.store.add_policy(Some(&id), &body)?;
				true
			}
			Err(e) => return Err(e.into()),
		};
		state.pdp.manager().invalidate(&id);
		info!(policy_id = %id, created, "policy stored");
		Ok(PolicyWriteResponse { id, created })
	})
	.await?;

	let status = if response.created {
		StatusCode::CREATED
	} else {
		StatusCode::OK
	};
	Ok((status, Json(response)).into_response())
}

/// DELETE /policies/{id}
pub async fn delete_policy(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
	super::blocking(move || {
		state.store.delete_policy(&id)?;
		state.pdp.manager().invalidate(&id);
		info!(policy_id = %id, "policy deleted");
		Ok(())
	})
	.await?;
	Ok(StatusCode::NO_CONTENT)
}
