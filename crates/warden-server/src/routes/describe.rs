// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use warden_authz::REPOSITORY_PID;

use crate::api::AppState;
use crate::error::ServerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct DescribeResponse {
	pub repository: String,
	pub version: String,
	pub policies: usize,
	pub finders: Vec<String>,
	pub top_level_algorithm: Option<String>,
}

pub fn describe_repository(state: &AppState) -> Result<DescribeResponse, ServerError> {
	let manager = state.pdp.manager();
	Ok(DescribeResponse {
		repository: REPOSITORY_PID.to_string(),
		version: env!("CARGO_PKG_VERSION").to_string(),
		policies: state.store.list_policies()?.len(),
		finders: state
			.pdp
			.finders()
			.names()
			.into_iter()
			.map(str::to_string)
			.collect(),
		top_level_algorithm: manager.top_level_algorithm().map(|alg| alg.name().to_string()),
	})
}

/// GET /describe
pub async fn describe(State(state): State<AppState>) -> Result<Json<DescribeResponse>, ServerError> {
	let response = super::blocking(move || describe_repository(&state)).await?;
	Ok(Json(response))
}
