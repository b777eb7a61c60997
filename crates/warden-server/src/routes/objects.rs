// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Protected object routes.

use axum::{
	extract::{Path, Query, State},
	http::header,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use warden_authz::{ObjectSource, Relationship};

use crate::api::AppState;
use crate::error::ServerError;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize)]
pub struct RelationshipQuery {
	pub predicate: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelationshipsResponse {
	pub pid: String,
	pub relationships: Vec<Relationship>,
}

pub struct Datastream {
	pub content_type: String,
	pub content: Vec<u8>,
}

pub fn load_relationships(
	objects: &dyn ObjectSource,
	pid: &str,
	predicate: Option<&str>,
) -> Result<RelationshipsResponse, ServerError> {
	Ok(RelationshipsResponse {
		pid: pid.to_string(),
		relationships: objects.relationships(pid, predicate)?,
	})
}

pub fn load_datastream(
	objects: &dyn ObjectSource,
	pid: &str,
	dsid: &str,
) -> Result<Datastream, ServerError> {
	let content = objects
		.datastream_content(pid, dsid)?
		.ok_or_else(|| ServerError::NotFound(format!("datastream {pid}/{dsid} not found")))?;
	let content_type = objects
		.datastream_mime_type(pid, dsid)?
		.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
	Ok(Datastream {
		content_type,
		content,
	})
}

/// GET /objects/{pid}/relationships
pub async fn relationships(
	State(state): State<AppState>,
	Path(pid): Path<String>,
	Query(query): Query<RelationshipQuery>,
) -> Result<Json<RelationshipsResponse>, ServerError> {
	let response = super::blocking(move || {
		load_relationships(state.objects.as_ref(), &pid, query.predicate.as_deref())
	})
	.await?;
	Ok(Json(response))
}

/// GET /objects/{pid}/datastreams/{dsid}/content
///
/// The body is held back by the enforcement layer until the content type
/// has been checked.
pub async fn datastream_content(
	State(state): State<AppState>,
	Path((pid, dsid)): Path<(String, String)>,
) -> Result<Response, ServerError> {
	let datastream =
		super::blocking(move || load_datastream(state.objects.as_ref(), &pid, &dsid)).await?;
	Ok((
		[(header::CONTENT_TYPE, datastream.content_type)],
		datastream.content,
	)
		.into_response())
}
