// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.
//!
//! Each REST handler runs behind the enforcement layer; the RPC endpoint
//! enforces per message itself. Store and object access may block, so it
//! runs on the blocking pool.

pub mod describe;
pub mod objects;
pub mod policies;
pub mod rpc;

use crate::error::ServerError;

pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ServerError>
where
	F: FnOnce() -> Result<T, ServerError> + Send + 'static,
	T: Send + 'static,
{
	tokio::task::spawn_blocking(work)
		.await
		.map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}
