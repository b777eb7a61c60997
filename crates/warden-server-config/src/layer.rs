// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as read from one source.

use serde::Deserialize;

use crate::sections::{
	FinderConfig, HttpConfigLayer, IdentityConfigLayer, LoggingConfigLayer, ObjectsConfigLayer,
	PdpConfigLayer, RestRouteConfig, RightsConfigLayer, RpcRouteConfig,
};

/// One source's view of the configuration. Every section is optional so a
/// higher-precedence source only overrides what it sets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub pdp: Option<PdpConfigLayer>,
	#[serde(default)]
	pub objects: Option<ObjectsConfigLayer>,
	#[serde(default)]
	pub rights: Option<RightsConfigLayer>,
	#[serde(default)]
	pub identity: Option<IdentityConfigLayer>,
	/// Replaces the whole finder list when set.
	#[serde(default)]
	pub finders: Option<Vec<FinderConfig>>,
	#[serde(default)]
	pub rest_routes: Option<Vec<RestRouteConfig>>,
	#[serde(default)]
	pub rpc_routes: Option<Vec<RpcRouteConfig>>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(other)) => merge(existing, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}

fn merge_option<T>(base: &mut Option<T>, other: Option<T>) {
	if other.is_some() {
		*base = other;
	}
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.pdp, other.pdp, PdpConfigLayer::merge);
		merge_section(&mut self.objects, other.objects, ObjectsConfigLayer::merge);
		merge_section(&mut self.rights, other.rights, RightsConfigLayer::merge);
		merge_section(&mut self.identity, other.identity, IdentityConfigLayer::merge);
		merge_option(&mut self.finders, other.finders);
		merge_option(&mut self.rest_routes, other.rest_routes);
		merge_option(&mut self.rpc_routes, other.rpc_routes);
	}
}
