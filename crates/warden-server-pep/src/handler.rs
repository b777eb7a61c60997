// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operation handlers and the tables that route transport operations to them.
//!
//! A handler turns one transport-neutral [`OperationInput`] into the
//! [`RequestCtx`] values the decision point evaluates. The same handler
//! serves a REST route and an RPC operation; only the route tables differ.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use warden_authz::{attribute::ids, RequestCtx, RequestCtxBuilder};

use crate::error::PepError;
use crate::handlers;
use crate::identity::AuthenticatedSubject;

/// The transport an operation arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
	Rest,
	Rpc,
}

impl Api {
	pub fn as_str(&self) -> &'static str {
		match self {
			Api::Rest => "rest",
			Api::Rpc => "rpc",
		}
	}
}

/// Everything a handler may read about an incoming operation.
#[derive(Debug, Clone)]
pub struct OperationInput {
	pub api: Api,
	/// `GET /objects/{pid}` or `objects.getRelationships`.
	pub operation: String,
	pub action: Option<String>,
	pub subject: Option<AuthenticatedSubject>,
	pub params: BTreeMap<String, Vec<String>>,
}

impl OperationInput {
	pub fn new(api: Api, operation: impl Into<String>) -> Self {
		Self {
			api,
			operation: operation.into(),
			action: None,
			subject: None,
			params: BTreeMap::new(),
		}
	}

	pub fn with_action(mut self, action: Option<String>) -> Self {
		self.action = action;
		self
	}

	pub fn with_subject(mut self, subject: Option<AuthenticatedSubject>) -> Self {
		self.subject = subject;
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.add_param(name, value);
		self
	}

	pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.params.entry(name.into()).or_default().push(value.into());
	}

	/// First value of a parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params
			.get(name)
			.and_then(|values| values.first())
			.map(String::as_str)
	}

	pub fn param_values(&self, name: &str) -> &[String] {
		self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn require_param(&self, name: &str) -> Result<&str, PepError> {
		self.param(name)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| PepError::BadRequest(format!("missing parameter '{name}'")))
	}

	/// The configured action id, falling back to the operation name.
	pub fn action_id(&self) -> &str {
		self.action.as_deref().unwrap_or(&self.operation)
	}

	pub fn is_authenticated(&self) -> bool {
		self.subject.is_some()
	}

	/// A builder already carrying the subject and action attributes.
	pub fn request_builder(&self) -> RequestCtxBuilder {
		let builder = match &self.subject {
			Some(subject) => subject.describe(RequestCtx::builder()),
			None => RequestCtx::builder(),
		};
		builder
			.action_string(ids::ACTION_ID, self.action_id())
			.action_string(ids::ACTION_API, self.api.as_str())
	}
}

/// What the response pass may inspect about a produced response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFacts {
	pub status: u16,
	pub content_type: Option<String>,
	pub content_length: Option<usize>,
}

/// Builds decision requests for one kind of operation.
pub trait OperationHandler: Send + Sync {
	fn name(&self) -> &'static str;

	/// Requests to evaluate before the operation runs. One per resource.
	fn build_requests(&self, input: &OperationInput) -> Result<Vec<RequestCtx>, PepError>;

	/// Whether the response must be held back for [`Self::response_requests`].
	fn inspects_response(&self) -> bool {
		false
	}

	/// Requests to evaluate over the produced response before it is released.
	fn response_requests(
		&self,
		_input: &OperationInput,
		_facts: &ResponseFacts,
	) -> Result<Vec<RequestCtx>, PepError> {
		Ok(Vec::new())
	}

	/// Operations that are deliberately not subject to policy.
	fn unrestricted(&self) -> bool {
		false
	}
}

/// Handler constructors keyed by their configuration name.
pub struct HandlerRegistry {
	handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl HandlerRegistry {
	pub fn empty() -> Self {
		Self {
			handlers: HashMap::new(),
		}
	}

	/// Registry holding every built-in handler.
	pub fn with_builtins() -> Self {
		let mut registry = Self::empty();
		registry.register(Arc::new(handlers::RepositoryOperation));
		registry.register(Arc::new(handlers::ObjectOperation));
		registry.register(Arc::new(handlers::DatastreamOperation));
		registry.register(Arc::new(handlers::DatastreamContent));
		registry.register(Arc::new(handlers::BatchObjectOperation));
		registry.register(Arc::new(handlers::Unrestricted));
		registry
	}

	pub fn register(&mut self, handler: Arc<dyn OperationHandler>) {
		self.handlers.insert(handler.name().to_string(), handler);
	}

	pub fn get(&self, name: &str) -> Result<Arc<dyn OperationHandler>, PepError> {
		self.handlers
			.get(name)
			.cloned()
			.ok_or_else(|| PepError::Configuration(format!("unknown operation handler '{name}'")))
	}

	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Binds a named handler to an action for use in a route table.
	pub fn bind(&self, name: &str, action: Option<String>) -> Result<RouteBinding, PepError> {
		Ok(RouteBinding {
			handler: self.get(name)?,
			action,
		})
	}
}

impl fmt::Debug for HandlerRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HandlerRegistry")
			.field("handlers", &self.names())
			.finish()
	}
}

/// A handler together with the action id the route performs.
#[derive(Clone)]
pub struct RouteBinding {
	pub handler: Arc<dyn OperationHandler>,
	pub action: Option<String>,
}

impl fmt::Debug for RouteBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteBinding")
			.field("handler", &self.handler.name())
			.field("action", &self.action)
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

/// A path such as `/objects/{pid}/datastreams/{dsid}/content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
	template: String,
	segments: Vec<Segment>,
}

impl PathTemplate {
	pub fn parse(template: &str) -> Result<Self, PepError> {
		if !template.starts_with('/') {
			return Err(PepError::Configuration(format!(
				"route path '{template}' must start with '/'"
			)));
		}

		let mut segments = Vec::new();
		for part in split_path(template) {
			let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
				Some("") => {
					return Err(PepError::Configuration(format!(
						"route path '{template}' has an unnamed parameter"
					)))
				}
				Some(name) => Segment::Param(name.to_string()),
				None => Segment::Literal(part.to_string()),
			};
			segments.push(segment);
		}

		Ok(Self {
			template: template.to_string(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.template
	}

	fn literal_count(&self) -> usize {
		self.segments
			.iter()
			.filter(|s| matches!(s, Segment::Literal(_)))
			.count()
	}

	/// Path parameters when `path` matches, percent-decoded.
	pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
		let parts: Vec<&str> = split_path(path).collect();
		if parts.len() != self.segments.len() {
			return None;
		}

		let mut params = BTreeMap::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(literal) if literal == part => {}
				Segment::Literal(_) => return None,
				Segment::Param(name) => {
					let value = urlencoding::decode(part).ok()?;
					params.insert(name.clone(), value.into_owned());
				}
			}
		}
		Some(params)
	}
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
	path.split('/').filter(|part| !part.is_empty())
}

/// REST routes: method plus path template.
#[derive(Debug, Default)]
pub struct RestRoutes {
	routes: Vec<(String, PathTemplate, RouteBinding)>,
}

/// A resolved REST route.
#[derive(Debug, Clone)]
pub struct RestMatch {
	pub operation: String,
	pub binding: RouteBinding,
	pub params: BTreeMap<String, String>,
}

impl RestRoutes {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, method: &str, path: &str, binding: RouteBinding) -> Result<(), PepError> {
		let method = method.to_ascii_uppercase();
		let template = PathTemplate::parse(path)?;
		if self
			.routes
			.iter()
			.any(|(m, t, _)| *m == method && t.as_str() == template.as_str())
		{
			return Err(PepError::Configuration(format!(
				"duplicate REST route {method} {path}"
			)));
		}
		self.routes.push((method, template, binding));
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// The matching route with the most literal segments wins; ties go to the
	/// first registered.
	pub fn resolve(&self, method: &str, path: &str) -> Option<RestMatch> {
		let mut best: Option<(usize, RestMatch)> = None;
		for (route_method, template, binding) in &self.routes {
			if !route_method.eq_ignore_ascii_case(method) {
				continue;
			}
			let Some(params) = template.matches(path) else {
				continue;
			};
			let score = template.literal_count();
			if best.as_ref().is_some_and(|(s, _)| *s >= score) {
				continue;
			}
			best = Some((
				score,
				RestMatch {
					operation: format!("{route_method} {}", template.as_str()),
					binding: binding.clone(),
					params,
				},
			));
		}
		best.map(|(_, found)| found)
	}
}

/// RPC routes: service plus operation name.
#[derive(Debug, Default)]
pub struct RpcRoutes {
	routes: HashMap<(String, String), RouteBinding>,
}

impl RpcRoutes {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(
		&mut self,
		service: &str,
		operation: &str,
		binding: RouteBinding,
	) -> Result<(), PepError> {
		let key = (service.to_string(), operation.to_string());
		if self.routes.contains_key(&key) {
			return Err(PepError::Configuration(format!(
				"duplicate RPC route {service}.{operation}"
			)));
		}
		self.routes.insert(key, binding);
		Ok(())
	}

	pub fn resolve(&self, service: &str, operation: &str) -> Option<&RouteBinding> {
		self.routes
			.get(&(service.to_string(), operation.to_string()))
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	mod templates {
		use super::*;

		#[test]
		fn captures_and_decodes_parameters() {
			let template = PathTemplate::parse("/objects/{pid}/datastreams/{dsid}/content").unwrap();
			let params = template
				.matches("/objects/demo%3A1/datastreams/DC/content")
				.unwrap();
			assert_eq!(params["pid"], "demo:1");
			assert_eq!(params["dsid"], "DC");
		}

		#[test]
		fn rejects_other_shapes() {
			let template = PathTemplate::parse("/objects/{pid}/relationships").unwrap();
			assert!(template.matches("/objects/demo:1").is_none());
			assert!(template.matches("/objects/demo:1/datastreams").is_none());
			assert!(template.matches("/objects/demo:1/relationships/").is_some());
		}

		proptest::proptest! {
			#[test]
			fn any_encoded_segment_is_captured_verbatim(pid in "[^/]{1,24}") {
				let template = PathTemplate::parse("/objects/{pid}/relationships").unwrap();
				let path = format!("/objects/{}/relationships", urlencoding::encode(&pid));
				let params = template.matches(&path).unwrap();
				proptest::prop_assert_eq!(&params["pid"], &pid);
			}
		}

		#[test]
		fn invalid_templates_are_configuration_errors() {
			assert!(matches!(
				PathTemplate::parse("objects"),
				Err(PepError::Configuration(_))
			));
			assert!(matches!(
				PathTemplate::parse("/objects/{}"),
				Err(PepError::Configuration(_))
			));
		}
	}

	mod routes {
		use super::*;

		fn binding(registry: &HandlerRegistry, name: &str) -> RouteBinding {
			registry.bind(name, None).unwrap()
		}

		#[test]
		fn literal_routes_beat_parameterised_ones() {
			let registry = HandlerRegistry::with_builtins();
			let mut routes = RestRoutes::new();
			routes
				.add("GET", "/policies/{id}", binding(&registry, "repository-operation"))
				.unwrap();
			routes
				.add("get", "/policies/export", binding(&registry, "unrestricted"))
				.unwrap();

			let found = routes.resolve("GET", "/policies/export").unwrap();
			assert_eq!(found.binding.handler.name(), "unrestricted");
			assert_eq!(found.operation, "GET /policies/export");

			let found = routes.resolve("GET", "/policies/p1").unwrap();
			assert_eq!(found.params["id"], "p1");
			assert!(routes.resolve("DELETE", "/policies/p1").is_none());
		}

		#[test]
		fn duplicates_are_rejected() {
			let registry = HandlerRegistry::with_builtins();
			let mut rest = RestRoutes::new();
			rest.add("GET", "/describe", binding(&registry, "unrestricted"))
				.unwrap();
			assert!(rest
				.add("get", "/describe", binding(&registry, "unrestricted"))
				.is_err());

			let mut rpc = RpcRoutes::new();
			rpc.add("objects", "get", binding(&registry, "object-operation"))
				.unwrap();
			assert!(rpc
				.add("objects", "get", binding(&registry, "object-operation"))
				.is_err());
			assert!(rpc.resolve("objects", "get").is_some());
			assert!(rpc.resolve("objects", "put").is_none());
		}

		#[test]
		fn unknown_handler_is_a_configuration_error() {
			let registry = HandlerRegistry::with_builtins();
			assert!(matches!(
				registry.bind("com.example.LegacyFilter", None),
				Err(PepError::Configuration(_))
			));
		}
	}

	#[test]
	fn input_params_and_action_fallback() {
		let input = OperationInput::new(Api::Rpc, "objects.getRelationships")
			.with_param("pids", "demo:1")
			.with_param("pids", "demo:2");
		assert_eq!(input.param("pids"), Some("demo:1"));
		assert_eq!(input.param_values("pids").len(), 2);
		assert_eq!(input.action_id(), "objects.getRelationships");
		assert!(matches!(
			input.require_param("pid"),
			Err(PepError::BadRequest(_))
		));
	}
}
