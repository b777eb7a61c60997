// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod finders;
mod http;
mod identity;
mod logging;
mod objects;
mod pdp;
mod rights;
mod routes;

pub use finders::{default_finders, DesignatorConfig, FinderConfig};
pub use http::{HttpConfig, HttpConfigLayer, DEFAULT_MAX_BUFFERED_RESPONSE_BYTES};
pub use identity::{IdentityConfig, IdentityConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer, DEFAULT_LOG_LEVEL};
pub use objects::{ObjectsConfig, ObjectsConfigLayer, DEFAULT_OBJECTS_ROOT};
pub use pdp::{PdpConfig, PdpConfigLayer, DEFAULT_POLICY_DIR, DEFAULT_RIGHTS_CACHE_CAPACITY};
pub use rights::{default_action_aliases, RightsConfig, RightsConfigLayer, DEFAULT_RIGHTS_DATASTREAM};
pub use routes::{default_rest_routes, default_rpc_routes, RestRouteConfig, RpcRouteConfig};

pub(crate) use finders::validate_finders;
pub(crate) use routes::{validate_rest_routes, validate_rpc_routes};
