// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden authorization server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_server::{build_services, create_router, version};

/// Warden server - policy decision and enforcement over HTTP.
#[derive(Parser, Debug)]
#[command(
	name = "warden-server",
	about = "Warden authorization server",
	version
)]
struct Args {
	/// Configuration file; defaults to /etc/warden/server.toml
	#[arg(long, env = "WARDEN_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// Load configuration, build every service, and exit
	CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => warden_server_config::load_config_with_file(path)?,
		None => warden_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let services = build_services(&config)?;

	if let Some(Command::CheckConfig) = args.command {
		println!(
			"configuration ok: {} policies, {} finders, {} REST routes",
			services.store.list_policies()?.len(),
			services.pdp.finders().len(),
			services.rest_routes.len(),
		);
		return Ok(());
	}

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		policy_dir = %config.pdp.policy_dir.display(),
		"starting warden-server"
	);

	let app = create_router(&services).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	tracing::info!(addr = %addr, "listening");
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
