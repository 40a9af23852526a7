mod airband_conf;
mod api;
mod config;

use anyhow::Context;
use clap::Parser;
use squelch::{StopOutcome, Supervisor};
use std::path::PathBuf;
use std::sync::Arc;

/// Web control panel for rtl_airband.
#[derive(Debug, Parser)]
#[command(name = "airband-panel", version, about)]
struct Args {
	/// Settings file (default: ~/.config/airband-panel/config.toml)
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// Address to listen on
	#[arg(long)]
	host: Option<String>,
	/// HTTP port
	#[arg(short, long)]
	port: Option<u16>,
	/// Directory rtl_airband runs in and where airband.conf lives
	#[arg(short, long)]
	dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt().init();

	let args = Args::parse();
	let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
	let mut cfg = config::load(&config_path);
	if let Some(host) = args.host {
		cfg.server.host = host;
	}
	if let Some(port) = args.port {
		cfg.server.port = port;
	}
	if let Some(dir) = args.dir {
		cfg.airband.dir = Some(dir);
	}

	let supervisor = Supervisor::new(cfg.airband.supervisor_config());
	let state = api::AppState {
		supervisor: Arc::clone(&supervisor),
		airband_conf: cfg.airband.config_path(),
	};
	tracing::info!(
		"supervising `{}` in {}",
		supervisor.config().command.display(),
		supervisor.config().command.dir.display()
	);

	let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind HTTP on {}", addr))?;
	tracing::info!("HTTP listening on http://{}", addr);

	serve(listener, state, shutdown_signal()).await
}

/// Serve until `shutdown` resolves, then stop rtl_airband. The stop runs even
/// when the server itself fails.
async fn serve(
	listener: tokio::net::TcpListener,
	state: api::AppState,
	shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
	let supervisor = Arc::clone(&state.supervisor);
	let served = axum::serve(listener, api::router(state))
		.with_graceful_shutdown(shutdown)
		.await;
	if let Err(e) = &served {
		tracing::error!("HTTP server error: {}", e);
	}

	tracing::info!("shutting down");
	match supervisor.stop().await {
		Ok(StopOutcome::Stopped) => tracing::info!("rtl_airband stopped"),
		Ok(StopOutcome::NotRunning) => {}
		Err(e) => tracing::error!("failed to stop rtl_airband: {}", e),
	}
	served.context("HTTP server error")
}

async fn shutdown_signal() {
	use tokio::signal::unix::{signal, SignalKind};

	let terminate = async {
		match signal(SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				tracing::warn!("cannot listen for SIGTERM: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	tokio::select! {
		_ = tokio::signal::ctrl_c() => {},
		_ = terminate => {},
	}
}
