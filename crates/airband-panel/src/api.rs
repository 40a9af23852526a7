use crate::airband_conf;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_embed::RustEmbed;
use serde::Serialize;
use squelch::{ProcessStatus, StartOutcome, StopOutcome, Supervisor};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

#[derive(Clone)]
pub struct AppState {
	pub supervisor: Arc<Supervisor>,
	/// rtl_airband's config, read on every request for the recordings directory.
	pub airband_conf: PathBuf,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/start", post(start))
		.route("/stop", post(stop))
		.route("/logs", get(logs))
		.route("/status", get(status))
		.route("/recordings/{*filename}", get(serve_recording))
		.fallback(static_handler)
		.layer(CorsLayer::permissive())
		.with_state(state)
}

#[derive(Serialize)]
struct StartResponse {
	status: StartOutcome,
}

#[derive(Serialize)]
struct StopResponse {
	status: StopOutcome,
}

#[derive(Serialize)]
struct LogsResponse {
	lines: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
	error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: squelch::Error) -> ApiError {
	tracing::error!("{}", e);
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(ErrorResponse { error: e.to_string() }),
	)
}

async fn start(State(state): State<AppState>) -> Result<Json<StartResponse>, ApiError> {
	state
		.supervisor
		.start()
		.await
		.map(|status| Json(StartResponse { status }))
		.map_err(internal_error)
}

async fn stop(State(state): State<AppState>) -> Result<Json<StopResponse>, ApiError> {
	state
		.supervisor
		.stop()
		.await
		.map(|status| Json(StopResponse { status }))
		.map_err(internal_error)
}

async fn logs(State(state): State<AppState>) -> Json<LogsResponse> {
	Json(LogsResponse {
		lines: state.supervisor.logs().await,
	})
}

async fn status(State(state): State<AppState>) -> Json<ProcessStatus> {
	Json(state.supervisor.status().await)
}

async fn index(State(state): State<AppState>) -> Response {
	let recordings = airband_conf::recordings_dir(&state.airband_conf)
		.map(|dir| airband_conf::list_recordings(&dir))
		.unwrap_or_default();

	let Some(page) = Assets::get("index.html") else {
		return (StatusCode::NOT_FOUND, "Not Found").into_response();
	};
	let html = String::from_utf8_lossy(&page.data).replace("{{recordings}}", &render_recordings(&recordings));
	Html(html).into_response()
}

async fn serve_recording(State(state): State<AppState>, request: Request) -> Response {
	let Some(dir) = airband_conf::recordings_dir(&state.airband_conf) else {
		return (StatusCode::NOT_FOUND, "Recording directory not configured").into_response();
	};

	// ServeDir resolves the still-encoded path below /recordings and refuses
	// anything that climbs out of `dir`.
	let (mut parts, body) = request.into_parts();
	let inner = parts.uri.path().strip_prefix("/recordings").unwrap_or("/");
	parts.uri = match inner.parse() {
		Ok(uri) => uri,
		Err(_) => return StatusCode::BAD_REQUEST.into_response(),
	};

	let service = ServeDir::new(dir).append_index_html_on_directories(false);
	match service.oneshot(Request::from_parts(parts, body)).await {
		Ok(res) => res.into_response(),
		Err(never) => match never {},
	}
}

async fn static_handler(uri: axum::http::Uri) -> Response {
	let path = uri.path().trim_start_matches('/');
	match Assets::get(path) {
		Some(content) => {
			let mime = mime_guess::from_path(path).first_or_octet_stream();
			([(header::CONTENT_TYPE, mime.to_string())], content.data).into_response()
		}
		None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
	}
}

fn render_recordings(names: &[String]) -> String {
	if names.is_empty() {
		return "\t\t\t<li class=\"empty\">No recordings</li>".to_string();
	}
	names
		.iter()
		.map(|name| {
			let href = format!("/recordings/{}", encode_path_segment(name));
			let label = escape_html(name);
			format!(
				"\t\t\t<li><a href=\"{href}\">{label}</a><audio controls preload=\"none\" src=\"{href}\"></audio></li>"
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

fn escape_html(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}

fn encode_path_segment(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for b in s.bytes() {
		match b {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
			_ => out.push_str(&format!("%{:02X}", b)),
		}
	}
	out
}
