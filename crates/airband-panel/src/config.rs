use serde::Deserialize;
use squelch::{CommandSpec, SupervisorConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Panel config (~/.config/airband-panel/config.toml) ──────────────────────

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PanelConfig {
	#[serde(default)]
	pub server: ServerConfig,
	#[serde(default)]
	pub airband: AirbandConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { host: default_host(), port: default_port() }
	}
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct AirbandConfig {
	#[serde(default = "default_binary")]
	pub binary: String,
	#[serde(default = "default_args")]
	pub args: Vec<String>,
	/// Working directory for rtl_airband. Defaults to the directory holding
	/// the panel executable.
	pub dir: Option<PathBuf>,
	/// Relative paths resolve against `dir`.
	#[serde(default = "default_config_file")]
	pub config_file: PathBuf,
	#[serde(default = "default_stop_timeout")]
	pub stop_timeout_secs: u64,
	#[serde(default = "default_log_lines")]
	pub log_lines: usize,
}

impl Default for AirbandConfig {
	fn default() -> Self {
		Self {
			binary: default_binary(),
			args: default_args(),
			dir: None,
			config_file: default_config_file(),
			stop_timeout_secs: default_stop_timeout(),
			log_lines: default_log_lines(),
		}
	}
}

fn default_binary() -> String { "rtl_airband".into() }
fn default_args() -> Vec<String> {
	["-f", "-e", "-c", "airband.conf"].iter().map(|s| s.to_string()).collect()
}
fn default_config_file() -> PathBuf { PathBuf::from("airband.conf") }
fn default_stop_timeout() -> u64 { 5 }
fn default_log_lines() -> usize { 200 }

impl AirbandConfig {
	pub fn work_dir(&self) -> PathBuf {
		self.dir.clone().unwrap_or_else(install_dir)
	}

	pub fn config_path(&self) -> PathBuf {
		if self.config_file.is_absolute() {
			self.config_file.clone()
		} else {
			self.work_dir().join(&self.config_file)
		}
	}

	pub fn supervisor_config(&self) -> SupervisorConfig {
		let mut config = SupervisorConfig::new(CommandSpec {
			program: self.binary.clone(),
			args: self.args.clone(),
			dir: self.work_dir(),
		});
		config.stop_timeout = Duration::from_secs(self.stop_timeout_secs);
		config.log_capacity = self.log_lines;
		config
	}
}

fn install_dir() -> PathBuf {
	std::env::current_exe()
		.ok()
		.and_then(|exe| exe.parent().map(Path::to_path_buf))
		.unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_dir() -> PathBuf {
	if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
		return PathBuf::from(xdg).join("airband-panel");
	}
	match std::env::var("HOME") {
		Ok(home) => PathBuf::from(home).join(".config").join("airband-panel"),
		Err(_) => PathBuf::from("/etc/airband-panel"),
	}
}

pub fn default_config_path() -> PathBuf {
	config_dir().join("config.toml")
}

pub fn parse(content: &str) -> Result<PanelConfig, toml::de::Error> {
	toml::from_str(content)
}

/// Missing file means defaults. A file that can't be read or parsed is
/// reported and also falls back to defaults.
pub fn load(path: &Path) -> PanelConfig {
	if path.exists() {
		match std::fs::read_to_string(path) {
			Ok(content) => match parse(&content) {
				Ok(config) => return config,
				Err(e) => tracing::warn!("failed to parse {}: {}", path.display(), e),
			},
			Err(e) => tracing::warn!("failed to read {}: {}", path.display(), e),
		}
	} else {
		tracing::debug!("no config at {}, using defaults", path.display());
	}
	PanelConfig::default()
}
