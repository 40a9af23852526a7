//! Reads just enough of rtl_airband's own config to find its recordings.
//!
//! This is a pattern match, not a libconfig parser: the first
//! `directory = "..."` anywhere in the file wins, whichever output block it
//! belongs to.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

fn directory_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r#"directory\s*=\s*"([^"]+)""#).expect("directory pattern is valid"))
}

pub fn find_directory(content: &str) -> Option<PathBuf> {
	directory_pattern()
		.captures(content)
		.and_then(|caps| caps.get(1))
		.map(|m| PathBuf::from(m.as_str()))
}

/// Recordings directory named in `conf_path`, if any. Relative directories
/// resolve against the config file's own directory, which is where
/// rtl_airband runs.
pub fn recordings_dir(conf_path: &Path) -> Option<PathBuf> {
	let content = match std::fs::read_to_string(conf_path) {
		Ok(c) => c,
		Err(e) => {
			tracing::debug!("cannot read {}: {}", conf_path.display(), e);
			return None;
		}
	};
	let dir = find_directory(&content)?;
	if dir.is_absolute() {
		return Some(dir);
	}
	Some(match conf_path.parent() {
		Some(parent) => parent.join(dir),
		None => dir,
	})
}

pub fn is_audio_file(name: &str) -> bool {
	Path::new(name)
		.extension()
		.and_then(|e| e.to_str())
		.is_some_and(|ext| AUDIO_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

/// Audio files directly inside `dir`, sorted by name. A missing directory
/// lists as empty.
pub fn list_recordings(dir: &Path) -> Vec<String> {
	let entries = match std::fs::read_dir(dir) {
		Ok(e) => e,
		Err(_) => return vec![],
	};

	let mut names: Vec<String> = entries
		.flatten()
		.filter(|entry| entry.path().is_file())
		.filter_map(|entry| entry.file_name().into_string().ok())
		.filter(|name| is_audio_file(name))
		.collect();
	names.sort();
	names
}
