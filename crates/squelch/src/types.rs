use serde::Serialize;
use std::path::PathBuf;

/// The program the supervisor launches, with its fixed arguments.
#[derive(Debug, Clone)]
pub struct CommandSpec {
	pub program: String,
	pub args: Vec<String>,
	pub dir: PathBuf,
}

impl CommandSpec {
	pub fn display(&self) -> String {
		if self.args.is_empty() {
			self.program.clone()
		} else {
			format!("{} {}", self.program, self.args.join(" "))
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
	Started,
	AlreadyRunning,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
	Stopped,
	NotRunning,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProcessStatus {
	pub running: bool,
	pub pid: Option<u32>,
	pub uptime_secs: Option<u64>,
}

impl ProcessStatus {
	pub fn stopped() -> Self {
		Self { running: false, pid: None, uptime_secs: None }
	}
}
