use nix::sys::signal::Signal;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::output::{self, LogRing};
use crate::types::*;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
	pub command: CommandSpec,
	/// How long SIGTERM gets before SIGKILL.
	pub stop_timeout: Duration,
	pub log_capacity: usize,
}

impl SupervisorConfig {
	pub fn new(command: CommandSpec) -> Self {
		Self {
			command,
			stop_timeout: DEFAULT_STOP_TIMEOUT,
			log_capacity: output::DEFAULT_CAPACITY,
		}
	}
}

/// Owns at most one child process and the ring its output drains into.
pub struct Supervisor {
	config: SupervisorConfig,
	process: Mutex<Option<ManagedProcess>>,
	output: LogRing,
}

struct ManagedProcess {
	child: Child,
	started_at: Instant,
}

impl ManagedProcess {
	/// Non-blocking liveness check. Reaps the child if it has exited.
	fn is_alive(&mut self) -> bool {
		match self.child.try_wait() {
			Ok(None) => true,
			Ok(Some(status)) => {
				info!("process exited on its own: {}", status);
				false
			}
			Err(e) => {
				warn!("failed to poll process: {}", e);
				false
			}
		}
	}
}

impl Supervisor {
	pub fn new(config: SupervisorConfig) -> Arc<Self> {
		let output = LogRing::new(config.log_capacity);
		Arc::new(Self {
			config,
			process: Mutex::new(None),
			output,
		})
	}

	pub fn config(&self) -> &SupervisorConfig {
		&self.config
	}

	pub async fn logs(&self) -> Vec<String> {
		self.output.snapshot().await
	}

	pub async fn status(&self) -> ProcessStatus {
		let mut slot = self.process.lock().await;
		let alive = slot.as_mut().is_some_and(|mp| mp.is_alive());
		if !alive {
			*slot = None;
			return ProcessStatus::stopped();
		}
		match slot.as_ref() {
			Some(mp) => ProcessStatus {
				running: true,
				pid: mp.child.id(),
				uptime_secs: Some(mp.started_at.elapsed().as_secs()),
			},
			None => ProcessStatus::stopped(),
		}
	}

	pub async fn start(&self) -> Result<StartOutcome> {
		let mut slot = self.process.lock().await;
		if let Some(mp) = slot.as_mut() {
			if mp.is_alive() {
				return Ok(StartOutcome::AlreadyRunning);
			}
		}
		*slot = None;

		let spec = &self.config.command;
		let (read_end, write_end) = cloexec_pipe().map_err(Error::Pipe)?;
		let stderr_end = write_end.try_clone().map_err(Error::Pipe)?;
		let receiver = pipe::Receiver::from_owned_fd(read_end).map_err(Error::Pipe)?;

		let mut cmd = Command::new(&spec.program);
		cmd.args(&spec.args)
			.current_dir(&spec.dir)
			.stdin(Stdio::null())
			.stdout(Stdio::from(write_end))
			.stderr(Stdio::from(stderr_end))
			.process_group(0)
			.kill_on_drop(true);

		let child = cmd.spawn().map_err(|source| Error::Spawn {
			command: spec.display(),
			source,
		})?;
		// Close our copies of the write end so the tailer sees EOF when the child exits.
		drop(cmd);

		let ring = self.output.clone();
		tokio::spawn(async move {
			let count = output::tail_lines(receiver, ring).await;
			debug!("output stream closed after {} lines", count);
		});

		info!(
			"started `{}` (pid {}) in {}",
			spec.display(),
			child.id().unwrap_or_default(),
			spec.dir.display()
		);

		*slot = Some(ManagedProcess {
			child,
			started_at: Instant::now(),
		});
		Ok(StartOutcome::Started)
	}

	/// SIGTERM, wait up to the stop timeout, then SIGKILL. Both paths report
	/// `Stopped`.
	///
	/// The child stays in the slot until it has been reaped, so a stop that is
	/// cancelled or fails part way still leaves it tracked.
	pub async fn stop(&self) -> Result<StopOutcome> {
		let mut slot = self.process.lock().await;
		let Some(mp) = slot.as_mut() else {
			return Ok(StopOutcome::NotRunning);
		};
		if !mp.is_alive() {
			*slot = None;
			return Ok(StopOutcome::NotRunning);
		}
		let Some(pid) = mp.child.id() else {
			*slot = None;
			return Ok(StopOutcome::NotRunning);
		};

		info!("stopping pid {}", pid);
		signal_group(pid, Signal::SIGTERM)?;

		match tokio::time::timeout(self.config.stop_timeout, mp.child.wait()).await {
			Ok(status) => {
				let status = status.map_err(Error::Wait)?;
				info!("pid {} exited: {}", pid, status);
			}
			Err(_) => {
				warn!(
					"pid {} still alive after {:?}, sending SIGKILL",
					pid, self.config.stop_timeout
				);
				signal_group(pid, Signal::SIGKILL)?;
				let status = mp.child.wait().await.map_err(Error::Wait)?;
				info!("pid {} killed: {}", pid, status);
			}
		}

		*slot = None;
		Ok(StopOutcome::Stopped)
	}
}

/// Signal the child's whole process group. A group that is already gone is
/// not an error.
fn signal_group(pid: u32, signal: Signal) -> Result<()> {
	use nix::errno::Errno;
	use nix::sys::signal::killpg;
	use nix::unistd::Pid;

	match killpg(Pid::from_raw(pid as i32), signal) {
		Ok(()) | Err(Errno::ESRCH) => Ok(()),
		Err(source) => Err(Error::Signal { pid, source }),
	}
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn cloexec_pipe() -> std::io::Result<(OwnedFd, OwnedFd)> {
	use nix::fcntl::OFlag;

	Ok(nix::unistd::pipe2(OFlag::O_CLOEXEC)?)
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn cloexec_pipe() -> std::io::Result<(OwnedFd, OwnedFd)> {
	use nix::fcntl::{fcntl, FcntlArg, FdFlag};
	use std::os::fd::AsRawFd;

	let (read_end, write_end) = nix::unistd::pipe()?;
	for fd in [&read_end, &write_end] {
		fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
	}
	Ok((read_end, write_end))
}
