use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to create output pipe: {0}")]
	Pipe(#[source] std::io::Error),

	#[error("failed to spawn `{command}`: {source}")]
	Spawn {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to signal pid {pid}: {source}")]
	Signal {
		pid: u32,
		#[source]
		source: nix::Error,
	},

	#[error("failed to wait on child: {0}")]
	Wait(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
