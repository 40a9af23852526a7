//! # squelch
//!
//! Supervise one long-running child process.
//!
//! [`Supervisor`] spawns the configured command with stdout and stderr merged
//! into a single pipe, tails that pipe into a bounded [`LogRing`], and stops
//! the child with SIGTERM followed by SIGKILL after a timeout. Start and stop
//! are idempotent.
//!
//! ```rust,no_run
//! use squelch::{CommandSpec, StartOutcome, Supervisor, SupervisorConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> squelch::Result<()> {
//! let sup = Supervisor::new(SupervisorConfig::new(CommandSpec {
//!     program: "rtl_airband".into(),
//!     args: vec!["-f".into(), "-e".into(), "-c".into(), "airband.conf".into()],
//!     dir: "/opt/airband".into(),
//! }));
//!
//! assert_eq!(sup.start().await?, StartOutcome::Started);
//! for line in sup.logs().await {
//!     println!("{}", line);
//! }
//! sup.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod output;
pub mod supervisor;
pub mod types;

pub use error::{Error, Result};
pub use output::LogRing;
pub use supervisor::{Supervisor, SupervisorConfig};
pub use types::*;
