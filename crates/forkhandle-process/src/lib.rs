//! # forkhandle-process
//!
//! **Purpose**: Lifecycle management for children created by duplicating
//! the calling process
//!
//! A [`ProcessHandle`] owns one forked child. It caches the child's
//! termination status, delivers signals, and guarantees on drop that the
//! child is neither left running nor left as a zombie.
//!
//! ## Features
//!
//! - **Duplication**: [`fork`] returns [`Forked::Child`] or [`Forked::Parent`]
//! - **Status**: blocking and non-blocking waits with normalized exit codes
//! - **Signals**: validated delivery by name or number (real-time signals
//!   included), no-op once the child is gone
//! - **Close**: idempotent close signal + reap, also run on drop
//! - **Configuration**: close signal from code, TOML or the environment
//!
//! ## Usage
//!
//! ```rust,no_run
//! use forkhandle_process::{exit_child, fork, ForkConfig, Forked, Signal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ForkConfig::new().with_close_signal(Signal::SIGINT);
//!
//! match unsafe { fork(&config)? } {
//!     Forked::Child => exit_child(0),
//!     Forked::Parent(mut child) => {
//!         // Poll, then shut down
//!         if child.try_wait()?.is_none() {
//!             child.close()?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod fork;
pub mod handle;
pub mod status;

pub use config::{
    is_valid_signal, parse_signal, signal_name, ForkConfig, SignalSpec, CLOSE_SIGNAL_ENV,
    DEFAULT_CLOSE_SIGNAL,
};
pub use control::ProcessControl;
pub use error::{ProcessError, Result};
pub use fork::{exit_child, fork, Forked};
pub use handle::ProcessHandle;
pub use status::{
    normalize_exit_code, Termination, WaitMode, WaitOutcome, SIGNALED_EXIT_CODE, STILL_RUNNING,
};

pub use nix::sys::signal::Signal;
pub use nix::unistd::Pid;
