//! Process duplication

use nix::unistd::{self, ForkResult};
use tracing::{debug, error, info};

use crate::{
    config::{signal_name, ForkConfig},
    error::{ProcessError, Result},
    handle::ProcessHandle,
};

/// Which side of a fork the caller is on
#[derive(Debug)]
#[must_use = "dropping the parent side immediately terminates the child"]
pub enum Forked {
    /// Running in the duplicate; there is no handle
    Child,
    /// Running in the original, holding the child's handle
    Parent(ProcessHandle),
}

impl Forked {
    /// True in the duplicate
    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child)
    }

    /// The handle, if this is the parent side
    pub fn into_handle(self) -> Option<ProcessHandle> {
        match self {
            Self::Child => None,
            Self::Parent(handle) => Some(handle),
        }
    }
}

/// Duplicate the calling process.
///
/// The close signal is validated before anything else happens, so a bad
/// configuration never produces a child.
///
/// # Examples
/// ```no_run
/// use forkhandle_process::{fork, exit_child, ForkConfig, Forked};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// match unsafe { fork(&ForkConfig::default())? } {
///     Forked::Child => exit_child(7),
///     Forked::Parent(mut handle) => assert_eq!(handle.wait()?, 7),
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Safety
///
/// Same contract as [`nix::unistd::fork`]: if the caller is multi-threaded,
/// the child may only use async-signal-safe functions until it execs or
/// exits (see [`exit_child`]). Memory allocation, locking and logging are
/// all off limits there.
pub unsafe fn fork(config: &ForkConfig) -> Result<Forked> {
    let close_signal = config.resolve_close_signal()?;

    debug!(close_signal = %signal_name(close_signal), "Forking process");

    match unsafe { unistd::fork() } {
        Ok(ForkResult::Child) => Ok(Forked::Child),
        Ok(ForkResult::Parent { child }) => {
            info!(pid = %child, "Process forked");
            Ok(Forked::Parent(ProcessHandle::new(child, close_signal)))
        }
        Err(errno) => {
            error!(error = %errno, "Fork failed");
            Err(ProcessError::SpawnFailure(errno))
        }
    }
}

/// End the child branch immediately.
///
/// Skips atexit handlers, destructors and stdio flushing, none of which are
/// safe in a child forked from a multi-threaded parent.
pub fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}
