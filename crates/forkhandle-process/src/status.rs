//! Wait status decoding
//!
//! The OS reports how a child ended as a raw `waitpid` status word. Callers
//! only ever see the normalized integer exit code (or a [`Termination`]
//! summary), never the word itself.

use libc::c_int;
use nix::sys::signal::Signal;

use crate::error::{ProcessError, Result};

/// Exit code reported for every child killed by a signal
pub const SIGNALED_EXIT_CODE: i32 = 129;

/// Host-facing code for a child that has not changed state yet
pub const STILL_RUNNING: i32 = -1;

/// Whether a wait may suspend the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Blocking,
    NonBlocking,
}

impl WaitMode {
    pub(crate) fn flags(self) -> c_int {
        match self {
            Self::Blocking => 0,
            Self::NonBlocking => libc::WNOHANG,
        }
    }
}

/// Result of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Non-blocking wait found the child still alive
    Running,
    /// Child is gone; normalized exit code
    Exited(i32),
}

impl WaitOutcome {
    /// Integer form, [`STILL_RUNNING`] while the child is alive
    pub fn code(self) -> i32 {
        match self {
            Self::Running => STILL_RUNNING,
            Self::Exited(code) => code,
        }
    }

    /// The exit code, `None` while the child is alive
    pub fn exit_code(self) -> Option<i32> {
        match self {
            Self::Running => None,
            Self::Exited(code) => Some(code),
        }
    }
}

/// How a child ended, including the signal the exit code leaves out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// `signal` is the raw number, real-time signals included
    Signaled { signal: i32, core_dumped: bool },
}

impl Termination {
    /// The terminating signal when it is one `nix` has a name for
    pub fn named_signal(self) -> Option<Signal> {
        match self {
            Self::Signaled { signal, .. } => Signal::try_from(signal).ok(),
            Self::Exited(_) => None,
        }
    }
}

/// Collapse a terminal raw wait status into an exit code.
///
/// Normal exits keep their status, any signal death becomes
/// [`SIGNALED_EXIT_CODE`] whatever the signal. Stopped and continued
/// statuses are not terminal and are rejected.
pub fn normalize_exit_code(raw_status: c_int) -> Result<i32> {
    if libc::WIFEXITED(raw_status) {
        Ok(libc::WEXITSTATUS(raw_status))
    } else if libc::WIFSIGNALED(raw_status) {
        Ok(SIGNALED_EXIT_CODE)
    } else {
        Err(ProcessError::invalid_state(format!(
            "unrecognized wait status {raw_status:#x}"
        )))
    }
}

pub(crate) fn termination_of(raw_status: c_int) -> Option<Termination> {
    if libc::WIFEXITED(raw_status) {
        Some(Termination::Exited(libc::WEXITSTATUS(raw_status)))
    } else if libc::WIFSIGNALED(raw_status) {
        Some(Termination::Signaled {
            signal: libc::WTERMSIG(raw_status),
            core_dumped: libc::WCOREDUMP(raw_status),
        })
    } else {
        None
    }
}
