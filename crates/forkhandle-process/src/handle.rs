//! Owning handle for a forked child process

use std::fmt;

use libc::c_int;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::{getpid, Pid};
use tracing::{debug, warn};

use crate::{
    config::{parse_signal, signal_name, DEFAULT_CLOSE_SIGNAL},
    error::{ProcessError, Result},
    status::{normalize_exit_code, termination_of, Termination, WaitMode, WaitOutcome},
};

/// Repeat an OS call until it finishes with something other than `EINTR`
fn retry_on_eintr<T>(mut call: impl FnMut() -> nix::Result<T>) -> nix::Result<T> {
    loop {
        match call() {
            Err(Errno::EINTR) => continue,
            result => return result,
        }
    }
}

/// `kill(2)` by raw number, so signals `nix` has no variant for still go out
fn send_signal(pid: Pid, signal: c_int) -> nix::Result<()> {
    retry_on_eintr(|| Errno::result(unsafe { libc::kill(pid.as_raw(), signal) }).map(drop))
}

/// `waitpid(2)` keeping the raw status word. `None` means WNOHANG found
/// the child still running.
fn wait_raw(pid: Pid, flags: c_int) -> nix::Result<Option<c_int>> {
    let mut status: c_int = 0;
    let reaped = retry_on_eintr(|| {
        Errno::result(unsafe { libc::waitpid(pid.as_raw(), &mut status, flags) })
    })?;
    Ok((reaped != 0).then_some(status))
}

/// Owning reference to a forked child and its cached termination state.
///
/// Dropping a handle whose child has not been reaped sends the close signal
/// and blocks until the child is gone, so a handle never leaves a running
/// process or a zombie behind. Call [`close`](Self::close) or
/// [`wait`](Self::wait) to observe errors that the drop path would swallow.
///
/// A handle is only attached in the process that created it. Copies that a
/// forked child inherits from its parent report no pid and treat every
/// operation as a no-op, so the child cannot kill or reap its siblings.
pub struct ProcessHandle {
    /// Child pid, fixed at creation
    pid: Option<Pid>,
    /// Process that created the handle
    owner: Pid,
    close_signal: c_int,
    terminated: bool,
    /// Last terminal status word, only meaningful once `terminated` is set
    raw_status: Option<c_int>,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid, close_signal: c_int) -> Self {
        Self {
            pid: Some(pid),
            owner: getpid(),
            close_signal,
            terminated: false,
            raw_status: None,
        }
    }

    /// A handle with no process behind it
    pub fn detached() -> Self {
        Self {
            pid: None,
            owner: getpid(),
            close_signal: DEFAULT_CLOSE_SIGNAL,
            terminated: false,
            raw_status: None,
        }
    }

    fn attached_pid(&self) -> Option<Pid> {
        self.pid.filter(|_| getpid() == self.owner)
    }

    /// Child pid, still reported after the child exits. `None` when detached.
    pub fn pid(&self) -> Option<Pid> {
        self.attached_pid()
    }

    /// Signal number sent by close and on drop
    pub fn close_signal(&self) -> i32 {
        self.close_signal
    }

    /// Whether a terminal status has been observed (always true when detached)
    pub fn is_terminated(&self) -> bool {
        self.terminated || self.attached_pid().is_none()
    }

    /// How the child ended, with the signal number the exit code drops
    pub fn termination(&self) -> Option<Termination> {
        if !self.terminated {
            return None;
        }
        self.raw_status.and_then(termination_of)
    }

    fn cached_exit_code(&self) -> Result<i32> {
        if !self.terminated {
            return Err(ProcessError::invalid_state(
                "exit code requested before the process was reaped",
            ));
        }
        match self.raw_status {
            Some(status) => normalize_exit_code(status),
            None => Err(ProcessError::invalid_state(
                "process was marked terminated without a status",
            )),
        }
    }

    /// Query the child's status, reaping it if it has exited.
    ///
    /// Once a terminal status is cached, later calls return it without
    /// touching the OS.
    pub fn wait_with(&mut self, mode: WaitMode) -> Result<WaitOutcome> {
        let pid = self
            .attached_pid()
            .ok_or_else(|| ProcessError::invalid_state("no process attached to handle"))?;

        if self.terminated {
            return self.cached_exit_code().map(WaitOutcome::Exited);
        }

        let status = match wait_raw(pid, mode.flags())
            .map_err(|source| ProcessError::WaitFailure { pid, source })?
        {
            Some(status) => status,
            None => return Ok(WaitOutcome::Running),
        };

        // Reaped: from here on the pid may belong to another process.
        self.terminated = true;
        self.raw_status = Some(status);
        debug!(pid = %pid, termination = ?termination_of(status), "Process reaped");

        self.cached_exit_code().map(WaitOutcome::Exited)
    }

    /// Block until the child exits and return its normalized exit code
    pub fn wait(&mut self) -> Result<i32> {
        match self.wait_with(WaitMode::Blocking)? {
            WaitOutcome::Exited(code) => Ok(code),
            WaitOutcome::Running => Err(ProcessError::invalid_state(
                "blocking wait returned while the process was still running",
            )),
        }
    }

    /// Non-blocking wait: `None` while the child is still running
    pub fn try_wait(&mut self) -> Result<Option<i32>> {
        self.wait_with(WaitMode::NonBlocking).map(WaitOutcome::exit_code)
    }

    /// Refresh without blocking, then report the exit code if there is one
    pub fn exit_code(&mut self) -> Result<Option<i32>> {
        if self.attached_pid().is_none() {
            return Ok(None);
        }
        self.try_wait()
    }

    /// Deliver a signal. Succeeds without doing anything once the child is gone.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        self.deliver(signal as c_int)
    }

    /// Deliver a signal given by number, validating it first.
    ///
    /// Real-time signals are accepted. `0` is the existence check: nothing
    /// is delivered, only the permission and liveness checks run.
    pub fn signal_number(&self, signal_number: i32) -> Result<()> {
        if signal_number != 0 {
            parse_signal(signal_number)?;
        }
        self.deliver(signal_number)
    }

    fn deliver(&self, signal: c_int) -> Result<()> {
        let pid = match self.attached_pid() {
            Some(pid) if !self.terminated => pid,
            _ => return Ok(()),
        };

        debug!(pid = %pid, signal = %signal_name(signal), "Signalling process");
        send_signal(pid, signal).map_err(|source| ProcessError::SignalFailure {
            pid,
            signal,
            source,
        })
    }

    /// Send the close signal and wait for the child to exit.
    ///
    /// Idempotent: once the child is reaped this does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.is_terminated() {
            return Ok(());
        }

        self.deliver(self.close_signal)?;
        self.wait()?;
        Ok(())
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        let Some(pid) = self.attached_pid() else {
            return;
        };
        if self.terminated {
            return;
        }

        debug!(pid = %pid, signal = %signal_name(self.close_signal), "Finalizing unreaped process");

        if let Err(e) = send_signal(pid, self.close_signal) {
            warn!(pid = %pid, error = %e, "Failed to signal process during finalization");
        }

        if let Err(e) = self.wait() {
            warn!(pid = %pid, error = %e, "Failed to reap process during finalization");
            self.terminated = true;
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("close_signal", &self.close_signal)
            .field("terminated", &self.terminated)
            .finish()
    }
}
