//! Capability interface for child processes

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::{error::Result, handle::ProcessHandle};

/// The fixed set of operations a host can perform on a child
pub trait ProcessControl: Send + std::fmt::Debug {
    /// Child pid, `None` once detached
    fn pid(&self) -> Option<Pid>;

    /// Non-blocking refresh, then the exit code if the child is gone
    fn exit_code(&mut self) -> Result<Option<i32>>;

    /// Block until the child exits
    fn wait(&mut self) -> Result<i32>;

    /// Poll without blocking
    fn try_wait(&mut self) -> Result<Option<i32>>;

    /// Deliver `signal` unless the child is already gone
    fn signal(&mut self, signal: Signal) -> Result<()>;

    /// Same as `signal`, by raw number (validated, `0` checks existence)
    fn signal_number(&mut self, signal_number: i32) -> Result<()>;

    /// Graceful, idempotent shutdown
    fn close(&mut self) -> Result<()>;
}

impl ProcessControl for ProcessHandle {
    fn pid(&self) -> Option<Pid> {
        ProcessHandle::pid(self)
    }

    fn exit_code(&mut self) -> Result<Option<i32>> {
        ProcessHandle::exit_code(self)
    }

    fn wait(&mut self) -> Result<i32> {
        ProcessHandle::wait(self)
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        ProcessHandle::try_wait(self)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        ProcessHandle::signal(self, signal)
    }

    fn signal_number(&mut self, signal_number: i32) -> Result<()> {
        ProcessHandle::signal_number(self, signal_number)
    }

    fn close(&mut self) -> Result<()> {
        ProcessHandle::close(self)
    }
}
