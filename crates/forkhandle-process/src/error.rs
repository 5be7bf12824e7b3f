//! Error types for forked process management

use nix::errno::Errno;
use nix::unistd::Pid;
use thiserror::Error;

/// Process lifecycle errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The OS refused to duplicate the calling process
    #[error("fork failed: {}", .0.desc())]
    SpawnFailure(#[source] Errno),

    /// Invalid close signal or signal number
    #[error("invalid process configuration: {0}")]
    ConfigurationError(String),

    /// Querying the child's status failed
    #[error("error waiting for process {pid}: {}", source.desc())]
    WaitFailure {
        pid: Pid,
        #[source]
        source: Errno,
    },

    /// Delivering a signal to the child failed
    #[error("unable to signal process {pid} with {}: {}", crate::config::signal_name(*signal), source.desc())]
    SignalFailure {
        pid: Pid,
        signal: i32,
        #[source]
        source: Errno,
    },

    /// Internal invariant violated
    #[error("invalid process state: {0}")]
    InvalidState(String),
}

impl ProcessError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// OS error behind this failure, if any
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::SpawnFailure(errno) => Some(*errno),
            Self::WaitFailure { source, .. } | Self::SignalFailure { source, .. } => Some(*source),
            Self::ConfigurationError(_) | Self::InvalidState(_) => None,
        }
    }
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failure_carries_os_description() {
        let err = ProcessError::SpawnFailure(Errno::EAGAIN);
        assert_eq!(err.errno(), Some(Errno::EAGAIN));
        assert!(err.to_string().starts_with("fork failed: "));
        assert!(err.to_string().contains(Errno::EAGAIN.desc()));
    }

    #[test]
    fn test_signal_failure_message() {
        let err = ProcessError::SignalFailure {
            pid: Pid::from_raw(4242),
            signal: libc::SIGTERM,
            source: Errno::EPERM,
        };
        let msg = err.to_string();
        assert!(msg.contains("4242"));
        assert!(msg.contains("SIGTERM"));
    }

    #[test]
    fn test_config_error_has_no_errno() {
        assert_eq!(ProcessError::config("bad").errno(), None);
        assert_eq!(ProcessError::invalid_state("bad").errno(), None);
    }
}
