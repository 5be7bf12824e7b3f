//! Fork configuration

use std::fmt;
use std::mem::MaybeUninit;
use std::path::Path;
use std::str::FromStr;

use nix::sys::signal::Signal;
use serde::Deserialize;

use crate::error::{ProcessError, Result};

/// Environment variable that overrides the close signal
pub const CLOSE_SIGNAL_ENV: &str = "FORKHANDLE_CLOSE_SIGNAL";

/// Signal sent on close when nothing else is configured
pub const DEFAULT_CLOSE_SIGNAL: i32 = libc::SIGTERM;

/// A signal as written by a user: a raw number or a name like `"SIGINT"`,
/// `"int"` or `"SIGRTMIN+2"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignalSpec {
    Number(i32),
    Name(String),
}

impl SignalSpec {
    /// Numbers become `Number`, anything else is kept as a name
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<i32>() {
            Ok(raw) => Self::Number(raw),
            Err(_) => Self::Name(s.to_string()),
        }
    }

    /// Validate against the host's signal set
    pub fn resolve(&self) -> Result<i32> {
        match self {
            Self::Number(raw) => parse_signal(*raw),
            Self::Name(name) => {
                let upper = name.trim().to_ascii_uppercase();
                let full = if upper.starts_with("SIG") {
                    upper
                } else {
                    format!("SIG{upper}")
                };
                match realtime_signal(&full) {
                    Some(raw) => parse_signal(raw),
                    None => Signal::from_str(&full)
                        .map(|signal| signal as i32)
                        .map_err(|_| ProcessError::config(format!("unknown signal name {name:?}"))),
                }
            }
        }
    }
}

/// `SIGRTMIN`, `SIGRTMIN+n`, `SIGRTMAX`, `SIGRTMAX-n`
#[cfg(any(target_os = "linux", target_os = "android"))]
fn realtime_signal(name: &str) -> Option<i32> {
    let offset = |rest: &str, sign: char| -> Option<i32> {
        if rest.is_empty() {
            return Some(0);
        }
        rest.strip_prefix(sign)?.parse::<i32>().ok()
    };
    if let Some(rest) = name.strip_prefix("SIGRTMIN") {
        return offset(rest, '+').map(|n| libc::SIGRTMIN() + n);
    }
    if let Some(rest) = name.strip_prefix("SIGRTMAX") {
        return offset(rest, '-').map(|n| libc::SIGRTMAX() - n);
    }
    None
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn realtime_name(raw: i32) -> Option<String> {
    (libc::SIGRTMIN()..=libc::SIGRTMAX())
        .contains(&raw)
        .then(|| format!("SIGRTMIN+{}", raw - libc::SIGRTMIN()))
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn realtime_signal(_name: &str) -> Option<i32> {
    None
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn realtime_name(_raw: i32) -> Option<String> {
    None
}

impl From<Signal> for SignalSpec {
    fn from(signal: Signal) -> Self {
        Self::Number(signal as i32)
    }
}

impl From<i32> for SignalSpec {
    fn from(raw: i32) -> Self {
        Self::Number(raw)
    }
}

impl FromStr for SignalSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SignalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(raw) => write!(f, "{raw}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Whether the host accepts `raw` as a signal number.
///
/// `sigaddset` knows the platform's real range, real-time signals included,
/// and refuses numbers reserved by the C library.
pub fn is_valid_signal(raw: i32) -> bool {
    if raw <= 0 {
        return false;
    }
    let mut set = MaybeUninit::<libc::sigset_t>::uninit();
    unsafe {
        libc::sigemptyset(set.as_mut_ptr());
        libc::sigaddset(set.as_mut_ptr(), raw) == 0
    }
}

/// Validate a raw signal number for delivery or as a close signal.
///
/// Zero and negative values are rejected up front, everything else must be a
/// signal the host OS actually defines.
pub fn parse_signal(raw: i32) -> Result<i32> {
    if raw == -1 {
        return Err(ProcessError::config("invalid value for close signal: -1"));
    }
    if raw <= 0 {
        return Err(ProcessError::config(format!(
            "signal number must be positive, got {raw}"
        )));
    }
    if !is_valid_signal(raw) {
        return Err(ProcessError::config(format!(
            "{raw} is not a valid signal on this platform"
        )));
    }
    Ok(raw)
}

/// Human-readable name for a raw signal number
pub fn signal_name(raw: i32) -> String {
    if let Ok(signal) = Signal::try_from(raw) {
        return signal.as_str().to_string();
    }
    realtime_name(raw).unwrap_or_else(|| format!("signal {raw}"))
}

/// Options accepted when forking
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForkConfig {
    /// Signal used by close and by the finalizer (None = SIGTERM)
    pub close_signal: Option<SignalSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    process: ForkConfig,
}

impl ForkConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set close signal
    pub fn with_close_signal(mut self, signal: impl Into<SignalSpec>) -> Self {
        self.close_signal = Some(signal.into());
        self
    }

    /// Parse the `[process]` table of a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| ProcessError::config(format!("malformed config: {e}")))?;
        Ok(file.process)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ProcessError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `FORKHANDLE_CLOSE_SIGNAL` if it is set and non-empty
    pub fn load_from_env(&mut self) {
        if let Ok(value) = std::env::var(CLOSE_SIGNAL_ENV) {
            if !value.trim().is_empty() {
                self.close_signal = Some(SignalSpec::parse(&value));
            }
        }
    }

    /// The configured close signal, validated
    pub fn resolve_close_signal(&self) -> Result<i32> {
        match &self.close_signal {
            Some(spec) => spec.resolve(),
            None => Ok(DEFAULT_CLOSE_SIGNAL),
        }
    }
}
