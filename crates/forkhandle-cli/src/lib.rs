//! # forkhandle-cli
//!
//! Host program for `forkhandle-process`. Each subcommand forks a child and
//! drives one lifecycle path: explicit wait, signal then wait, or drop.

pub mod logging;
pub mod router;
