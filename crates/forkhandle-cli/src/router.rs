// Command routing and dispatch

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use forkhandle_process::{
    exit_child, fork, signal_name, ForkConfig, Forked, Pid, ProcessHandle, SignalSpec,
    Termination, WaitMode,
};
use nix::errno::Errno;
use nix::sys::signal::kill;
use tracing::debug;

/// How long a sleeping child waits before giving up on being signalled
const CHILD_SLEEP: Duration = Duration::from_secs(60);

/// forkhandle - fork children and watch their lifecycle
#[derive(Parser, Debug)]
#[command(name = "forkhandle")]
#[command(bin_name = "forkhandle")]
#[command(about = "Fork child processes and drive their lifecycle")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML file with a [process] table
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fork a child that exits with CODE and wait for it
    Exit {
        #[arg(value_parser = clap::value_parser!(i32).range(0..=255))]
        code: i32,
    },

    /// Fork a sleeping child, poll it, signal it and wait
    Kill {
        /// Signal number or name (default: the configured close signal)
        #[arg(short, long)]
        signal: Option<String>,
    },

    /// Fork a sleeping child and drop its handle without closing it
    Drop,
}

fn load_config(path: Option<&PathBuf>) -> Result<ForkConfig> {
    let mut config = match path {
        Some(path) => ForkConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ForkConfig::default(),
    };
    config.load_from_env();
    Ok(config)
}

fn spawn_sleeping(config: &ForkConfig) -> Result<ProcessHandle> {
    // The CLI is single-threaded when it forks, so the child may sleep freely.
    match unsafe { fork(config)? } {
        Forked::Child => {
            std::thread::sleep(CHILD_SLEEP);
            exit_child(0)
        }
        Forked::Parent(handle) => Ok(handle),
    }
}

fn describe(termination: Option<Termination>) -> String {
    match termination {
        Some(Termination::Exited(code)) => format!("exited with status {code}"),
        Some(Termination::Signaled { signal, core_dumped }) => {
            let core = if core_dumped { " (core dumped)" } else { "" };
            format!("killed by {}{core}", signal_name(signal))
        }
        None => "unknown".to_string(),
    }
}

fn run_exit(config: &ForkConfig, code: i32) -> Result<()> {
    let mut handle = match unsafe { fork(config)? } {
        Forked::Child => exit_child(code),
        Forked::Parent(handle) => handle,
    };
    let exit_code = handle.wait()?;
    println!("exit code: {exit_code}");
    Ok(())
}

fn run_kill(config: &ForkConfig, signal: Option<&str>) -> Result<()> {
    let mut handle = spawn_sleeping(config)?;
    let pid = handle.pid().context("fresh handle has no pid")?;

    let poll = handle.wait_with(WaitMode::NonBlocking)?;
    println!("poll: {}", poll.code());

    let signal = match signal {
        Some(spec) => SignalSpec::parse(spec).resolve()?,
        None => handle.close_signal(),
    };
    debug!(pid = %pid, signal = %signal_name(signal), "Signalling child");
    handle.signal_number(signal)?;

    let exit_code = handle.wait()?;
    println!("exit code: {exit_code} ({})", describe(handle.termination()));
    Ok(())
}

fn run_drop(config: &ForkConfig) -> Result<()> {
    let handle = spawn_sleeping(config)?;
    let pid: Pid = handle.pid().context("fresh handle has no pid")?;
    drop(handle);

    match kill(pid, None) {
        Err(Errno::ESRCH) => {
            println!("pid {pid} reaped");
            Ok(())
        }
        Ok(()) => bail!("pid {pid} is still in the process table"),
        Err(e) => bail!("cannot inspect pid {pid}: {}", e.desc()),
    }
}

/// Execute a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    // Validate once up front so every subcommand reports bad config the same way
    config.resolve_close_signal()?;

    match &cli.command {
        Commands::Exit { code } => run_exit(&config, *code),
        Commands::Kill { signal } => run_kill(&config, signal.as_deref()),
        Commands::Drop => run_drop(&config),
    }
}
