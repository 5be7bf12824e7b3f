// forkhandle CLI entry point

use clap::Parser;
use forkhandle_cli::{logging, router::Cli};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    if let Err(e) = forkhandle_cli::router::run(cli) {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
