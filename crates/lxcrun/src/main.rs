//! # lxcrun
//! Runs a command in an LXC container, or attaches a shell to it, creating
//! the container from a template the first time its name is used.
mod observability;
mod run;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{crate_version, Parser};
use liblxcrun::runtime::create_runtime;
use liblxcrun_cli::{GlobalOpts, Run};

/// Exit code for every fatal error, including command line parse errors
const FATAL_EXIT_CODE: u8 = 2;

/// output lxcrun version together with the commit it was built from
#[macro_export]
macro_rules! lxcrun_version {
    () => {
        concat!(crate_version!(), "\ncommit: ", env!("VERGEN_GIT_SHA"))
    };
}

#[derive(Parser, Debug)]
#[clap(
    version = lxcrun_version!(),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION")
)]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(flatten)]
    run: Run,
}

/// Parses the flags, resolves the container and runs the session. Help and
/// version exit with 0, everything else that goes wrong exits with 2 after
/// a single `Error:` line on stdout.
fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(err) => return ExitCode::from(report_parse_error(&err)),
    };

    if let Err(e) = observability::init(&opts) {
        eprintln!("log init failed: {:?}", e);
    }

    tracing::debug!(
        "started by user {} with {:?}",
        nix::unistd::geteuid(),
        std::env::args_os()
    );

    let runtime = create_runtime();
    let result = run::run(
        opts.run,
        opts.global.debug,
        runtime.as_ref(),
        &mut io::stdout().lock(),
    );
    ExitCode::from(report(result))
}

/// Prints the usage or help text clap produced and picks the exit code
fn report_parse_error(err: &clap::Error) -> u8 {
    let _ = err.print();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => FATAL_EXIT_CODE,
    }
}

fn report(result: Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!("{:#}", err);
            println!("Error: {:#}", err);
            FATAL_EXIT_CODE
        }
    }
}
