use std::path::PathBuf;

use clap::Parser;

mod run;

pub use run::Run;

// Flags that only affect lxcrun's own logging, not the container
#[derive(Parser, Debug)]
pub struct GlobalOpts {
    /// set the log file to write lxcrun logs to (default is '/dev/stderr')
    #[clap(short, long, overrides_with("log"))]
    pub log: Option<PathBuf>,
    /// dump the resolved container and configuration, and log at debug level
    /// unless `--log-level` is given
    #[clap(short = 'D', long)]
    pub debug: bool,
    /// set the log format ('text' (default), or 'json') (default: "text")
    #[clap(long)]
    pub log_format: Option<String>,
    /// set the log level (default: 'error' in release builds, 'debug' otherwise)
    #[clap(long)]
    pub log_level: Option<String>,
    /// also send logs to the systemd journal
    #[clap(long)]
    pub systemd_log: bool,
}
