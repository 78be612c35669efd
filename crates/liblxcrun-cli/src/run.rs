use std::path::PathBuf;

use clap::Parser;
use liblxcrun::config::{DEFAULT_INTERFACE, DEFAULT_TEMPLATE};
use liblxcrun::container::resolver::DEFAULT_CONTAINER_LOG_DIR;

/// Find or create a container, then run a command in it or attach a shell
#[derive(Parser, Debug)]
pub struct Run {
    /// Name of the container, a random one is generated when omitted
    #[clap(short, long)]
    pub name: Option<String>,
    /// Network interface address hint
    #[clap(short, long, default_value = DEFAULT_INTERFACE)]
    pub interface: String,
    /// Directory holding the containers (default: the lxc default path)
    #[clap(short = 'p', long)]
    pub lxcpath: Option<PathBuf>,
    /// Template used to create the container if it does not exist yet
    #[clap(short, long, default_value = DEFAULT_TEMPLATE)]
    pub template: PathBuf,
    /// Attach an interactive shell instead of running a command
    #[clap(short = 'I', long)]
    pub interactive: bool,
    /// Directory receiving the lxc log of each container as <name>.log
    #[clap(long, default_value = DEFAULT_CONTAINER_LOG_DIR)]
    pub container_log_dir: PathBuf,
    /// Command and arguments to run inside the container
    #[clap(required_unless_present = "interactive", trailing_var_arg = true)]
    pub command: Vec<String>,
}
