//! Runtime driven through the lxc command line tools
use std::any::Any;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use nix::fcntl::OFlag;
use nix::unistd::{geteuid, pipe2};

use super::{AttachOptions, Result, Runtime, RuntimeError};
use crate::container::{validate_name, Container};

const LXC_ATTACH: &str = "lxc-attach";
const LXC_CONFIG: &str = "lxc-config";
const LXC_CREATE: &str = "lxc-create";
const LXC_EXECUTE: &str = "lxc-execute";
const LXC_INFO: &str = "lxc-info";
const LXC_LS: &str = "lxc-ls";
const LXC_START: &str = "lxc-start";
const LXC_WAIT: &str = "lxc-wait";

/// Seconds lxc-wait may spend waiting for a started container
const START_TIMEOUT_SECS: u32 = 30;
const STATE_RUNNING: &str = "RUNNING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    tool: &'static str,
    args: Vec<OsString>,
}

impl Invocation {
    fn new(tool: &'static str) -> Self {
        Self { tool, args: vec![] }
    }

    /// Every tool that operates on a single container takes the same
    /// path, name and logging options
    fn for_container(tool: &'static str, container: &Container) -> Self {
        let invocation = Self::new(tool)
            .arg("-P")
            .arg(container.lxc_path())
            .arg("-n")
            .arg(container.name());

        match container.log_file() {
            Some(log_file) => invocation
                .arg("-o")
                .arg(log_file)
                .arg("-l")
                .arg(container.log_level().to_string()),
            None => invocation,
        }
    }

    fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
        self
    }

    fn command(&self) -> Command {
        tracing::debug!(tool = self.tool, args = ?self.args, "running lxc tool");
        let mut command = Command::new(self.tool);
        command.args(&self.args);
        command
    }

    /// Only the last line the tool printed goes into the error, the rest
    /// is left to the debug log
    fn failed(&self, code: Option<i32>, output: &[u8]) -> RuntimeError {
        let output = String::from_utf8_lossy(output);
        tracing::debug!(tool = self.tool, ?code, %output, "lxc tool failed");
        RuntimeError::ToolFailed {
            tool: self.tool,
            code,
            detail: last_line(&output).to_owned(),
        }
    }

    /// Runs the tool with captured stdout, which is returned on success.
    /// stderr ends up in the error on failure.
    fn output(&self) -> Result<String> {
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RuntimeError::Spawn {
                tool: self.tool,
                source,
            })?;

        if !output.status.success() {
            return Err(self.failed(output.status.code(), &output.stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs the tool attached to the caller's terminal
    fn status(&self) -> Result<()> {
        let status = self
            .command()
            .status()
            .map_err(|source| RuntimeError::Spawn {
                tool: self.tool,
                source,
            })?;

        if !status.success() {
            return Err(self.failed(status.code(), &[]));
        }

        Ok(())
    }

    /// Runs the tool with stdout and stderr sharing a single pipe so the
    /// returned output keeps the order in which it was written
    fn combined_output(&self) -> Result<Vec<u8>> {
        let (reader, writer) = pipe2(OFlag::O_CLOEXEC).map_err(RuntimeError::Pipe)?;
        let stderr = writer.try_clone().map_err(|source| RuntimeError::Output {
            tool: self.tool,
            source,
        })?;

        let mut command = self.command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(stderr));
        let mut child = command.spawn().map_err(|source| RuntimeError::Spawn {
            tool: self.tool,
            source,
        })?;
        // the command still holds the write ends, reading would never see EOF
        drop(command);

        let mut output = Vec::new();
        File::from(reader)
            .read_to_end(&mut output)
            .map_err(|source| RuntimeError::Output {
                tool: self.tool,
                source,
            })?;
        let status = child.wait().map_err(|source| RuntimeError::Output {
            tool: self.tool,
            source,
        })?;

        if !status.success() {
            return Err(self.failed(status.code(), &output));
        }

        Ok(output)
    }
}

pub(crate) fn state_invocation(container: &Container) -> Invocation {
    Invocation::for_container(LXC_INFO, container)
        .arg("-s")
        .arg("-H")
}

pub(crate) fn list_invocation(lxc_path: &Path) -> Invocation {
    Invocation::new(LXC_LS)
        .arg("-P")
        .arg(lxc_path)
        .arg("--line")
        .arg("--defined")
}

pub(crate) fn create_invocation(container: &Container, template: &Path) -> Invocation {
    Invocation::for_container(LXC_CREATE, container)
        .arg("-t")
        .arg(template)
}

pub(crate) fn attach_invocation(container: &Container, options: &AttachOptions) -> Invocation {
    let env_flag = if options.clear_env {
        "--clear-env"
    } else {
        "--keep-env"
    };
    Invocation::for_container(LXC_ATTACH, container).arg(env_flag)
}

/// lxc-execute refuses a container that is already running, a command for
/// one is run through lxc-attach instead
pub(crate) fn execute_invocation(
    container: &Container,
    args: &[String],
    running: bool,
) -> Invocation {
    let invocation = if running {
        attach_invocation(container, &AttachOptions { clear_env: true })
    } else {
        Invocation::for_container(LXC_EXECUTE, container)
    };
    invocation.arg("--").args(args)
}

fn last_line(output: &str) -> &str {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

/// Where liblxc keeps containers when lxc-config can't tell us
fn fallback_lxc_path() -> PathBuf {
    if !geteuid().is_root() {
        if let Ok(home) = env::var("HOME") {
            return Path::new(&home).join(".local/share/lxc");
        }
    }
    PathBuf::from("/var/lib/lxc")
}

pub struct LxcRuntime;

impl LxcRuntime {
    fn is_running(&self, container: &Container) -> Result<bool> {
        let state = state_invocation(container).output()?;
        Ok(state.trim() == STATE_RUNNING)
    }

    /// lxc-attach needs a running container
    fn ensure_running(&self, container: &Container) -> Result<()> {
        if self.is_running(container)? {
            return Ok(());
        }

        tracing::info!(name = container.name(), "starting container");
        Invocation::for_container(LXC_START, container)
            .arg("-d")
            .output()?;
        Invocation::for_container(LXC_WAIT, container)
            .arg("-s")
            .arg(STATE_RUNNING)
            .arg("-t")
            .arg(START_TIMEOUT_SECS.to_string())
            .output()?;
        Ok(())
    }
}

impl Runtime for LxcRuntime {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn default_lxc_path(&self) -> Result<PathBuf> {
        match Invocation::new(LXC_CONFIG).arg("lxc.lxcpath").output() {
            Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path.trim())),
            Ok(_) => {
                tracing::warn!("lxc-config returned no lxc.lxcpath, using the built-in default");
                Ok(fallback_lxc_path())
            }
            Err(err) => {
                tracing::warn!(?err, "could not query lxc-config, using the built-in default");
                Ok(fallback_lxc_path())
            }
        }
    }

    fn defined_containers(&self, lxc_path: &Path) -> Result<Vec<Container>> {
        let listing = list_invocation(lxc_path).output()?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Container::new(name, lxc_path))
            .collect())
    }

    fn allocate(&self, name: &str, lxc_path: &Path) -> Result<Container> {
        validate_name(name).map_err(|source| RuntimeError::InvalidName {
            name: name.to_owned(),
            source,
        })?;

        if !lxc_path.exists() {
            fs::create_dir_all(lxc_path).map_err(|source| RuntimeError::LxcPath {
                path: lxc_path.to_owned(),
                source,
            })?;
        }

        Ok(Container::new(name, lxc_path))
    }

    fn is_defined(&self, container: &Container) -> bool {
        container.config_file().exists()
    }

    fn create(&self, container: &Container, template: &Path) -> Result<()> {
        let output = create_invocation(container, template).output()?;
        tracing::debug!(name = container.name(), %output, "template finished");
        Ok(())
    }

    fn attach_shell(&self, container: &Container, options: &AttachOptions) -> Result<()> {
        self.ensure_running(container)?;
        attach_invocation(container, options).status()
    }

    fn execute(&self, container: &Container, args: &[String]) -> Result<Vec<u8>> {
        let running = self.is_running(container)?;
        execute_invocation(container, args, running).combined_output()
    }
}
