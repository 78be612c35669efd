use std::io::Write;

use serde::Serialize;

use crate::container::Container;
use crate::runtime::{AttachOptions, Runtime, RuntimeError};

/// What to do once the container is resolved. Interactive sessions carry no
/// command, so only one of the two modes can ever be requested.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "mode", content = "command")]
pub enum Session {
    /// Attach a shell to the container's terminal
    Interactive,
    /// Run a single command and print its output
    Execute(Vec<String>),
}

impl Session {
    /// The command is ignored when `interactive` is set
    pub fn new(interactive: bool, command: Vec<String>) -> Self {
        if interactive {
            Session::Interactive
        } else {
            Session::Execute(command)
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Session::Interactive)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to attach to container {name:?}")]
    Attach { name: String, source: RuntimeError },
    #[error("failed to execute {args:?} in container {name:?}")]
    Execution {
        name: String,
        args: Vec<String>,
        source: RuntimeError,
    },
    #[error("no command given for container {name:?}")]
    EmptyCommand { name: String },
    #[error("failed to write command output")]
    WriteOutput(#[source] std::io::Error),
}

type Result<T> = std::result::Result<T, DispatchError>;

pub struct SessionDispatcher<'a> {
    runtime: &'a dyn Runtime,
}

impl<'a> SessionDispatcher<'a> {
    pub fn new(runtime: &'a dyn Runtime) -> Self {
        Self { runtime }
    }

    /// Runs `session` in `container`, blocking until it finishes. Output of
    /// an executed command goes to `out` unchanged.
    pub fn dispatch<W: Write>(
        &self,
        container: &Container,
        session: &Session,
        out: &mut W,
    ) -> Result<()> {
        match session {
            Session::Interactive => self.attach(container),
            Session::Execute(args) => self.execute(container, args, out),
        }
    }

    fn attach(&self, container: &Container) -> Result<()> {
        let options = AttachOptions { clear_env: true };
        tracing::debug!(name = container.name(), ?options, "attaching to container");
        self.runtime
            .attach_shell(container, &options)
            .map_err(|source| DispatchError::Attach {
                name: container.name().to_owned(),
                source,
            })
    }

    fn execute<W: Write>(&self, container: &Container, args: &[String], out: &mut W) -> Result<()> {
        if args.is_empty() {
            return Err(DispatchError::EmptyCommand {
                name: container.name().to_owned(),
            });
        }

        tracing::debug!(name = container.name(), ?args, "executing in container");
        let output =
            self.runtime
                .execute(container, args)
                .map_err(|source| DispatchError::Execution {
                    name: container.name().to_owned(),
                    args: args.to_vec(),
                    source,
                })?;

        out.write_all(&output).map_err(DispatchError::WriteOutput)?;
        out.flush().map_err(DispatchError::WriteOutput)?;
        Ok(())
    }
}
