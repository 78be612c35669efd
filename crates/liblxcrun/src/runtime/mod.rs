//! Contains a wrapper of the container runtime for unit tests
//! This provides a uniform interface for the rest of lxcrun
//! to drive the runtime that actually manages containers

use std::path::PathBuf;

use crate::container::ErrInvalidName;

pub mod lxc;
#[allow(clippy::module_inception)]
pub mod runtime;

pub use runtime::{create_runtime, AttachOptions, Runtime, RuntimeType};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid container name {name:?}")]
    InvalidName {
        name: String,
        source: ErrInvalidName,
    },
    #[error("container path {path:?} is not usable")]
    LxcPath {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to run {tool}")]
    Spawn {
        tool: &'static str,
        source: std::io::Error,
    },
    #[error("failed to capture output of {tool}")]
    Output {
        tool: &'static str,
        source: std::io::Error,
    },
    #[error("failed to create output pipe: {0}")]
    Pipe(nix::Error),
    #[error("{tool} {}{}", describe_exit(.code), describe_detail(.detail))]
    ToolFailed {
        tool: &'static str,
        code: Option<i32>,
        detail: String,
    },
    #[error("container {name} is not defined")]
    NotDefined { name: String },
}

type Result<T> = std::result::Result<T, RuntimeError>;

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}

fn describe_detail(detail: &str) -> String {
    let detail = detail.trim();
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}
