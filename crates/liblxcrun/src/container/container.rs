use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Log priorities accepted by the lxc tools, from most to least verbose
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Notice,
    Warn,
    // liblxc logs errors and above unless told otherwise
    #[default]
    Error,
    Crit,
    Alert,
    Fatal,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let print = match *self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Crit => "CRIT",
            Self::Alert => "ALERT",
            Self::Fatal => "FATAL",
        };

        write!(f, "{print}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ErrInvalidName {
    #[error("container name can't be empty")]
    Empty,
    #[error("container name should not be . or ..")]
    FileName,
    #[error("container name contains invalid character: {0}")]
    InvalidChars(char),
}

/// validate_name checks if the supplied container name can be used as a
/// directory below the container path.
///
/// A valid name is a non-empty string consisting only of Latin letters,
/// digits, underscore, plus sign, minus sign and period. `.` and `..` are
/// rejected.
pub fn validate_name(name: &str) -> Result<(), ErrInvalidName> {
    if name.is_empty() {
        return Err(ErrInvalidName::Empty);
    }

    if name == "." || name == ".." {
        return Err(ErrInvalidName::FileName);
    }

    for c in name.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '+' | '-' | '.' => (),
            _ => return Err(ErrInvalidName::InvalidChars(c)),
        }
    }
    Ok(())
}

/// Handle to a container in the runtime's registry, identified by its name
/// and the container path it lives under. Holding a handle says nothing about
/// whether the container is defined; ask the runtime for that.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    name: String,
    lxc_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_file: Option<PathBuf>,
    log_level: LogLevel,
}

impl Container {
    pub(crate) fn new<S: Into<String>, P: Into<PathBuf>>(name: S, lxc_path: P) -> Self {
        Self {
            name: name.into(),
            lxc_path: lxc_path.into(),
            log_file: None,
            log_level: LogLevel::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lxc_path(&self) -> &Path {
        &self.lxc_path
    }

    /// Directory holding the container's configuration and rootfs
    pub fn dir(&self) -> PathBuf {
        self.lxc_path.join(&self.name)
    }

    /// A container is defined once this file exists
    pub fn config_file(&self) -> PathBuf {
        self.dir().join("config")
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_log_file<P: Into<PathBuf>>(&mut self, log_file: P) -> &mut Self {
        self.log_file = Some(log_file.into());
        self
    }

    pub fn set_log_level(&mut self, log_level: LogLevel) -> &mut Self {
        self.log_level = log_level;
        self
    }
}
