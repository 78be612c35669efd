//! Logging of lxcrun itself. Container logs are written by liblxc into the
//! per-container log file instead.
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

const JOURNALD_IDENTIFIER: &str = "lxcrun";

#[derive(Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            unknown => bail!("unknown log format: {}", unknown),
        }
    }
}

/// Debug builds log everything, release builds only failures so nothing
/// but errors shows up next to the command output
fn default_level() -> Level {
    if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::ERROR
    }
}

/// `--log-level` wins over `--debug`
fn log_level(level: Option<&str>, debug: bool) -> Result<Level> {
    match level {
        Some(level) => Level::from_str(level).with_context(|| format!("bad log level {level:?}")),
        None if debug => Ok(Level::DEBUG),
        None => Ok(default_level()),
    }
}

#[derive(Debug)]
pub struct ObservabilityConfig {
    debug: bool,
    level: Option<String>,
    file: Option<PathBuf>,
    format: Option<String>,
    journald: bool,
}

impl From<&crate::Opts> for ObservabilityConfig {
    fn from(opts: &crate::Opts) -> Self {
        Self {
            debug: opts.global.debug,
            level: opts.global.log_level.clone(),
            file: opts.global.log.clone(),
            format: opts.global.log_format.clone(),
            journald: opts.global.systemd_log,
        }
    }
}

impl ObservabilityConfig {
    /// stdout carries the command output, logs go to stderr unless a file
    /// is given
    fn writer(&self) -> Result<BoxMakeWriter> {
        match &self.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open log file {}", path.display()))?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            None => Ok(BoxMakeWriter::new(std::io::stderr)),
        }
    }
}

pub fn init<T>(config: T) -> Result<()>
where
    T: Into<ObservabilityConfig>,
{
    let config = config.into();
    let level = log_level(config.level.as_deref(), config.debug)?;
    let format = match config.format.as_deref() {
        Some(format) => format.parse()?,
        None => LogFormat::Text,
    };
    let writer = config.writer()?;
    let ansi = config.file.is_none();

    let fmt_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
    };

    let journald = if config.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_syslog_identifier(JOURNALD_IDENTIFIER.to_owned())),
            Err(err) => {
                // an unreachable journal only loses the extra copy
                eprintln!("failed to initialize journald logging: {:?}", err);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(journald)
        .with(tracing_subscriber::filter::LevelFilter::from(level))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logger: {}", e))
}
