//! Options of a single lxcrun invocation, resolved once before any
//! container is looked up
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::container::resolver::DEFAULT_CONTAINER_LOG_DIR;
use crate::container::Session;
use crate::names;
use crate::runtime::{Runtime, RuntimeError};

pub const DEFAULT_TEMPLATE: &str = "/usr/share/lxc/templates/lxc-alpine";
pub const DEFAULT_INTERFACE: &str = "0.0.0.0";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "could not stat LXC template {path:?}, ensure lxc packages are installed on your system"
    )]
    TemplateMissing { path: PathBuf },
    #[error("failed to access LXC template {path:?}")]
    TemplateAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to determine the default container path")]
    DefaultLxcPath(#[source] RuntimeError),
}

type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub name: String,
    pub lxc_path: PathBuf,
    pub template: PathBuf,
    /// Accepted for compatibility, nothing consumes it yet
    pub interface: String,
    pub session: Session,
    pub debug: bool,
    pub container_log_dir: PathBuf,
}

/// Collects the raw options and resolves them into a [`Config`]
///
/// # Example
///
/// ```no_run
/// use liblxcrun::config::ConfigBuilder;
/// use liblxcrun::container::Session;
/// use liblxcrun::runtime::create_runtime;
///
/// let runtime = create_runtime();
/// let config = ConfigBuilder::new(Session::Execute(vec!["uname".to_owned(), "-a".to_owned()]))
///     .with_name(Some("builder".to_owned()))
///     .with_lxc_path(None::<&str>)
///     .build(runtime.as_ref())
///     .expect("invalid config");
/// ```
pub struct ConfigBuilder {
    name: Option<String>,
    lxc_path: Option<PathBuf>,
    template: PathBuf,
    interface: String,
    session: Session,
    debug: bool,
    container_log_dir: PathBuf,
}

impl ConfigBuilder {
    pub fn new(session: Session) -> Self {
        Self {
            name: None,
            lxc_path: None,
            template: PathBuf::from(DEFAULT_TEMPLATE),
            interface: DEFAULT_INTERFACE.to_owned(),
            session,
            debug: false,
            container_log_dir: PathBuf::from(DEFAULT_CONTAINER_LOG_DIR),
        }
    }

    /// A missing or empty name is replaced by a random one
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// A missing or empty path is replaced by the runtime's default
    pub fn with_lxc_path<P: Into<PathBuf>>(mut self, lxc_path: Option<P>) -> Self {
        self.lxc_path = lxc_path.map(|p| p.into());
        self
    }

    pub fn with_template<P: Into<PathBuf>>(mut self, template: P) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_interface<S: Into<String>>(mut self, interface: S) -> Self {
        self.interface = interface.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_container_log_dir<P: Into<PathBuf>>(mut self, container_log_dir: P) -> Self {
        self.container_log_dir = container_log_dir.into();
        self
    }

    /// Checks the template and fills in defaults. Nothing in the container
    /// path is touched; the only runtime call made is the default path
    /// lookup.
    pub fn build(self, runtime: &dyn Runtime) -> Result<Config> {
        check_template(&self.template)?;

        let lxc_path = match self.lxc_path {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => runtime
                .default_lxc_path()
                .map_err(ConfigError::DefaultLxcPath)?,
        };

        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => {
                let name = names::random_name();
                tracing::debug!(%name, "no container name given, generated one");
                name
            }
        };

        Ok(Config {
            name,
            lxc_path,
            template: self.template,
            interface: self.interface,
            session: self.session,
            debug: self.debug,
            container_log_dir: self.container_log_dir,
        })
    }
}

/// The template has to exist before anything is created from it
pub fn check_template(template: &Path) -> Result<()> {
    match fs::metadata(template) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::TemplateMissing {
            path: template.to_owned(),
        }),
        Err(source) => Err(ConfigError::TemplateAccess {
            path: template.to_owned(),
            source,
        }),
    }
}
