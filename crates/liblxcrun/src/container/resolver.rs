//! Turns a container name into a defined container, creating it from a
//! template the first time it is asked for
use std::path::{Path, PathBuf};

use crate::container::{Container, LogLevel};
use crate::runtime::{Runtime, RuntimeError};

/// Directory receiving per-container runtime logs unless told otherwise
pub const DEFAULT_CONTAINER_LOG_DIR: &str = "/tmp";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to list containers under {lxc_path:?}")]
    List {
        lxc_path: PathBuf,
        source: RuntimeError,
    },
    #[error("failed to allocate container {name:?} under {lxc_path:?}")]
    Allocation {
        name: String,
        lxc_path: PathBuf,
        source: RuntimeError,
    },
    #[error("could not create container {name:?}")]
    Provisioning { name: String, source: RuntimeError },
}

type Result<T> = std::result::Result<T, ResolveError>;

pub struct ContainerResolver<'a> {
    runtime: &'a dyn Runtime,
    log_dir: PathBuf,
}

impl<'a> ContainerResolver<'a> {
    pub fn new(runtime: &'a dyn Runtime) -> Self {
        Self {
            runtime,
            log_dir: PathBuf::from(DEFAULT_CONTAINER_LOG_DIR),
        }
    }

    /// Sets the directory in which `<name>.log` is kept for each container
    pub fn with_log_dir<P: Into<PathBuf>>(mut self, log_dir: P) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn log_file(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{name}.log"))
    }

    /// Returns the container called `name` under `lxc_path`, creating it
    /// from `template` if it is not defined yet. An existing container is
    /// never created again.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn resolve(&self, name: &str, lxc_path: &Path, template: &Path) -> Result<Container> {
        let mut container = match self.find(name, lxc_path)? {
            Some(container) => {
                tracing::info!(name, "found existing container");
                container
            }
            None => self
                .runtime
                .allocate(name, lxc_path)
                .map_err(|source| ResolveError::Allocation {
                    name: name.to_owned(),
                    lxc_path: lxc_path.to_owned(),
                    source,
                })?,
        };

        // allocation alone does not put anything on disk
        if !self.runtime.is_defined(&container) {
            self.create(&container, template)?;
        }

        container
            .set_log_file(self.log_file(name))
            .set_log_level(LogLevel::Trace);

        Ok(container)
    }

    fn find(&self, name: &str, lxc_path: &Path) -> Result<Option<Container>> {
        let containers =
            self.runtime
                .defined_containers(lxc_path)
                .map_err(|source| ResolveError::List {
                    lxc_path: lxc_path.to_owned(),
                    source,
                })?;

        Ok(containers
            .into_iter()
            .find(|container| container.name() == name))
    }

    fn create(&self, container: &Container, template: &Path) -> Result<()> {
        tracing::info!(name = container.name(), ?template, "creating new container");
        match self.runtime.create(container, template) {
            Ok(()) => Ok(()),
            // another invocation defined it between our lookup and create
            Err(err) if self.runtime.is_defined(container) => {
                tracing::warn!(
                    name = container.name(),
                    %err,
                    "container was defined concurrently, reusing it"
                );
                Ok(())
            }
            Err(source) => {
                tracing::error!(name = container.name(), "could not create container");
                Err(ResolveError::Provisioning {
                    name: container.name().to_owned(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Result;

    use super::*;
    use crate::runtime::test::{Call, CallKind, TestHelperRuntime};
    use crate::runtime::RuntimeType;

    const TEMPLATE: &str = "/usr/share/lxc/templates/lxc-alpine";

    fn test_runtime(runtime: &dyn Runtime) -> &TestHelperRuntime {
        runtime
            .as_any()
            .downcast_ref::<TestHelperRuntime>()
            .expect("test runtime")
    }

    #[test]
    fn test_reuses_existing_container() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.define("web", "/var/lib/lxc");

        let container = ContainerResolver::new(runtime.as_ref()).resolve(
            "web",
            Path::new("/var/lib/lxc"),
            Path::new(TEMPLATE),
        )?;

        assert_eq!(container.name(), "web");
        assert_eq!(container.lxc_path(), Path::new("/var/lib/lxc"));
        assert_eq!(helper.count_calls(CallKind::Allocate), 0);
        assert_eq!(helper.count_calls(CallKind::Create), 0);
        Ok(())
    }

    #[test]
    fn test_creates_unknown_container_once() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.define("other", "/var/lib/lxc");

        ContainerResolver::new(runtime.as_ref()).resolve(
            "web",
            Path::new("/var/lib/lxc"),
            Path::new(TEMPLATE),
        )?;

        assert_eq!(
            helper.get_create_args(),
            vec![("web".to_owned(), PathBuf::from(TEMPLATE))]
        );
        assert_eq!(
            helper.get_template("web", Path::new("/var/lib/lxc")),
            Some(PathBuf::from(TEMPLATE))
        );
        Ok(())
    }

    #[test]
    fn test_resolve_is_idempotent() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        let resolver = ContainerResolver::new(runtime.as_ref());

        let first = resolver.resolve("web", Path::new("/srv/lxc"), Path::new(TEMPLATE))?;
        let second = resolver.resolve("web", Path::new("/srv/lxc"), Path::new(TEMPLATE))?;

        assert_eq!(first, second);
        assert_eq!(helper.count_calls(CallKind::Create), 1);
        assert_eq!(helper.count_calls(CallKind::Allocate), 1);
        Ok(())
    }

    #[test]
    fn test_name_match_is_exact_and_per_path() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.define("Web", "/var/lib/lxc");
        helper.define("web", "/srv/lxc");

        ContainerResolver::new(runtime.as_ref()).resolve(
            "web",
            Path::new("/var/lib/lxc"),
            Path::new(TEMPLATE),
        )?;

        assert_eq!(helper.count_calls(CallKind::Create), 1);
        Ok(())
    }

    #[test]
    fn test_call_order() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());

        ContainerResolver::new(runtime.as_ref()).resolve(
            "web",
            Path::new("/var/lib/lxc"),
            Path::new(TEMPLATE),
        )?;

        assert_eq!(
            helper.get_calls(),
            vec![
                Call::DefinedContainers(PathBuf::from("/var/lib/lxc")),
                Call::Allocate {
                    name: "web".to_owned(),
                    lxc_path: PathBuf::from("/var/lib/lxc"),
                },
                Call::IsDefined("web".to_owned()),
                Call::Create {
                    name: "web".to_owned(),
                    template: PathBuf::from(TEMPLATE),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_sets_container_log_target() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let container = ContainerResolver::new(runtime.as_ref())
            .with_log_dir("/var/log/lxcrun")
            .resolve("web", Path::new("/var/lib/lxc"), Path::new(TEMPLATE))?;

        assert_eq!(
            container.log_file(),
            Some(Path::new("/var/log/lxcrun/web.log"))
        );
        assert_eq!(container.log_level(), LogLevel::Trace);

        let container = ContainerResolver::new(runtime.as_ref()).resolve(
            "web",
            Path::new("/var/lib/lxc"),
            Path::new(TEMPLATE),
        )?;
        assert_eq!(container.log_file(), Some(Path::new("/tmp/web.log")));
        Ok(())
    }

    #[test]
    fn test_allocation_error() {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());

        let err = ContainerResolver::new(runtime.as_ref())
            .resolve("bad/name", Path::new("/var/lib/lxc"), Path::new(TEMPLATE))
            .expect_err("invalid name must not be allocated");

        assert!(matches!(err, ResolveError::Allocation { .. }));
        assert_eq!(helper.count_calls(CallKind::Create), 0);
    }

    #[test]
    fn test_provisioning_error_names_container() {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.set_ret_err(CallKind::Create, || RuntimeError::ToolFailed {
            tool: "lxc-create",
            code: Some(1),
            detail: "template script failed".to_owned(),
        });

        let err = ContainerResolver::new(runtime.as_ref())
            .resolve("web", Path::new("/var/lib/lxc"), Path::new(TEMPLATE))
            .expect_err("failed template must fail resolve");

        assert!(matches!(err, ResolveError::Provisioning { .. }));
        assert!(err.to_string().contains("\"web\""));
    }

    #[test]
    fn test_list_error() {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.set_ret_err(CallKind::DefinedContainers, || RuntimeError::Spawn {
            tool: "lxc-ls",
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });

        let err = ContainerResolver::new(runtime.as_ref())
            .resolve("web", Path::new("/var/lib/lxc"), Path::new(TEMPLATE))
            .expect_err("listing failure is fatal");

        assert!(matches!(err, ResolveError::List { .. }));
        assert_eq!(helper.count_calls(CallKind::Allocate), 0);
    }

    #[test]
    fn test_concurrently_created_container_is_reused() -> Result<()> {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.set_create_races(true);

        let container = ContainerResolver::new(runtime.as_ref()).resolve(
            "web",
            Path::new("/var/lib/lxc"),
            Path::new(TEMPLATE),
        )?;

        assert_eq!(container.name(), "web");
        assert_eq!(helper.count_calls(CallKind::Create), 1);
        Ok(())
    }
}
