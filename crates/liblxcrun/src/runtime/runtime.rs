//! An interface trait so that rest of lxcrun can call
//! into the container runtime without having to worry about
//! how the runtime is driven
use std::any::Any;
use std::path::{Path, PathBuf};

use crate::container::Container;
use crate::runtime::lxc::LxcRuntime;
use crate::runtime::test::TestHelperRuntime;
use crate::runtime::Result;

/// Options for an interactive attach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachOptions {
    /// Start the attached shell with an empty environment instead of
    /// inheriting the caller's
    pub clear_env: bool,
}

/// The capabilities lxcrun needs from a container runtime
pub trait Runtime {
    fn as_any(&self) -> &dyn Any;
    /// Container path used when the caller does not specify one
    fn default_lxc_path(&self) -> Result<PathBuf>;
    fn defined_containers(&self, lxc_path: &Path) -> Result<Vec<Container>>;
    /// Returns a handle bound to (name, lxc_path) without creating anything
    fn allocate(&self, name: &str, lxc_path: &Path) -> Result<Container>;
    fn is_defined(&self, container: &Container) -> bool;
    fn create(&self, container: &Container, template: &Path) -> Result<()>;
    fn attach_shell(&self, container: &Container, options: &AttachOptions) -> Result<()>;
    /// Runs `args` in the container and returns its combined output
    fn execute(&self, container: &Container, args: &[String]) -> Result<Vec<u8>>;
}

#[derive(Clone, Copy)]
pub enum RuntimeType {
    Lxc,
    Test,
}

impl Default for RuntimeType {
    fn default() -> Self {
        if cfg!(test) {
            RuntimeType::Test
        } else {
            RuntimeType::Lxc
        }
    }
}

impl RuntimeType {
    pub fn create_runtime(&self) -> Box<dyn Runtime> {
        match self {
            RuntimeType::Lxc => Box::new(LxcRuntime),
            RuntimeType::Test => Box::<TestHelperRuntime>::default(),
        }
    }
}

pub fn create_runtime() -> Box<dyn Runtime> {
    RuntimeType::default().create_runtime()
}
