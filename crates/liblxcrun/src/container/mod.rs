//! Container management
/// A container is only ever looked up or created through the runtime. The
/// resolver turns a name into a defined container, creating it from a
/// template on first use, and the session dispatcher runs either an
/// interactive shell or a single command inside it.
#[allow(clippy::module_inception)]
mod container;
pub mod resolver;
pub mod session;

pub use container::{validate_name, Container, ErrInvalidName, LogLevel};
pub use resolver::{ContainerResolver, ResolveError};
pub use session::{DispatchError, Session, SessionDispatcher};
