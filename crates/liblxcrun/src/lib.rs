pub mod config;
pub mod container;
pub mod names;
pub mod runtime;
