//! Filesystem primitives for modkit
//!
//! Atomic writes, advisory file locks, format-agnostic config loading and the
//! copy / move / remove helpers the lifecycle engine uses to put module files
//! in place and take them away again.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod ops;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::{FileLock, RobustnessConfig};
pub use ops::Removed;
