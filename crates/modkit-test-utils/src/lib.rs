//! Shared test fixtures for the modkit workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`host`]: [`TestHost`], a temporary host application layout
//! - [`archive`]: [`ArchiveBuilder`], module zip archives
//! - [`package_manager`]: [`RecordingPackageManager`], an in-memory
//!   package manager that records every call

pub mod archive;
pub mod host;
pub mod package_manager;

pub use archive::ArchiveBuilder;
pub use host::TestHost;
pub use package_manager::{PmCall, RecordingPackageManager};
