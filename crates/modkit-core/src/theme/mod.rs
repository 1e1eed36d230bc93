//! Theme integration: component manifest, injection and rebuilds.

pub mod builder;
pub mod injector;
pub mod manifest;

pub use builder::{CommandThemeBuilder, ThemeBuilder};
pub use injector::{ComponentFile, Injector, component_files};
pub use manifest::{ComponentEntry, ThemeManifest};
