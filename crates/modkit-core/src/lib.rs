//! Core module lifecycle for modkit
//!
//! This crate installs module archives into a host, activates and
//! deactivates them (reconciling their npm-style package dependencies
//! through `modkit-deps`), injects their front-end components into the
//! theme and keeps the module registry.

pub mod archive;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hooks;
pub mod locks;
pub mod module;
pub mod orchestrator;
pub mod registry;
pub mod theme;

pub use archive::ModuleArchive;
pub use config::{Environment, HostConfig};
pub use descriptor::Descriptor;
pub use error::{Error, OperationError, Result};
pub use hooks::{HookError, ModuleHooks, ScriptHooks};
pub use module::{Module, ModuleQuery};
pub use orchestrator::{AdminBundle, OpResult, Orchestrator, OrchestratorBuilder};
pub use registry::{JsonFileStore, MemoryStore, ModuleStore};
pub use theme::{CommandThemeBuilder, Injector, ThemeBuilder, ThemeManifest};

pub use modkit_deps::{PackageSpec, Plan};
