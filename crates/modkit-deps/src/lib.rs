//! Package dependency reconciliation for modkit modules
//!
//! Modules declare npm packages for two scopes: the host backend (`api`) and
//! the active front-end theme (`theme`). Before a module is turned on or off,
//! this crate works out which packages must be installed, changed or removed
//! without breaking the constraints of any other active module:
//!
//! 1. [`aggregate`] collects every active module's requests for the packages
//!    the candidate touches.
//! 2. [`Prober`] snapshots what is installed and what the host or theme pins.
//! 3. [`plan()`] compares the two and reports a [`Plan`], including conflicts
//!    it refuses to decide on.
//!
//! [`PackageManager`] is the seam to the external `yarn` / `npm` binaries.

pub mod aggregate;
pub mod error;
pub mod manager;
pub mod plan;
pub mod probe;
pub mod range;
pub mod requirements;
pub mod scope;
pub mod spec;

pub use aggregate::{Aggregation, Direction, Requester, aggregate};
pub use error::{Error, Result};
pub use manager::{CommandPackageManager, PackageManager};
pub use plan::{Conflict, Plan, ScopePlan, plan, reconcile};
pub use probe::{InstalledSet, Prober, ScopeLocation, Snapshot};
pub use requirements::{RequestedRanges, RequirementSet};
pub use scope::{PerScope, Scope};
pub use spec::{PackageDependencies, PackageSpec};
