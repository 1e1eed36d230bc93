//! Dependency aggregation.
//!
//! For a module being activated or deactivated, collect every `name@range`
//! that the *other* active modules request for the packages this module
//! touches. Packages the candidate does not declare are irrelevant: changing
//! the candidate's state can never require touching them.
//!
//! # Example
//!
//! ```
//! use modkit_deps::{Direction, PackageDependencies, Requester, Scope, aggregate};
//!
//! let shop = PackageDependencies { api: vec!["lodash@^4.0.0".into()], theme: vec![] };
//! let blog = PackageDependencies { api: vec!["lodash@^3.0.0".into()], theme: vec![] };
//!
//! let agg = aggregate(
//!     Requester::new("shop", &shop),
//!     &[Requester::new("blog", &blog)],
//!     Direction::Activate,
//! )
//! .unwrap();
//!
//! let lodash = agg.requirements(Scope::Api).get("lodash").unwrap();
//! assert_eq!(lodash.to_vec(), vec!["lodash@^4.0.0", "lodash@^3.0.0"]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::requirements::RequirementSet;
use crate::scope::{PerScope, Scope};
use crate::spec::{PackageDependencies, PackageSpec, normalize};

/// Whether requirements are computed for turning a module on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Activate,
    Deactivate,
}

/// A module that requests packages.
#[derive(Debug, Clone, Copy)]
pub struct Requester<'a> {
    pub name: &'a str,
    pub dependencies: &'a PackageDependencies,
}

impl<'a> Requester<'a> {
    pub fn new(name: &'a str, dependencies: &'a PackageDependencies) -> Self {
        Self { name, dependencies }
    }
}

/// Output of [`aggregate`].
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub direction: Direction,
    /// Name of the module being activated or deactivated.
    pub candidate: String,
    /// The candidate's own normalized specs per scope.
    pub own: PerScope<Vec<PackageSpec>>,
    requirements: PerScope<RequirementSet>,
    declared: Vec<Scope>,
}

impl Aggregation {
    /// Scopes in which the candidate declares dependencies.
    pub fn scopes(&self) -> &[Scope] {
        &self.declared
    }

    pub fn requirements(&self, scope: Scope) -> &RequirementSet {
        self.requirements.get(scope)
    }

    /// Fold the host's or theme's own pinned packages into a scope.
    ///
    /// The host and the theme are implicit requesters that must never be
    /// broken by module changes; only packages already tracked are touched.
    pub fn fold_pinned(&mut self, scope: Scope, pins: &[PackageSpec]) {
        let set = self.requirements.get_mut(scope);
        for pin in pins {
            if set.request_if_tracked(pin) {
                tracing::debug!(%scope, pin = %pin, "Folded pinned requirement");
            }
        }
    }
}

/// Aggregate requirement sets for `candidate` against the other `active`
/// modules.
///
/// On [`Direction::Activate`] the candidate's own spec is part of each set;
/// on [`Direction::Deactivate`] it is not, so an empty set means nobody else
/// needs the package. Malformed entries in *other* modules are logged and
/// skipped; malformed entries in the candidate are an error.
pub fn aggregate(
    candidate: Requester<'_>,
    active: &[Requester<'_>],
    direction: Direction,
) -> Result<Aggregation> {
    let declared = candidate.dependencies.declared_scopes();
    let mut own: PerScope<Vec<PackageSpec>> = PerScope::default();
    let mut requirements: PerScope<RequirementSet> = PerScope::default();

    for &scope in &declared {
        let specs: Vec<PackageSpec> = normalize(candidate.dependencies.get(scope))?
            .into_iter()
            .filter(|spec| spec.name() != candidate.name)
            .collect();

        let set = requirements.get_mut(scope);
        for spec in &specs {
            match direction {
                Direction::Activate => set.request(spec),
                Direction::Deactivate => set.track(spec.name()),
            }
        }

        for other in active.iter().filter(|r| r.name != candidate.name) {
            let their_specs = match normalize(other.dependencies.get(scope)) {
                Ok(specs) => specs,
                Err(e) => {
                    tracing::warn!(
                        module = other.name,
                        %scope,
                        error = %e,
                        "Ignoring malformed dependency list of active module"
                    );
                    continue;
                }
            };
            for spec in &their_specs {
                set.request_if_tracked(spec);
            }
        }

        *own.get_mut(scope) = specs;
    }

    Ok(Aggregation {
        direction,
        candidate: candidate.name.to_string(),
        own,
        requirements,
        declared,
    })
}
