//! Reconciliation planning.
//!
//! Turns an [`Aggregation`] plus fresh [`Snapshot`]s into a [`Plan`]: which
//! specs must be installed or changed, which packages can go, and which are
//! already fine. Planning is pure; nothing here touches the disk or spawns
//! processes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{Aggregation, Direction};
use crate::error::Result;
use crate::probe::{Prober, Snapshot};
use crate::range::range_accepts;
use crate::scope::{PerScope, Scope};
use crate::spec::PackageSpec;

/// Planned changes for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopePlan {
    /// Package name -> specs to hand to the package manager. More than one
    /// spec for a name is a conflict.
    pub to_install_or_change: BTreeMap<String, Vec<String>>,
    /// Package name -> the candidate's specs for packages nobody else needs.
    pub to_remove: BTreeMap<String, Vec<String>>,
    /// Package name -> `name@installed-version`.
    pub already_satisfied: BTreeMap<String, String>,
}

impl ScopePlan {
    /// Deduplicated specs for the install command, in package-name order.
    pub fn install_specs(&self) -> Vec<String> {
        let mut specs: Vec<String> = Vec::new();
        for spec in self.to_install_or_change.values().flatten() {
            if !specs.contains(spec) {
                specs.push(spec.clone());
            }
        }
        specs
    }

    /// Package names for the remove command.
    pub fn remove_names(&self) -> Vec<String> {
        self.to_remove.keys().cloned().collect()
    }

    pub fn is_noop(&self) -> bool {
        self.to_install_or_change.is_empty() && self.to_remove.is_empty()
    }
}

/// A package requested with more than one distinct range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub scope: Scope,
    pub package: String,
    pub requested: Vec<String>,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.package,
            self.scope,
            self.requested.join(", ")
        )
    }
}

/// Reconciliation result for one activation or deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub direction: Direction,
    pub candidate: String,
    #[serde(flatten)]
    pub scopes: PerScope<ScopePlan>,
    /// Set when some package ends up at a version the caller must confirm.
    pub need_upgrade: bool,
}

impl Plan {
    pub fn scope(&self, scope: Scope) -> &ScopePlan {
        self.scopes.get(scope)
    }

    /// Entries requested with more than one distinct range.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for (scope, plan) in self.scopes.iter() {
            for (package, requested) in &plan.to_install_or_change {
                if requested.len() > 1 {
                    conflicts.push(Conflict {
                        scope,
                        package: package.clone(),
                        requested: requested.clone(),
                    });
                }
            }
        }
        conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts().is_empty()
    }

    /// Replace conflicting entries with caller-chosen specs.
    ///
    /// A resolution applies to its package name in every scope where that
    /// name conflicts. Non-conflicting entries are left alone, and
    /// `need_upgrade` stays set: the caller has accepted a change.
    pub fn resolve(mut self, resolutions: &[PackageSpec]) -> Self {
        for resolution in resolutions {
            for scope in Scope::ALL {
                let plan = self.scopes.get_mut(scope);
                let Some(requested) = plan.to_install_or_change.get_mut(resolution.name()) else {
                    continue;
                };
                if requested.len() > 1 {
                    tracing::info!(
                        %scope,
                        package = resolution.name(),
                        resolution = %resolution,
                        "Applied conflict resolution"
                    );
                    *requested = vec![resolution.to_string()];
                }
            }
        }
        self
    }
}

/// Build a plan from an aggregation and per-scope snapshots.
///
/// Pins in the snapshots are expected to be folded into the aggregation
/// already; see [`reconcile`].
pub fn plan(aggregation: &Aggregation, snapshots: &PerScope<Snapshot>) -> Plan {
    let mut scopes: PerScope<ScopePlan> = PerScope::default();
    let mut need_upgrade = false;

    for &scope in aggregation.scopes() {
        let snapshot = snapshots.get(scope);
        let own = aggregation.own.get(scope);
        let out = scopes.get_mut(scope);

        for (name, ranges) in aggregation.requirements(scope).iter() {
            match ranges.len() {
                0 => {
                    let candidate_specs: Vec<String> = own
                        .iter()
                        .filter(|spec| spec.name() == name)
                        .map(ToString::to_string)
                        .collect();
                    out.to_remove.insert(name.to_string(), candidate_specs);
                }
                1 => {
                    let Some(value) = ranges.first() else {
                        continue;
                    };
                    let range = PackageSpec::parse(value).ok();
                    match (snapshot.installed_version(name), range) {
                        (Some(version), Some(spec)) if range_accepts(spec.range(), version) => {
                            out.already_satisfied
                                .insert(name.to_string(), format!("{name}@{version}"));
                        }
                        _ => {
                            out.to_install_or_change
                                .insert(name.to_string(), vec![value.to_string()]);
                            if aggregation.direction == Direction::Deactivate {
                                need_upgrade = true;
                            }
                        }
                    }
                }
                _ => {
                    need_upgrade = true;
                    out.to_install_or_change
                        .insert(name.to_string(), ranges.to_vec());
                }
            }
        }
    }

    let plan = Plan {
        direction: aggregation.direction,
        candidate: aggregation.candidate.clone(),
        scopes,
        need_upgrade,
    };
    tracing::debug!(
        candidate = %plan.candidate,
        direction = ?plan.direction,
        need_upgrade = plan.need_upgrade,
        conflicts = plan.conflicts().len(),
        "Planned dependency changes"
    );
    plan
}

/// Probe the candidate's scopes, fold in pins and plan.
pub fn reconcile(mut aggregation: Aggregation, prober: &Prober<'_>) -> Result<Plan> {
    let scopes = aggregation.scopes().to_vec();
    let snapshots = prober.probe_scopes(&scopes)?;
    for &scope in &scopes {
        aggregation.fold_pinned(scope, &snapshots.get(scope).pinned);
    }
    Ok(plan(&aggregation, &snapshots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Requester, aggregate};
    use crate::spec::PackageDependencies;
    use pretty_assertions::assert_eq;

    fn deps(api: &[&str]) -> PackageDependencies {
        PackageDependencies {
            api: api.iter().map(|s| s.to_string()).collect(),
            theme: vec![],
        }
    }

    fn installed(pairs: &[(&str, &str)]) -> PerScope<Snapshot> {
        let mut snapshots: PerScope<Snapshot> = PerScope::default();
        for (name, version) in pairs {
            snapshots
                .api
                .installed
                .insert(name.to_string(), version.to_string());
        }
        snapshots
    }

    #[test]
    fn shared_range_already_installed_is_satisfied() {
        let a = deps(&["lodash@^4.0.0"]);
        let b = deps(&["lodash@^4.0.0"]);
        let agg = aggregate(
            Requester::new("a", &a),
            &[Requester::new("b", &b)],
            Direction::Activate,
        )
        .unwrap();

        let plan = plan(&agg, &installed(&[("lodash", "4.17.21")]));
        assert!(!plan.need_upgrade);
        assert_eq!(
            plan.scope(Scope::Api).already_satisfied.get("lodash"),
            Some(&"lodash@4.17.21".to_string())
        );
        assert!(plan.scope(Scope::Api).is_noop());
    }

    #[test]
    fn missing_package_is_installed_on_activation() {
        let a = deps(&["axios@^1.6.0"]);
        let agg = aggregate(Requester::new("a", &a), &[], Direction::Activate).unwrap();
        let plan = plan(&agg, &PerScope::default());

        assert!(!plan.need_upgrade);
        assert_eq!(plan.scope(Scope::Api).install_specs(), vec!["axios@^1.6.0"]);
    }

    #[test]
    fn conflicting_ranges_need_upgrade() {
        let a = deps(&["lodash@^4.0.0"]);
        let b = deps(&["lodash@^3.0.0"]);
        let agg = aggregate(
            Requester::new("a", &a),
            &[Requester::new("b", &b)],
            Direction::Activate,
        )
        .unwrap();

        let plan = plan(&agg, &installed(&[("lodash", "3.10.1")]));
        assert!(plan.need_upgrade);
        let conflicts = plan.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].requested, vec!["lodash@^4.0.0", "lodash@^3.0.0"]);
    }

    #[test]
    fn sole_requester_deactivation_removes() {
        let b = deps(&["moment@^2.0"]);
        let agg = aggregate(Requester::new("b", &b), &[], Direction::Deactivate).unwrap();
        let plan = plan(&agg, &installed(&[("moment", "2.29.4")]));

        assert!(!plan.need_upgrade);
        assert_eq!(
            plan.scope(Scope::Api).to_remove.get("moment"),
            Some(&vec!["moment@^2.0".to_string()])
        );
        assert_eq!(plan.scope(Scope::Api).remove_names(), vec!["moment"]);
    }

    #[test]
    fn deactivation_restores_other_requirement() {
        let leaving = deps(&["lodash@^4.0.0"]);
        let staying = deps(&["lodash@^3.0.0"]);
        let agg = aggregate(
            Requester::new("a", &leaving),
            &[Requester::new("b", &staying)],
            Direction::Deactivate,
        )
        .unwrap();

        let plan = plan(&agg, &installed(&[("lodash", "4.17.21")]));
        assert!(plan.need_upgrade);
        assert_eq!(plan.scope(Scope::Api).install_specs(), vec!["lodash@^3.0.0"]);
        assert!(!plan.has_conflicts());
    }

    #[test]
    fn resolution_replaces_conflict() {
        let a = deps(&["lodash@^4.0.0"]);
        let b = deps(&["lodash@^3.0.0"]);
        let agg = aggregate(
            Requester::new("a", &a),
            &[Requester::new("b", &b)],
            Direction::Activate,
        )
        .unwrap();

        let plan = plan(&agg, &PerScope::default())
            .resolve(&[PackageSpec::parse("lodash@^4.17.0").unwrap()]);
        assert!(!plan.has_conflicts());
        assert!(plan.need_upgrade);
        assert_eq!(plan.scope(Scope::Api).install_specs(), vec!["lodash@^4.17.0"]);
    }

    #[test]
    fn resolution_for_unrelated_package_is_ignored() {
        let a = deps(&["axios@^1"]);
        let agg = aggregate(Requester::new("a", &a), &[], Direction::Activate).unwrap();

        let plan = plan(&agg, &PerScope::default())
            .resolve(&[PackageSpec::parse("axios@0.27.0").unwrap()]);
        assert_eq!(plan.scope(Scope::Api).install_specs(), vec!["axios@^1"]);
    }

    #[test]
    fn scoped_package_names_survive() {
        let a = deps(&["@nuxt/image@^1.0.0"]);
        let agg = aggregate(Requester::new("a", &a), &[], Direction::Activate).unwrap();

        let plan = plan(&agg, &installed(&[("@nuxt/image", "1.2.0")]));
        assert_eq!(
            plan.scope(Scope::Api).already_satisfied.get("@nuxt/image"),
            Some(&"@nuxt/image@1.2.0".to_string())
        );
    }

    #[test]
    fn plan_serializes_by_scope() {
        let b = deps(&["moment@^2.0"]);
        let agg = aggregate(Requester::new("b", &b), &[], Direction::Deactivate).unwrap();
        let value = serde_json::to_value(plan(&agg, &PerScope::default())).unwrap();

        assert_eq!(value["direction"], "deactivate");
        assert_eq!(value["api"]["to_remove"]["moment"][0], "moment@^2.0");
        assert_eq!(value["need_upgrade"], false);
    }
}
