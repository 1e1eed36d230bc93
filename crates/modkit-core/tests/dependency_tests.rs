//! Package dependency reconciliation during activation and deactivation.

mod common;

use common::Fixture;
use modkit_core::{Error, PackageSpec};
use modkit_deps::Scope;
use modkit_test_utils::{ArchiveBuilder, PmCall};
use pretty_assertions::assert_eq;

#[test]
fn test_shared_package_is_already_satisfied() {
    let fx = Fixture::new();
    fx.install_active(&ArchiveBuilder::new("first").api_deps(&["lodash@^4.0.0"]));
    let second = fx.install(&ArchiveBuilder::new("second").api_deps(&["lodash@^4.0.0"]));
    fx.packages.clear_calls();

    let plan = fx.orchestrator.plan_activation(second.id).unwrap();
    assert_eq!(
        plan.scope(Scope::Api).already_satisfied.get("lodash"),
        Some(&"lodash@4.0.0".to_string())
    );
    assert!(plan.scope(Scope::Api).to_install_or_change.is_empty());

    fx.orchestrator.activate(second.id, &[]).unwrap();
    assert!(fx.packages.mutations().is_empty());
}

#[test]
fn test_conflicting_ranges_block_activation() {
    let fx = Fixture::new();
    fx.install_active(&ArchiveBuilder::new("legacy").api_deps(&["lodash@^3.0.0"]));
    let modern = fx.install(&ArchiveBuilder::new("modern").api_deps(&["lodash@^4.0.0"]));
    fx.packages.clear_calls();

    let err = fx.orchestrator.activate(modern.id, &[]).unwrap_err();

    match &err.error {
        Error::DependencyConflict { plan } => {
            let conflicts = plan.conflicts();
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].package, "lodash");
            assert!(plan.need_upgrade);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fx.packages.mutations().is_empty());
    assert!(!fx.module("modern").active);
    fx.host.assert_file_not_exists("backoffice/app/modern");
    assert_eq!(err.modules.len(), 2);
}

#[test]
fn test_resolution_unblocks_activation() {
    let fx = Fixture::new();
    fx.install_active(&ArchiveBuilder::new("legacy").api_deps(&["lodash@^3.0.0"]));
    let modern = fx.install(&ArchiveBuilder::new("modern").api_deps(&["lodash@^4.0.0"]));
    fx.packages.clear_calls();

    let resolution = PackageSpec::parse("lodash@^4.0.0").unwrap();
    fx.orchestrator.activate(modern.id, &[resolution]).unwrap();

    assert_eq!(
        fx.packages.mutations(),
        vec![PmCall::Install {
            cwd: fx.api_root(),
            specs: vec!["lodash@^4.0.0".to_string()],
        }]
    );
    assert!(fx.module("modern").active);
}

#[test]
fn test_sole_requester_deactivation_removes_package() {
    let fx = Fixture::new();
    let dates = fx.install_active(&ArchiveBuilder::new("dates").api_deps(&["moment@^2.29.0"]));
    fx.packages.clear_calls();

    fx.orchestrator.deactivate(dates.id, &[]).unwrap();

    assert_eq!(
        fx.packages.mutations(),
        vec![PmCall::Remove {
            cwd: fx.api_root(),
            names: vec!["moment".to_string()],
        }]
    );
}

#[test]
fn test_shared_package_survives_deactivation() {
    let fx = Fixture::new();
    fx.install_active(&ArchiveBuilder::new("first").api_deps(&["lodash@^4.0.0"]));
    let second = fx.install_active(&ArchiveBuilder::new("second").api_deps(&["lodash@^4.0.0"]));
    fx.packages.clear_calls();

    fx.orchestrator.deactivate(second.id, &[]).unwrap();

    assert!(fx.packages.mutations().is_empty());
}

#[test]
fn test_theme_scope_runs_in_theme_root() {
    let fx = Fixture::new();
    let module = fx.install(&ArchiveBuilder::new("slider").theme_deps(&["swiper@^8.0.0"]));

    fx.orchestrator.activate(module.id, &[]).unwrap();

    assert_eq!(
        fx.packages.mutations(),
        vec![PmCall::Install {
            cwd: fx.theme_root(),
            specs: vec!["swiper@^8.0.0".to_string()],
        }]
    );
    assert!(
        fx.packages
            .calls()
            .iter()
            .all(|call| !matches!(call, PmCall::List { cwd } if *cwd == fx.api_root()))
    );
}

#[test]
fn test_host_pin_conflict_blocks_activation() {
    let fx = Fixture::new();
    fx.host.write_host_pins(&["moment@^2.29.4"]);
    let module = fx.install(&ArchiveBuilder::new("dates").api_deps(&["moment@^1.0.0"]));

    let err = fx.orchestrator.activate(module.id, &[]).unwrap_err();

    assert!(matches!(err.error, Error::DependencyConflict { .. }));
    assert!(fx.packages.mutations().is_empty());
}

#[test]
fn test_installed_version_outside_range_is_changed() {
    let fx = Fixture::new();
    fx.packages.set_installed(&fx.api_root(), "lodash", "3.10.1");
    let module = fx.install(&ArchiveBuilder::new("modern").api_deps(&["lodash@^4.0.0"]));

    let plan = fx.orchestrator.plan_activation(module.id).unwrap();
    assert_eq!(
        plan.scope(Scope::Api).install_specs(),
        vec!["lodash@^4.0.0".to_string()]
    );
    assert!(!plan.has_conflicts());
}

#[test]
fn test_plan_activation_reports_conflicts_without_failing() {
    let fx = Fixture::new();
    fx.install_active(&ArchiveBuilder::new("legacy").api_deps(&["lodash@^3.0.0"]));
    let modern = fx.install(&ArchiveBuilder::new("modern").api_deps(&["lodash@^4.0.0"]));

    let plan = fx.orchestrator.plan_activation(modern.id).unwrap();

    assert!(plan.has_conflicts());
}

#[test]
fn test_concurrent_activations_see_each_others_installs() {
    let fx = Fixture::new();
    let alpha = fx.install(&ArchiveBuilder::new("alpha").api_deps(&["lodash@^4.0.0"]));
    let beta = fx.install(&ArchiveBuilder::new("beta").api_deps(&["lodash@^4.0.0"]));

    std::thread::scope(|s| {
        s.spawn(|| fx.orchestrator.activate(alpha.id, &[]).unwrap());
        s.spawn(|| fx.orchestrator.activate(beta.id, &[]).unwrap());
    });

    assert_eq!(
        fx.packages.mutations(),
        vec![PmCall::Install {
            cwd: fx.api_root(),
            specs: vec!["lodash@^4.0.0".to_string()],
        }]
    );
    assert!(fx.module("alpha").active);
    assert!(fx.module("beta").active);
}
