use std::collections::BTreeSet;

use modkit_deps::{
    Direction, PackageDependencies, PerScope, Requester, Scope, Snapshot, aggregate, plan,
};
use proptest::prelude::*;

fn api(specs: Vec<String>) -> PackageDependencies {
    PackageDependencies {
        api: specs,
        theme: vec![],
    }
}

fn caret(name: &str, major: u64) -> String {
    format!("{name}@^{major}.0.0")
}

proptest! {
    #[test]
    fn disjoint_packages_never_need_upgrade(
        mine in prop::collection::btree_set("[a-m]{3,8}", 1..6),
        theirs in prop::collection::btree_set("[n-z]{3,8}", 0..6),
        major in 0u64..20,
    ) {
        let candidate = api(mine.iter().map(|n| caret(n, major)).collect());
        let other = api(theirs.iter().map(|n| caret(n, major + 1)).collect());

        let agg = aggregate(
            Requester::new("candidate", &candidate),
            &[Requester::new("other", &other)],
            Direction::Activate,
        ).unwrap();
        let plan = plan(&agg, &PerScope::<Snapshot>::default());

        prop_assert!(!plan.need_upgrade);
        prop_assert!(plan.conflicts().is_empty());
        let planned: BTreeSet<String> =
            plan.scope(Scope::Api).to_install_or_change.keys().cloned().collect();
        prop_assert_eq!(planned, mine);
    }

    #[test]
    fn distinct_ranges_for_one_name_are_all_reported(
        name in "[a-z]{3,8}",
        majors in prop::collection::btree_set(0u64..30, 2..5),
    ) {
        let majors: Vec<u64> = majors.into_iter().collect();
        let candidate = api(vec![caret(&name, majors[0])]);
        let others: Vec<PackageDependencies> =
            majors[1..].iter().map(|m| api(vec![caret(&name, *m)])).collect();
        let names: Vec<String> = (0..others.len()).map(|i| format!("m{i}")).collect();
        let requesters: Vec<Requester<'_>> = others
            .iter()
            .zip(&names)
            .map(|(deps, n)| Requester::new(n, deps))
            .collect();

        let agg = aggregate(
            Requester::new("candidate", &candidate),
            &requesters,
            Direction::Activate,
        ).unwrap();
        let plan = plan(&agg, &PerScope::<Snapshot>::default());

        prop_assert!(plan.need_upgrade);
        let requested = plan.scope(Scope::Api).to_install_or_change.get(&name).unwrap();
        prop_assert_eq!(requested.len(), majors.len());
        for m in &majors {
            prop_assert!(requested.contains(&caret(&name, *m)));
        }
    }

    #[test]
    fn deactivation_without_overlap_removes_everything(
        mine in prop::collection::btree_set("[a-m]{3,8}", 1..6),
        theirs in prop::collection::btree_set("[n-z]{3,8}", 0..6),
    ) {
        let candidate = api(mine.iter().map(|n| caret(n, 1)).collect());
        let other = api(theirs.iter().map(|n| caret(n, 1)).collect());

        let agg = aggregate(
            Requester::new("candidate", &candidate),
            &[Requester::new("other", &other)],
            Direction::Deactivate,
        ).unwrap();
        let plan = plan(&agg, &PerScope::<Snapshot>::default());

        prop_assert!(!plan.need_upgrade);
        let removed: BTreeSet<String> = plan.scope(Scope::Api).remove_names().into_iter().collect();
        prop_assert_eq!(removed, mine);
        prop_assert!(plan.scope(Scope::Api).install_specs().is_empty());
    }
}
