use super::*;

fn items(entries: &[(&str, &[&str])]) -> RunModeItems {
    entries
        .iter()
        .map(|(run_mode, ids)| {
            (
                run_mode.to_string(),
                ids.iter().map(|id| id.to_string()).collect(),
            )
        })
        .collect()
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn key(name: &str) -> AggregateKey {
    AggregateKey::parse(name).expect("valid aggregate key")
}

fn key_names(resolution: &Resolution) -> Vec<String> {
    resolution
        .aggregates
        .keys()
        .map(AggregateKey::run_mode)
        .collect()
}

#[test]
fn prunes_stage_aggregates_equal_to_their_role() {
    let input = items(&[
        (DEFAULT_RUN_MODE, &["m0"]),
        ("author", &["m1"]),
        ("author.prod", &["m2"]),
        ("publish", &["m3"]),
    ]);
    let resolution = resolve(&input, &ServiceRole::ALL).expect("resolve");

    assert_eq!(key_names(&resolution), vec!["author", "author.prod", "publish"]);
    assert_eq!(resolution.aggregates[&key("author")], ids(&["m0", "m1"]));
    assert_eq!(
        resolution.aggregates[&key("author.prod")],
        ids(&["m0", "m1", "m2"])
    );
    assert_eq!(resolution.aggregates[&key("publish")], ids(&["m0", "m3"]));
    assert!(resolution.notices.is_empty());
}

#[test]
fn drops_role_aggregate_when_every_stage_differs() {
    let input = items(&[
        ("author", &["base"]),
        ("author.dev", &["d"]),
        ("author.stage", &["s"]),
        ("author.prod", &["p"]),
    ]);
    let resolution = resolve(&input, &ServiceRole::ALL).expect("resolve");

    assert_eq!(
        key_names(&resolution),
        vec!["author.dev", "author.stage", "author.prod", "publish"]
    );
    assert_eq!(resolution.aggregates[&key("author.dev")], ids(&["base", "d"]));
    assert_eq!(resolution.aggregates[&key("publish")], BTreeSet::new());
}

#[test]
fn default_items_reach_every_surviving_aggregate() {
    let input = items(&[
        (DEFAULT_RUN_MODE, &["everywhere"]),
        ("author.dev", &["a"]),
        ("publish.stage", &["b"]),
        ("publish.prod", &["c"]),
    ]);
    let resolution = resolve(&input, &ServiceRole::ALL).expect("resolve");

    assert!(!resolution.aggregates.is_empty());
    for (key, members) in &resolution.aggregates {
        assert!(members.contains("everywhere"), "{key} is missing default item");
    }
}

#[test]
fn stage_aggregates_contain_their_role_members() {
    let input = items(&[
        (DEFAULT_RUN_MODE, &["m0"]),
        ("author", &["r1", "r2"]),
        ("author.stage", &["s1"]),
        ("publish", &["p1"]),
        ("publish.dev", &["p2"]),
        ("publish.prod", &["p1"]),
    ]);
    let resolution = resolve(&input, &ServiceRole::ALL).expect("resolve");

    for (key, members) in &resolution.aggregates {
        let Some(parent) = key.parent() else {
            continue;
        };
        if let Some(parent_members) = resolution.aggregates.get(&parent) {
            assert!(
                members.is_superset(parent_members),
                "{key} does not contain {parent}"
            );
        }
    }
    // publish.prod only re-adds a role item, so it collapses into publish.
    assert!(!resolution.aggregates.contains_key(&key("publish.prod")));
    assert!(resolution.aggregates.contains_key(&key("publish.dev")));
}

#[test]
fn resolving_twice_gives_identical_output() {
    let input = items(&[
        (DEFAULT_RUN_MODE, &["m0"]),
        ("publish", &["x", "y"]),
        ("publish.dev", &["z"]),
        ("dev", &["ignored"]),
    ]);
    let resolver = Resolver::new(&ServiceRole::ALL).expect("resolver");
    let first = resolver.resolve(&input).expect("first resolve");
    let second = resolver.resolve(&input).expect("second resolve");
    assert_eq!(first, second);
}

#[test]
fn unknown_run_mode_is_dropped_with_notice() {
    let input = items(&[("author", &["a"]), ("foo.bar", &["lost"])]);
    let resolution = resolve(&input, &ServiceRole::ALL).expect("resolve");

    assert_eq!(
        resolution.notices,
        vec![RunModeNotice {
            run_mode: "foo.bar".to_string(),
            kind: NoticeKind::Unknown,
            items: vec!["lost".to_string()],
        }]
    );
    assert_eq!(resolution.aggregates[&key("author")], ids(&["a"]));
    assert!(resolution
        .aggregates
        .values()
        .all(|members| !members.contains("lost")));
}

#[test]
fn misordered_run_mode_fails_with_corrected_name() {
    let input = items(&[("author", &["a"]), ("dev.author", &["b"])]);
    let err = resolve(&input, &ServiceRole::ALL).expect_err("misordered run mode");
    assert_eq!(
        err,
        AggregateError::MisorderedRunMode {
            run_mode: "dev.author".to_string(),
            corrected: "author.dev".to_string(),
        }
    );
}

#[test]
fn misordered_sdk_token_is_fatal_but_sdk_token_is_unused() {
    let err = resolve(&items(&[("sdk.publish", &["x"])]), &ServiceRole::ALL)
        .expect_err("misordered sdk token");
    assert!(err.to_string().contains("publish.sdk"));

    let resolution =
        resolve(&items(&[("publish.sdk", &["x"])]), &ServiceRole::ALL).expect("resolve");
    assert_eq!(resolution.notices.len(), 1);
    assert_eq!(resolution.notices[0].kind, NoticeKind::Unused);
}

#[test]
fn empty_role_scope_is_invalid() {
    let err = resolve(&items(&[("author", &["a"])]), &[]).expect_err("empty scope");
    assert_eq!(err, AggregateError::InvalidScope);
}

#[test]
fn role_subset_only_computes_requested_roles() {
    let input = items(&[
        (DEFAULT_RUN_MODE, &["m0"]),
        ("author", &["a"]),
        ("publish", &["p"]),
        ("publish.dev", &["pd"]),
    ]);
    let resolution = resolve(&input, &[ServiceRole::Author]).expect("resolve");

    assert_eq!(key_names(&resolution), vec!["author"]);
    let unused: Vec<&str> = resolution
        .notices
        .iter()
        .map(|notice| notice.run_mode.as_str())
        .collect();
    assert_eq!(unused, vec!["publish", "publish.dev"]);
    assert!(resolution
        .notices
        .iter()
        .all(|notice| notice.kind == NoticeKind::Unused));
}

#[test]
fn bare_stage_run_mode_is_unused() {
    let resolution = resolve(&items(&[("prod", &["x"])]), &ServiceRole::ALL).expect("resolve");
    assert_eq!(resolution.notices[0].kind, NoticeKind::Unused);
    assert_eq!(key_names(&resolution), vec!["author", "publish"]);
}

#[test]
fn custom_stage_axis_applies_same_pruning_rule() {
    let input = items(&[("author", &["a"]), ("author.dev", &["d"]), ("author.prod", &["p"])]);
    let resolver = Resolver::new(&[ServiceRole::Author])
        .expect("resolver")
        .with_stages(&[DeploymentStage::Prod, DeploymentStage::Dev]);
    assert_eq!(
        resolver.stages(),
        &[DeploymentStage::Prod, DeploymentStage::Dev]
    );
    let resolution = resolver.resolve(&input).expect("resolve");

    assert_eq!(key_names(&resolution), vec!["author.dev", "author.prod"]);
}

#[test]
fn stage_outside_configured_axis_is_still_honored() {
    let input = items(&[("author", &["a"]), ("author.prod", &["p"])]);
    let resolution = Resolver::new(&[ServiceRole::Author])
        .expect("resolver")
        .with_stages(&[DeploymentStage::Dev])
        .resolve(&input)
        .expect("resolve");

    assert!(resolution.notices.is_empty());
    assert_eq!(key_names(&resolution), vec!["author", "author.prod"]);
    assert_eq!(resolution.aggregates[&key("author.prod")], ids(&["a", "p"]));
}

#[test]
fn empty_stage_axis_keeps_role_aggregates() {
    let resolver = Resolver::new(&ServiceRole::ALL)
        .expect("resolver")
        .with_stages(&[]);
    let resolution = resolver
        .resolve(&items(&[("author", &["a"])]))
        .expect("resolve");
    assert_eq!(key_names(&resolution), vec!["author", "publish"]);
}
