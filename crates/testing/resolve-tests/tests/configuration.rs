//! Resolver configuration loaded from TOML and its effect on lookup

use std::io::Write;

use resolve_tests::FixtureBuilder;
use rv_entity::{AccessLevel, LookupType};
use rv_resolve::{LookupOptions, ResolverConfig, ShadowingPolicy, UnqualifiedOptions};

#[test]
fn test_access_control_switched_off_by_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "enable_access_control = false").unwrap();
    let config = ResolverConfig::from_file(file.path()).unwrap();
    assert!(!config.enable_access_control);
    assert!(config.named_lazy_member_loading);

    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let owner = fixture.file(module, "a.swift");
    let other = fixture.file(module, "b.swift");
    let helper = fixture.func(owner, "helper");
    fixture.access(helper, AccessLevel::FilePrivate);
    let name = fixture.name("helper");
    let mut session = fixture.session_with(config);

    let found = session.lookup_unqualified(&name, other, None, UnqualifiedOptions::empty());
    assert_eq!(found.decls().collect::<Vec<_>>(), vec![helper]);
}

#[test]
fn test_nested_shadowing_table_parses() {
    let config = ResolverConfig::from_toml_str(
        "enable_dependency_tracking = false\n\n[shadowing]\nprefer_concrete_over_protocol = false\n",
    )
    .unwrap();

    assert!(!config.enable_dependency_tracking);
    assert!(!config.shadowing.prefer_concrete_over_protocol);
    assert!(config.enable_access_control);
}

#[test]
fn test_unreadable_config_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("resolver.toml");

    let error = ResolverConfig::from_file(&missing).unwrap_err();

    assert!(format!("{error:#}").contains("resolver.toml"));
}

#[test]
fn test_shadowing_policy_decides_protocol_ties() {
    let build = |policy: ShadowingPolicy| {
        let mut fixture = FixtureBuilder::new();
        let module = fixture.module("App");
        let file = fixture.file(module, "shapes.swift");
        let protocol = fixture.protocol(file, "Drawable");
        let requirement = fixture.method(protocol, "draw");
        let shape = fixture.structure(file, "Shape");
        let witness = fixture.method(shape, "draw");
        fixture.graph.add_conformance(shape, protocol).unwrap();
        let draw = fixture.name("draw");
        let mut session = fixture.session_with(ResolverConfig {
            shadowing: policy,
            ..ResolverConfig::default()
        });
        let found = session.lookup_qualified_decls(
            &LookupType::Nominal(shape),
            &draw,
            LookupOptions::QUALIFIED_DEFAULT | LookupOptions::PROTOCOL_MEMBERS,
            file,
        );
        (found, requirement, witness)
    };

    let (found, _, witness) = build(ShadowingPolicy::default());
    assert_eq!(found, vec![witness]);

    let (mut found, requirement, witness) = build(ShadowingPolicy {
        prefer_concrete_over_protocol: false,
    });
    found.sort_by_key(|decl| u32::from(decl.into_raw()));
    assert_eq!(found, vec![requirement, witness]);
}
