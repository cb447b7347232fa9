//! Qualified lookup across class hierarchies, protocols and modules

use resolve_tests::FixtureBuilder;
use rv_entity::{AccessLevel, CtorKind, DeclId, LookupType};
use rv_resolve::{LookupOptions, LookupResultEntry};

fn decls(found: &[LookupResultEntry]) -> Vec<DeclId> {
    found.iter().map(|entry| entry.decl).collect()
}

#[test]
fn test_override_chain_keeps_most_derived() {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let file = fixture.file(module, "shapes.swift");
    let base = fixture.class(file, "Base");
    let middle = fixture.class(file, "Middle");
    let derived = fixture.class(file, "Derived");
    fixture.inherit(middle, base);
    fixture.inherit(derived, middle);

    let base_draw = fixture.method(base, "draw");
    let middle_draw = fixture.method(middle, "draw");
    let derived_draw = fixture.method(derived, "draw");
    fixture.overrides(middle_draw, base_draw);
    fixture.overrides(derived_draw, middle_draw);
    let draw = fixture.name("draw");
    let mut session = fixture.session();

    let found = session.lookup_qualified(
        &LookupType::Nominal(derived),
        &draw,
        LookupOptions::QUALIFIED_DEFAULT,
        file,
    );
    assert_eq!(decls(&found), vec![derived_draw]);

    let found = session.lookup_qualified(
        &LookupType::Nominal(middle),
        &draw,
        LookupOptions::QUALIFIED_DEFAULT,
        file,
    );
    assert_eq!(decls(&found), vec![middle_draw]);
}

#[test]
fn test_overriding_initializer_replaces_inherited_one() {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let file = fixture.file(module, "views.swift");
    let base = fixture.class(file, "Base");
    let derived = fixture.class(file, "Derived");
    fixture.inherit(derived, base);

    let base_init = fixture.ctor(base, CtorKind::Designated, "a");
    let derived_init = fixture.ctor(derived, CtorKind::Designated, "a");
    fixture.overrides(derived_init, base_init);
    let init = fixture.name("init");
    let mut session = fixture.session();

    let found = session.lookup_qualified(
        &LookupType::Nominal(derived),
        &init,
        LookupOptions::QUALIFIED_DEFAULT,
        file,
    );

    assert_eq!(decls(&found), vec![derived_init]);
    assert!(session.inherits_superclass_initializers(derived));
}

#[test]
fn test_inherited_convenience_initializers_are_found() {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let file = fixture.file(module, "views.swift");
    let base = fixture.class(file, "Base");
    let derived = fixture.class(file, "Derived");
    fixture.inherit(derived, base);

    let base_init = fixture.ctor(base, CtorKind::Designated, "a");
    let convenience = fixture.ctor(base, CtorKind::Convenience, "c");
    let derived_init = fixture.ctor(derived, CtorKind::Designated, "a");
    fixture.overrides(derived_init, base_init);
    let init = fixture.name("init");
    let mut session = fixture.session();

    let mut found = decls(&session.lookup_qualified(
        &LookupType::Nominal(derived),
        &init,
        LookupOptions::QUALIFIED_DEFAULT,
        file,
    ));
    found.sort_by_key(|decl| u32::from(decl.into_raw()));

    assert_eq!(found, vec![convenience, derived_init]);
}

#[test]
fn test_extension_conformance_exposes_protocol_members() {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let file = fixture.file(module, "shapes.swift");
    let protocol = fixture.protocol(file, "Drawable");
    let requirement = fixture.method(protocol, "draw");
    let shape = fixture.structure(file, "Shape");
    let ext = fixture.extension(file, shape);
    fixture.graph.add_conformance(ext, protocol).unwrap();
    let draw = fixture.name("draw");
    let mut session = fixture.session();

    let without = session.lookup_qualified(
        &LookupType::Nominal(shape),
        &draw,
        LookupOptions::QUALIFIED_DEFAULT,
        file,
    );
    assert!(without.is_empty());

    let with = session.lookup_qualified(
        &LookupType::Nominal(shape),
        &draw,
        LookupOptions::QUALIFIED_DEFAULT | LookupOptions::PROTOCOL_MEMBERS,
        file,
    );
    assert_eq!(decls(&with), vec![requirement]);
}

#[test]
fn test_archetype_lookup_searches_its_constraints() {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let file = fixture.file(module, "generic.swift");
    let protocol = fixture.protocol(file, "Sized");
    let size = fixture.var(protocol, "size");
    let name = fixture.name("size");
    let mut session = fixture.session();

    let archetype = LookupType::Archetype {
        conforms_to: vec![protocol],
        superclass: None,
        any_object: false,
    };
    let found = session.lookup_qualified(&archetype, &name, LookupOptions::QUALIFIED_DEFAULT, file);

    assert_eq!(decls(&found), vec![size]);
}

#[test]
fn test_module_qualified_lookup_needs_an_import() {
    let mut fixture = FixtureBuilder::new();
    let lib = fixture.module("Lib");
    let lib_file = fixture.file(lib, "lib.swift");
    let helper = fixture.func(lib_file, "helper");
    fixture.access(helper, AccessLevel::Public);

    let app = fixture.module("App");
    let importing = fixture.file(app, "main.swift");
    fixture.import(importing, lib);
    let other = fixture.file(app, "other.swift");
    let name = fixture.name("helper");
    let mut session = fixture.session();

    let found = session.lookup_qualified(
        &LookupType::Module(lib),
        &name,
        LookupOptions::QUALIFIED_DEFAULT,
        importing,
    );
    assert_eq!(decls(&found), vec![helper]);

    let found = session.lookup_qualified(
        &LookupType::Module(lib),
        &name,
        LookupOptions::QUALIFIED_DEFAULT,
        other,
    );
    assert!(found.is_empty());
}

#[test]
fn test_private_members_need_the_same_file() {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("App");
    let file = fixture.file(module, "a.swift");
    let other = fixture.file(module, "b.swift");
    let ty = fixture.structure(file, "Counter");
    let count = fixture.var(ty, "count");
    fixture.access(count, AccessLevel::FilePrivate);
    let name = fixture.name("count");
    let mut session = fixture.session();
    let ty_lookup = LookupType::Nominal(ty);

    let same_file = session.lookup_qualified(&ty_lookup, &name, LookupOptions::QUALIFIED_DEFAULT, file);
    assert_eq!(decls(&same_file), vec![count]);

    let other_file =
        session.lookup_qualified(&ty_lookup, &name, LookupOptions::QUALIFIED_DEFAULT, other);
    assert!(other_file.is_empty());

    let ignored = session.lookup_qualified(
        &ty_lookup,
        &name,
        LookupOptions::QUALIFIED_DEFAULT | LookupOptions::IGNORE_ACCESS_CONTROL,
        other,
    );
    assert_eq!(decls(&ignored), vec![count]);
}
