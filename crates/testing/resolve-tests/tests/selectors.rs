//! Selector tables refreshing as modules load

use resolve_tests::FixtureBuilder;
use rv_entity::{ContextId, DeclId, DeclKind, FuncDecl, Selector, SourceFileKind};
use rv_span::FileId;

fn selector_method(
    fixture: &mut FixtureBuilder,
    owner: ContextId,
    name: &str,
    selector: Selector,
) -> DeclId {
    let name = fixture.name(name);
    let kind = DeclKind::Func(FuncDecl {
        selector: Some(selector),
        ..FuncDecl::default()
    });
    fixture.graph.add_decl(owner, Some(name), kind)
}

#[test]
fn test_selector_table_picks_up_late_modules() {
    let mut fixture = FixtureBuilder::new();
    let app = fixture.module("App");
    let file = fixture.file(app, "view.swift");
    let view = fixture.class(file, "View");
    let body = fixture.body(view);
    let selector = Selector(fixture.graph.interner().intern("drawRect:"));
    let draw = selector_method(&mut fixture, body, "draw", selector);
    let mut session = fixture.session();

    assert_eq!(session.lookup_selector(view, selector, true), vec![draw]);
    assert!(session.lookup_selector(view, selector, false).is_empty());

    let late = session.graph_mut().add_module("Late");
    let late_file = session
        .graph_mut()
        .add_file(late, FileId::new(9), SourceFileKind::Library, "late.swift")
        .unwrap();
    let ext = session.graph_mut().add_extension(late_file, view).unwrap();
    let ext_body = session.graph().decl(ext).as_context.unwrap();
    let render_name = session.graph().name("render");
    let render = session.graph_mut().add_decl(
        ext_body,
        Some(render_name),
        DeclKind::Func(FuncDecl {
            selector: Some(selector),
            ..FuncDecl::default()
        }),
    );

    // Cached until the module is announced.
    assert_eq!(session.lookup_selector(view, selector, true), vec![draw]);

    session.register_loaded_module(late);
    assert_eq!(session.lookup_selector(view, selector, true), vec![draw, render]);
    assert_eq!(session.selector_generation(), 1);

    let conflicts = session.selector_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].class, view);
    assert_eq!(conflicts[0].existing, draw);
    assert_eq!(conflicts[0].conflicting, render);
}

#[test]
fn test_all_selector_methods_cover_visible_classes() {
    let mut fixture = FixtureBuilder::new();
    let kit = fixture.module("Kit");
    let kit_file = fixture.file(kit, "kit.swift");
    let button = fixture.class(kit_file, "Button");
    let button_body = fixture.body(button);
    let selector = Selector(fixture.graph.interner().intern("tap:"));
    let tap = selector_method(&mut fixture, button_body, "tap", selector);

    let app = fixture.module("App");
    let app_file = fixture.file(app, "main.swift");
    let screen = fixture.class(app_file, "Screen");
    let screen_body = fixture.body(screen);
    let on_tap = selector_method(&mut fixture, screen_body, "onTap", selector);
    let other = fixture.file(app, "other.swift");
    fixture.import(app_file, kit);
    let mut session = fixture.session();

    let mut found = session.lookup_all_selector_methods(app_file, selector);
    found.sort_by_key(|decl| u32::from(decl.into_raw()));
    assert_eq!(found, vec![tap, on_tap]);

    // Without the import only the module's own classes are searched.
    assert_eq!(session.lookup_all_selector_methods(other, selector), vec![on_tap]);
}
