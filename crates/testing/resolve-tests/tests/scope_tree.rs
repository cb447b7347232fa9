//! Scope trees driving unqualified lookup

use expect_test::expect;
use resolve_tests::FixtureBuilder;
use rv_entity::{ContextId, DeclId, DeclKind, SourceFileKind, VarDecl};
use rv_resolve::{LookupResultEntry, ResolverSession, ScopeId, ScopeKind, ScopeTree, UnqualifiedOptions};
use rv_span::{SourceLoc, Span};

struct Closures {
    session: ResolverSession,
    file: ContextId,
    body: ContextId,
    closure: ContextId,
    closure_scope: ScopeId,
    global: DeclId,
    outer: DeclId,
    inner: DeclId,
}

/// `run` binds `value`, then a closure inside it binds another `value`
fn closures() -> Closures {
    let mut fixture = FixtureBuilder::new();
    let module = fixture.module("Script");
    let file = fixture.file_of_kind(module, SourceFileKind::Main, "main.swift");
    let global = fixture.var_in(file, "value");
    let run = fixture.func(file, "run");
    let body = fixture.body(run);
    let closure = fixture.graph.add_closure(body);
    let value = fixture.name("value");
    let outer = fixture
        .graph
        .alloc_decl(body, Some(value.clone()), DeclKind::Var(VarDecl::default()));
    let inner = fixture
        .graph
        .alloc_decl(closure, Some(value), DeclKind::Var(VarDecl::default()));

    let mut tree = ScopeTree::new(file, Span::new(0, 100));
    let mut builder = tree.builder();
    builder.enter(ScopeKind::FunctionDecl(run), Span::new(10, 90));
    builder.enter(ScopeKind::FunctionBody(run), Span::new(20, 90));
    builder.enter(ScopeKind::AfterPatternBinding, Span::new(30, 89));
    builder.bind(outer);
    let closure_scope = builder.enter(ScopeKind::Closure(closure), Span::new(40, 60));
    builder.leaf(ScopeKind::AfterPatternBinding, Span::new(45, 59), &[inner]);
    builder.exit();
    builder.exit();
    builder.exit();
    builder.exit();
    builder.finish().unwrap();
    tree.verify().unwrap();

    let mut session = fixture.session();
    session.add_scope_tree(tree);
    Closures {
        session,
        file,
        body,
        closure,
        closure_scope,
        global,
        outer,
        inner,
    }
}

#[test]
fn test_innermost_binding_wins() {
    let mut test = closures();
    let value = test.session.graph().name("value");
    let options = UnqualifiedOptions::empty();

    let found = test
        .session
        .lookup_unqualified(&value, test.closure, Some(SourceLoc(50)), options);
    assert_eq!(found.results, vec![LookupResultEntry::unqualified(test.inner)]);

    let found = test
        .session
        .lookup_unqualified(&value, test.body, Some(SourceLoc(70)), options);
    assert_eq!(found.results, vec![LookupResultEntry::unqualified(test.outer)]);

    // Before the local binding starts, the file-level variable is found.
    let found = test
        .session
        .lookup_unqualified(&value, test.body, Some(SourceLoc(25)), options);
    assert_eq!(found.results, vec![LookupResultEntry::unqualified(test.global)]);
}

#[test]
fn test_rebuilt_subtree_keeps_the_tree_consistent() {
    let mut test = closures();
    let inner = test.inner;
    let closure_scope = test.closure_scope;
    let tree = test.session.scope_tree_mut(test.file).unwrap();

    tree.rebuild_subtree(closure_scope, Span::new(40, 70), |builder| {
        builder.leaf(ScopeKind::AfterPatternBinding, Span::new(42, 69), &[inner]);
    })
    .unwrap();
    tree.verify().unwrap();

    let tree = test.session.scope_tree(test.file).unwrap();
    expect![[r#"
        SourceFile 0..110
          FunctionDecl run 10..100
            FunctionBody run 20..100
              AfterPatternBinding 30..99 [value]
                Closure 40..70
                  AfterPatternBinding 42..69 [value]
    "#]]
    .assert_eq(&tree.dump(test.session.graph()));

    let value = test.session.graph().name("value");
    let found = test.session.lookup_unqualified(
        &value,
        test.closure,
        Some(SourceLoc(65)),
        UnqualifiedOptions::empty(),
    );
    assert_eq!(found.results, vec![LookupResultEntry::unqualified(inner)]);
}
