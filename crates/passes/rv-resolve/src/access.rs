//! Access scopes and the access filter

use rv_entity::{AccessLevel, ContextId, ContextKind, DeclId, DeclKind, EntityGraph};

use crate::session::ResolverSession;

/// Widest context from which a declaration remains visible
///
/// `context == None` is the universal scope. `private` marks scopes derived
/// from a `private` declaration, which extend to same-file extensions of the
/// declaring type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccessScope {
    /// Context the declaration is visible from; `None` means everywhere
    pub context: Option<ContextId>,
    /// Opened by a `private` declaration
    pub private: bool,
}

impl AccessScope {
    /// Visible everywhere
    pub const PUBLIC: Self = Self {
        context: None,
        private: false,
    };

    /// Scope limited to `context`
    pub fn new(context: ContextId, private: bool) -> Self {
        Self {
            context: Some(context),
            private,
        }
    }

    /// Visible everywhere
    pub fn is_public(&self) -> bool {
        self.context.is_none()
    }

    /// Scope of a declaration with `access` whose owner is `owner`
    pub fn for_level(graph: &EntityGraph, owner: ContextId, access: AccessLevel) -> Self {
        match access {
            AccessLevel::Public | AccessLevel::Open => Self::PUBLIC,
            AccessLevel::Internal => {
                let module = graph.module_of_context(owner);
                graph
                    .decl(module)
                    .as_context
                    .map_or(Self::PUBLIC, |context| Self::new(context, false))
            }
            AccessLevel::FilePrivate => Self::new(graph.module_scope_of(owner), false),
            AccessLevel::Private => Self::new(owner, true),
        }
    }

    /// The narrower of two scopes on one context chain
    ///
    /// Scopes on unrelated chains have no intersection; the first is kept.
    #[must_use]
    pub fn intersect(self, graph: &EntityGraph, other: Self) -> Self {
        match (self.context, other.context) {
            (None, _) => other,
            (_, None) => self,
            (Some(mine), Some(theirs)) => {
                if is_child_context_of(graph, mine, theirs) {
                    self
                } else if is_child_context_of(graph, theirs, mine) {
                    other
                } else {
                    self
                }
            }
        }
    }
}

/// Whether `context` is `ancestor` or nested in it
pub fn is_child_context_of(graph: &EntityGraph, context: ContextId, ancestor: ContextId) -> bool {
    let mut current = Some(context);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = graph.parent(node);
    }
    false
}

/// Access scope of `decl` at `access`, narrowed by every enclosing type
fn scope_at_level(graph: &EntityGraph, decl: DeclId, access: AccessLevel) -> AccessScope {
    let owner = graph.owner(decl);
    let mut scope = AccessScope::for_level(graph, owner, access);

    let mut current = Some(owner);
    while let Some(context) = current {
        let node = graph.context(context);
        if node.is_module_scope() {
            break;
        }
        if let Some(nominal) = graph.nominal_of_context(context) {
            let nominal_decl = graph.decl(nominal);
            let nominal_scope =
                AccessScope::for_level(graph, nominal_decl.owner, nominal_decl.access());
            scope = scope.intersect(graph, nominal_scope);
        }
        current = node.parent;
    }
    scope
}

/// The access scope of a declaration
pub fn access_scope(graph: &EntityGraph, decl: DeclId) -> AccessScope {
    scope_at_level(graph, decl, graph.decl(decl).access())
}

/// Whether `use_context` may see private members of `source`
///
/// Lexically nested contexts always can. Otherwise the two must be in the
/// same file and `use_context` must sit inside the nominal type `source`
/// belongs to or inside one of that type's extensions.
pub fn allows_private_access(graph: &EntityGraph, use_context: ContextId, source: ContextId) -> bool {
    if is_child_context_of(graph, use_context, source) {
        return true;
    }
    if graph.file_of(use_context) != graph.file_of(source) {
        return false;
    }
    let Some(source_nominal) = graph.nominal_of_context(source) else {
        return false;
    };

    let mut current = Some(use_context);
    while let Some(context) = current {
        if graph.context(context).is_module_scope() {
            break;
        }
        if graph.nominal_of_context(context) == Some(source_nominal) {
            return true;
        }
        current = graph.parent(context);
    }
    false
}

/// Whether `use_context` lies within `scope`
fn scope_contains(graph: &EntityGraph, scope: AccessScope, use_context: ContextId) -> bool {
    let Some(scope_context) = scope.context else {
        return true;
    };
    if scope.private {
        return allows_private_access(graph, use_context, scope_context);
    }
    match graph.context(scope_context).kind {
        ContextKind::Module(module) => {
            if graph.module_of_context(use_context) == module {
                return true;
            }
            // `@testable` imports see internal declarations.
            graph.file_unit(use_context).is_some_and(|unit| {
                unit.imports
                    .iter()
                    .any(|import| import.testable && import.module == module)
            })
        }
        _ => is_child_context_of(graph, use_context, scope_context),
    }
}

fn check_access(
    graph: &EntityGraph,
    decl: DeclId,
    use_context: Option<ContextId>,
    access: AccessLevel,
) -> bool {
    let scope = scope_at_level(graph, decl, access);
    match use_context {
        None => scope.is_public(),
        Some(use_context) => {
            // Local declarations are visible wherever they can be named.
            if graph.context(graph.owner(decl)).is_local() {
                return true;
            }
            scope_contains(graph, scope, use_context)
        }
    }
}

/// Whether `decl` is accessible from `use_context`
///
/// Without a requester (e.g. during serialization) only universally public
/// declarations are accessible.
pub fn is_accessible_from(graph: &EntityGraph, decl: DeclId, use_context: Option<ContextId>) -> bool {
    check_access(graph, decl, use_context, graph.decl(decl).access())
}

/// Whether the setter of a storage declaration is accessible from `use_context`
pub fn is_setter_accessible_from(
    graph: &EntityGraph,
    decl: DeclId,
    use_context: Option<ContextId>,
) -> bool {
    let target = graph.decl(decl);
    if matches!(target.kind, DeclKind::Param) {
        return true;
    }
    // Stored properties without a setter are only written by initializers.
    if target.flags.contains(rv_entity::DeclFlags::HAS_STORAGE) && !target.is_settable() {
        return true;
    }
    check_access(graph, decl, use_context, target.setter_access())
}

impl ResolverSession {
    /// Access scope of `decl`
    pub fn access_scope(&self, decl: DeclId) -> AccessScope {
        access_scope(&self.graph, decl)
    }

    /// Whether `decl` is accessible from `use_context`
    pub fn is_accessible_from(&self, decl: DeclId, use_context: Option<ContextId>) -> bool {
        is_accessible_from(&self.graph, decl, use_context)
    }

    /// Whether the setter of `decl` is accessible from `use_context`
    pub fn is_setter_accessible_from(&self, decl: DeclId, use_context: Option<ContextId>) -> bool {
        is_setter_accessible_from(&self.graph, decl, use_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_entity::{
        Import, NominalDecl, NominalKind, SourceFileKind, VarDecl,
    };
    use rv_span::FileId;

    struct Fixture {
        graph: EntityGraph,
        lib: DeclId,
        app: DeclId,
        file_a: ContextId,
        file_b: ContextId,
        app_file: ContextId,
        point: DeclId,
    }

    fn fixture() -> Fixture {
        let mut graph = EntityGraph::default();
        let lib = graph.add_module("Lib");
        let app = graph.add_module("App");
        let file_a = graph
            .add_file(lib, FileId::new(0), SourceFileKind::Library, "a")
            .unwrap();
        let file_b = graph
            .add_file(lib, FileId::new(1), SourceFileKind::Library, "b")
            .unwrap();
        let app_file = graph
            .add_file(app, FileId::new(2), SourceFileKind::Main, "main")
            .unwrap();
        let name = graph.name("Point");
        let point = graph.add_decl(
            file_a,
            Some(name),
            DeclKind::Nominal(NominalDecl::new(NominalKind::Struct)),
        );
        graph.set_access(point, AccessLevel::Public).unwrap();
        Fixture {
            graph,
            lib,
            app,
            file_a,
            file_b,
            app_file,
            point,
        }
    }

    fn member(graph: &mut EntityGraph, owner: DeclId, name: &str, access: AccessLevel) -> DeclId {
        let context = graph.decl(owner).as_context.unwrap();
        let name = graph.name(name);
        let decl = graph.add_decl(context, Some(name), DeclKind::Var(VarDecl::default()));
        graph.set_access(decl, access).unwrap();
        decl
    }

    #[test]
    fn test_fileprivate_visible_only_in_same_file() {
        let mut fx = fixture();
        let hidden = member(&mut fx.graph, fx.point, "hidden", AccessLevel::FilePrivate);

        assert!(is_accessible_from(&fx.graph, hidden, Some(fx.file_a)));
        assert!(!is_accessible_from(&fx.graph, hidden, Some(fx.file_b)));
        assert!(!is_accessible_from(&fx.graph, hidden, None));
    }

    #[test]
    fn test_internal_needs_same_module_or_testable_import() {
        let mut fx = fixture();
        let count = member(&mut fx.graph, fx.point, "count", AccessLevel::Internal);

        assert!(is_accessible_from(&fx.graph, count, Some(fx.file_b)));
        assert!(!is_accessible_from(&fx.graph, count, Some(fx.app_file)));

        fx.graph
            .add_import(
                fx.app_file,
                Import {
                    module: fx.lib,
                    exported: false,
                    testable: true,
                },
            )
            .unwrap();
        assert!(is_accessible_from(&fx.graph, count, Some(fx.app_file)));
        assert_eq!(fx.graph.module_of_context(fx.app_file), fx.app);
    }

    #[test]
    fn test_public_member_of_internal_type_is_module_scoped() {
        let mut fx = fixture();
        let name = fx.graph.name("Box");
        let boxed = fx.graph.add_decl(
            fx.file_a,
            Some(name),
            DeclKind::Nominal(NominalDecl::new(NominalKind::Struct)),
        );
        let value = member(&mut fx.graph, boxed, "value", AccessLevel::Public);

        let scope = access_scope(&fx.graph, value);
        assert!(!scope.is_public());
        assert!(!is_accessible_from(&fx.graph, value, Some(fx.app_file)));
        assert!(is_accessible_from(&fx.graph, value, Some(fx.file_b)));
    }

    #[test]
    fn test_private_visible_from_same_file_extension() {
        let mut fx = fixture();
        let secret = member(&mut fx.graph, fx.point, "secret", AccessLevel::Private);
        let same_file = fx.graph.add_extension(fx.file_a, fx.point).unwrap();
        let other_file = fx.graph.add_extension(fx.file_b, fx.point).unwrap();
        let same_ctx = fx.graph.decl(same_file).as_context.unwrap();
        let other_ctx = fx.graph.decl(other_file).as_context.unwrap();

        assert!(is_accessible_from(&fx.graph, secret, Some(same_ctx)));
        assert!(!is_accessible_from(&fx.graph, secret, Some(other_ctx)));
        assert!(!is_accessible_from(&fx.graph, secret, Some(fx.file_a)));
    }

    #[test]
    fn test_setter_access_can_be_narrower() {
        let mut fx = fixture();
        let count = member(&mut fx.graph, fx.point, "count", AccessLevel::Public);
        fx.graph
            .add_accessor(count, rv_entity::AccessorKind::Set);
        fx.graph
            .set_setter_access(count, AccessLevel::FilePrivate)
            .unwrap();

        assert!(is_accessible_from(&fx.graph, count, Some(fx.app_file)));
        assert!(!is_setter_accessible_from(&fx.graph, count, Some(fx.app_file)));
        assert!(is_setter_accessible_from(&fx.graph, count, Some(fx.file_a)));

        let stored = member(&mut fx.graph, fx.point, "id", AccessLevel::Public);
        fx.graph
            .insert_flags(stored, rv_entity::DeclFlags::HAS_STORAGE);
        assert!(is_setter_accessible_from(&fx.graph, stored, Some(fx.app_file)));
    }
}
