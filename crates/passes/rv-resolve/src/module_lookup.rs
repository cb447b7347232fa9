//! Module-level lookup
//!
//! Top-level declarations of each module are indexed by name once and
//! re-indexed when the module gains declarations. A lookup searches the
//! module, then everything it re-exports and any extra imports, and reduces
//! the merged set with shadow removal.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use rv_entity::{ContextId, DeclId, DeclKind, DeclName, EntityGraph};
use rv_intern::Symbol;
use smallvec::SmallVec;

use crate::access::is_accessible_from;
use crate::options::LookupOptions;
use crate::session::ResolverSession;
use crate::shadow::{filter_for_discriminator, remove_shadowed_decls};

/// Name-to-declarations index over a set of declarations
///
/// Compound names are indexed under both the full and the base name, so a
/// simple query finds every overload.
#[derive(Debug, Clone, Default)]
pub(crate) struct NameIndex {
    entries: FxHashMap<DeclName, SmallVec<[DeclId; 2]>>,
    /// Size of the source the index was built from
    source_len: Option<usize>,
}

impl NameIndex {
    pub(crate) fn is_current(&self, source_len: usize) -> bool {
        self.source_len == Some(source_len)
    }

    pub(crate) fn rebuild(
        &mut self,
        graph: &EntityGraph,
        decls: impl IntoIterator<Item = DeclId>,
        source_len: usize,
    ) {
        self.entries.clear();
        for decl in decls {
            self.insert(graph, decl);
        }
        self.source_len = Some(source_len);
    }

    fn insert(&mut self, graph: &EntityGraph, decl: DeclId) {
        let Some(name) = graph.decl(decl).name.clone() else {
            return;
        };
        if name.is_compound() {
            self.entries.entry(name.simple_name()).or_default().push(decl);
        }
        self.entries.entry(name).or_default().push(decl);
    }

    pub(crate) fn get(&self, name: &DeclName) -> &[DeclId] {
        self.entries.get(name).map_or(&[], SmallVec::as_slice)
    }
}

/// Functions, initializers and enum cases may be overloaded across modules
fn is_overloadable(graph: &EntityGraph, decl: DeclId) -> bool {
    matches!(
        graph.decl(decl).kind,
        DeclKind::Func(_) | DeclKind::Constructor(_) | DeclKind::EnumElement
    )
}

/// Remove repeated entries, keeping the first occurrence
pub(crate) fn dedupe(decls: &mut Vec<DeclId>) {
    let mut seen = FxHashSet::default();
    decls.retain(|decl| seen.insert(*decl));
}

impl ResolverSession {
    /// Modules `module` makes visible to its importers
    ///
    /// Declared re-exports plus `@_exported` imports of its files.
    pub fn reexported_modules(&self, module: DeclId) -> Vec<DeclId> {
        let mut modules = self.graph.reexports_of(module).to_vec();
        for file in self.graph.files_of(module) {
            if let Some(unit) = self.graph.context(*file).as_file() {
                modules.extend(
                    unit.imports
                        .iter()
                        .filter(|import| import.exported)
                        .map(|import| import.module),
                );
            }
        }
        dedupe(&mut modules);
        modules
    }

    /// Every module visible from `context`, the current module first
    pub fn visible_modules(&self, context: ContextId) -> Vec<DeclId> {
        let current = self.graph.module_of_context(context);
        let mut modules = vec![current];
        let mut seen: FxHashSet<DeclId> = FxHashSet::default();
        seen.insert(current);

        let mut queue: VecDeque<DeclId> = self.reexported_modules(current).into();
        if let Some(unit) = self.graph.file_unit(context) {
            queue.extend(unit.imports.iter().map(|import| import.module));
        }
        while let Some(module) = queue.pop_front() {
            if !seen.insert(module) {
                continue;
            }
            modules.push(module);
            queue.extend(self.reexported_modules(module));
        }
        modules
    }

    /// Module visible from `context` under `name`
    pub fn visible_module_named(&self, context: ContextId, name: Symbol) -> Option<DeclId> {
        self.visible_modules(context)
            .into_iter()
            .find(|module| self.graph.decl(*module).base_name() == Some(name))
    }

    /// Top-level declarations of `module` named `name`, through the index
    fn module_decls_named(&mut self, module: DeclId, name: &DeclName) -> Vec<DeclId> {
        let source_len = self.graph.top_level_decls(module).count();
        let Self {
            module_indexes,
            graph,
            ..
        } = self;
        let index = module_indexes.entry(module).or_default();
        if !index.is_current(source_len) {
            tracing::trace!(module = ?module, source_len, "indexing module top level");
            index.rebuild(graph, graph.top_level_decls(module), source_len);
        }
        index.get(name).to_vec()
    }

    /// Acceptable top-level declarations of `module` for `requester`
    fn module_level_decls(
        &mut self,
        module: DeclId,
        name: &DeclName,
        requester: ContextId,
        options: LookupOptions,
    ) -> Vec<DeclId> {
        let ignore_access = options.contains(LookupOptions::IGNORE_ACCESS_CONTROL)
            || !self.config.enable_access_control;
        let mut decls = self.module_decls_named(module, name);
        decls.retain(|decl| {
            (!options.contains(LookupOptions::ONLY_TYPES) || self.graph.decl(*decl).is_type_decl())
                && (ignore_access || is_accessible_from(&self.graph, *decl, Some(requester)))
        });
        decls
    }

    /// Look `name` up at the top level of `module` and everything it re-exports
    ///
    /// `extra_imports` are searched as if `module` re-exported them. A type
    /// result, or any result that cannot be overloaded, ends the search before
    /// the imports are visited.
    pub fn lookup_in_module(
        &mut self,
        module: DeclId,
        name: &DeclName,
        requester: ContextId,
        options: LookupOptions,
        extra_imports: &[DeclId],
    ) -> Vec<DeclId> {
        let mut results = self.module_level_decls(module, name, requester, options);
        let done = !results.is_empty()
            && (options.contains(LookupOptions::ONLY_TYPES)
                || results
                    .iter()
                    .any(|decl| !is_overloadable(&self.graph, *decl)));
        if done {
            return results;
        }

        let mut visited: FxHashSet<DeclId> = FxHashSet::default();
        visited.insert(module);
        let mut queue: VecDeque<DeclId> = self.reexported_modules(module).into();
        queue.extend(extra_imports.iter().copied());
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next) {
                continue;
            }
            let found = self.module_level_decls(next, name, requester, options);
            results.extend(found);
            queue.extend(self.reexported_modules(next));
        }

        dedupe(&mut results);
        let current_module = self.graph.module_of_context(requester);
        remove_shadowed_decls(
            &self.graph,
            self.config.shadowing,
            self.config.effective_language_version,
            &mut results,
            current_module,
        );
        results
    }

    /// Qualified lookup into a module
    ///
    /// The module must be the requester's own module or visible from it.
    pub(crate) fn lookup_module_member(
        &mut self,
        module: DeclId,
        name: &DeclName,
        requester: ContextId,
        options: LookupOptions,
        cascading: Option<bool>,
    ) -> Vec<DeclId> {
        let current = self.graph.module_of_context(requester);
        if module == current {
            if let (Some(cascading), Some(tracker)) = (cascading, self.tracker_for(requester)) {
                tracker.add_top_level_name(name.base(), cascading);
            }
        } else if !self.visible_modules(requester).contains(&module) {
            tracing::debug!(module = ?module, "module is not visible from the requester");
            return Vec::new();
        }

        let mut results = self.lookup_in_module(module, name, requester, options, &[]);
        dedupe(&mut results);
        if options.contains(LookupOptions::ONLY_TYPES) {
            results.retain(|decl| self.graph.decl(*decl).is_type_decl());
        }
        if let Some(discriminator) = self.preferred_discriminator() {
            filter_for_discriminator(&self.graph, &mut results, discriminator, |decl| *decl);
        }
        results
    }

    pub(crate) fn preferred_discriminator(&self) -> Option<Symbol> {
        self.debugger
            .as_ref()
            .and_then(|client| client.preferred_private_discriminator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use rv_entity::{AccessLevel, FuncDecl, Import, Interner, NominalDecl, NominalKind, SourceFileKind};
    use rv_span::FileId;

    fn library(graph: &mut EntityGraph, name: &str, id: u32) -> (DeclId, ContextId) {
        let module = graph.add_module(name);
        let file = graph
            .add_file(module, FileId::new(id), SourceFileKind::Library, name)
            .unwrap();
        (module, file)
    }

    fn public_func(graph: &mut EntityGraph, file: ContextId, name: &str) -> DeclId {
        let name = graph.name(name);
        let decl = graph.add_decl(file, Some(name), DeclKind::Func(FuncDecl::default()));
        graph.set_access(decl, AccessLevel::Public).unwrap();
        graph.set_signature(decl, "() -> ()").unwrap();
        decl
    }

    #[test]
    fn test_visible_modules_follow_reexports() {
        let mut graph = EntityGraph::new(Interner::new());
        let (app, app_file) = library(&mut graph, "App", 0);
        let (kit, _) = library(&mut graph, "Kit", 1);
        let (base, _) = library(&mut graph, "Base", 2);
        let (hidden, _) = library(&mut graph, "Hidden", 3);
        graph.add_reexport(kit, base).unwrap();
        graph
            .add_import(app_file, Import { module: kit, exported: false, testable: false })
            .unwrap();

        let session = ResolverSession::new(graph, ResolverConfig::default());
        let visible = session.visible_modules(app_file);
        assert_eq!(visible, vec![app, kit, base]);
        assert!(!visible.contains(&hidden));
    }

    #[test]
    fn test_local_module_wins_for_functions() {
        let mut graph = EntityGraph::new(Interner::new());
        let (_, app_file) = library(&mut graph, "App", 0);
        let (other, other_file) = library(&mut graph, "Other", 1);
        let local = public_func(&mut graph, app_file, "f");
        public_func(&mut graph, other_file, "f");
        graph
            .add_import(app_file, Import { module: other, exported: false, testable: false })
            .unwrap();

        let module = graph.module_of_context(app_file);
        let name = graph.name("f");
        let mut session = ResolverSession::new(graph, ResolverConfig::default());
        let found = session.lookup_in_module(module, &name, app_file, LookupOptions::empty(), &[other]);
        assert_eq!(found, vec![local]);
    }

    #[test]
    fn test_type_result_stops_before_imports() {
        let mut graph = EntityGraph::new(Interner::new());
        let (app, app_file) = library(&mut graph, "App", 0);
        let (other, other_file) = library(&mut graph, "Other", 1);
        let name = graph.name("Point");
        let local = graph.add_decl(
            app_file,
            Some(name.clone()),
            DeclKind::Nominal(NominalDecl::new(NominalKind::Struct)),
        );
        let remote = graph.add_decl(
            other_file,
            Some(name.clone()),
            DeclKind::Nominal(NominalDecl::new(NominalKind::Struct)),
        );
        graph.set_access(remote, AccessLevel::Public).unwrap();

        let mut session = ResolverSession::new(graph, ResolverConfig::default());
        let found = session.lookup_in_module(app, &name, app_file, LookupOptions::empty(), &[other]);
        assert_eq!(found, vec![local]);
    }

    #[test]
    fn test_index_picks_up_new_top_level_decls() {
        let mut graph = EntityGraph::new(Interner::new());
        let (app, app_file) = library(&mut graph, "App", 0);
        let first = public_func(&mut graph, app_file, "g");
        let name = graph.name("g");
        let mut session = ResolverSession::new(graph, ResolverConfig::default());
        assert_eq!(
            session.lookup_in_module(app, &name, app_file, LookupOptions::empty(), &[]),
            vec![first]
        );

        let overload_name = session.graph().compound_name("g", &["x"]);
        let overload = session.graph_mut().add_decl(
            app_file,
            Some(overload_name),
            DeclKind::Func(FuncDecl::default()),
        );
        let found = session.lookup_in_module(app, &name, app_file, LookupOptions::empty(), &[]);
        assert_eq!(found, vec![first, overload]);
    }

    #[test]
    fn test_invisible_module_member_lookup_is_empty() {
        let mut graph = EntityGraph::new(Interner::new());
        let (_, app_file) = library(&mut graph, "App", 0);
        let (other, other_file) = library(&mut graph, "Other", 1);
        public_func(&mut graph, other_file, "f");
        let name = graph.name("f");
        let mut session = ResolverSession::new(graph, ResolverConfig::default());
        let found =
            session.lookup_module_member(other, &name, app_file, LookupOptions::empty(), Some(true));
        assert!(found.is_empty());
    }
}
