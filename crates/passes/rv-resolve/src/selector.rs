//! Foreign selector cache
//!
//! Each class keeps a table from `(selector, is_instance)` to the methods
//! answering that selector. Entries remember the module generation they were
//! filled at; a lookup refreshes an entry from every module loaded since.

use rustc_hash::FxHashMap;
use rv_entity::{ContextId, DeclId, Selector};
use smallvec::SmallVec;

use crate::module_lookup::dedupe;
use crate::session::ResolverSession;

/// Two distinct methods of one class answering the same selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectorConflict {
    /// Class whose methods collided
    pub class: DeclId,
    /// Selector both methods answer
    pub selector: Selector,
    /// Instance rather than class methods
    pub is_instance: bool,
    /// Method recorded first
    pub existing: DeclId,
    /// Method that collided with it
    pub conflicting: DeclId,
}

#[derive(Debug, Clone, Default)]
struct StoredMethods {
    generation: u32,
    methods: SmallVec<[DeclId; 2]>,
}

type MethodTable = FxHashMap<(Selector, bool), StoredMethods>;

/// Session-owned selector tables, conflicts and the module generation counter
#[derive(Debug, Clone, Default)]
pub(crate) struct SelectorState {
    tables: FxHashMap<DeclId, MethodTable>,
    conflicts: Vec<SelectorConflict>,
    generation: u32,
    /// Modules registered as loaded, with the generation they bumped to
    loaded_modules: Vec<(DeclId, u32)>,
}

impl ResolverSession {
    /// Note that `module` finished loading; cached selector entries go stale
    pub fn register_loaded_module(&mut self, module: DeclId) {
        let state = &mut self.selectors;
        state.generation += 1;
        state.loaded_modules.push((module, state.generation));
        tracing::debug!(module = ?module, generation = state.generation, "module loaded");
    }

    /// Bumped each time a module is registered as loaded
    pub fn selector_generation(&self) -> u32 {
        self.selectors.generation
    }

    /// Conflicts recorded so far, in discovery order
    pub fn selector_conflicts(&self) -> &[SelectorConflict] {
        &self.selectors.conflicts
    }

    /// Record `method` in the selector table of `class`
    ///
    /// Ignored for classes whose table was never requested, for members
    /// without a selector, and for methods already recorded.
    pub(crate) fn record_selector_method(&mut self, class: DeclId, method: DeclId) {
        let decl = self.graph.decl(method);
        let Some(selector) = decl.selector() else {
            return;
        };
        let is_instance = !decl.is_static();
        let state = &mut self.selectors;
        let generation = state.generation;
        let Some(table) = state.tables.get_mut(&class) else {
            return;
        };
        let stored = table
            .entry((selector, is_instance))
            .or_insert_with(|| StoredMethods {
                generation,
                methods: SmallVec::new(),
            });
        if stored.methods.contains(&method) {
            return;
        }
        if let Some(existing) = stored.methods.first().copied() {
            state.conflicts.push(SelectorConflict {
                class,
                selector,
                is_instance,
                existing,
                conflicting: method,
            });
        }
        stored.methods.push(method);
    }

    /// Build the selector table of `class` from everything it has
    fn ensure_selector_table(&mut self, class: DeclId) {
        if self.selectors.tables.contains_key(&class) {
            return;
        }
        self.selectors.tables.insert(class, MethodTable::default());

        let mut iterables = vec![class];
        iterables.extend(self.graph.extensions(class));
        for iterable in iterables {
            self.load_all_members(iterable);
            let members: Vec<DeclId> = self.graph.members(iterable).collect();
            for member in members {
                self.record_selector_method(class, member);
            }
        }
    }

    /// Methods of `class` answering `selector`
    pub fn lookup_selector(
        &mut self,
        class: DeclId,
        selector: Selector,
        is_instance: bool,
    ) -> Vec<DeclId> {
        self.ensure_selector_table(class);

        let current = self.selectors.generation;
        let stored_generation = self
            .selectors
            .tables
            .get(&class)
            .and_then(|table| table.get(&(selector, is_instance)))
            .map_or(0, |stored| stored.generation);

        if stored_generation < current {
            let newer: Vec<DeclId> = self
                .selectors
                .loaded_modules
                .iter()
                .filter(|(_, generation)| *generation > stored_generation)
                .map(|(module, _)| *module)
                .collect();
            let mut iterables = vec![class];
            iterables.extend(self.graph.extensions(class));
            for iterable in iterables {
                if !newer.contains(&self.graph.module_of(iterable)) {
                    continue;
                }
                self.load_all_members(iterable);
                let members: Vec<DeclId> = self.graph.members(iterable).collect();
                for member in members {
                    self.record_selector_method(class, member);
                }
            }
            if let Some(table) = self.selectors.tables.get_mut(&class) {
                table.entry((selector, is_instance)).or_default().generation = current;
            }
        }

        self.selectors
            .tables
            .get(&class)
            .and_then(|table| table.get(&(selector, is_instance)))
            .map(|stored| stored.methods.to_vec())
            .unwrap_or_default()
    }

    /// Every method answering `selector` in the classes visible from `requester`
    pub fn lookup_all_selector_methods(
        &mut self,
        requester: ContextId,
        selector: Selector,
    ) -> Vec<DeclId> {
        let mut classes = Vec::new();
        for module in self.visible_modules(requester) {
            classes.extend(
                self.graph
                    .top_level_decls(module)
                    .filter(|decl| self.graph.decl(*decl).is_class()),
            );
        }

        let mut methods = Vec::new();
        for class in classes {
            methods.extend(self.lookup_selector(class, selector, true));
            methods.extend(self.lookup_selector(class, selector, false));
        }
        dedupe(&mut methods);
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use rv_entity::{
        DeclFlags, DeclKind, EntityGraph, FuncDecl, Interner, NominalDecl, NominalKind,
        SourceFileKind,
    };
    use rv_span::FileId;

    fn method(graph: &mut EntityGraph, body: ContextId, name: &str, selector: &str) -> DeclId {
        let name = graph.name(name);
        let selector = Selector(graph.interner().intern(selector));
        graph.add_decl(
            body,
            Some(name),
            DeclKind::Func(FuncDecl {
                selector: Some(selector),
                ..FuncDecl::default()
            }),
        )
    }

    fn class_fixture() -> (EntityGraph, ContextId, DeclId, ContextId) {
        let mut graph = EntityGraph::new(Interner::new());
        let module = graph.add_module("App");
        let file = graph
            .add_file(module, FileId::new(0), SourceFileKind::Library, "a.swift")
            .unwrap();
        let name = graph.name("View");
        let class = graph.add_decl(
            file,
            Some(name),
            DeclKind::Nominal(NominalDecl::new(NominalKind::Class)),
        );
        let body = graph.decl(class).as_context.unwrap();
        (graph, file, class, body)
    }

    #[test]
    fn test_lookup_and_conflict() {
        let (mut graph, file, class, body) = class_fixture();
        let draw = method(&mut graph, body, "draw", "drawRect:");
        let selector = graph.decl(draw).selector().unwrap();
        let mut session = ResolverSession::new(graph, ResolverConfig::default());

        assert_eq!(session.lookup_selector(class, selector, true), vec![draw]);
        assert!(session.lookup_selector(class, selector, false).is_empty());
        assert!(session.selector_conflicts().is_empty());

        let ext = session.graph_mut().add_extension(file, class).unwrap();
        let ext_body = session.graph().decl(ext).as_context.unwrap();
        let name = session.graph().name("render");
        let render = session.graph_mut().alloc_decl(
            ext_body,
            Some(name),
            DeclKind::Func(FuncDecl {
                selector: Some(selector),
                ..FuncDecl::default()
            }),
        );
        session.add_member(ext, render).unwrap();
        // Re-recording the same method is not a conflict.
        session.add_member(ext, render).unwrap();

        assert_eq!(session.lookup_selector(class, selector, true), vec![draw, render]);
        assert_eq!(
            session.selector_conflicts(),
            &[SelectorConflict {
                class,
                selector,
                is_instance: true,
                existing: draw,
                conflicting: render,
            }]
        );
    }

    #[test]
    fn test_static_methods_use_class_side_key() {
        let (mut graph, file, class, body) = class_fixture();
        let make = method(&mut graph, body, "make", "make");
        graph.insert_flags(make, DeclFlags::STATIC);
        let selector = graph.decl(make).selector().unwrap();
        let mut session = ResolverSession::new(graph, ResolverConfig::default());

        assert!(session.lookup_selector(class, selector, true).is_empty());
        assert_eq!(session.lookup_selector(class, selector, false), vec![make]);
        assert_eq!(session.lookup_all_selector_methods(file, selector), vec![make]);
    }

    #[test]
    fn test_generation_bumps_on_module_load() {
        let (graph, _, _, _) = class_fixture();
        let module = graph.modules().next().unwrap();
        let mut session = ResolverSession::new(graph, ResolverConfig::default());
        assert_eq!(session.selector_generation(), 0);
        session.register_loaded_module(module);
        session.register_loaded_module(module);
        assert_eq!(session.selector_generation(), 2);
    }
}
