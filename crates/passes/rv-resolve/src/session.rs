//! The resolver session: graph, caches and configuration of one compilation

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use rv_entity::{ContextId, DeclId, EntityError, EntityGraph, SourceFileKind};

use crate::config::ResolverConfig;
use crate::debugger::DebuggerClient;
use crate::lazy::{LazyMemberLoader, LazyMembers, LookupStats};
use crate::member_table::MemberLookupTable;
use crate::module_lookup::NameIndex;
use crate::scope::ScopeTree;
use crate::selector::SelectorState;
use crate::tracker::ReferencedNames;

/// Owner of one compilation's entity graph and every resolver cache
///
/// All lookups are methods on the session. Nothing here is shared across
/// sessions, and nothing is persisted.
pub struct ResolverSession {
    pub(crate) graph: EntityGraph,
    pub(crate) config: ResolverConfig,
    pub(crate) tables: FxHashMap<DeclId, MemberLookupTable>,
    pub(crate) lazy: FxHashMap<DeclId, LazyMembers>,
    pub(crate) stats: LookupStats,
    pub(crate) scope_trees: FxHashMap<ContextId, ScopeTree>,
    pub(crate) referenced: FxHashMap<ContextId, ReferencedNames>,
    pub(crate) debugger: Option<Box<dyn DebuggerClient>>,
    pub(crate) inherits_inits: FxHashMap<DeclId, bool>,
    pub(crate) module_indexes: FxHashMap<DeclId, NameIndex>,
    pub(crate) class_member_indexes: FxHashMap<DeclId, NameIndex>,
    pub(crate) selectors: SelectorState,
}

impl ResolverSession {
    /// Create a session over `graph`
    pub fn new(graph: EntityGraph, config: ResolverConfig) -> Self {
        Self {
            graph,
            config,
            tables: FxHashMap::default(),
            lazy: FxHashMap::default(),
            stats: LookupStats::default(),
            scope_trees: FxHashMap::default(),
            referenced: FxHashMap::default(),
            debugger: None,
            inherits_inits: FxHashMap::default(),
            module_indexes: FxHashMap::default(),
            class_member_indexes: FxHashMap::default(),
            selectors: SelectorState::default(),
        }
    }

    /// Graph being resolved against
    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    /// Mutable graph access for loaders and graph builders
    ///
    /// Prefer [`Self::add_member`] and [`Self::add_extension`] for members
    /// added after lookups ran; they keep existing tables current.
    pub fn graph_mut(&mut self) -> &mut EntityGraph {
        &mut self.graph
    }

    /// Give the graph back, dropping every cache
    pub fn into_graph(self) -> EntityGraph {
        self.graph
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Snapshot of the lookup counters
    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    // ---------------------------------------------------------------------
    // Lazy member registration
    // ---------------------------------------------------------------------

    /// Hand the members of `iterable` to a lazy loader
    pub fn set_lazy_members(
        &mut self,
        iterable: DeclId,
        loader: Rc<dyn LazyMemberLoader>,
        cursor: u64,
    ) -> Result<(), EntityError> {
        if self.graph.decl(iterable).member_list().is_none() {
            return Err(EntityError::NotIterable(iterable));
        }
        self.lazy
            .insert(iterable, LazyMembers::unloaded(loader, cursor));
        Ok(())
    }

    /// Population state; contexts never handed to a loader are `Loaded`
    pub fn lazy_state(&self, iterable: DeclId) -> &LazyMembers {
        const LOADED: &LazyMembers = &LazyMembers::Loaded;
        self.lazy.get(&iterable).unwrap_or(LOADED)
    }

    /// Whether some members of `iterable` may still be missing from the graph
    pub fn has_lazy_members(&self, iterable: DeclId) -> bool {
        !self.lazy_state(iterable).is_loaded()
    }

    /// Member lookup table of `nominal`, once built
    pub fn member_table(&self, nominal: DeclId) -> Option<&MemberLookupTable> {
        self.tables.get(&nominal)
    }

    /// Whether the table exists, has no lazy members behind it and covers every extension
    pub fn is_fully_populated(&self, nominal: DeclId) -> bool {
        let Some(table) = self.tables.get(&nominal) else {
            return false;
        };
        table.is_populated()
            && !self.has_lazy_members(nominal)
            && table.pending_extensions(&self.graph, nominal).is_empty()
            && self
                .graph
                .extensions(nominal)
                .all(|ext| !self.has_lazy_members(ext))
    }

    // ---------------------------------------------------------------------
    // Incremental additions
    // ---------------------------------------------------------------------

    /// Append `member` to an iterable context and keep existing caches current
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotIterable`] if `iterable` is not a nominal type
    /// or extension.
    pub fn add_member(&mut self, iterable: DeclId, member: DeclId) -> Result<(), EntityError> {
        if self.graph.link_member(iterable, member)? {
            self.note_added_member(iterable, member);
        }
        Ok(())
    }

    /// Register a new extension of `nominal`
    ///
    /// The table picks its members up at the next lookup through the watermark.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotNominal`] if `nominal` is not a nominal type
    /// and [`EntityError::ExtensionAlreadyRegistered`] if `ext` is already in
    /// an extension chain.
    pub fn add_extension(&mut self, nominal: DeclId, ext: DeclId) -> Result<(), EntityError> {
        self.graph.register_extension(nominal, ext)
    }

    /// Index `decl` in the table of `nominal` without linking it anywhere
    pub fn make_member_visible(&mut self, nominal: DeclId, decl: DeclId) {
        let Self { tables, graph, .. } = self;
        tables.entry(nominal).or_default().add_member(graph, decl);
    }

    /// Clear the table of `nominal`; the next lookup rebuilds it
    pub fn invalidate_member_table(&mut self, nominal: DeclId) {
        let Self { tables, graph, .. } = self;
        if let Some(table) = tables.get_mut(&nominal) {
            table.clear(graph);
        }
        self.inherits_inits.remove(&nominal);
    }

    /// Keep the member table and selector cache in step with a new member
    pub(crate) fn note_added_member(&mut self, iterable: DeclId, member: DeclId) {
        let decl = self.graph.decl(iterable);
        let nominal = if decl.as_nominal().is_some() {
            Some(iterable)
        } else {
            decl.as_extension().and_then(|ext| ext.extended)
        };
        let Some(nominal) = nominal else {
            return;
        };

        let Self { tables, graph, .. } = self;
        if let Some(table) = tables.get_mut(&nominal) {
            let indexed_already = if iterable == nominal {
                table.is_populated()
            } else {
                table.includes_extension(graph, nominal, iterable)
            };
            if indexed_already {
                table.add_member(graph, member);
            }
        }
        if self.graph.decl(member).is_constructor() {
            self.inherits_inits.remove(&nominal);
        }
        if self.graph.decl(nominal).is_class() {
            self.record_selector_method(nominal, member);
        }
    }

    // ---------------------------------------------------------------------
    // Scope trees, trackers and the debugger hook
    // ---------------------------------------------------------------------

    /// Install the scope tree of a source file, replacing any previous one
    pub fn add_scope_tree(&mut self, tree: ScopeTree) {
        self.scope_trees.insert(tree.file(), tree);
    }

    /// Scope tree of `file`
    pub fn scope_tree(&self, file: ContextId) -> Option<&ScopeTree> {
        self.scope_trees.get(&file)
    }

    /// Mutable scope tree of `file`, for edits
    pub fn scope_tree_mut(&mut self, file: ContextId) -> Option<&mut ScopeTree> {
        self.scope_trees.get_mut(&file)
    }

    /// Route lookups through a debugger client
    pub fn set_debugger(&mut self, client: Box<dyn DebuggerClient>) {
        self.debugger = Some(client);
    }

    /// Detach the debugger client
    pub fn clear_debugger(&mut self) {
        self.debugger = None;
    }

    /// Names referenced from a source file so far
    pub fn referenced_names(&self, file: ContextId) -> Option<&ReferencedNames> {
        self.referenced.get(&file)
    }

    /// Tracker of the source file enclosing `context`, when tracking applies
    pub(crate) fn tracker_for(&mut self, context: ContextId) -> Option<&mut ReferencedNames> {
        if !self.config.enable_dependency_tracking {
            return None;
        }
        let file = self.graph.file_of(context)?;
        let unit = self.graph.context(file).as_file()?;
        if unit.kind == SourceFileKind::Serialized {
            return None;
        }
        Some(self.referenced.entry(file).or_default())
    }
}

impl fmt::Debug for ResolverSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResolverSession")
            .field("config", &self.config)
            .field("tables", &self.tables.len())
            .field("lazy", &self.lazy)
            .field("stats", &self.stats)
            .field("scope_trees", &self.scope_trees.len())
            .field("debugger", &self.debugger.is_some())
            .finish_non_exhaustive()
    }
}
