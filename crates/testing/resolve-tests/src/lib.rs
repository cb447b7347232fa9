//! Fixtures for resolver integration tests
//!
//! [`FixtureBuilder`] assembles entity graphs a declaration at a time and
//! [`CountingLoader`] stands in for a deserializer, counting every call the
//! session makes into it.

use std::cell::{Cell, RefCell};
use std::fmt::Display;

use rustc_hash::FxHashMap;
use rv_entity::{
    AccessLevel, ConstructorDecl, ContextId, CtorKind, DeclId, DeclKind, DeclName, EntityGraph,
    FuncDecl, Import, Interner, NominalDecl, NominalKind, SourceFileKind, VarDecl,
};
use rv_resolve::{LoaderError, ResolverConfig, ResolverSession};
use rv_span::FileId;

/// Unwrap a fixture setup step; a failure here is a bug in the test itself
fn setup<T, E: Display>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("fixture setup failed ({what}): {error}"),
    }
}

/// Incremental builder of entity graphs for tests
pub struct FixtureBuilder {
    /// Graph under construction
    pub graph: EntityGraph,
    next_file: u32,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBuilder {
    /// Creates an empty fixture
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: EntityGraph::new(Interner::new()),
            next_file: 0,
        }
    }

    /// Adds a module
    pub fn module(&mut self, name: &str) -> DeclId {
        self.graph.add_module(name)
    }

    /// Adds a library source file named `discriminator` to `module`
    pub fn file(&mut self, module: DeclId, discriminator: &str) -> ContextId {
        self.file_of_kind(module, SourceFileKind::Library, discriminator)
    }

    /// Adds a source file of the given kind to `module`
    pub fn file_of_kind(
        &mut self,
        module: DeclId,
        kind: SourceFileKind,
        discriminator: &str,
    ) -> ContextId {
        let file = FileId::new(self.next_file);
        self.next_file += 1;
        setup(self.graph.add_file(module, file, kind, discriminator), "add file")
    }

    /// Imports `module` into `file`
    pub fn import(&mut self, file: ContextId, module: DeclId) {
        let import = Import {
            module,
            exported: false,
            testable: false,
        };
        setup(self.graph.add_import(file, import), "add import");
    }

    /// Context opened by a declaration
    pub fn body(&self, decl: DeclId) -> ContextId {
        match self.graph.decl(decl).as_context {
            Some(context) => context,
            None => panic!("{} opens no context", self.graph.display_name(decl)),
        }
    }

    fn nominal(&mut self, owner: ContextId, name: &str, kind: NominalKind) -> DeclId {
        let name = self.graph.name(name);
        self.graph
            .add_decl(owner, Some(name), DeclKind::Nominal(NominalDecl::new(kind)))
    }

    /// Adds a class
    pub fn class(&mut self, owner: ContextId, name: &str) -> DeclId {
        self.nominal(owner, name, NominalKind::Class)
    }

    /// Adds a struct
    pub fn structure(&mut self, owner: ContextId, name: &str) -> DeclId {
        self.nominal(owner, name, NominalKind::Struct)
    }

    /// Adds a protocol
    pub fn protocol(&mut self, owner: ContextId, name: &str) -> DeclId {
        self.nominal(owner, name, NominalKind::Protocol)
    }

    /// Makes `class` a subclass of `superclass`
    pub fn inherit(&mut self, class: DeclId, superclass: DeclId) {
        setup(self.graph.set_superclass(class, superclass), "set superclass");
    }

    /// Declares an extension of `nominal` in `file` and registers it
    pub fn extension(&mut self, file: ContextId, nominal: DeclId) -> DeclId {
        setup(self.graph.add_extension(file, nominal), "add extension")
    }

    /// Adds a stored property to a type, extension or file
    pub fn var(&mut self, owner: DeclId, name: &str) -> DeclId {
        let body = self.body(owner);
        self.var_in(body, name)
    }

    /// Adds a variable with `owner` as its context
    pub fn var_in(&mut self, owner: ContextId, name: &str) -> DeclId {
        let name = self.graph.name(name);
        let decl = self
            .graph
            .add_decl(owner, Some(name), DeclKind::Var(VarDecl::default()));
        setup(self.graph.set_signature(decl, "Int"), "set signature");
        decl
    }

    /// Adds a free function with signature `() -> ()`
    pub fn func(&mut self, owner: ContextId, name: &str) -> DeclId {
        let name = self.graph.name(name);
        let decl = self
            .graph
            .add_decl(owner, Some(name), DeclKind::Func(FuncDecl::default()));
        setup(self.graph.set_signature(decl, "() -> ()"), "set signature");
        decl
    }

    /// Adds an instance method with an implicit `self` to a type or extension
    pub fn method(&mut self, owner: DeclId, name: &str) -> DeclId {
        let body = self.body(owner);
        let decl = self.func(body, name);
        self.graph.add_implicit_self(decl);
        decl
    }

    /// Adds `init(label:)` of the given kind to a class
    pub fn ctor(&mut self, class: DeclId, kind: CtorKind, label: &str) -> DeclId {
        let body = self.body(class);
        let name = self.graph.compound_name("init", &[label]);
        let decl = self.graph.add_decl(
            body,
            Some(name),
            DeclKind::Constructor(ConstructorDecl::new(kind)),
        );
        setup(self.graph.set_signature(decl, label), "set signature");
        self.graph.add_implicit_self(decl);
        decl
    }

    /// Sets the access level of a declaration
    pub fn access(&mut self, decl: DeclId, access: AccessLevel) {
        setup(self.graph.set_access(decl, access), "set access");
    }

    /// Records that `decl` overrides `base`
    pub fn overrides(&mut self, decl: DeclId, base: DeclId) {
        self.graph.set_overridden(decl, base);
    }

    /// Interns a simple name
    pub fn name(&self, text: &str) -> DeclName {
        self.graph.name(text)
    }

    /// Finishes the fixture with the default configuration
    pub fn session(self) -> ResolverSession {
        self.session_with(ResolverConfig::default())
    }

    /// Finishes the fixture with `config`
    pub fn session_with(self, config: ResolverConfig) -> ResolverSession {
        ResolverSession::new(self.graph, config)
    }
}

/// How a [`CountingLoader`] answers named requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedLoading {
    /// Serve the members with the requested base name
    Supported,
    /// Report named loading as unsupported
    Unsupported,
    /// Fail every named request
    Failing,
}

/// Lazy loader over a fixed list of member names, counting its calls
///
/// Members are stored properties owned by the loaded context. A member is
/// allocated on first request and the same [`DeclId`] is returned for it
/// afterwards, whichever path asks.
pub struct CountingLoader {
    names: Vec<String>,
    named: NamedLoading,
    fail_full_loads: bool,
    /// Name looked up on the loaded context from inside a full load
    reentrant_lookup: Option<String>,
    materialized: RefCell<FxHashMap<(DeclId, usize), DeclId>>,
    full_loads: Cell<usize>,
    named_loads: Cell<usize>,
    reentrant_results: RefCell<Vec<Vec<DeclId>>>,
}

impl CountingLoader {
    /// Loader serving one member per name
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            named: NamedLoading::Supported,
            fail_full_loads: false,
            reentrant_lookup: None,
            materialized: RefCell::default(),
            full_loads: Cell::new(0),
            named_loads: Cell::new(0),
            reentrant_results: RefCell::default(),
        }
    }

    /// Loader serving `member0` through `member{count - 1}`
    pub fn numbered(count: usize) -> Self {
        Self::new((0..count).map(|index| format!("member{index}")))
    }

    /// Answers named requests according to `named`
    #[must_use]
    pub fn with_named_loading(mut self, named: NamedLoading) -> Self {
        self.named = named;
        self
    }

    /// Fails every full load
    #[must_use]
    pub fn failing_full_loads(mut self) -> Self {
        self.fail_full_loads = true;
        self
    }

    /// Look `name` up on the loaded context while a full load is running
    #[must_use]
    pub fn with_reentrant_lookup(mut self, name: &str) -> Self {
        self.reentrant_lookup = Some(name.to_owned());
        self
    }

    /// Number of full loads so far
    pub fn full_loads(&self) -> usize {
        self.full_loads.get()
    }

    /// Number of named loads so far
    pub fn named_loads(&self) -> usize {
        self.named_loads.get()
    }

    /// Results of the lookups issued from inside full loads
    pub fn reentrant_results(&self) -> Vec<Vec<DeclId>> {
        self.reentrant_results.borrow().clone()
    }

    /// Number of members allocated so far
    pub fn materialized(&self) -> usize {
        self.materialized.borrow().len()
    }

    fn member(&self, session: &mut ResolverSession, context: DeclId, index: usize) -> DeclId {
        if let Some(decl) = self.materialized.borrow().get(&(context, index)) {
            return *decl;
        }
        let graph = session.graph_mut();
        let owner = match graph.decl(context).as_context {
            Some(owner) => owner,
            None => panic!("loader attached to a declaration without a body"),
        };
        let name = graph.name(&self.names[index]);
        let decl = graph.alloc_decl(owner, Some(name), DeclKind::Var(VarDecl::default()));
        self.materialized.borrow_mut().insert((context, index), decl);
        decl
    }
}

impl rv_resolve::LazyMemberLoader for CountingLoader {
    fn load_all_members(
        &self,
        session: &mut ResolverSession,
        context: DeclId,
        _cursor: u64,
    ) -> Result<Vec<DeclId>, LoaderError> {
        self.full_loads.set(self.full_loads.get() + 1);
        tracing::trace!(context = ?context, members = self.names.len(), "counting loader: full load");

        if let Some(name) = &self.reentrant_lookup {
            let name = session.graph().name(name);
            let found = session.lookup_direct(context, &name);
            self.reentrant_results.borrow_mut().push(found);
        }
        if self.fail_full_loads {
            return Err(LoaderError::Deserialization {
                context,
                message: "truncated member table".to_owned(),
            });
        }
        Ok((0..self.names.len())
            .map(|index| self.member(session, context, index))
            .collect())
    }

    fn load_named_members(
        &self,
        session: &mut ResolverSession,
        context: DeclId,
        name: &DeclName,
        _cursor: u64,
    ) -> Result<Option<Vec<DeclId>>, LoaderError> {
        self.named_loads.set(self.named_loads.get() + 1);
        match self.named {
            NamedLoading::Supported => {}
            NamedLoading::Unsupported => return Ok(None),
            NamedLoading::Failing => return Err(LoaderError::Bridge("bridge offline".to_owned())),
        }

        let wanted = session.graph().interner().resolve(&name.base()).to_owned();
        let members = (0..self.names.len())
            .filter(|index| self.names[*index] == wanted)
            .map(|index| self.member(session, context, index))
            .collect();
        Ok(Some(members))
    }
}
