//! The entity graph and its structural queries

use la_arena::{Arena, Idx, RawIdx};
use rv_intern::{Interner, Symbol};
use rv_span::FileId;

use crate::access::{AccessLevel, Availability};
use crate::context::{
    Context, ContextId, ContextKind, FileUnit, Import, InitializerContext, SourceFileKind,
};
use crate::decl::{
    AccessorDecl, AccessorKind, Decl, DeclFlags, DeclId, DeclKind, ExtensionDecl, ModuleDecl,
};
use crate::error::EntityError;
use crate::name::DeclName;

/// Arena-backed forest of declarations and contexts
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    interner: Interner,
    decls: Arena<Decl>,
    contexts: Arena<Context>,
}

impl EntityGraph {
    /// Create an empty graph interning names into `interner`
    pub fn new(interner: Interner) -> Self {
        Self {
            interner,
            decls: Arena::new(),
            contexts: Arena::new(),
        }
    }

    /// Interner shared by every name in the graph
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Intern `text` as a simple name
    pub fn name(&self, text: &str) -> DeclName {
        DeclName::simple(self.interner.intern(text))
    }

    /// Intern a compound name; `_` stands for an unlabeled argument
    pub fn compound_name(&self, base: &str, labels: &[&str]) -> DeclName {
        DeclName::compound(
            self.interner.intern(base),
            labels
                .iter()
                .map(|label| (*label != "_").then(|| self.interner.intern(label))),
        )
    }

    /// Declaration by index
    pub fn decl(&self, decl: DeclId) -> &Decl {
        &self.decls[decl]
    }

    /// Mutable declaration by index
    pub fn decl_mut(&mut self, decl: DeclId) -> &mut Decl {
        &mut self.decls[decl]
    }

    /// Context by index
    pub fn context(&self, context: ContextId) -> &Context {
        &self.contexts[context]
    }

    /// Every declaration in allocation order
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls.iter()
    }

    /// Base name text of a declaration, or `_` when unnamed
    pub fn display_name(&self, decl: DeclId) -> &str {
        self.decls[decl]
            .base_name()
            .map_or("_", |base| self.interner.resolve(&base))
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Create a module together with its module context
    pub fn add_module(&mut self, name: &str) -> DeclId {
        let decl_id: DeclId = Idx::from_raw(RawIdx::from(self.decls.len() as u32));
        let context = self.contexts.alloc(Context {
            parent: None,
            kind: ContextKind::Module(decl_id),
        });
        let mut decl = Decl::new(
            context,
            Some(self.name(name)),
            DeclKind::Module(ModuleDecl::default()),
        );
        decl.as_context = Some(context);
        decl.access = Some(AccessLevel::Public);
        self.decls.alloc(decl)
    }

    /// Add a source file to `module`
    pub fn add_file(
        &mut self,
        module: DeclId,
        file: FileId,
        kind: SourceFileKind,
        discriminator: &str,
    ) -> Result<ContextId, EntityError> {
        let module_context = self.decls[module]
            .as_module()
            .and(self.decls[module].as_context)
            .ok_or(EntityError::NotModule(module))?;
        let context = self.contexts.alloc(Context {
            parent: Some(module_context),
            kind: ContextKind::File(FileUnit {
                file,
                kind,
                discriminator: self.interner.intern(discriminator),
                imports: Vec::new(),
                top_level: Vec::new(),
            }),
        });
        if let DeclKind::Module(data) = &mut self.decls[module].kind {
            data.files.push(context);
        }
        Ok(context)
    }

    /// Record that `file` imports `import.module`
    pub fn add_import(&mut self, file: ContextId, import: Import) -> Result<(), EntityError> {
        if self.decls[import.module].as_module().is_none() {
            return Err(EntityError::NotModule(import.module));
        }
        match &mut self.contexts[file].kind {
            ContextKind::File(unit) => {
                unit.imports.push(import);
                Ok(())
            }
            _ => Err(EntityError::NotFile(file)),
        }
    }

    /// Make `module` re-export `reexported` to all of its importers
    pub fn add_reexport(&mut self, module: DeclId, reexported: DeclId) -> Result<(), EntityError> {
        if self.decls[reexported].as_module().is_none() {
            return Err(EntityError::NotModule(reexported));
        }
        match &mut self.decls[module].kind {
            DeclKind::Module(data) => {
                data.reexports.push(reexported);
                Ok(())
            }
            _ => Err(EntityError::NotModule(module)),
        }
    }

    /// Allocate a declaration without attaching it to any member list
    ///
    /// Declarations that open a context get their context allocated here.
    pub fn alloc_decl(
        &mut self,
        owner: ContextId,
        name: Option<DeclName>,
        kind: DeclKind,
    ) -> DeclId {
        let opens = kind.opens_context();
        let decl_id = self.decls.alloc(Decl::new(owner, name, kind));
        if opens {
            let kind = match self.decls[decl_id].kind {
                DeclKind::Nominal(_) => ContextKind::Nominal(decl_id),
                DeclKind::Extension(_) => ContextKind::Extension(decl_id),
                _ => ContextKind::Function(decl_id),
            };
            let context = self.contexts.alloc(Context {
                parent: Some(owner),
                kind,
            });
            self.decls[decl_id].as_context = Some(context);
        }
        decl_id
    }

    /// Allocate a declaration and attach it to its owner
    ///
    /// File-level declarations join the file's top-level list, declarations
    /// inside a type body join the member list. Local declarations are only
    /// allocated.
    pub fn add_decl(&mut self, owner: ContextId, name: Option<DeclName>, kind: DeclKind) -> DeclId {
        let decl = self.alloc_decl(owner, name, kind);
        let iterable = match &mut self.contexts[owner].kind {
            ContextKind::File(unit) => {
                unit.top_level.push(decl);
                None
            }
            ContextKind::Nominal(iterable) | ContextKind::Extension(iterable) => Some(*iterable),
            _ => None,
        };
        if let Some(iterable) = iterable {
            if let Err(error) = self.link_member(iterable, decl) {
                unreachable!("type bodies are iterable: {error}");
            }
        }
        decl
    }

    /// Append `member` to the member list of `iterable`
    ///
    /// Returns `false` when the member was already linked.
    pub fn link_member(&mut self, iterable: DeclId, member: DeclId) -> Result<bool, EntityError> {
        if self.decls[iterable].member_list().is_none() {
            return Err(EntityError::NotIterable(iterable));
        }
        if self.decls[member].flags.contains(DeclFlags::MEMBER_LISTED) {
            return Ok(false);
        }
        self.decls[member].flags.insert(DeclFlags::MEMBER_LISTED);

        let previous_last = self.decls[iterable].member_list().and_then(|list| list.last);
        if let Some(last) = previous_last {
            self.decls[last].next_member = Some(member);
        }
        if let Some(list) = self.decls[iterable].member_list_mut() {
            if list.first.is_none() {
                list.first = Some(member);
            }
            list.last = Some(member);
            list.len += 1;
        }
        Ok(true)
    }

    /// Declare an extension of `nominal` at the top level of `file`
    pub fn add_extension(&mut self, file: ContextId, nominal: DeclId) -> Result<DeclId, EntityError> {
        if self.decls[nominal].as_nominal().is_none() {
            return Err(EntityError::NotNominal(nominal));
        }
        let ext = self.add_decl(
            file,
            None,
            DeclKind::Extension(ExtensionDecl {
                extended: Some(nominal),
                ..ExtensionDecl::default()
            }),
        );
        self.register_extension(nominal, ext)?;
        Ok(ext)
    }

    /// Append an already allocated extension to the chain of `nominal`
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ExtensionAlreadyRegistered`] if `ext` already
    /// sits in an extension chain, [`EntityError::NotIterable`] if it is not
    /// an extension and [`EntityError::NotNominal`] if `nominal` is not a
    /// nominal type.
    pub fn register_extension(&mut self, nominal: DeclId, ext: DeclId) -> Result<(), EntityError> {
        let Some(data) = self.decls[ext].as_extension() else {
            return Err(EntityError::NotIterable(ext));
        };
        if let Some(extended) = data.extended {
            if self.extensions(extended).any(|registered| registered == ext) {
                return Err(EntityError::ExtensionAlreadyRegistered(ext));
            }
        }
        let previous_last = match &self.decls[nominal].kind {
            DeclKind::Nominal(data) => data.extensions.last,
            _ => return Err(EntityError::NotNominal(nominal)),
        };
        if let Some(last) = previous_last {
            if let DeclKind::Extension(data) = &mut self.decls[last].kind {
                data.next = Some(ext);
            }
        }
        if let DeclKind::Extension(data) = &mut self.decls[ext].kind {
            data.extended = Some(nominal);
        }
        if let DeclKind::Nominal(data) = &mut self.decls[nominal].kind {
            if data.extensions.first.is_none() {
                data.extensions.first = Some(ext);
            }
            data.extensions.last = Some(ext);
        }
        Ok(())
    }

    /// Open a closure context inside `parent`
    pub fn add_closure(&mut self, parent: ContextId) -> ContextId {
        self.contexts.alloc(Context {
            parent: Some(parent),
            kind: ContextKind::Closure,
        })
    }

    /// Open a pattern binding or default argument context inside `parent`
    pub fn add_initializer(&mut self, parent: ContextId, kind: InitializerContext) -> ContextId {
        self.contexts.alloc(Context {
            parent: Some(parent),
            kind: ContextKind::Initializer(kind),
        })
    }

    /// Open the top-level code context of a main or interactive file
    pub fn add_top_level_code(&mut self, file: ContextId) -> ContextId {
        self.contexts.alloc(Context {
            parent: Some(file),
            kind: ContextKind::TopLevelCode,
        })
    }

    /// Give a method or initializer its implicit `self` parameter
    pub fn add_implicit_self(&mut self, function: DeclId) -> Option<DeclId> {
        let context = self.decls[function].as_context?;
        if !matches!(
            self.decls[function].kind,
            DeclKind::Func(_) | DeclKind::Constructor(_)
        ) {
            return None;
        }
        let name = DeclName::simple(self.interner.known().self_);
        let param = self.alloc_decl(context, Some(name), DeclKind::Param);
        self.decls[param].flags.insert(DeclFlags::IMPLICIT);
        match &mut self.decls[function].kind {
            DeclKind::Func(data) => data.implicit_self = Some(param),
            DeclKind::Constructor(data) => data.implicit_self = Some(param),
            _ => {}
        }
        Some(param)
    }

    /// Add a named parameter to a function or initializer
    pub fn add_param(&mut self, function: DeclId, name: &str) -> Option<DeclId> {
        let context = self.decls[function].as_context?;
        let name = self.name(name);
        let param = self.alloc_decl(context, Some(name), DeclKind::Param);
        match &mut self.decls[function].kind {
            DeclKind::Func(data) => data.params.push(param),
            DeclKind::Constructor(data) => data.params.push(param),
            _ => return None,
        }
        Some(param)
    }

    /// Add a generic parameter to a type, extension or function
    pub fn add_generic_param(&mut self, owner: DeclId, name: &str) -> Option<DeclId> {
        let context = self.decls[owner].as_context?;
        let name = self.name(name);
        let param = self.alloc_decl(context, Some(name), DeclKind::GenericParam);
        match &mut self.decls[owner].kind {
            DeclKind::Nominal(data) => data.generic_params.push(param),
            DeclKind::Extension(data) => data.generic_params.push(param),
            DeclKind::Func(data) => data.generic_params.push(param),
            _ => return None,
        }
        Some(param)
    }

    /// Add an accessor for `storage`, placed next to it
    pub fn add_accessor(&mut self, storage: DeclId, kind: AccessorKind) -> DeclId {
        let owner = self.decls[storage].owner;
        let accessor = self.alloc_decl(
            owner,
            None,
            DeclKind::Accessor(AccessorDecl { storage, kind }),
        );
        if let DeclKind::Var(data) = &mut self.decls[storage].kind {
            data.accessors.push(accessor);
            if kind == AccessorKind::Set {
                data.settable = true;
            }
        }
        accessor
    }

    // ---------------------------------------------------------------------
    // Write-once properties
    // ---------------------------------------------------------------------

    /// Write the access level of a declaration, once
    pub fn set_access(&mut self, decl: DeclId, access: AccessLevel) -> Result<(), EntityError> {
        let target = &mut self.decls[decl];
        if target.access.is_some() {
            return Err(EntityError::AlreadyHasAccess(decl));
        }
        target.access = Some(access);
        Ok(())
    }

    /// Write the setter access level of a declaration, once
    pub fn set_setter_access(&mut self, decl: DeclId, access: AccessLevel) -> Result<(), EntityError> {
        let target = &mut self.decls[decl];
        if target.setter_access.is_some() {
            return Err(EntityError::AlreadyHasAccess(decl));
        }
        target.setter_access = Some(access);
        Ok(())
    }

    /// Record the canonical interface type of a declaration
    pub fn set_signature(&mut self, decl: DeclId, signature: &str) -> Result<(), EntityError> {
        let symbol = self.interner.intern(signature);
        let target = &mut self.decls[decl];
        if target.signature.is_some() {
            return Err(EntityError::AlreadyHasType(decl));
        }
        target.signature = Some(symbol);
        Ok(())
    }

    /// Record the declaration `decl` overrides
    pub fn set_overridden(&mut self, decl: DeclId, overridden: DeclId) {
        self.decls[decl].overridden = Some(overridden);
    }

    /// Replace the availability attributes of a declaration
    pub fn set_availability(&mut self, decl: DeclId, availability: Availability) {
        self.decls[decl].availability = availability;
    }

    /// Set boolean properties
    pub fn insert_flags(&mut self, decl: DeclId, flags: DeclFlags) {
        self.decls[decl].flags.insert(flags);
    }

    /// Clear boolean properties
    pub fn remove_flags(&mut self, decl: DeclId, flags: DeclFlags) {
        self.decls[decl].flags.remove(flags);
    }

    /// Write the superclass of a class
    pub fn set_superclass(&mut self, class: DeclId, superclass: DeclId) -> Result<(), EntityError> {
        match &mut self.decls[class].kind {
            DeclKind::Nominal(data) => {
                data.superclass = Some(superclass);
                Ok(())
            }
            _ => Err(EntityError::NotNominal(class)),
        }
    }

    /// Declare a protocol conformance on a nominal type or extension
    pub fn add_conformance(&mut self, decl: DeclId, protocol: DeclId) -> Result<(), EntityError> {
        match &mut self.decls[decl].kind {
            DeclKind::Nominal(data) => data.protocols.push(protocol),
            DeclKind::Extension(data) => data.protocols.push(protocol),
            _ => return Err(EntityError::NotNominal(decl)),
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Structural queries
    // ---------------------------------------------------------------------

    /// Enclosing context; `None` for modules
    pub fn parent(&self, context: ContextId) -> Option<ContextId> {
        self.contexts[context].parent
    }

    /// Context a declaration lives in
    pub fn owner(&self, decl: DeclId) -> ContextId {
        self.decls[decl].owner
    }

    /// Innermost module or file context enclosing `context` (inclusive)
    pub fn module_scope_of(&self, context: ContextId) -> ContextId {
        let mut current = context;
        while !self.contexts[current].is_module_scope() {
            match self.contexts[current].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// File context enclosing `context`, if it is inside a file
    pub fn file_of(&self, context: ContextId) -> Option<ContextId> {
        let scope = self.module_scope_of(context);
        self.contexts[scope].as_file().map(|_| scope)
    }

    /// File payload of the file enclosing `context`
    pub fn file_unit(&self, context: ContextId) -> Option<&FileUnit> {
        self.file_of(context)
            .and_then(|file| self.contexts[file].as_file())
    }

    /// Module declaration enclosing `context`
    pub fn module_of_context(&self, context: ContextId) -> DeclId {
        let mut current = context;
        loop {
            let node = &self.contexts[current];
            if let ContextKind::Module(module) = node.kind {
                return module;
            }
            match node.parent {
                Some(parent) => current = parent,
                None => unreachable!("context forest roots are modules"),
            }
        }
    }

    /// Module a declaration belongs to
    pub fn module_of(&self, decl: DeclId) -> DeclId {
        self.module_of_context(self.decls[decl].owner)
    }

    /// Nominal type a type context is the body of or extends
    pub fn nominal_of_context(&self, context: ContextId) -> Option<DeclId> {
        match self.contexts[context].kind {
            ContextKind::Nominal(nominal) => Some(nominal),
            ContextKind::Extension(ext) => self.decls[ext].as_extension()?.extended,
            _ => None,
        }
    }

    /// Nominal type the declaration is a member of
    pub fn enclosing_nominal(&self, decl: DeclId) -> Option<DeclId> {
        self.nominal_of_context(self.decls[decl].owner)
    }

    /// Whether `context` is a protocol body or a protocol extension
    pub fn is_protocol_context(&self, context: ContextId) -> bool {
        self.nominal_of_context(context)
            .is_some_and(|nominal| self.decls[nominal].is_protocol())
    }

    /// Whether `decl` is a member of a protocol or protocol extension
    pub fn is_protocol_member(&self, decl: DeclId) -> bool {
        self.is_protocol_context(self.decls[decl].owner)
    }

    /// Iterate the currently linked members of an iterable context
    pub fn members(&self, iterable: DeclId) -> Members<'_> {
        Members {
            graph: self,
            next: self.decls[iterable].member_list().and_then(|list| list.first),
        }
    }

    /// Iterate the registered extensions of a nominal type
    pub fn extensions(&self, nominal: DeclId) -> Extensions<'_> {
        Extensions {
            graph: self,
            next: self.decls[nominal]
                .as_nominal()
                .and_then(|data| data.extensions.first),
        }
    }

    /// Superclass of a class
    pub fn superclass_of(&self, nominal: DeclId) -> Option<DeclId> {
        self.decls[nominal].as_nominal()?.superclass
    }

    /// Protocols declared on the type itself and on any of its extensions
    pub fn all_protocols(&self, nominal: DeclId) -> Vec<DeclId> {
        let mut protocols = self.decls[nominal]
            .as_nominal()
            .map(|data| data.protocols.clone())
            .unwrap_or_default();
        for ext in self.extensions(nominal) {
            if let Some(data) = self.decls[ext].as_extension() {
                for protocol in &data.protocols {
                    if !protocols.contains(protocol) {
                        protocols.push(*protocol);
                    }
                }
            }
        }
        protocols
    }

    /// Function-like declaration whose body `context` is
    pub fn function_of(&self, context: ContextId) -> Option<DeclId> {
        match self.contexts[context].kind {
            ContextKind::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Whether an unresolved reference from `context` affects other files
    pub fn is_cascading_context_for_lookup(
        &self,
        context: ContextId,
        functions_are_non_cascading: bool,
    ) -> bool {
        let node = &self.contexts[context];
        match &node.kind {
            ContextKind::Module(_) | ContextKind::File(_) | ContextKind::TopLevelCode => {
                return true;
            }
            ContextKind::Initializer(InitializerContext::DefaultArgument { .. }) => return false,
            ContextKind::Function(function) => {
                if functions_are_non_cascading {
                    return false;
                }
                let decl = &self.decls[*function];
                if decl.has_access() {
                    return decl.access() > AccessLevel::FilePrivate;
                }
            }
            ContextKind::Nominal(nominal) => {
                let decl = &self.decls[*nominal];
                if decl.has_access() {
                    return decl.access() > AccessLevel::FilePrivate;
                }
            }
            ContextKind::Extension(_) => {
                return self
                    .nominal_of_context(context)
                    .is_none_or(|nominal| self.decls[nominal].access() > AccessLevel::FilePrivate);
            }
            ContextKind::Closure | ContextKind::Initializer(_) => {}
        }
        node.parent
            .is_none_or(|parent| self.is_cascading_context_for_lookup(parent, true))
    }

    /// Next context consulted by the context-chain walk
    ///
    /// Protocols and extensions skip straight to their module scope, as do
    /// nominal types nested inside a protocol.
    pub fn parent_for_lookup(&self, context: ContextId) -> Option<ContextId> {
        let node = &self.contexts[context];
        match node.kind {
            ContextKind::Extension(_) => return Some(self.module_scope_of(context)),
            ContextKind::Nominal(nominal) => {
                let nested_in_protocol = node.parent.is_some_and(|parent| {
                    matches!(self.contexts[parent].kind, ContextKind::Nominal(outer)
                        if self.decls[outer].is_protocol())
                });
                if self.decls[nominal].is_protocol() || nested_in_protocol {
                    return Some(self.module_scope_of(context));
                }
            }
            _ => {}
        }
        node.parent
    }

    /// Every module declaration
    pub fn modules(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.decls
            .iter()
            .filter(|(_, decl)| decl.as_module().is_some())
            .map(|(id, _)| id)
    }

    /// Module with base name `name`
    pub fn module_named(&self, name: Symbol) -> Option<DeclId> {
        self.modules()
            .find(|module| self.decls[*module].base_name() == Some(name))
    }

    /// File contexts of a module, in declaration order
    pub fn files_of(&self, module: DeclId) -> &[ContextId] {
        self.decls[module]
            .as_module()
            .map_or(&[], |data| data.files.as_slice())
    }

    /// Modules re-exported by `module`
    pub fn reexports_of(&self, module: DeclId) -> &[DeclId] {
        self.decls[module]
            .as_module()
            .map_or(&[], |data| data.reexports.as_slice())
    }

    /// Top-level declarations of every file of `module`, in file order
    pub fn top_level_decls(&self, module: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.files_of(module).iter().flat_map(|file| {
            self.contexts[*file]
                .as_file()
                .map(|unit| unit.top_level.iter().copied())
                .into_iter()
                .flatten()
        })
    }
}

/// Iterator over a member list
#[derive(Debug, Clone)]
pub struct Members<'graph> {
    graph: &'graph EntityGraph,
    next: Option<DeclId>,
}

impl Iterator for Members<'_> {
    type Item = DeclId;

    fn next(&mut self) -> Option<DeclId> {
        let current = self.next?;
        self.next = self.graph.decls[current].next_member;
        Some(current)
    }
}

/// Iterator over an extension chain
#[derive(Debug, Clone)]
pub struct Extensions<'graph> {
    graph: &'graph EntityGraph,
    next: Option<DeclId>,
}

impl Iterator for Extensions<'_> {
    type Item = DeclId;

    fn next(&mut self) -> Option<DeclId> {
        let current = self.next?;
        self.next = self.graph.decls[current]
            .as_extension()
            .and_then(|data| data.next);
        Some(current)
    }
}
