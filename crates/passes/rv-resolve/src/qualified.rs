//! Qualified lookup
//!
//! Searches a type for a member: the nominal types reachable from the base
//! type are visited through a work stack, each answering from its member
//! lookup table. Superclasses are visited unless initializer inheritance
//! forbids it, protocols when requested or when the current type is itself
//! a protocol. `AnyObject` lookups may additionally consult every visible
//! class. The merged set is then reduced by override and shadow removal.

use rustc_hash::FxHashSet;
use rv_entity::{ContextId, CtorKind, DeclFlags, DeclId, DeclName, DeclKind, LookupType};

use crate::access::is_accessible_from;
use crate::options::LookupOptions;
use crate::result::LookupResultEntry;
use crate::session::ResolverSession;
use crate::shadow::{filter_for_discriminator, remove_overridden_decls, remove_shadowed_decls};

fn push_unvisited(stack: &mut Vec<DeclId>, visited: &mut FxHashSet<DeclId>, nominal: DeclId) {
    if visited.insert(nominal) {
        stack.push(nominal);
    }
}

impl ResolverSession {
    /// Look `name` up as a member of `ty` on behalf of `requester`
    ///
    /// Results carry no base; the caller knows the receiver it looked into.
    pub fn lookup_qualified(
        &mut self,
        ty: &LookupType,
        name: &DeclName,
        options: LookupOptions,
        requester: ContextId,
    ) -> Vec<LookupResultEntry> {
        self.lookup_qualified_decls(ty, name, options, requester)
            .into_iter()
            .map(LookupResultEntry::unqualified)
            .collect()
    }

    /// [`Self::lookup_qualified`] returning bare declarations
    #[tracing::instrument(level = "trace", skip_all, fields(name = ?name.base(), options = ?options))]
    pub fn lookup_qualified_decls(
        &mut self,
        ty: &LookupType,
        name: &DeclName,
        mut options: LookupOptions,
        requester: ContextId,
    ) -> Vec<DeclId> {
        let cascading = self.lookup_cascading(requester, options);

        if let LookupType::Module(module) = ty {
            return self.lookup_module_member(*module, name, requester, options, cascading);
        }

        if !self.config.enable_access_control {
            options |= LookupOptions::IGNORE_ACCESS_CONTROL;
        }

        let mut stack = Vec::new();
        let mut visited = FxHashSet::default();
        let mut want_protocol_members = options.contains(LookupOptions::PROTOCOL_MEMBERS);
        let mut want_all_classes = false;

        match ty {
            LookupType::Nominal(decl) => {
                let nominal = match &self.graph.decl(*decl).kind {
                    DeclKind::Extension(ext) => ext.extended,
                    DeclKind::Nominal(_) => Some(*decl),
                    _ => None,
                };
                if let Some(nominal) = nominal {
                    push_unvisited(&mut stack, &mut visited, nominal);
                }
            }
            LookupType::Archetype {
                conforms_to,
                superclass,
                any_object,
            } => {
                want_all_classes = *any_object && options.contains(LookupOptions::DYNAMIC_LOOKUP);
                for protocol in conforms_to {
                    push_unvisited(&mut stack, &mut visited, *protocol);
                }
                if let Some(superclass) = superclass {
                    push_unvisited(&mut stack, &mut visited, *superclass);
                }
            }
            LookupType::Composition {
                protocols,
                superclass,
                any_object,
            } => {
                want_all_classes = *any_object && options.contains(LookupOptions::DYNAMIC_LOOKUP);
                for protocol in protocols {
                    push_unvisited(&mut stack, &mut visited, *protocol);
                }
                if let Some(superclass) = superclass {
                    push_unvisited(&mut stack, &mut visited, *superclass);
                }
            }
            LookupType::Module(_) => {}
        }

        let is_init = name.base() == self.graph.interner().known().init;
        let mut only_complete_object_inits = false;
        let mut decls = Vec::new();

        while let Some(current) = stack.pop() {
            if let Some(cascading) = cascading {
                if let Some(tracker) = self.tracker_for(requester) {
                    tracker.add_used_member(current, name.base(), cascading);
                }
            }

            let current_is_protocol = self.graph.decl(current).is_protocol();
            for decl in self.lookup_direct(current, name) {
                if options.contains(LookupOptions::ONLY_TYPES) && !self.graph.decl(decl).is_type_decl()
                {
                    continue;
                }
                if self.is_acceptable(decl, requester, options, only_complete_object_inits) {
                    decls.push(decl);
                }
            }

            let current_is_class = self.graph.decl(current).is_class();
            if current_is_class {
                let mut visit_superclass = options.contains(LookupOptions::VISIT_SUPERTYPES);
                if is_init {
                    if self.inherits_superclass_initializers(current) {
                        only_complete_object_inits = true;
                    } else {
                        visit_superclass = false;
                    }
                }
                if visit_superclass {
                    if let Some(superclass) = self.graph.superclass_of(current) {
                        push_unvisited(&mut stack, &mut visited, superclass);
                    }
                }
            }

            let visit_protocols = want_protocol_members
                || (current_is_protocol && options.contains(LookupOptions::VISIT_SUPERTYPES));
            if !visit_protocols {
                continue;
            }
            for protocol in self.conformed_protocols(current) {
                push_unvisited(&mut stack, &mut visited, protocol);
            }
            // Protocol members of superclasses are reachable through this class.
            if current_is_class {
                want_protocol_members = false;
            }
        }

        if want_all_classes {
            self.lookup_in_all_classes(name, requester, options, cascading, &visited, &mut decls);
        }

        if options.contains(LookupOptions::REMOVE_OVERRIDDEN) {
            remove_overridden_decls(&self.graph, &mut decls);
        }
        if options.contains(LookupOptions::REMOVE_NON_VISIBLE) {
            let current_module = self.graph.module_of_context(requester);
            remove_shadowed_decls(
                &self.graph,
                self.config.shadowing,
                self.config.effective_language_version,
                &mut decls,
                current_module,
            );
        }
        if let Some(discriminator) = self.preferred_discriminator() {
            filter_for_discriminator(&self.graph, &mut decls, discriminator, |decl| *decl);
        }
        decls
    }

    /// Cascading bit of a dependency from `requester`; `None` if the
    /// dependency is not to be recorded at all
    fn lookup_cascading(&self, requester: ContextId, options: LookupOptions) -> Option<bool> {
        match (
            options.contains(LookupOptions::KNOWN_CASCADING_DEPENDENCY),
            options.contains(LookupOptions::KNOWN_NON_CASCADING_DEPENDENCY),
        ) {
            (false, false) => Some(self.graph.is_cascading_context_for_lookup(requester, false)),
            (true, false) => Some(true),
            (false, true) => Some(false),
            (true, true) => None,
        }
    }

    /// Acceptability of a found member
    ///
    /// A declaration whose signature is still being computed is accepted so
    /// the walk terminates; the cycle is diagnosed elsewhere.
    fn is_acceptable(
        &self,
        decl: DeclId,
        requester: ContextId,
        options: LookupOptions,
        only_complete_object_inits: bool,
    ) -> bool {
        let target = self.graph.decl(decl);
        if target.is_being_validated() {
            return true;
        }
        if only_complete_object_inits
            && !matches!(
                target.ctor_kind(),
                Some(CtorKind::Convenience | CtorKind::ConvenienceFactory)
            )
        {
            return false;
        }
        if target.is_constructor() && target.flags.contains(DeclFlags::STUB_IMPLEMENTATION) {
            return false;
        }
        options.contains(LookupOptions::IGNORE_ACCESS_CONTROL)
            || is_accessible_from(&self.graph, decl, Some(requester))
    }

    /// Whether `class` inherits the initializers of its superclass
    ///
    /// It does when it declares no designated initializer of its own, or when
    /// each designated initializer of the superclass is overridden by one of
    /// its initializers. Classes without a superclass inherit nothing.
    pub fn inherits_superclass_initializers(&mut self, class: DeclId) -> bool {
        if let Some(inherits) = self.inherits_inits.get(&class) {
            return *inherits;
        }
        let Some(superclass) = self.graph.superclass_of(class) else {
            self.inherits_inits.insert(class, false);
            return false;
        };

        let init = DeclName::simple(self.graph.interner().known().init);
        let own: Vec<DeclId> = self
            .lookup_direct(class, &init)
            .into_iter()
            .filter(|ctor| !self.graph.decl(*ctor).is_invalid())
            .collect();
        let inherits = if own.iter().any(|ctor| self.graph.decl(*ctor).is_designated_init()) {
            let inherited: Vec<DeclId> = self
                .lookup_direct(superclass, &init)
                .into_iter()
                .filter(|ctor| self.graph.decl(*ctor).is_designated_init())
                .collect();
            inherited
                .iter()
                .all(|base| own.iter().any(|ctor| self.overrides(*ctor, *base)))
        } else {
            true
        };

        tracing::trace!(class = ?class, inherits, "initializer inheritance");
        self.inherits_inits.insert(class, inherits);
        inherits
    }

    /// Protocols `nominal` conforms to, including those inherited from superclasses
    fn conformed_protocols(&self, nominal: DeclId) -> Vec<DeclId> {
        let mut protocols = self.graph.all_protocols(nominal);
        let mut seen = FxHashSet::default();
        seen.insert(nominal);
        let mut current = self.graph.superclass_of(nominal);
        while let Some(class) = current {
            if !seen.insert(class) {
                break;
            }
            for protocol in self.graph.all_protocols(class) {
                if !protocols.contains(&protocol) {
                    protocols.push(protocol);
                }
            }
            current = self.graph.superclass_of(class);
        }
        protocols
    }

    /// Whether `decl` overrides `base`, directly or through a chain
    fn overrides(&self, decl: DeclId, base: DeclId) -> bool {
        let mut visited = FxHashSet::default();
        let mut current = self.graph.decl(decl).overridden;
        while let Some(ancestor) = current {
            if ancestor == base {
                return true;
            }
            if !visited.insert(ancestor) {
                break;
            }
            current = self.graph.decl(ancestor).overridden;
        }
        false
    }

    /// Add matching dynamic members of every visible class not visited yet
    fn lookup_in_all_classes(
        &mut self,
        name: &DeclName,
        requester: ContextId,
        options: LookupOptions,
        cascading: Option<bool>,
        visited: &FxHashSet<DeclId>,
        decls: &mut Vec<DeclId>,
    ) {
        if let Some(cascading) = cascading {
            if let Some(tracker) = self.tracker_for(requester) {
                tracker.add_dynamic_lookup_name(name.base(), cascading);
            }
        }

        let mut candidates = Vec::new();
        for module in self.visible_modules(requester) {
            candidates.extend(self.lookup_class_member(module, name));
        }

        let mut known = FxHashSet::default();
        for decl in candidates {
            let target = self.graph.decl(decl);
            if options.contains(LookupOptions::ONLY_TYPES) && !target.is_type_decl() {
                continue;
            }
            // The overridden declaration is found as well and preferred.
            if target.overridden.is_some() {
                continue;
            }
            let Some(nominal) = self.graph.enclosing_nominal(decl) else {
                continue;
            };
            if !visited.contains(&nominal)
                && known.insert(decl)
                && self.is_acceptable(decl, requester, options, false)
            {
                decls.push(decl);
            }
        }
    }

    /// Dynamic members named `name` of the classes declared in `module`
    ///
    /// Backed by a per-module index over class bodies and class extensions,
    /// rebuilt when any of them gains members.
    fn lookup_class_member(&mut self, module: DeclId, name: &DeclName) -> Vec<DeclId> {
        let iterables: Vec<DeclId> = self
            .graph
            .top_level_decls(module)
            .filter(|decl| {
                let target = self.graph.decl(*decl);
                match &target.kind {
                    DeclKind::Nominal(_) => target.is_class(),
                    DeclKind::Extension(ext) => ext
                        .extended
                        .is_some_and(|extended| self.graph.decl(extended).is_class()),
                    _ => false,
                }
            })
            .collect();
        for iterable in &iterables {
            self.load_all_members(*iterable);
        }

        let source_len = iterables.len()
            + iterables
                .iter()
                .filter_map(|iterable| self.graph.decl(*iterable).member_list())
                .map(|list| list.len as usize)
                .sum::<usize>();
        let Self {
            class_member_indexes,
            graph,
            ..
        } = self;
        let index = class_member_indexes.entry(module).or_default();
        if !index.is_current(source_len) {
            let members: Vec<DeclId> = iterables
                .iter()
                .flat_map(|iterable| graph.members(*iterable))
                .filter(|member| graph.decl(*member).is_dynamic())
                .collect();
            tracing::debug!(module = ?module, members = members.len(), "indexing dynamic class members");
            index.rebuild(graph, members, source_len);
        }
        index.get(name).to_vec()
    }
}
