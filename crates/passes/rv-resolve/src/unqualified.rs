//! Unqualified lookup
//!
//! A bare name is resolved by walking outward from the point of use. With a
//! source location and a scope tree the walk follows scopes; otherwise it
//! follows the context chain. Enclosing types are searched with qualified
//! lookup along the way. Whatever is left falls through to module scope,
//! the debugger hook and finally module names.

use rv_entity::{
    ContextId, ContextKind, DeclId, DeclKind, DeclName, InitializerContext, LookupType,
    SourceFileKind,
};
use rv_span::SourceLoc;
use smallvec::SmallVec;

use crate::options::{LookupOptions, UnqualifiedOptions};
use crate::result::{LookupResultEntry, UnqualifiedResult};
use crate::scope::ScopeKind;
use crate::session::ResolverSession;
use crate::shadow::filter_for_discriminator;

/// Outcome of one step of a walk
enum Step {
    /// Results are final
    Done,
    /// Keep walking
    Continue,
}

/// State threaded through a walk
struct Walk<'name> {
    name: &'name DeclName,
    options: UnqualifiedOptions,
    cascading: Option<bool>,
    results: Vec<LookupResultEntry>,
    /// Inner results unavailable in the active language version
    parked: Vec<LookupResultEntry>,
}

impl Walk<'_> {
    fn qualified_options(&self) -> LookupOptions {
        let mut options = self.options.qualified();
        if self.cascading.unwrap_or(true) {
            options |= LookupOptions::KNOWN_CASCADING_DEPENDENCY;
        } else {
            options |= LookupOptions::KNOWN_NON_CASCADING_DEPENDENCY;
        }
        options
    }
}

impl ResolverSession {
    /// Resolve the bare name `name` used in `context` at `location`
    ///
    /// Local bindings end the walk as soon as one matches. Results that are
    /// all unavailable in the active language version are kept aside and
    /// only returned if nothing else is found.
    #[tracing::instrument(level = "trace", skip_all, fields(name = ?name.base(), location = ?location))]
    pub fn lookup_unqualified(
        &mut self,
        name: &DeclName,
        context: ContextId,
        location: Option<SourceLoc>,
        options: UnqualifiedOptions,
    ) -> UnqualifiedResult {
        let mut walk = Walk {
            name,
            options,
            cascading: options
                .contains(UnqualifiedOptions::KNOWN_NON_CASCADING)
                .then_some(false),
            results: Vec::new(),
            parked: Vec::new(),
        };

        let is_operator = self.graph.interner().is_operator(&name.base());
        let use_scopes = location.is_some_and(|_| {
            self.graph.file_of(context).is_some_and(|file| {
                self.scope_trees.contains_key(&file)
                    && self
                        .graph
                        .file_unit(file)
                        .is_some_and(|unit| unit.kind != SourceFileKind::Repl)
            })
        });

        let module_scope = if is_operator {
            // Operators are only ever declared at file scope.
            if walk.cascading.is_none() {
                walk.cascading = Some(self.graph.is_cascading_context_for_lookup(context, true));
            }
            self.graph.module_scope_of(context)
        } else {
            let outcome = match location {
                Some(location) if use_scopes => self.walk_scopes(&mut walk, context, location),
                _ => self.walk_contexts(&mut walk, context),
            };
            match outcome {
                (Step::Done, _) => return finish(walk),
                (Step::Continue, scope) => scope,
            }
        };

        self.lookup_at_module_scope(&mut walk, module_scope, location);
        finish(walk)
    }

    /// Walk the scope tree outward from the innermost scope at `location`
    fn walk_scopes(
        &mut self,
        walk: &mut Walk<'_>,
        context: ContextId,
        location: SourceLoc,
    ) -> (Step, ContextId) {
        let fallback = self.graph.module_scope_of(context);
        let Some(file) = self.graph.file_of(context) else {
            return (Step::Continue, fallback);
        };
        let Some(tree) = self.scope_trees.get(&file) else {
            return (Step::Continue, fallback);
        };
        let chain: Vec<(ScopeKind, SmallVec<[DeclId; 4]>)> = tree
            .ancestors(tree.find_innermost(location))
            .map(|scope| {
                let node = tree.node(scope);
                (node.kind, node.bindings.clone())
            })
            .collect();

        let mut self_context: Option<ContextId> = None;
        for (kind, bindings) in chain {
            if self.consume_locals(walk, &bindings) {
                return (Step::Done, file);
            }
            // Parameter and generic parameter scopes are siblings of the body.
            let implied = self.implied_bindings(kind);
            if self.consume_locals(walk, &implied) {
                return (Step::Done, file);
            }

            let Some(scope_context) = kind.context(&self.graph) else {
                continue;
            };
            if walk.cascading.is_none() {
                walk.cascading =
                    Some(self.graph.is_cascading_context_for_lookup(scope_context, false));
            }

            if let ScopeKind::FunctionBody(function) = kind {
                let decl = self.graph.decl(function);
                let is_method = self.graph.context(decl.owner).is_type_context();
                // Static members have no `self` to act as receiver.
                self_context = (is_method && !decl.is_static() && decl.implicit_self().is_some())
                    .then_some(scope_context);
                continue;
            }

            match &self.graph.context(scope_context).kind {
                ContextKind::Initializer(InitializerContext::PatternBinding {
                    implicit_self,
                    ..
                }) => {
                    if implicit_self.is_some() {
                        self_context = Some(scope_context);
                    }
                    continue;
                }
                ContextKind::Nominal(_) | ContextKind::Extension(_) => {}
                ContextKind::File(_) => break,
                _ => continue,
            }

            let Some(nominal) = self.graph.nominal_of_context(scope_context) else {
                continue;
            };
            let options = walk.qualified_options();
            let found = self.lookup_qualified_decls(
                &LookupType::Nominal(nominal),
                walk.name,
                options,
                scope_context,
            );
            for decl in found {
                let base = if self.graph.decl(decl).is_type_decl() {
                    Some(scope_context)
                } else {
                    self_context.or(Some(scope_context))
                };
                walk.results.push(LookupResultEntry::new(decl, base));
            }
            if self.settle_type_results(walk) {
                return (Step::Done, file);
            }
            let type_generic_params = match kind {
                ScopeKind::TypeOrExtensionBody(decl) => {
                    self.graph.decl(decl).generic_params().to_vec()
                }
                _ => Vec::new(),
            };
            if self.consume_locals(walk, &type_generic_params) {
                return (Step::Done, file);
            }
            self_context = None;
        }
        (Step::Continue, file)
    }

    /// Bindings a scope owns without listing them: a body sees its function's
    /// `self` and parameters, a function declaration its generic parameters
    fn implied_bindings(&self, kind: ScopeKind) -> Vec<DeclId> {
        match kind {
            ScopeKind::FunctionBody(function) => {
                let decl = self.graph.decl(function);
                let mut params: Vec<DeclId> = decl.implicit_self().into_iter().collect();
                params.extend_from_slice(decl.params());
                params
            }
            ScopeKind::FunctionDecl(function) => {
                self.graph.decl(function).generic_params().to_vec()
            }
            _ => Vec::new(),
        }
    }

    /// Walk the context chain outward from `context`
    fn walk_contexts(&mut self, walk: &mut Walk<'_>, context: ContextId) -> (Step, ContextId) {
        let mut current = context;
        while !self.graph.context(current).is_module_scope() {
            let mut base: Option<ContextId> = None;
            let mut meta_base: Option<ContextId> = None;
            let mut extended: Option<DeclId> = None;
            let mut generic_params: Vec<DeclId> = Vec::new();

            match self.graph.context(current).kind.clone() {
                ContextKind::Initializer(InitializerContext::PatternBinding {
                    binding,
                    implicit_self,
                }) => {
                    let binding_in_type = binding
                        .is_some_and(|binding| self.graph.context(self.graph.owner(binding)).is_type_context());
                    if let Some(self_param) = implicit_self {
                        if self.consume_locals(walk, &[self_param]) {
                            return (Step::Done, current);
                        }
                        let initializer = current;
                        current = self.parent_or(current);
                        extended = self.graph.nominal_of_context(current);
                        meta_base = Some(current);
                        base = Some(initializer);
                    } else if binding_in_type {
                        current = self.parent_or(current);
                        extended = self.graph.nominal_of_context(current);
                        meta_base = Some(current);
                        base = Some(current);
                        walk.cascading =
                            Some(self.graph.is_cascading_context_for_lookup(current, false));
                    }
                    if walk.cascading.is_none() {
                        walk.cascading =
                            Some(self.graph.is_cascading_context_for_lookup(current, false));
                    }
                }
                ContextKind::Function(function) => {
                    let mut params: Vec<DeclId> =
                        self.graph.decl(function).implicit_self().into_iter().collect();
                    params.extend_from_slice(self.graph.decl(function).params());
                    if self.consume_locals(walk, &params) {
                        return (Step::Done, current);
                    }
                    if walk.cascading.is_none_or(|cascading| cascading) {
                        walk.cascading =
                            Some(self.graph.is_cascading_context_for_lookup(current, false));
                    }

                    let owner = self.graph.owner(function);
                    if self.graph.context(owner).is_type_context() {
                        extended = self.graph.nominal_of_context(owner);
                        meta_base = Some(owner);
                        // Static members have no `self` to act as receiver.
                        base = if self.graph.decl(function).is_static() {
                            Some(owner)
                        } else {
                            Some(current)
                        };
                        current = self.parent_or(current);
                    }
                    generic_params = self.graph.decl(function).generic_params().to_vec();
                }
                ContextKind::Nominal(nominal) => {
                    extended = Some(nominal);
                    base = Some(current);
                    meta_base = Some(current);
                    if walk.cascading.is_none() {
                        walk.cascading =
                            Some(self.graph.is_cascading_context_for_lookup(current, false));
                    }
                }
                ContextKind::Extension(_) => {
                    extended = self.graph.nominal_of_context(current);
                    base = Some(current);
                    meta_base = Some(current);
                    if walk.cascading.is_none() {
                        walk.cascading =
                            Some(self.graph.is_cascading_context_for_lookup(current, false));
                    }
                }
                ContextKind::Initializer(InitializerContext::DefaultArgument { .. }) => {
                    // Skip out of both the initializer and its function.
                    walk.cascading = Some(false);
                    current = self
                        .graph
                        .parent(current)
                        .and_then(|function| self.graph.parent(function))
                        .unwrap_or_else(|| self.graph.module_scope_of(current));
                    continue;
                }
                ContextKind::Closure | ContextKind::TopLevelCode => {
                    if walk.cascading.is_none() {
                        walk.cascading =
                            Some(self.graph.is_cascading_context_for_lookup(current, false));
                    }
                }
                ContextKind::Module(_) | ContextKind::File(_) => break,
            }

            if self.consume_locals(walk, &generic_params) {
                return (Step::Done, current);
            }

            if let (Some(nominal), Some(base)) = (extended, base) {
                let options = walk.qualified_options();
                let found = self.lookup_qualified_decls(
                    &LookupType::Nominal(nominal),
                    walk.name,
                    options,
                    current,
                );
                for decl in found {
                    let target = self.graph.decl(decl);
                    let entry = if matches!(target.kind, DeclKind::GenericParam) {
                        LookupResultEntry::unqualified(decl)
                    } else if target.is_type_decl() {
                        LookupResultEntry::new(decl, meta_base)
                    } else {
                        LookupResultEntry::new(decl, Some(base))
                    };
                    walk.results.push(entry);
                }
                if self.settle_type_results(walk) {
                    return (Step::Done, current);
                }
            }

            let own_generic_params = match self.graph.context(current).kind {
                ContextKind::Nominal(decl) | ContextKind::Extension(decl) => {
                    self.graph.decl(decl).generic_params().to_vec()
                }
                _ => Vec::new(),
            };
            if self.consume_locals(walk, &own_generic_params) {
                return (Step::Done, current);
            }

            let Some(next) = self.graph.parent_for_lookup(current) else {
                break;
            };
            current = next;
        }

        if walk.cascading.is_none() {
            walk.cascading = Some(true);
        }
        (Step::Continue, current)
    }

    fn parent_or(&self, context: ContextId) -> ContextId {
        self.graph
            .parent(context)
            .unwrap_or_else(|| self.graph.module_scope_of(context))
    }

    /// Match local bindings against the name; returns whether the walk is over
    ///
    /// If every match is unavailable in the active language version the
    /// matches are parked and the walk goes on.
    fn consume_locals(&self, walk: &mut Walk<'_>, bindings: &[DeclId]) -> bool {
        let type_only = walk.options.contains(UnqualifiedOptions::TYPE_LOOKUP);
        let matches: Vec<DeclId> = bindings
            .iter()
            .copied()
            .filter(|binding| {
                let decl = self.graph.decl(*binding);
                decl.name.as_ref().is_some_and(|full| walk.name.matches_ref(full))
                    && (!type_only || decl.is_type_decl())
            })
            .collect();
        if matches.is_empty() {
            return false;
        }
        let version = self.config.effective_language_version;
        let all_unavailable = matches
            .iter()
            .all(|binding| self.graph.decl(*binding).availability.is_unavailable_in(version));
        let entries = matches.into_iter().map(LookupResultEntry::unqualified);
        if all_unavailable {
            walk.parked.extend(entries);
            return false;
        }
        walk.results.extend(entries);
        true
    }

    /// Park results found in a type if all are unavailable; returns whether they are final
    fn settle_type_results(&self, walk: &mut Walk<'_>) -> bool {
        if walk.results.is_empty() {
            return false;
        }
        let version = self.config.effective_language_version;
        let all_unavailable = walk.results.iter().all(|entry| {
            self.graph
                .decl(entry.decl)
                .availability
                .is_unavailable_in(version)
        });
        if all_unavailable {
            walk.parked.append(&mut walk.results);
            return false;
        }
        if let Some(discriminator) = self.preferred_discriminator() {
            filter_for_discriminator(&self.graph, &mut walk.results, discriminator, |entry| {
                entry.decl
            });
        }
        true
    }

    /// Module-scope phase: debugger hook, module lookup, parked results, module names
    fn lookup_at_module_scope(
        &mut self,
        walk: &mut Walk<'_>,
        scope: ContextId,
        location: Option<SourceLoc>,
    ) {
        let name = walk.name;
        let type_lookup = walk.options.contains(UnqualifiedOptions::TYPE_LOOKUP);

        if name.is_simple() {
            if let Some(client) = self.debugger.as_ref() {
                if client.lookup_overrides(
                    &self.graph,
                    name.base(),
                    scope,
                    location,
                    type_lookup,
                    &mut walk.results,
                ) {
                    return;
                }
            }
        }

        let cascading = *walk.cascading.get_or_insert(true);
        if let Some(tracker) = self.tracker_for(scope) {
            tracker.add_top_level_name(name.base(), cascading);
        }

        let extra_imports: Vec<DeclId> = self
            .graph
            .context(scope)
            .as_file()
            .map(|unit| {
                unit.imports
                    .iter()
                    .filter(|import| !import.exported)
                    .map(|import| import.module)
                    .collect()
            })
            .unwrap_or_default();

        let mut options = LookupOptions::empty();
        if type_lookup {
            options |= LookupOptions::ONLY_TYPES;
        }
        if walk.options.contains(UnqualifiedOptions::IGNORE_ACCESS_CONTROL) {
            options |= LookupOptions::IGNORE_ACCESS_CONTROL;
        }
        let module = self.graph.module_of_context(scope);
        let found = self.lookup_in_module(module, name, scope, options, &extra_imports);
        walk.results
            .extend(found.into_iter().map(LookupResultEntry::unqualified));

        if let Some(discriminator) = self.preferred_discriminator() {
            filter_for_discriminator(&self.graph, &mut walk.results, discriminator, |entry| {
                entry.decl
            });
        }

        if name.is_simple() {
            if let Some(client) = self.debugger.as_ref() {
                client.lookup_additions(
                    &self.graph,
                    name.base(),
                    scope,
                    location,
                    type_lookup,
                    &mut walk.results,
                );
            }
        }

        if !walk.results.is_empty() {
            return;
        }
        if !walk.parked.is_empty() {
            walk.results.append(&mut walk.parked);
            return;
        }
        if !name.is_simple() {
            return;
        }

        // A name that matches nothing may still name a module.
        if self.graph.decl(module).base_name() == Some(name.base()) {
            walk.results.push(LookupResultEntry::unqualified(module));
        } else if let Some(found) = self.visible_module_named(scope, name.base()) {
            walk.results.push(LookupResultEntry::unqualified(found));
        }
    }
}

fn finish(walk: Walk<'_>) -> UnqualifiedResult {
    UnqualifiedResult {
        results: walk.results,
        cascading: walk.cascading.unwrap_or(true),
    }
}
