//! Table population and direct member lookup
//!
//! A direct lookup checks the table at most twice. With named lazy loading
//! the first miss asks the loaders for just that name and retries; any loader
//! failure degrades to a full load before the retry.

use rv_entity::{DeclId, DeclName};

use crate::lazy::LazyMembers;
use crate::session::ResolverSession;

/// Outcome of asking a loader for one name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamedLoad {
    /// The entry is populated (possibly with nothing)
    Loaded,
    /// Unsupported or failed; the caller must fall back to a full load
    Failed,
    /// A load of this context is already running
    NotReady,
}

impl ResolverSession {
    /// Materialize every lazily held member of `iterable`
    ///
    /// Returns `false` when there was nothing to load, including a re-entrant
    /// call while the same context is loading.
    pub fn load_all_members(&mut self, iterable: DeclId) -> bool {
        let Some((loader, cursor)) = self.lazy_state(iterable).loader() else {
            return false;
        };
        self.lazy.insert(iterable, LazyMembers::Loading);
        self.stats.full_member_loads += 1;
        tracing::debug!(context = ?iterable, "loading all members");

        match loader.load_all_members(self, iterable, cursor) {
            Ok(members) => {
                for member in members {
                    if let Err(error) = self.add_member(iterable, member) {
                        tracing::warn!(context = ?iterable, %error, "dropping loaded member");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(
                    context = ?iterable,
                    %error,
                    "full member load failed; continuing with the members present"
                );
            }
        }
        self.lazy.insert(iterable, LazyMembers::Loaded);
        true
    }

    /// Fully populate the lookup table of `nominal`
    ///
    /// Loads every lazy member of the type and of its new extensions, indexes
    /// them, and advances the extension watermark. Calling it again without
    /// new members or extensions changes nothing and runs no loader.
    pub fn populate(&mut self, nominal: DeclId) {
        self.load_all_members(nominal);
        self.prepare_lookup_table(nominal, true, false);
    }

    /// Populate only the entry for `name`, falling back to [`Self::populate`]
    pub fn populate_name(&mut self, nominal: DeclId, name: &DeclName) {
        if !self.has_lazy_members(nominal) {
            self.populate(nominal);
            return;
        }
        self.prepare_lookup_table(nominal, false, false);
        let outcome = match self.populate_entry_from_loader(nominal, nominal, name) {
            NamedLoad::Loaded => self.populate_entry_from_extensions(nominal, name),
            other => other,
        };
        if outcome == NamedLoad::Failed {
            self.populate(nominal);
        }
    }

    /// Members of `nominal` and its extensions named `name`
    pub fn lookup_direct(&mut self, nominal: DeclId, name: &DeclName) -> Vec<DeclId> {
        self.lookup_direct_with(nominal, name, false)
    }

    /// [`Self::lookup_direct`], optionally ignoring extensions registered since
    /// the last population
    #[tracing::instrument(level = "trace", skip_all, fields(nominal = ?nominal))]
    pub fn lookup_direct_with(
        &mut self,
        nominal: DeclId,
        name: &DeclName,
        ignore_new_extensions: bool,
    ) -> Vec<DeclId> {
        self.stats.lookup_direct_count += 1;

        // Initializer ranking and inheritance need the complete set.
        let is_init = name.base() == self.graph.interner().known().init;
        let mut use_named = self.config.named_lazy_member_loading
            && self.has_lazy_members(nominal)
            && !is_init;

        for attempt in 0..2 {
            if !use_named {
                self.load_all_members(nominal);
            }
            self.prepare_lookup_table(nominal, !use_named, ignore_new_extensions);

            let found = self
                .tables
                .get(&nominal)
                .map(|table| table.lookup(name))
                .unwrap_or_default();
            if !found.is_empty() {
                return found.to_vec();
            }

            if !use_named || attempt > 0 {
                break;
            }
            let outcome = match self.populate_entry_from_loader(nominal, nominal, name) {
                NamedLoad::Loaded => self.populate_entry_from_extensions(nominal, name),
                other => other,
            };
            match outcome {
                NamedLoad::Loaded => {}
                NamedLoad::Failed => {
                    tracing::debug!(nominal = ?nominal, "named lazy loading failed; loading everything");
                    use_named = false;
                }
                NamedLoad::NotReady => break,
            }
        }
        Vec::new()
    }

    /// Bring the table of `nominal` up to date with the graph
    ///
    /// With `load_extensions`, every extension still holding lazy members is
    /// loaded first, including ones a named lookup already moved the
    /// watermark past.
    fn prepare_lookup_table(
        &mut self,
        nominal: DeclId,
        load_extensions: bool,
        ignore_new_extensions: bool,
    ) {
        if load_extensions {
            // Without new extensions, only those already indexed are loaded.
            let included = |ext: &DeclId| {
                !ignore_new_extensions
                    || self
                        .tables
                        .get(&nominal)
                        .is_some_and(|table| table.includes_extension(&self.graph, nominal, *ext))
            };
            let lazy: Vec<DeclId> = self
                .graph
                .extensions(nominal)
                .filter(|ext| included(ext) && self.has_lazy_members(*ext))
                .collect();
            for ext in lazy {
                self.load_all_members(ext);
            }
        }

        let Self { tables, graph, .. } = self;
        let table = tables.entry(nominal).or_default();
        table.scan_primary_members(graph, nominal);
        if !ignore_new_extensions {
            table.update_from_extensions(graph, nominal);
        }
    }

    /// Ask the loader of `iterable` for `name` and index the answer in `nominal`'s table
    fn populate_entry_from_loader(
        &mut self,
        nominal: DeclId,
        iterable: DeclId,
        name: &DeclName,
    ) -> NamedLoad {
        let state = self.lazy_state(iterable);
        if state.is_loading() {
            return NamedLoad::NotReady;
        }
        let Some((loader, cursor)) = state.loader() else {
            return NamedLoad::Loaded;
        };

        self.lazy.insert(iterable, LazyMembers::Loading);
        let result = loader.load_named_members(self, iterable, name, cursor);
        self.lazy
            .insert(iterable, LazyMembers::unloaded(loader, cursor));

        match result {
            Ok(Some(members)) => {
                self.stats.named_lazy_load_success += 1;
                let Self { tables, graph, .. } = self;
                tables
                    .entry(nominal)
                    .or_default()
                    .add_members(graph, members);
                NamedLoad::Loaded
            }
            Ok(None) => {
                self.stats.named_lazy_load_failure += 1;
                tracing::debug!(context = ?iterable, "named lazy loading unsupported");
                NamedLoad::Failed
            }
            Err(error) => {
                self.stats.named_lazy_load_failure += 1;
                tracing::debug!(context = ?iterable, %error, "named lazy loading failed");
                NamedLoad::Failed
            }
        }
    }

    /// Populate the entry for `name` from every extension of `nominal`
    ///
    /// Stops at the first extension whose loader cannot answer by name; the
    /// caller then falls back to a full population.
    fn populate_entry_from_extensions(&mut self, nominal: DeclId, name: &DeclName) -> NamedLoad {
        let extensions: Vec<DeclId> = self.graph.extensions(nominal).collect();
        for ext in extensions {
            if self.has_lazy_members(ext) {
                match self.populate_entry_from_loader(nominal, ext, name) {
                    NamedLoad::Failed => return NamedLoad::Failed,
                    NamedLoad::Loaded | NamedLoad::NotReady => continue,
                }
            }
            let Self { tables, graph, .. } = self;
            let members: Vec<DeclId> = graph.members(ext).collect();
            tables.entry(nominal).or_default().add_members(graph, members);
        }
        NamedLoad::Loaded
    }
}
