//! Referenced-name tracking for incremental builds

use rustc_hash::FxHashMap;
use rv_entity::DeclId;
use rv_intern::Symbol;

/// Names a source file depends on, each with its cascading bit
///
/// Once a name is recorded as cascading it stays cascading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedNames {
    top_level: FxHashMap<Symbol, bool>,
    used_members: FxHashMap<(DeclId, Symbol), bool>,
    dynamic_lookup: FxHashMap<Symbol, bool>,
}

impl ReferencedNames {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a top-level name reference
    pub fn add_top_level_name(&mut self, name: Symbol, cascading: bool) {
        *self.top_level.entry(name).or_default() |= cascading;
    }

    /// Record a member name referenced on `nominal`
    pub fn add_used_member(&mut self, nominal: DeclId, name: Symbol, cascading: bool) {
        *self.used_members.entry((nominal, name)).or_default() |= cascading;
    }

    /// Record a name referenced through dynamic lookup
    pub fn add_dynamic_lookup_name(&mut self, name: Symbol, cascading: bool) {
        *self.dynamic_lookup.entry(name).or_default() |= cascading;
    }

    /// Cascading bit of a top-level name, `None` if never referenced
    pub fn top_level_name(&self, name: Symbol) -> Option<bool> {
        self.top_level.get(&name).copied()
    }

    /// Cascading bit of a member name, `None` if never referenced
    pub fn used_member(&self, nominal: DeclId, name: Symbol) -> Option<bool> {
        self.used_members.get(&(nominal, name)).copied()
    }

    /// Cascading bit of a dynamic lookup name, `None` if never referenced
    pub fn dynamic_lookup_name(&self, name: Symbol) -> Option<bool> {
        self.dynamic_lookup.get(&name).copied()
    }

    /// Every top-level name with its cascading bit
    pub fn top_level_names(&self) -> impl Iterator<Item = (Symbol, bool)> + '_ {
        self.top_level.iter().map(|(name, cascading)| (*name, *cascading))
    }

    /// Every member reference with its cascading bit
    pub fn used_members(&self) -> impl Iterator<Item = (DeclId, Symbol, bool)> + '_ {
        self.used_members
            .iter()
            .map(|((nominal, name), cascading)| (*nominal, *name, *cascading))
    }
}
