//! Lookup results

use rv_entity::{ContextId, ContextKind, DeclId, EntityGraph, InitializerContext};

/// A found declaration paired with the context acting as its implicit receiver
///
/// The base is a method body (whose `self` is the receiver), a pattern
/// initializer with an implicit `self`, a type context (for type members and
/// static contexts) or absent for non-member results.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LookupResultEntry {
    /// Declaration found
    pub decl: DeclId,
    /// Context of the implicit receiver, for member results
    pub base: Option<ContextId>,
}

impl LookupResultEntry {
    /// Entry for `decl` found through `base`
    pub fn new(decl: DeclId, base: Option<ContextId>) -> Self {
        Self { decl, base }
    }

    /// Entry without a receiver
    pub fn unqualified(decl: DeclId) -> Self {
        Self { decl, base: None }
    }

    /// The declaration acting as receiver: a `self` parameter or a nominal type
    pub fn base_decl(&self, graph: &EntityGraph) -> Option<DeclId> {
        let base = self.base?;
        match graph.context(base).kind {
            ContextKind::Function(function) => graph.decl(function).implicit_self(),
            ContextKind::Initializer(InitializerContext::PatternBinding { implicit_self, .. }) => {
                implicit_self
            }
            ContextKind::Nominal(_) | ContextKind::Extension(_) => graph.nominal_of_context(base),
            _ => None,
        }
    }
}

/// Outcome of an unqualified lookup
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnqualifiedResult {
    /// Entries in discovery order
    pub results: Vec<LookupResultEntry>,
    /// Whether the reference was recorded as a cascading dependency
    pub cascading: bool,
}

impl UnqualifiedResult {
    /// No declaration found
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Declarations found, in order
    pub fn decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.results.iter().map(|entry| entry.decl)
    }

    /// The only result, if there is exactly one and it is a type
    pub fn single_type_result(&self, graph: &EntityGraph) -> Option<DeclId> {
        match self.results.as_slice() {
            [only] if graph.decl(only.decl).is_type_decl() => Some(only.decl),
            _ => None,
        }
    }
}
