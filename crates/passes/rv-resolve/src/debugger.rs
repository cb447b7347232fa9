//! Hook for debugger and REPL clients

use rv_entity::{ContextId, EntityGraph};
use rv_intern::Symbol;
use rv_span::SourceLoc;

use crate::result::LookupResultEntry;

/// External client consulted at the module-scope step of unqualified lookup
///
/// Every method has a neutral default so clients implement only what they need.
pub trait DebuggerClient {
    /// Replace module-scope lookup entirely; return `true` when `results` is final
    fn lookup_overrides(
        &self,
        _graph: &EntityGraph,
        _name: Symbol,
        _context: ContextId,
        _location: Option<SourceLoc>,
        _type_lookup: bool,
        _results: &mut Vec<LookupResultEntry>,
    ) -> bool {
        false
    }

    /// Add results after module-scope lookup; return `true` if any were added
    fn lookup_additions(
        &self,
        _graph: &EntityGraph,
        _name: Symbol,
        _context: ContextId,
        _location: Option<SourceLoc>,
        _type_lookup: bool,
        _results: &mut Vec<LookupResultEntry>,
    ) -> bool {
        false
    }

    /// File discriminator whose private declarations win ties
    fn preferred_private_discriminator(&self) -> Option<Symbol> {
        None
    }
}
