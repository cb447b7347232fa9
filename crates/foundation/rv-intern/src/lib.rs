//! String interning for symbols
//!
//! Every identifier the resolver compares (declaration base names, argument
//! labels, module names, file discriminators, selectors) is interned once and
//! compared by [`Symbol`] afterwards.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::sync::Arc;

/// Names the resolver treats specially
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KnownNames {
    /// `init`, the base name shared by every initializer
    pub init: Symbol,
    /// `self`, the implicit receiver parameter
    pub self_: Symbol,
    /// `AnyObject`, the class-existential marker
    pub any_object: Symbol,
}

/// Shared string interner
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
    known: KnownNames,
}

impl Interner {
    /// Create an interner with the known names pre-interned
    pub fn new() -> Self {
        let inner = ThreadedRodeo::new();
        let known = KnownNames {
            init: inner.get_or_intern_static("init"),
            self_: inner.get_or_intern_static("self"),
            any_object: inner.get_or_intern_static("AnyObject"),
        };
        Self {
            inner: Arc::new(inner),
            known,
        }
    }

    /// Intern `text`, returning the existing symbol if already present
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Look up a symbol without interning it
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Text of an interned symbol
    pub fn resolve(&self, sym: &Symbol) -> &str {
        self.inner.resolve(sym)
    }

    /// Text of a symbol, `None` if it came from another interner
    pub fn try_resolve(&self, sym: &Symbol) -> Option<&str> {
        self.inner.try_resolve(sym)
    }

    /// The pre-interned special names
    pub fn known(&self) -> KnownNames {
        self.known
    }

    /// Whether `sym` spells an operator rather than an identifier
    ///
    /// Identifiers start with a letter, an underscore or a backtick; anything
    /// else (`+`, `==`, `<>`) names an operator.
    pub fn is_operator(&self, sym: &Symbol) -> bool {
        self.inner
            .try_resolve(sym)
            .and_then(|text| text.chars().next())
            .is_some_and(|first| !(first.is_alphanumeric() || matches!(first, '_' | '`' | '$')))
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Interner")
            .field("len", &self.inner.len())
            .finish()
    }
}
