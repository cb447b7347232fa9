//! Declaration names

use rv_intern::Symbol;
use smallvec::SmallVec;

/// A declaration name: a base name plus, for compound names, argument labels
///
/// `foo` is a simple name; `foo(bar:_:)` is a compound name with labels
/// `[Some(bar), None]`. A simple name used as a lookup key refers to every
/// declaration sharing its base name.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct DeclName {
    base: Symbol,
    labels: Option<SmallVec<[Option<Symbol>; 4]>>,
}

impl DeclName {
    /// Name without argument labels
    pub fn simple(base: Symbol) -> Self {
        Self { base, labels: None }
    }

    /// Name with one label per argument, `None` for `_`
    pub fn compound(base: Symbol, labels: impl IntoIterator<Item = Option<Symbol>>) -> Self {
        Self {
            base,
            labels: Some(labels.into_iter().collect()),
        }
    }

    /// Base name
    pub fn base(&self) -> Symbol {
        self.base
    }

    /// Argument labels, for compound names
    pub fn labels(&self) -> Option<&[Option<Symbol>]> {
        self.labels.as_deref()
    }

    /// Has no argument labels
    pub fn is_simple(&self) -> bool {
        self.labels.is_none()
    }

    /// Has argument labels
    pub fn is_compound(&self) -> bool {
        self.labels.is_some()
    }

    /// The base name on its own
    #[must_use]
    pub fn simple_name(&self) -> Self {
        Self::simple(self.base)
    }

    /// Simple name spelled `base`
    pub fn is_simple_name(&self, base: Symbol) -> bool {
        self.is_simple() && self.base == base
    }

    /// Whether this name, used as a reference, can denote a declaration named `full`
    pub fn matches_ref(&self, full: &DeclName) -> bool {
        if self.is_simple() {
            self.base == full.base
        } else {
            self == full
        }
    }
}

impl From<Symbol> for DeclName {
    fn from(base: Symbol) -> Self {
        Self::simple(base)
    }
}
