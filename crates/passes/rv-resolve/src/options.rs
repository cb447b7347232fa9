//! Lookup option sets

use bitflags::bitflags;

bitflags! {
    /// Options of qualified lookup
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct LookupOptions: u16 {
        /// Visit the protocols a nominal type conforms to
        const PROTOCOL_MEMBERS = 1 << 0;
        /// Only return type declarations
        const ONLY_TYPES = 1 << 1;
        /// Visit superclasses and, for protocols, inherited protocols
        const VISIT_SUPERTYPES = 1 << 2;
        /// Do not filter out inaccessible declarations
        const IGNORE_ACCESS_CONTROL = 1 << 3;
        /// Fall back to every visible class for `AnyObject` lookups
        const DYNAMIC_LOOKUP = 1 << 4;
        /// Drop declarations overridden by other results
        const REMOVE_OVERRIDDEN = 1 << 5;
        /// Drop declarations shadowed by other results
        const REMOVE_NON_VISIBLE = 1 << 6;
        /// The dependency is known to be cascading
        const KNOWN_CASCADING_DEPENDENCY = 1 << 7;
        /// The dependency is known to be private
        const KNOWN_NON_CASCADING_DEPENDENCY = 1 << 8;
    }
}

impl LookupOptions {
    /// Defaults for qualified lookups
    pub const QUALIFIED_DEFAULT: Self = Self::VISIT_SUPERTYPES
        .union(Self::REMOVE_OVERRIDDEN)
        .union(Self::REMOVE_NON_VISIBLE);

    /// Defaults for unqualified lookups
    pub const UNQUALIFIED_DEFAULT: Self = Self::QUALIFIED_DEFAULT;
}

bitflags! {
    /// Options of unqualified lookup
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct UnqualifiedOptions: u8 {
        /// Only types are acceptable results
        const TYPE_LOOKUP = 1 << 0;
        /// Consider protocol members reachable from enclosing types
        const ALLOW_PROTOCOL_MEMBERS = 1 << 1;
        /// Do not filter out inaccessible declarations
        const IGNORE_ACCESS_CONTROL = 1 << 2;
        /// The reference is known not to cascade
        const KNOWN_NON_CASCADING = 1 << 3;
    }
}

impl UnqualifiedOptions {
    /// Qualified options used when the walk looks into an enclosing type
    pub fn qualified(self) -> LookupOptions {
        let mut options = LookupOptions::UNQUALIFIED_DEFAULT;
        if self.contains(Self::TYPE_LOOKUP) {
            options |= LookupOptions::ONLY_TYPES;
        }
        if self.contains(Self::ALLOW_PROTOCOL_MEMBERS) {
            options |= LookupOptions::PROTOCOL_MEMBERS;
        }
        if self.contains(Self::IGNORE_ACCESS_CONTROL) {
            options |= LookupOptions::IGNORE_ACCESS_CONTROL;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified_maps_to_qualified() {
        let options = (UnqualifiedOptions::TYPE_LOOKUP | UnqualifiedOptions::ALLOW_PROTOCOL_MEMBERS)
            .qualified();
        assert!(options.contains(LookupOptions::UNQUALIFIED_DEFAULT));
        assert!(options.contains(LookupOptions::ONLY_TYPES | LookupOptions::PROTOCOL_MEMBERS));
        assert!(!options.contains(LookupOptions::IGNORE_ACCESS_CONTROL));
        assert_eq!(UnqualifiedOptions::empty().qualified(), LookupOptions::UNQUALIFIED_DEFAULT);
    }
}
