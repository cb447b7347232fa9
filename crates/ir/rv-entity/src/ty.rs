//! Base types of qualified lookup

use crate::decl::DeclId;

/// Shape of the type a qualified lookup searches
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupType {
    /// A nominal type or an extension of one
    Nominal(DeclId),
    /// A generic parameter with its constraints
    Archetype {
        /// Protocols the parameter must conform to
        conforms_to: Vec<DeclId>,
        /// Class the parameter must inherit from
        superclass: Option<DeclId>,
        /// Constrained to class types
        any_object: bool,
    },
    /// A protocol composition, e.g. `P & Q & AnyObject`
    Composition {
        /// Protocol members of the composition
        protocols: Vec<DeclId>,
        /// Class member of the composition
        superclass: Option<DeclId>,
        /// Includes `AnyObject`
        any_object: bool,
    },
    /// A module, for `Module.name` references
    Module(DeclId),
}

impl LookupType {
    /// Whether the type carries an `AnyObject` requirement
    pub fn requires_any_object(&self) -> bool {
        match self {
            Self::Archetype { any_object, .. } | Self::Composition { any_object, .. } => {
                *any_object
            }
            Self::Nominal(_) | Self::Module(_) => false,
        }
    }
}
