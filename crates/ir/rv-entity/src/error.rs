//! Errors raised when the graph is mutated inconsistently

use crate::context::ContextId;
use crate::decl::DeclId;

/// Misuse of the entity graph's write-once or shape contracts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// The interface type of a declaration was written twice
    #[error("declaration {0:?} already has a type")]
    AlreadyHasType(DeclId),

    /// The access level of a declaration was written twice
    #[error("declaration {0:?} already has an access level")]
    AlreadyHasAccess(DeclId),

    /// Members can only be attached to nominal types and extensions
    #[error("declaration {0:?} is not an iterable context")]
    NotIterable(DeclId),

    /// Extensions can only be registered on nominal types
    #[error("declaration {0:?} is not a nominal type")]
    NotNominal(DeclId),

    /// An extension joins at most one extension chain, once
    #[error("extension {0:?} is already registered")]
    ExtensionAlreadyRegistered(DeclId),

    /// Files and imports attach to modules only
    #[error("declaration {0:?} is not a module")]
    NotModule(DeclId),

    /// The context is not a source file
    #[error("context {0:?} is not a file")]
    NotFile(ContextId),
}
