//! Entity graph: declarations and their nesting contexts
//!
//! The graph is an append-only forest allocated in two arenas. Declarations
//! point at their owning context, contexts point at their parent, and every
//! other cross reference (override chains, extension chains, member lists)
//! is an arena index, so there is no ownership cycle anywhere.
//!
//! # Layout
//!
//! - [`Decl`] / [`DeclId`]: named or unnamed entities, tagged by [`DeclKind`]
//! - [`Context`] / [`ContextId`]: module, file, nominal type, extension,
//!   function, closure, initializer and top-level-code contexts
//! - [`EntityGraph`]: owns both arenas and the [`Interner`]
//!
//! Iterable contexts (nominal types and extensions) keep their members in an
//! intrusive singly linked list with a tail pointer, and nominal types keep
//! their extensions the same way.

pub mod access;
pub mod context;
pub mod decl;
pub mod error;
pub mod graph;
pub mod name;
pub mod ty;

pub use access::{AccessLevel, Availability, LanguageVersion};
pub use context::{
    Context, ContextId, ContextKind, FileUnit, Import, InitializerContext, SourceFileKind,
};
pub use decl::{
    AccessorDecl, AccessorKind, ConstructorDecl, CtorKind, Decl, DeclFlags, DeclId, DeclKind,
    ExtensionChain, ExtensionDecl, FuncDecl, MemberList, ModuleDecl, NominalDecl, NominalKind,
    Selector, VarDecl,
};
pub use error::EntityError;
pub use graph::{EntityGraph, Extensions, Members};
pub use name::DeclName;
pub use rv_intern::{Interner, Symbol};
pub use ty::LookupType;
