//! Name resolution for Raven
//!
//! Given a name and a point in the program (a source location, a context or a
//! type), this crate produces the set of declarations the name may refer to.
//! It reconciles lexical nesting, the nominal type hierarchy, lazily loaded
//! members, access control and availability, and memoizes everything it can.
//!
//! # Architecture
//!
//! - **Session**: [`ResolverSession`] owns the [`EntityGraph`](rv_entity::EntityGraph)
//!   and every cache below; all lookups are methods on it
//! - **Lazy population**: [`LazyMemberLoader`] materializes members on demand
//! - **Member lookup table**: per-nominal name index with an extension watermark
//! - **Scope tree**: source-range tree per file answering "what is in scope at L"
//! - **Qualified lookup**: walks supertypes and conformances of a [`LookupType`](rv_entity::LookupType)
//! - **Unqualified lookup**: walks the scope tree (or the context chain) outward
//! - **Filters**: override removal, shadow removal, access checks
//! - **Selector cache**: foreign selector to method table per class
//!
//! # Usage
//!
//! ```rust,ignore
//! use rv_resolve::{ResolverConfig, ResolverSession, UnqualifiedOptions};
//!
//! let mut session = ResolverSession::new(graph, ResolverConfig::default());
//! let name = session.graph().name("x");
//! let found = session.lookup_unqualified(&name, context, Some(loc), UnqualifiedOptions::empty());
//! ```
//!
//! Lookups never fail: an empty result means "not found", more than one
//! surviving entry means "ambiguous", and the caller decides what to report.

pub mod access;
pub mod config;
pub mod debugger;
pub mod error;
pub mod lazy;
pub mod member_table;
pub mod module_lookup;
pub mod options;
pub mod populate;
pub mod qualified;
pub mod result;
pub mod scope;
pub mod selector;
pub mod session;
pub mod shadow;
pub mod tracker;
pub mod unqualified;

pub use access::AccessScope;
pub use config::{ResolverConfig, ShadowingPolicy};
pub use debugger::DebuggerClient;
pub use error::{LoaderError, ScopeTreeError};
pub use lazy::{LazyMemberLoader, LazyMembers, LookupStats};
pub use member_table::MemberLookupTable;
pub use options::{LookupOptions, UnqualifiedOptions};
pub use result::{LookupResultEntry, UnqualifiedResult};
pub use scope::{ScopeBuilder, ScopeId, ScopeKind, ScopeNode, ScopeTree};
pub use selector::SelectorConflict;
pub use session::ResolverSession;
pub use tracker::ReferencedNames;
