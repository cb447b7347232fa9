//! Error types for name resolution
//!
//! Lookups themselves never fail. These errors belong to the collaborators:
//! lazy loaders (recovered inside the session) and scope-tree construction
//! (an internal consistency fault).

use rv_entity::DeclId;
use rv_span::Span;

use crate::scope::ScopeId;

/// Failure reported by a [`LazyMemberLoader`](crate::LazyMemberLoader)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    /// The loader cannot serve this request
    #[error("lazy member loading is not supported here")]
    Unsupported,

    /// Reading serialized members failed
    #[error("failed to deserialize members of {context:?}: {message}")]
    Deserialization {
        /// Context whose members were being read
        context: DeclId,
        /// Loader-specific description
        message: String,
    },

    /// The cross-language bridge failed
    #[error("foreign bridge failure: {0}")]
    Bridge(String),
}

/// Structural invariant violations of a [`ScopeTree`](crate::ScopeTree)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeTreeError {
    /// A child's range is not contained in its parent's
    #[error("child not contained in its parent: child {child:?} at {child_range}, parent {parent:?} at {parent_range}")]
    ChildNotContained {
        /// Enclosing node
        parent: ScopeId,
        /// Range of the enclosing node
        parent_range: Span,
        /// Offending child
        child: ScopeId,
        /// Range of the offending child
        child_range: Span,
    },

    /// A child overlaps or precedes its previous sibling
    #[error("child overlaps previous child: child {child:?} at {child_range}, previous {previous:?} at {previous_range}")]
    ChildOverlapsSibling {
        /// Sibling before the offending child
        previous: ScopeId,
        /// Range of that sibling
        previous_range: Span,
        /// Offending child
        child: ScopeId,
        /// Range of the offending child
        child_range: Span,
    },

    /// `enter`/`exit` calls of a builder did not balance
    #[error("unbalanced scope builder: {open} scope(s) left open")]
    UnbalancedBuilder {
        /// Scopes still open (negative counts are reported as zero)
        open: usize,
    },

    /// A rebuilt node must keep its start offset
    #[error("rebuilt range {new_range} of {node:?} does not start at {old_range}")]
    RebuildMovedStart {
        /// Node being rebuilt
        node: ScopeId,
        /// Range before the rebuild
        old_range: Span,
        /// Range the rebuild produced
        new_range: Span,
    },
}
