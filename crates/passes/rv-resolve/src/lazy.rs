//! Lazy member population
//!
//! Iterable contexts loaded from a compiled module or a foreign bridge start
//! out [`LazyMembers::Unloaded`]. The session moves them to `Loading` while a
//! loader runs and to `Loaded` afterwards; the transition never goes back.

use std::fmt;
use std::rc::Rc;

use rv_entity::{DeclId, DeclName};

use crate::error::LoaderError;
use crate::session::ResolverSession;

/// External source of members (deserializer, cross-language bridge)
///
/// Loaders allocate the declarations they return in the session's graph with
/// the iterable context as owner. A loader asked for the same member twice
/// (once by name, once in a full load) must return the same [`DeclId`].
pub trait LazyMemberLoader {
    /// Materialize every member of `context`
    ///
    /// # Errors
    ///
    /// Returns a loader-specific error; the session logs it and treats the
    /// context as loaded with whatever members are present.
    fn load_all_members(
        &self,
        session: &mut ResolverSession,
        context: DeclId,
        cursor: u64,
    ) -> Result<Vec<DeclId>, LoaderError>;

    /// Materialize only the members of `context` named `name`
    ///
    /// `Ok(None)` means named loading is unsupported for this context.
    ///
    /// # Errors
    ///
    /// Any error makes the session fall back to a full load.
    fn load_named_members(
        &self,
        session: &mut ResolverSession,
        context: DeclId,
        name: &DeclName,
        cursor: u64,
    ) -> Result<Option<Vec<DeclId>>, LoaderError>;
}

/// Population state of one iterable context
#[derive(Clone)]
pub enum LazyMembers {
    /// Members still live behind the loader
    Unloaded {
        loader: Rc<dyn LazyMemberLoader>,
        /// Opaque position of the context's data inside the loader
        cursor: u64,
    },
    /// A loader call for this context is in progress
    Loading,
    /// Every member is in the graph
    Loaded,
}

impl LazyMembers {
    /// Members still held by `loader` at `cursor`
    pub fn unloaded(loader: Rc<dyn LazyMemberLoader>, cursor: u64) -> Self {
        Self::Unloaded { loader, cursor }
    }

    /// Every member is in the graph
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// A loader call is in progress
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loader, only while unloaded
    pub fn loader(&self) -> Option<(Rc<dyn LazyMemberLoader>, u64)> {
        match self {
            Self::Unloaded { loader, cursor } => Some((Rc::clone(loader), *cursor)),
            Self::Loading | Self::Loaded => None,
        }
    }
}

impl fmt::Debug for LazyMembers {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded { cursor, .. } => formatter
                .debug_struct("Unloaded")
                .field("cursor", cursor)
                .finish_non_exhaustive(),
            Self::Loading => formatter.write_str("Loading"),
            Self::Loaded => formatter.write_str("Loaded"),
        }
    }
}

/// Counters of the direct-lookup and lazy-loading paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Direct member lookups performed
    pub lookup_direct_count: u64,
    /// Named loads that answered the request
    pub named_lazy_load_success: u64,
    /// Named loads that failed and fell back to a full load
    pub named_lazy_load_failure: u64,
    /// Full member loads performed
    pub full_member_loads: u64,
}
