//! Per-nominal member lookup table

use rustc_hash::FxHashMap;
use rv_entity::{DeclFlags, DeclId, DeclName, EntityGraph};
use smallvec::SmallVec;

/// Name index over the members of a nominal type and its extensions
///
/// Members with a compound name are indexed under both the full name and the
/// base name. A member is indexed at most once; the
/// [`DeclFlags::IN_LOOKUP_TABLE`] bit on the declaration guards that.
#[derive(Debug, Clone, Default)]
pub struct MemberLookupTable {
    /// Last extension whose members are indexed
    last_extension_included: Option<DeclId>,
    /// Whether the primary declaration's members were scanned
    populated: bool,
    /// Length of the primary member list at the last scan
    members_scanned: u32,
    lookup: FxHashMap<DeclName, SmallVec<[DeclId; 2]>>,
}

impl MemberLookupTable {
    /// Create an empty, unpopulated table
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the primary declaration's members have been scanned
    ///
    /// Full population additionally needs every lazy loader drained; see
    /// [`crate::ResolverSession::is_fully_populated`].
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Latest extension whose members are indexed
    pub fn last_extension_included(&self) -> Option<DeclId> {
        self.last_extension_included
    }

    /// Index one member; no-op for unnamed or already indexed declarations
    pub fn add_member(&mut self, graph: &mut EntityGraph, member: DeclId) {
        let decl = graph.decl(member);
        if decl.flags.contains(DeclFlags::IN_LOOKUP_TABLE) {
            return;
        }
        let Some(name) = decl.name.clone() else {
            return;
        };
        graph.insert_flags(member, DeclFlags::IN_LOOKUP_TABLE);

        if name.is_compound() {
            self.lookup.entry(name.simple_name()).or_default().push(member);
        }
        self.lookup.entry(name).or_default().push(member);
    }

    /// Index several members
    pub fn add_members(&mut self, graph: &mut EntityGraph, members: impl IntoIterator<Item = DeclId>) {
        for member in members {
            self.add_member(graph, member);
        }
    }

    /// Index members of `nominal`'s primary declaration appended since the last scan
    pub fn scan_primary_members(&mut self, graph: &mut EntityGraph, nominal: DeclId) {
        let len = graph
            .decl(nominal)
            .member_list()
            .map_or(0, |list| list.len);
        if self.populated && len == self.members_scanned {
            return;
        }
        self.populated = true;
        self.members_scanned = len;
        let members: Vec<DeclId> = graph.members(nominal).collect();
        self.add_members(graph, members);
    }

    /// Extensions of `nominal` registered after the watermark
    pub fn pending_extensions(&self, graph: &EntityGraph, nominal: DeclId) -> Vec<DeclId> {
        let mut extensions = graph.extensions(nominal);
        if let Some(last) = self.last_extension_included {
            // Skip up to and including the watermark.
            for ext in extensions.by_ref() {
                if ext == last {
                    break;
                }
            }
        }
        extensions.collect()
    }

    /// Index the current members of every extension past the watermark
    ///
    /// Returns the number of extensions newly included.
    pub fn update_from_extensions(&mut self, graph: &mut EntityGraph, nominal: DeclId) -> usize {
        let pending = self.pending_extensions(graph, nominal);
        for ext in &pending {
            let members: Vec<DeclId> = graph.members(*ext).collect();
            self.add_members(graph, members);
            self.last_extension_included = Some(*ext);
        }
        pending.len()
    }

    /// Whether `ext` is at or before the watermark
    pub fn includes_extension(&self, graph: &EntityGraph, nominal: DeclId, ext: DeclId) -> bool {
        let Some(last) = self.last_extension_included else {
            return false;
        };
        for candidate in graph.extensions(nominal) {
            if candidate == ext {
                return true;
            }
            if candidate == last {
                return false;
            }
        }
        false
    }

    /// Indexed declarations for `name`; never triggers population
    pub fn lookup(&self, name: &DeclName) -> &[DeclId] {
        self.lookup.get(name).map_or(&[], |found| found.as_slice())
    }

    /// Every indexed declaration, each once
    pub fn indexed(&self) -> impl Iterator<Item = DeclId> + '_ {
        // Each member sits in exactly one simple-name bucket.
        self.lookup
            .iter()
            .filter(|(name, _)| name.is_simple())
            .flat_map(|(_, decls)| decls.iter().copied())
    }

    /// Drop every entry and reset the indexed bits, watermark and scan state
    pub fn clear(&mut self, graph: &mut EntityGraph) {
        for decls in self.lookup.values() {
            for decl in decls {
                graph.remove_flags(*decl, DeclFlags::IN_LOOKUP_TABLE);
            }
        }
        self.lookup.clear();
        self.last_extension_included = None;
        self.populated = false;
        self.members_scanned = 0;
    }
}
