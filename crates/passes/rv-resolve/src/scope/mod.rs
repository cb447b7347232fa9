//! Source-range scope tree
//!
//! One tree per source file mirrors lexical nesting. Children are contained
//! in their parent and ordered without overlap, so the innermost scope of a
//! location is found by binary search at each level.

mod builder;

pub use builder::ScopeBuilder;


use la_arena::{Arena, Idx};
use rv_entity::{ContextId, DeclId, EntityGraph};
use rv_span::{SourceLoc, Span};
use smallvec::SmallVec;

use crate::error::ScopeTreeError;

/// Unique identifier for a scope node
pub type ScopeId = Idx<ScopeNode>;

/// Kind of a scope node, carrying its declaration or context where it has one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Root of a file's tree
    SourceFile,
    /// A type declaration, from its name to its closing brace
    TypeDecl(DeclId),
    /// Body of a nominal type or extension
    TypeOrExtensionBody(DeclId),
    /// Generic parameter list of a type, extension or function
    GenericParams(DeclId),
    /// A function, from its name to the end of its body
    FunctionDecl(DeclId),
    /// Parameter list of a function
    FunctionParams(DeclId),
    /// Body of a function, initializer or accessor
    FunctionBody(DeclId),
    /// Closure expression
    Closure(ContextId),
    /// Initial value of a pattern binding
    PatternInitializer(ContextId),
    /// Default value of a parameter
    DefaultArgument(ContextId),
    /// Top-level statements of a main file
    TopLevelCode(ContextId),
    /// Braced block
    BraceStmt,
    /// Remainder of a block after a local binding
    AfterPatternBinding,
    /// Condition of `if`/`guard`/`while`
    ConditionalClause,
    /// Loop variables of `for`-`in`
    ForEachPattern,
    /// `catch` clause
    CatchStmt,
    /// `case` of a `switch`
    CaseStmt,
}

impl ScopeKind {
    /// Name used in dumps
    pub fn label(&self) -> &'static str {
        match self {
            Self::SourceFile => "SourceFile",
            Self::TypeDecl(_) => "TypeDecl",
            Self::TypeOrExtensionBody(_) => "TypeOrExtensionBody",
            Self::GenericParams(_) => "GenericParams",
            Self::FunctionDecl(_) => "FunctionDecl",
            Self::FunctionParams(_) => "FunctionParams",
            Self::FunctionBody(_) => "FunctionBody",
            Self::Closure(_) => "Closure",
            Self::PatternInitializer(_) => "PatternInitializer",
            Self::DefaultArgument(_) => "DefaultArgument",
            Self::TopLevelCode(_) => "TopLevelCode",
            Self::BraceStmt => "BraceStmt",
            Self::AfterPatternBinding => "AfterPatternBinding",
            Self::ConditionalClause => "ConditionalClause",
            Self::ForEachPattern => "ForEachPattern",
            Self::CatchStmt => "CatchStmt",
            Self::CaseStmt => "CaseStmt",
        }
    }

    /// Declaration the scope belongs to, if any
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            Self::TypeDecl(decl)
            | Self::TypeOrExtensionBody(decl)
            | Self::GenericParams(decl)
            | Self::FunctionDecl(decl)
            | Self::FunctionParams(decl)
            | Self::FunctionBody(decl) => Some(*decl),
            _ => None,
        }
    }

    /// Context entered by this scope, if lookup treats it as one
    pub fn context(&self, graph: &EntityGraph) -> Option<ContextId> {
        match self {
            Self::TypeOrExtensionBody(decl) | Self::FunctionBody(decl) => {
                graph.decl(*decl).as_context
            }
            Self::Closure(context)
            | Self::PatternInitializer(context)
            | Self::DefaultArgument(context)
            | Self::TopLevelCode(context) => Some(*context),
            _ => None,
        }
    }
}

/// A node of the scope tree
#[derive(Debug, Clone)]
pub struct ScopeNode {
    /// What introduced the scope
    pub kind: ScopeKind,
    /// Source covered by the scope itself
    pub range: Span,
    /// Enclosing scope; `None` for the root
    pub parent: Option<ScopeId>,
    /// Ordered, non-overlapping, contained in `range`
    pub children: Vec<ScopeId>,
    /// Local bindings introduced here, in source order
    pub bindings: SmallVec<[DeclId; 4]>,
    /// Cached cover of `range` and every descendant
    extent: Span,
}

impl ScopeNode {
    fn new(kind: ScopeKind, range: Span, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            range,
            parent,
            children: Vec::new(),
            bindings: SmallVec::new(),
            extent: range,
        }
    }

    /// Cover of the node's range and all descendants
    pub fn extent(&self) -> Span {
        self.extent
    }
}

/// Scope tree of one source file
#[derive(Debug, Clone)]
pub struct ScopeTree {
    file: ContextId,
    nodes: Arena<ScopeNode>,
    root: ScopeId,
}

impl ScopeTree {
    /// Create a tree with a `SourceFile` root covering `range`
    pub fn new(file: ContextId, range: Span) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(ScopeNode::new(ScopeKind::SourceFile, range, None));
        Self { file, nodes, root }
    }

    /// File the tree describes
    pub fn file(&self) -> ContextId {
        self.file
    }

    /// Source file node
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Node by index
    pub fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id]
    }

    /// Builder positioned at the root
    pub fn builder(&mut self) -> ScopeBuilder<'_> {
        let root = self.root;
        ScopeBuilder::new(self, root)
    }

    /// `id` and its ancestors, innermost first
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), |node| self.nodes[*node].parent)
    }

    /// Innermost scope containing `loc`; the root if none does
    pub fn find_innermost(&self, loc: SourceLoc) -> ScopeId {
        let mut current = self.root;
        loop {
            let children = &self.nodes[current].children;
            let idx = children.partition_point(|child| self.nodes[*child].extent.end <= loc.offset());
            match children.get(idx) {
                Some(child) if self.nodes[*child].extent.contains_loc(loc) => current = *child,
                _ => return current,
            }
        }
    }

    /// Check a prospective child of `parent` against the parent and the last sibling
    fn check_child(
        &self,
        parent: ScopeId,
        child: ScopeId,
        previous: Option<ScopeId>,
    ) -> Result<(), ScopeTreeError> {
        let parent_range = self.nodes[parent].range;
        let child_range = self.nodes[child].range;
        if !parent_range.contains(child_range) {
            return Err(ScopeTreeError::ChildNotContained {
                parent,
                parent_range,
                child,
                child_range,
            });
        }
        if let Some(previous) = previous {
            let previous_range = self.nodes[previous].range;
            if !previous_range.precedes(child_range) {
                return Err(ScopeTreeError::ChildOverlapsSibling {
                    previous,
                    previous_range,
                    child,
                    child_range,
                });
            }
        }
        Ok(())
    }

    /// Allocate a child of `parent` and attach it
    ///
    /// Debug builds verify the nesting invariant and abort with a dump of the
    /// offending nodes when it is broken.
    fn attach_child(&mut self, parent: ScopeId, kind: ScopeKind, range: Span) -> ScopeId {
        let child = self.nodes.alloc(ScopeNode::new(kind, range, Some(parent)));

        #[cfg(debug_assertions)]
        {
            let previous = self.nodes[parent].children.last().copied();
            if let Err(error) = self.check_child(parent, child, previous) {
                panic!(
                    "{error}\nchild: {:#?}\nprevious: {:#?}\nparent: {:#?}",
                    self.nodes[child],
                    previous.map(|previous| &self.nodes[previous]),
                    self.nodes[parent],
                );
            }
        }

        self.nodes[parent].children.push(child);
        child
    }

    /// Recompute the cached extent of `node` from its own range and children
    fn recompute_extent(&mut self, node: ScopeId) {
        let extent = self.nodes[node]
            .children
            .iter()
            .fold(self.nodes[node].range, |extent, child| {
                extent.cover(self.nodes[*child].extent)
            });
        self.nodes[node].extent = extent;
    }

    /// Check the nesting invariant over the whole tree
    ///
    /// # Errors
    ///
    /// Returns the first violation found in depth-first order.
    pub fn verify(&self) -> Result<(), ScopeTreeError> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let mut previous = None;
            for child in &self.nodes[node].children {
                self.check_child(node, *child, previous)?;
                previous = Some(*child);
            }
            stack.extend(self.nodes[node].children.iter().rev().copied());
        }
        Ok(())
    }

    /// Replace the subtree under `node` after its text was reparsed
    ///
    /// `new_range` must start where the old range started. Ancestors grow or
    /// shrink by the length delta, every later node moves by it, and `build`
    /// repopulates the node's children through a builder rooted at `node`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeTreeError::RebuildMovedStart`] for a moved start and
    /// [`ScopeTreeError::UnbalancedBuilder`] if `build` leaves scopes open.
    pub fn rebuild_subtree(
        &mut self,
        node: ScopeId,
        new_range: Span,
        build: impl FnOnce(&mut ScopeBuilder<'_>),
    ) -> Result<(), ScopeTreeError> {
        let old_range = self.nodes[node].range;
        if new_range.start != old_range.start {
            return Err(ScopeTreeError::RebuildMovedStart {
                node,
                old_range,
                new_range,
            });
        }
        let delta = i64::from(new_range.end) - i64::from(old_range.end);
        tracing::debug!(?node, %old_range, %new_range, "rebuilding scope subtree");

        let ancestors: Vec<ScopeId> = self.ancestors(node).skip(1).collect();
        let detached = std::mem::take(&mut self.nodes[node].children);
        for child in detached {
            self.nodes[child].parent = None;
        }
        self.nodes[node].bindings.clear();

        if delta != 0 {
            let mut stack = vec![self.root];
            while let Some(current) = stack.pop() {
                if current == node {
                    continue;
                }
                let entry = &mut self.nodes[current];
                if ancestors.contains(&current) {
                    entry.range = entry.range.resized(delta);
                } else if entry.range.start >= old_range.end {
                    entry.range = entry.range.shifted(delta);
                    entry.extent = entry.extent.shifted(delta);
                }
                stack.extend(entry.children.iter().copied());
            }
        }

        self.nodes[node].range = new_range;
        self.nodes[node].extent = new_range;

        let mut builder = ScopeBuilder::new(self, node);
        build(&mut builder);
        builder.finish()?;

        for ancestor in ancestors {
            self.recompute_extent(ancestor);
        }
        Ok(())
    }

    /// Indented rendering of the tree, one node per line
    pub fn dump(&self, graph: &EntityGraph) -> String {
        let mut lines = Vec::new();
        let mut stack = vec![(self.root, 0_usize)];
        while let Some((node, depth)) = stack.pop() {
            let entry = &self.nodes[node];
            let mut line = format!("{:indent$}{}", "", entry.kind.label(), indent = depth * 2);
            if let Some(decl) = entry.kind.decl() {
                line.push(' ');
                line.push_str(graph.display_name(decl));
            }
            line.push_str(&format!(" {}", entry.range));
            if !entry.bindings.is_empty() {
                let names: Vec<&str> = entry
                    .bindings
                    .iter()
                    .map(|binding| graph.display_name(*binding))
                    .collect();
                line.push_str(&format!(" [{}]", names.join(", ")));
            }
            lines.push(line);
            stack.extend(entry.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
