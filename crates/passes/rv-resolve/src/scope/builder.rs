//! Builder for scope trees

use rv_entity::DeclId;
use rv_span::Span;

use super::{ScopeId, ScopeKind, ScopeTree};
use crate::error::ScopeTreeError;

/// Builds scopes in source order, tracking the currently open scope
///
/// Scopes must be entered in increasing source order; debug builds abort on
/// a child that escapes its parent or overlaps its previous sibling.
pub struct ScopeBuilder<'tree> {
    tree: &'tree mut ScopeTree,
    stack: Vec<ScopeId>,
    extra_exits: usize,
}

impl<'tree> ScopeBuilder<'tree> {
    pub(super) fn new(tree: &'tree mut ScopeTree, root: ScopeId) -> Self {
        Self {
            tree,
            stack: vec![root],
            extra_exits: 0,
        }
    }

    /// Enter a new child scope of the current scope
    pub fn enter(&mut self, kind: ScopeKind, range: Span) -> ScopeId {
        let parent = self.current();
        let child = self.tree.attach_child(parent, kind, range);
        self.stack.push(child);
        child
    }

    /// Exit to the parent scope
    pub fn exit(&mut self) {
        if self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.tree.recompute_extent(node);
            }
        } else {
            self.extra_exits += 1;
        }
    }

    /// Get current scope ID
    pub fn current(&self) -> ScopeId {
        // The stack always holds the builder's root.
        self.stack.last().copied().unwrap_or(self.tree.root)
    }

    /// Add a local binding to the current scope
    pub fn bind(&mut self, decl: DeclId) {
        let current = self.current();
        self.tree.nodes[current].bindings.push(decl);
    }

    /// Enter a scope, bind `bindings` in it and exit again
    pub fn leaf(&mut self, kind: ScopeKind, range: Span, bindings: &[DeclId]) -> ScopeId {
        let node = self.enter(kind, range);
        for binding in bindings {
            self.bind(*binding);
        }
        self.exit();
        node
    }

    /// Close the builder
    ///
    /// # Errors
    ///
    /// Returns [`ScopeTreeError::UnbalancedBuilder`] if scopes are left open
    /// or more scopes were exited than entered.
    pub fn finish(self) -> Result<(), ScopeTreeError> {
        let open = self.stack.len() - 1;
        if let Some(root) = self.stack.first() {
            self.tree.recompute_extent(*root);
        }
        if open != 0 || self.extra_exits != 0 {
            return Err(ScopeTreeError::UnbalancedBuilder { open });
        }
        Ok(())
    }
}
