//! Scope frames and the scope stack used while binding a function body

use rustc_hash::FxHashMap;
use vsl_tree::{SymbolRef, TableId};

/// Bindings of one lexical level: name to sequence number in the owning table
///
/// A frame only names symbols; releasing it never releases a symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFrame {
    bindings: FxHashMap<String, usize>,
}

impl ScopeFrame {
    /// Create an empty frame
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number bound to `name` in this frame only
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.bindings.get(name).copied()
    }

    /// Bind `name` unless it is already bound here
    ///
    /// # Errors
    ///
    /// Returns the sequence number of the existing binding, which is kept.
    pub fn bind(&mut self, name: &str, sequence: usize) -> Result<(), usize> {
        match self.bindings.get(name) {
            Some(&existing) => Err(existing),
            None => {
                self.bindings.insert(name.to_owned(), sequence);
                Ok(())
            }
        }
    }

    /// Number of names bound in this frame
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound in this frame
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Frames visible while binding one function body
///
/// Lookup walks the pushed block frames innermost first, then the function's
/// own frame, and ends at the global frame, so every chain terminates at the
/// global table. Block frames are pushed and popped strictly in nesting order.
#[derive(Debug)]
pub struct ScopeStack<'g> {
    global: &'g ScopeFrame,
    table: TableId,
    base: ScopeFrame,
    blocks: Vec<ScopeFrame>,
}

impl<'g> ScopeStack<'g> {
    /// Create a stack over a function's frame, backed by the global frame
    #[must_use]
    pub fn new(global: &'g ScopeFrame, table: TableId, base: ScopeFrame) -> Self {
        Self {
            global,
            table,
            base,
            blocks: Vec::new(),
        }
    }

    /// Open a frame for a nested block
    pub fn push(&mut self) {
        self.blocks.push(ScopeFrame::new());
    }

    /// Close the innermost block frame and hand it back to the caller
    ///
    /// Returns `None` when no block frame is open; the function's own frame is
    /// never popped.
    pub fn pop(&mut self) -> Option<ScopeFrame> {
        self.blocks.pop()
    }

    /// Number of open block frames
    #[must_use]
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Frame new local declarations go into
    pub fn current_mut(&mut self) -> &mut ScopeFrame {
        self.blocks.last_mut().unwrap_or(&mut self.base)
    }

    /// Resolve `name` through the whole chain
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<SymbolRef> {
        self.blocks
            .iter()
            .rev()
            .chain(std::iter::once(&self.base))
            .find_map(|frame| frame.lookup(name))
            .map(|sequence| SymbolRef::new(self.table, sequence))
            .or_else(|| {
                self.global
                    .lookup(name)
                    .map(|sequence| SymbolRef::new(TableId::Global, sequence))
            })
    }

    /// Give back the function's own frame once binding is done
    #[must_use]
    pub fn into_base(self) -> ScopeFrame {
        debug_assert!(self.blocks.is_empty(), "block frames left open");
        self.base
    }
}
