//! Symbols and the tables that own them

use crate::error::ResolveError;
use crate::scope::ScopeFrame;
use std::fmt;
use vsl_tree::{NodePath, TableId};

/// What a symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Scalar global variable
    GlobalVar,
    /// Global array
    GlobalArray,
    /// Function, owns a local table
    Function,
    /// Function parameter
    Parameter,
    /// Variable declared in a function body
    LocalVar,
}

impl SymbolKind {
    /// Name used in table dumps
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlobalVar => "GLOBAL_VAR",
            Self::GlobalArray => "GLOBAL_ARRAY",
            Self::Function => "FUNCTION",
            Self::Parameter => "PARAMETER",
            Self::LocalVar => "LOCAL_VAR",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A declared name
#[derive(Debug)]
pub struct Symbol {
    /// Declared name
    pub name: String,
    /// What the name refers to
    pub kind: SymbolKind,
    /// Insertion order within the owning table, starting at 0
    pub sequence: usize,
    /// Table that owns this symbol
    pub table: TableId,
    /// Local table, for functions only
    pub scope: Option<Box<SymbolTable>>,
    /// Declaring identifier node
    pub node: NodePath,
}

/// Counts of what a teardown released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownStats {
    /// Symbols released
    pub symbols: usize,
    /// Tables released
    pub tables: usize,
    /// Scope frames released
    pub frames: usize,
    /// Pooled strings released
    pub strings: usize,
}

impl std::ops::AddAssign for TeardownStats {
    fn add_assign(&mut self, other: Self) {
        self.symbols += other.symbols;
        self.tables += other.tables;
        self.frames += other.frames;
        self.strings += other.strings;
    }
}

/// Owned symbols in sequence order, plus the table's own scope frame
///
/// For the global table the frame holds every global name; for a function
/// table it holds the parameters. Sequence numbers are handed out in
/// insertion order and never reused, including after a rejected insertion.
#[derive(Debug)]
pub struct SymbolTable {
    id: TableId,
    symbols: Vec<Symbol>,
    frame: ScopeFrame,
}

impl SymbolTable {
    /// Create an empty table
    #[must_use]
    pub fn new(id: TableId) -> Self {
        Self {
            id,
            symbols: Vec::new(),
            frame: ScopeFrame::new(),
        }
    }

    /// Identity of this table
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Sequence number the next accepted symbol will receive
    #[must_use]
    pub fn next_sequence(&self) -> usize {
        self.symbols.len()
    }

    /// Insert a symbol into this table's own frame
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Redeclaration` if the frame already binds
    /// `name`; the table is left untouched.
    pub fn insert(
        &mut self,
        name: &str,
        kind: SymbolKind,
        node: NodePath,
    ) -> Result<usize, ResolveError> {
        self.insert_with_scope(name, kind, node, None)
    }

    /// Insert a function symbol that takes ownership of its local table
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Redeclaration` on a name collision; the local
    /// table is released with the rejected symbol.
    pub fn insert_function(
        &mut self,
        name: &str,
        node: NodePath,
        scope: Self,
    ) -> Result<usize, ResolveError> {
        self.insert_with_scope(name, SymbolKind::Function, node, Some(Box::new(scope)))
    }

    fn insert_with_scope(
        &mut self,
        name: &str,
        kind: SymbolKind,
        node: NodePath,
        scope: Option<Box<Self>>,
    ) -> Result<usize, ResolveError> {
        let sequence = self.next_sequence();
        if let Err(existing) = self.frame.bind(name, sequence) {
            return Err(ResolveError::Redeclaration {
                name: name.to_owned(),
                kind,
                table: self.id,
                existing,
                site: node,
            });
        }
        Ok(self.push(name, kind, node, scope))
    }

    /// Append a symbol whose name is bound in a frame outside the table
    pub(crate) fn push(
        &mut self,
        name: &str,
        kind: SymbolKind,
        node: NodePath,
        scope: Option<Box<Self>>,
    ) -> usize {
        let sequence = self.next_sequence();
        self.symbols.push(Symbol {
            name: name.to_owned(),
            kind,
            sequence,
            table: self.id,
            scope,
            node,
        });
        sequence
    }

    /// Symbol with the given sequence number
    #[must_use]
    pub fn get(&self, sequence: usize) -> Option<&Symbol> {
        self.symbols.get(sequence)
    }

    /// Symbol bound to `name` in this table's own frame
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frame.lookup(name).and_then(|sequence| self.get(sequence))
    }

    /// All symbols in sequence order
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the table holds no symbols
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Local table of the function symbol `sequence`
    #[must_use]
    pub fn function_table(&self, sequence: usize) -> Option<&Self> {
        self.get(sequence)?.scope.as_deref()
    }

    /// Splits out the global frame and a function's local table for binding
    pub(crate) fn split_function(&mut self, sequence: usize) -> Option<(&ScopeFrame, &mut Self)> {
        let Self { symbols, frame, .. } = self;
        let local = symbols.get_mut(sequence)?.scope.as_deref_mut()?;
        Some((&*frame, local))
    }

    /// Names bound in the table's own frame
    pub(crate) fn frame(&self) -> &ScopeFrame {
        &self.frame
    }

    /// Move the table's frame out, leaving an empty one
    pub(crate) fn take_frame(&mut self) -> ScopeFrame {
        std::mem::take(&mut self.frame)
    }

    /// Put a frame taken with [`SymbolTable::take_frame`] back
    pub(crate) fn restore_frame(&mut self, frame: ScopeFrame) {
        self.frame = frame;
    }

    /// Release every symbol, descending into function tables first, then the
    /// frame, the symbol storage and the table itself
    pub fn destroy(self) -> TeardownStats {
        let Self { symbols, frame, .. } = self;
        let mut stats = TeardownStats::default();

        for symbol in symbols {
            let Symbol { scope, .. } = symbol;
            if let Some(scope) = scope {
                stats += scope.destroy();
            }
            stats.symbols += 1;
        }

        drop(frame);
        stats.frames += 1;
        stats.tables += 1;
        stats
    }
}
