//! Symbol tables for VSL
//!
//! This crate walks a syntax tree and builds the global symbol table, one
//! local table per function, and the string pool. Identifiers used inside
//! statements are bound to the symbol they refer to, and string literals are
//! replaced with pool references.
//!
//! # Architecture
//!
//! Building the tables takes two passes over the tree:
//! - **Collection**: registers every global variable, global array and
//!   function, along with each function's parameters
//! - **Binding**: walks each function body with an explicit scope stack,
//!   declaring locals, resolving uses innermost frame first and ending at the
//!   global table, and moving string literals into the pool
//!
//! Because collection finishes before any body is bound, a function may call
//! another function declared after it.
//!
//! Redeclarations in the same frame keep the first declaration and are
//! reported as [`ResolveError`] diagnostics. Names that cannot be resolved are
//! left unbound; [`SymbolTables::unresolved`] lists them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vsl_resolve::SymbolTables;
//!
//! let tables = SymbolTables::create(&mut root);
//! print!("{}", tables.dump());
//! print!("{}", root.dump_bound(&tables));
//! ```

mod binder;
mod collector;
mod display;
pub mod error;
pub mod pool;
pub mod scope;
pub mod symbol;

pub use error::ResolveError;
pub use pool::StringPool;
pub use scope::{ScopeFrame, ScopeStack};
pub use symbol::{Symbol, SymbolKind, SymbolTable, TeardownStats};

use binder::{Binder, Position};
use collector::{Collection, PendingFunction, Target, collect_globals};
use display::TableDump;
use tracing::{debug, info};
use vsl_tree::{Node, NodeKind, NodePath, SymbolRef, TableId};

/// Index of the body among a `FUNCTION` node's children
const FUNCTION_BODY: usize = 2;

/// An identifier in a statement that no symbol was bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// The identifier's name
    pub name: String,
    /// Location of the identifier node
    pub site: NodePath,
}

/// Global table, with function tables nested inside it, plus the string pool
#[derive(Debug)]
pub struct SymbolTables {
    global: SymbolTable,
    strings: StringPool,
    diagnostics: Vec<ResolveError>,
}

impl SymbolTables {
    /// Build the tables for `root`, binding identifiers and pooling strings in
    /// place
    pub fn create(root: &mut Node) -> Self {
        let mut diagnostics = Vec::new();
        let Collection {
            mut global,
            functions,
        } = collect_globals(root, &mut diagnostics);
        let mut strings = StringPool::new();

        for PendingFunction { item, target } in functions {
            let path = NodePath::root().child(item).child(FUNCTION_BODY);
            let Some(body) = root
                .children
                .get_mut(item)
                .and_then(|function| function.children.get_mut(FUNCTION_BODY))
            else {
                debug!(%path, "function without a body");
                continue;
            };

            match target {
                Target::Function(sequence) => {
                    let Some((global_frame, local)) = global.split_function(sequence) else {
                        continue;
                    };
                    bind_function(global_frame, local, body, &path, &mut strings, &mut diagnostics);
                }
                Target::Detached(mut local) => {
                    bind_function(
                        global.frame(),
                        &mut local,
                        body,
                        &path,
                        &mut strings,
                        &mut diagnostics,
                    );
                    unbind(body, local.id());
                    let stats = local.destroy();
                    debug!(%path, symbols = stats.symbols, "released detached function table");
                }
            }
        }

        info!(
            globals = global.len(),
            strings = strings.len(),
            diagnostics = diagnostics.len(),
            "symbol tables created"
        );

        Self {
            global,
            strings,
            diagnostics,
        }
    }

    /// The global table
    #[must_use]
    pub fn global(&self) -> &SymbolTable {
        &self.global
    }

    /// Table with the given identity
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&SymbolTable> {
        match id {
            TableId::Global => Some(&self.global),
            TableId::Function(sequence) => self.global.function_table(sequence),
        }
    }

    /// Local table of the function called `name`
    #[must_use]
    pub fn function_table(&self, name: &str) -> Option<&SymbolTable> {
        self.global.lookup(name)?.scope.as_deref()
    }

    /// Symbol a bound identifier refers to
    #[must_use]
    pub fn symbol(&self, symbol: SymbolRef) -> Option<&Symbol> {
        self.table(symbol.table)?.get(symbol.sequence)
    }

    /// The string pool
    #[must_use]
    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Pooled string referenced by a `STRING_LIST_REFERENCE` node
    #[must_use]
    pub fn string(&self, index: usize) -> Option<&str> {
        self.strings.get(index)
    }

    /// Redeclarations and malformed declarations met while building
    #[must_use]
    pub fn diagnostics(&self) -> &[ResolveError] {
        &self.diagnostics
    }

    /// Identifiers in statements of `root` that are not bound to a symbol
    #[must_use]
    pub fn unresolved(&self, root: &Node) -> Vec<Unresolved> {
        let mut found = Vec::new();
        self.collect_unresolved(root, &NodePath::root(), Position::Declaration, &mut found);
        found
    }

    fn collect_unresolved(
        &self,
        node: &Node,
        path: &NodePath,
        position: Position,
        found: &mut Vec<Unresolved>,
    ) {
        match &node.kind {
            NodeKind::Identifier(name) => {
                let bound = node.symbol.and_then(|symbol| self.symbol(symbol));
                if position == Position::Use && bound.is_none() {
                    found.push(Unresolved {
                        name: name.clone(),
                        site: path.clone(),
                    });
                }
            }
            kind => {
                let position = if *kind == NodeKind::Block {
                    Position::Declaration
                } else {
                    position.enter(kind)
                };
                for (index, child) in node.children.iter().enumerate() {
                    self.collect_unresolved(child, &path.child(index), position, found);
                }
            }
        }
    }

    /// Listing of every table, function tables nested under their symbol
    #[must_use]
    pub fn dump(&self) -> String {
        TableDump {
            table: &self.global,
            depth: 0,
        }
        .to_string()
    }

    /// Release every table and the pool
    pub fn destroy(self) -> TeardownStats {
        let Self {
            global, strings, ..
        } = self;
        let mut stats = global.destroy();
        stats.strings += strings.destroy();
        debug!(?stats, "symbol tables released");
        stats
    }
}

/// Bind one function body, lending the local table's frame to the scope stack
fn bind_function(
    global: &ScopeFrame,
    local: &mut SymbolTable,
    body: &mut Node,
    path: &NodePath,
    strings: &mut StringPool,
    diagnostics: &mut Vec<ResolveError>,
) {
    let stack = ScopeStack::new(global, local.id(), local.take_frame());
    let stack = Binder::new(stack, local, strings, diagnostics).bind_body(body, path);
    let base = stack.into_base();
    local.restore_frame(base);
}

/// Clear every reference into `table` below `node`
fn unbind(node: &mut Node, table: TableId) {
    if node.symbol.is_some_and(|symbol| symbol.table == table) {
        node.symbol = None;
    }
    for child in &mut node.children {
        unbind(child, table);
    }
}
