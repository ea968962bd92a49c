//! Per-function name binding
//!
//! Runs once per function after global collection, so a body may refer to any
//! function or global regardless of declaration order. The walk carries a
//! scope stack: blocks push a frame on entry and pop it on exit, identifiers
//! in declaration position become local variables, identifiers inside
//! statements are resolved through the chain, and string literals move into
//! the pool.

use crate::error::ResolveError;
use crate::pool::StringPool;
use crate::scope::ScopeStack;
use crate::symbol::{SymbolKind, SymbolTable};
use tracing::{trace, warn};
use vsl_tree::{Node, NodeKind, NodePath};

/// Whether identifiers met at the current position declare or use a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Outside any statement: identifiers declare locals
    Declaration,
    /// Inside a statement or expression: identifiers are use sites
    Use,
}

impl Position {
    /// Position of the children of `kind`, given the position of `kind` itself
    pub(crate) fn enter(self, kind: &NodeKind) -> Self {
        if kind.is_resolution_context() {
            Self::Use
        } else {
            self
        }
    }
}

pub(crate) struct Binder<'a> {
    stack: ScopeStack<'a>,
    table: &'a mut SymbolTable,
    pool: &'a mut StringPool,
    diagnostics: &'a mut Vec<ResolveError>,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(
        stack: ScopeStack<'a>,
        table: &'a mut SymbolTable,
        pool: &'a mut StringPool,
        diagnostics: &'a mut Vec<ResolveError>,
    ) -> Self {
        Self {
            stack,
            table,
            pool,
            diagnostics,
        }
    }

    /// Bind a function body located at `path`, returning the scope stack
    pub(crate) fn bind_body(mut self, body: &mut Node, path: &NodePath) -> ScopeStack<'a> {
        self.bind(body, path, Position::Declaration);
        self.stack
    }

    fn bind(&mut self, node: &mut Node, path: &NodePath, position: Position) {
        match node.kind {
            NodeKind::Block => {
                self.stack.push();
                self.bind_children(node, path, Position::Declaration);
                if let Some(frame) = self.stack.pop() {
                    trace!(
                        %path,
                        bindings = frame.len(),
                        depth = self.stack.depth(),
                        "released block frame"
                    );
                }
            }
            NodeKind::String(ref mut text) => {
                let index = self.pool.add(std::mem::take(text));
                node.kind = NodeKind::StringRef(index);
                trace!(%path, index, "pooled string literal");
            }
            NodeKind::Identifier(ref name) => match position {
                Position::Declaration => self.declare(name, path),
                Position::Use => {
                    let resolved = self.stack.resolve(name);
                    if resolved.is_none() {
                        trace!(%path, name = name.as_str(), "left unresolved");
                    }
                    node.symbol = resolved;
                }
            },
            ref kind => {
                let position = position.enter(kind);
                self.bind_children(node, path, position);
            }
        }
    }

    fn bind_children(&mut self, node: &mut Node, path: &NodePath, position: Position) {
        for (index, child) in node.children.iter_mut().enumerate() {
            self.bind(child, &path.child(index), position);
        }
    }

    fn declare(&mut self, name: &str, path: &NodePath) {
        let table = self.table.id();
        let sequence = self.table.next_sequence();
        match self.stack.current_mut().bind(name, sequence) {
            Ok(()) => {
                self.table
                    .push(name, SymbolKind::LocalVar, path.clone(), None);
                trace!(%table, name, sequence, "declared local");
            }
            Err(existing) => {
                let redeclaration = ResolveError::Redeclaration {
                    name: name.to_owned(),
                    kind: SymbolKind::LocalVar,
                    table,
                    existing,
                    site: path.clone(),
                };
                warn!("{redeclaration}");
                self.diagnostics.push(redeclaration);
            }
        }
    }
}
