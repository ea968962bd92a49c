//! Errors reported while building symbol tables

use crate::symbol::SymbolKind;
use vsl_tree::{NodePath, TableId};

/// Diagnostics produced by symbol collection and binding
///
/// None of these stop the pass; they are collected and handed to the
/// consumer together with the tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Name is declared twice in the same frame; the first declaration wins
    #[error("{kind} '{name}' at {site} is already declared in the {table} table as symbol {existing}")]
    Redeclaration {
        /// The redeclared name
        name: String,
        /// Kind the rejected declaration would have had
        kind: SymbolKind,
        /// Table the insertion targeted
        table: TableId,
        /// Sequence number of the symbol that keeps the name
        existing: usize,
        /// Declaring node of the rejected declaration
        site: NodePath,
    },

    /// A declaration does not have the shape the collector expects
    #[error("malformed {what} at {site}")]
    MalformedDeclaration {
        /// Description of the expected construct
        what: &'static str,
        /// Location of the offending node
        site: NodePath,
    },
}

impl ResolveError {
    /// Returns the node the diagnostic points at
    #[must_use]
    pub fn site(&self) -> &NodePath {
        match self {
            Self::Redeclaration { site, .. } | Self::MalformedDeclaration { site, .. } => site,
        }
    }
}
