//! Table dumps and bound-symbol descriptions

use crate::SymbolTables;
use crate::symbol::SymbolTable;
use std::fmt;
use vsl_tree::{SymbolDescriber, SymbolRef};

const INDENT: usize = 4;

/// Sequence-numbered listing of a table, nested tables one level deeper
pub(crate) struct TableDump<'a> {
    pub table: &'a SymbolTable,
    pub depth: usize,
}

impl fmt::Display for TableDump<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = self.depth * INDENT;
        for symbol in self.table.symbols() {
            writeln!(
                formatter,
                "{:indent$}{}: {}({})",
                "", symbol.sequence, symbol.kind, symbol.name
            )?;
            if let Some(scope) = &symbol.scope {
                TableDump {
                    table: scope,
                    depth: self.depth + 1,
                }
                .fmt(formatter)?;
            }
        }
        Ok(())
    }
}

impl SymbolDescriber for SymbolTables {
    fn describe(&self, symbol: SymbolRef) -> Option<String> {
        self.symbol(symbol)
            .map(|symbol| format!("{}({})", symbol.kind, symbol.sequence))
    }
}
