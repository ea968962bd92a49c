//! Tree dumps

use crate::node::{Node, SymbolRef};
use std::fmt;

/// Environment variable that switches dumps to Graphviz output
pub const GRAPHVIZ_ENV: &str = "GRAPHVIZ_OUTPUT";

/// Supplies a printable description of a bound symbol
///
/// Implemented by the symbol tables so that a bound tree can be dumped without
/// this crate knowing how tables are laid out.
pub trait SymbolDescriber {
    /// Describe `symbol`, or `None` if the handle does not resolve
    fn describe(&self, symbol: SymbolRef) -> Option<String>;
}

/// Output format for tree dumps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpFormat {
    /// One line per node, depth encoded as indentation
    #[default]
    Indented,
    /// Graphviz `digraph`
    Graphviz,
}

impl Node {
    /// Indented dump of the subtree
    #[must_use]
    pub fn dump(&self) -> String {
        Indented {
            node: self,
            symbols: None,
        }
        .to_string()
    }

    /// Indented dump that also shows what each bound identifier refers to
    #[must_use]
    pub fn dump_bound(&self, symbols: &dyn SymbolDescriber) -> String {
        Indented {
            node: self,
            symbols: Some(symbols),
        }
        .to_string()
    }

    /// Graphviz dump of the subtree
    #[must_use]
    pub fn graphviz(&self) -> String {
        Graphviz { node: self }.to_string()
    }

    /// Dump in the requested format
    #[must_use]
    pub fn render(&self, format: DumpFormat, symbols: Option<&dyn SymbolDescriber>) -> String {
        match (format, symbols) {
            (DumpFormat::Graphviz, _) => self.graphviz(),
            (DumpFormat::Indented, Some(symbols)) => self.dump_bound(symbols),
            (DumpFormat::Indented, None) => self.dump(),
        }
    }
}

struct Indented<'a> {
    node: &'a Node,
    symbols: Option<&'a dyn SymbolDescriber>,
}

impl Indented<'_> {
    fn write_node(&self, node: &Node, depth: usize, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:depth$}{}", "", node.kind)?;

        let description = self
            .symbols
            .zip(node.symbol)
            .and_then(|(symbols, symbol)| symbols.describe(symbol));
        if let Some(description) = description {
            write!(formatter, " -> {description}")?;
        }
        writeln!(formatter)?;

        for child in &node.children {
            self.write_node(child, depth + 1, formatter)?;
        }
        Ok(())
    }
}

impl fmt::Display for Indented<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.node, 0, formatter)
    }
}

struct Graphviz<'a> {
    node: &'a Node,
}

impl fmt::Display for Graphviz<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "digraph {{")?;
        let mut next_id = 0;
        write_graph_node(self.node, &mut next_id, formatter)?;
        writeln!(formatter, "}}")
    }
}

/// Emits `node` and its edges, returning the id it was given
fn write_graph_node(
    node: &Node,
    next_id: &mut usize,
    formatter: &mut fmt::Formatter<'_>,
) -> Result<usize, fmt::Error> {
    let id = *next_id;
    *next_id += 1;

    let label = node.kind.to_string().replace('\\', "\\\\").replace('"', "\\\"");
    writeln!(formatter, "  node{id} [label=\"{label}\"];")?;

    for child in &node.children {
        let child_id = write_graph_node(child, next_id, formatter)?;
        writeln!(formatter, "  node{id} -> node{child_id};")?;
    }
    Ok(id)
}
