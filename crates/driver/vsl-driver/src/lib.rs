//! Compilation driver for the VSL front end
//!
//! This crate owns everything one compilation works on: the syntax tree
//! handed over by the parser, the symbol tables and string pool built from
//! it, and the configuration deciding which phases run and what gets printed.
//! Phases run in a fixed order: load, simplify, create tables, print, destroy.

pub mod config;

pub use config::DriverConfig;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};
use vsl_resolve::{ResolveError, SymbolTables, Unresolved};
use vsl_tree::{Node, SymbolDescriber};

/// What tearing down a compilation released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Tree nodes
    pub nodes: usize,
    /// Symbols across all tables
    pub symbols: usize,
    /// Symbol tables
    pub tables: usize,
    /// Scope frames owned by tables
    pub frames: usize,
    /// Pooled strings
    pub strings: usize,
}

/// Compilation context: the tree, its tables and the configuration
#[derive(Debug)]
pub struct Compilation {
    root: Node,
    tables: Option<SymbolTables>,
    config: DriverConfig,
}

impl Compilation {
    /// Create a context around an already-built tree
    #[must_use]
    pub fn new(root: Node, config: DriverConfig) -> Self {
        Self {
            root,
            tables: None,
            config,
        }
    }

    /// Build a context from the parser's JSON tree
    pub fn from_json(json: &str, config: DriverConfig) -> Result<Self> {
        let root: Node = serde_json::from_str(json).context("Failed to parse syntax tree JSON")?;
        root.validate().context("Syntax tree is malformed")?;
        debug!(nodes = root.count(), "loaded syntax tree");
        Ok(Self::new(root, config))
    }

    /// Read a JSON tree from `path`
    pub fn load(path: impl AsRef<Path>, config: DriverConfig) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json, config).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// The syntax tree
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Symbol tables, once created
    #[must_use]
    pub fn tables(&self) -> Option<&SymbolTables> {
        self.tables.as_ref()
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Fold constants and reduce strength in the whole tree
    ///
    /// Must run before the tables are created, since binding records node
    /// locations.
    pub fn simplify(&mut self) -> Result<()> {
        anyhow::ensure!(
            self.tables.is_none(),
            "Cannot simplify a tree whose symbol tables already exist"
        );
        let before = self.root.count();
        let root = std::mem::replace(&mut self.root, Node::list(Vec::new()));
        self.root = root.simplify();
        info!(before, after = self.root.count(), "simplified syntax tree");
        Ok(())
    }

    /// Build the symbol tables, binding the tree in place
    ///
    /// Calling this again returns the tables built the first time.
    pub fn create_tables(&mut self) -> &SymbolTables {
        self.tables
            .get_or_insert_with(|| SymbolTables::create(&mut self.root))
    }

    /// Run the configured phases: simplification, then table creation
    pub fn run(&mut self) -> Result<()> {
        if self.config.simplify {
            self.simplify()?;
        }
        let tables = self.create_tables();
        for diagnostic in tables.diagnostics() {
            warn!(site = %diagnostic.site(), "{diagnostic}");
        }
        Ok(())
    }

    /// Diagnostics produced while building the tables
    #[must_use]
    pub fn diagnostics(&self) -> &[ResolveError] {
        self.tables
            .as_ref()
            .map(SymbolTables::diagnostics)
            .unwrap_or_default()
    }

    /// Identifiers in statements left without a symbol
    #[must_use]
    pub fn unresolved(&self) -> Vec<Unresolved> {
        self.tables
            .as_ref()
            .map(|tables| tables.unresolved(&self.root))
            .unwrap_or_default()
    }

    /// Dump of the tree in the configured format, annotated with symbols once
    /// tables exist
    #[must_use]
    pub fn tree_dump(&self) -> String {
        let symbols = self.tables.as_ref().map(|tables| tables as &dyn SymbolDescriber);
        self.root.render(self.config.dump_format(), symbols)
    }

    /// Tables, string pool and bound tree, in that order
    ///
    /// Empty until the tables have been created.
    #[must_use]
    pub fn report(&self) -> String {
        let Some(tables) = &self.tables else {
            return String::new();
        };

        let mut report = tables.dump();
        report.push_str("\n== STRING LIST ==\n");
        report.push_str(&tables.strings().to_string());
        report.push_str("\n== BOUND SYNTAX TREE ==\n");
        report.push_str(&self.tree_dump());
        report
    }

    /// Everything the configuration asks to print
    #[must_use]
    pub fn output(&self) -> String {
        let mut output = String::new();
        if self.config.print_tree {
            output.push_str(&self.root.render(self.config.dump_format(), None));
        }
        if self.config.print_tables {
            output.push_str(&self.report());
        } else if self.config.print_bound_tree {
            output.push_str(&self.tree_dump());
        }
        output
    }

    /// Release the tree, the tables and the pool
    pub fn destroy(self) -> TeardownReport {
        let Self { root, tables, .. } = self;
        let stats = tables.map(SymbolTables::destroy).unwrap_or_default();
        let report = TeardownReport {
            nodes: root.destroy(),
            symbols: stats.symbols,
            tables: stats.tables,
            frames: stats.frames,
            strings: stats.strings,
        };
        debug!(?report, "compilation released");
        report
    }
}
