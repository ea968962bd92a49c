//! Driver configuration

use std::ffi::OsString;
use vsl_tree::DumpFormat;
use vsl_tree::print::GRAPHVIZ_ENV;

/// Which phases run and which dumps are produced
///
/// Built from [`Default`], then overlaid with the environment, then with
/// command-line flags by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "each flag toggles one independent phase or dump"
)]
pub struct DriverConfig {
    /// Dump trees as Graphviz instead of indented text
    pub graphviz: bool,
    /// Run constant folding and strength reduction before building tables
    pub simplify: bool,
    /// Print the tree after simplification
    pub print_tree: bool,
    /// Print the symbol tables and the string pool
    pub print_tables: bool,
    /// Print the tree with identifiers annotated by their symbols
    pub print_bound_tree: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            graphviz: false,
            simplify: true,
            print_tree: false,
            print_tables: false,
            print_bound_tree: false,
        }
    }
}

impl DriverConfig {
    /// Defaults overlaid with the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var_os(name))
    }

    /// Overlay settings read through `var`
    ///
    /// `GRAPHVIZ_OUTPUT` switches dumps to Graphviz when it is set at all,
    /// whatever its value.
    #[must_use]
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<OsString>) -> Self {
        if var(GRAPHVIZ_ENV).is_some() {
            self.graphviz = true;
        }
        self
    }

    /// Format used for tree dumps
    #[must_use]
    pub fn dump_format(&self) -> DumpFormat {
        if self.graphviz {
            DumpFormat::Graphviz
        } else {
            DumpFormat::Indented
        }
    }
}
