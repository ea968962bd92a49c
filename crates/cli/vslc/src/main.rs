//! VSL front end CLI
//!
//! Reads the parser's JSON syntax tree, simplifies it, builds the symbol
//! tables and prints the requested dumps.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use vsl_driver::{Compilation, DriverConfig};

mod logging;

#[derive(Parser)]
#[command(name = "vslc")]
#[command(about = "VSL syntax tree simplifier and symbol table builder", long_about = None)]
#[command(version)]
struct Cli {
    /// Syntax tree produced by the parser, as JSON
    tree: PathBuf,

    /// Skip constant folding and strength reduction
    #[arg(long)]
    no_simplify: bool,

    /// Dump trees as Graphviz (also enabled by GRAPHVIZ_OUTPUT)
    #[arg(long)]
    graphviz: bool,

    /// Print the simplified syntax tree
    #[arg(long)]
    print_tree: bool,

    /// Print the symbol tables, string list and bound syntax tree
    #[arg(long)]
    print_tables: bool,

    /// Print the syntax tree with bound symbols
    #[arg(long)]
    print_bound_tree: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> DriverConfig {
        let mut config = DriverConfig::from_env();
        config.graphviz |= self.graphviz;
        config.simplify &= !self.no_simplify;
        config.print_tree |= self.print_tree;
        config.print_tables |= self.print_tables;
        config.print_bound_tree |= self.print_bound_tree;
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut compilation = Compilation::load(&cli.tree, cli.config())?;
    compilation.run()?;
    print!("{}", compilation.output());

    for diagnostic in compilation.diagnostics() {
        eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
    }
    for unresolved in compilation.unresolved() {
        eprintln!(
            "{} '{}' at {} does not name any symbol",
            "warning:".yellow().bold(),
            unresolved.name,
            unresolved.site
        );
    }

    let report = compilation.destroy();
    tracing::debug!(
        nodes = report.nodes,
        symbols = report.symbols,
        tables = report.tables,
        strings = report.strings,
        "released"
    );

    Ok(())
}
