//! Syntax tree engine for VSL
//!
//! The parser hands this crate a fully-built tree. From there the tree is
//! owned strictly hierarchically: every node owns its children and its
//! kind-specific payload, nothing is shared and nothing is cyclic. That makes
//! recursive release and in-place rewriting safe.
//!
//! # Architecture
//!
//! - **Nodes** ([`Node`], [`NodeKind`]): tagged node kinds with the payload
//!   carried inside the variant that owns it
//! - **Printing** ([`Node::dump`], [`Node::graphviz`]): indented or Graphviz dumps
//! - **Simplification** ([`Node::simplify`]): constant folding followed by
//!   peephole strength reduction, bottom-up
//!
//! # Usage
//!
//! ```rust,ignore
//! use vsl_tree::{Node, Operator};
//!
//! let tree = Node::expression(Operator::Add, vec![Node::number(2), Node::number(3)]);
//! assert_eq!(tree.simplify(), Node::number(5));
//! ```

pub mod error;
pub mod node;
pub mod print;
pub mod simplify;

pub use error::TreeError;
pub use node::{Node, NodeKind, NodePath, Operator, RelationOp, SymbolRef, TableId};
pub use print::{DumpFormat, SymbolDescriber};
