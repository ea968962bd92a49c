//! Tree nodes and their construction

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the symbol table a [`SymbolRef`] points into
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum TableId {
    /// The global table
    Global,
    /// The local table of a function, keyed by the function symbol's sequence
    /// number in the global table
    Function(usize),
}

impl fmt::Display for TableId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(formatter, "global"),
            Self::Function(sequence) => write!(formatter, "function#{sequence}"),
        }
    }
}

/// Non-owning handle from an identifier node to the symbol it was bound to
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Table owning the symbol
    pub table: TableId,
    /// Sequence number of the symbol within that table
    pub sequence: usize,
}

impl SymbolRef {
    /// Creates a new symbol handle
    #[must_use]
    pub const fn new(table: TableId, sequence: usize) -> Self {
        Self { table, sequence }
    }
}

/// Arithmetic operators carried by `EXPRESSION` nodes
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// `+`
    #[serde(rename = "+")]
    Add,
    /// `-`, also unary negation when the node has a single child
    #[serde(rename = "-")]
    Sub,
    /// `*`
    #[serde(rename = "*")]
    Mul,
    /// `/`
    #[serde(rename = "/")]
    Div,
    /// `%`
    #[serde(rename = "%")]
    Rem,
    /// `<<`
    #[serde(rename = "<<")]
    Shl,
    /// `>>`
    #[serde(rename = ">>")]
    Shr,
    /// `&`
    #[serde(rename = "&")]
    BitAnd,
    /// `|`
    #[serde(rename = "|")]
    BitOr,
    /// `^`
    #[serde(rename = "^")]
    BitXor,
}

impl Operator {
    /// Source spelling of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Comparison operators carried by `RELATION` nodes
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum RelationOp {
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
}

impl RelationOp {
    /// Source spelling of the comparison
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for RelationOp {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Node kinds, with the payload owned by the kinds that carry one
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Variable-arity sequence built by appending
    List,
    /// Top-level `var` declaration
    GlobalDeclaration,
    /// `name[index]`, also the declarator of a global array
    ArrayIndexing,
    /// Local `var` declaration
    VariableDeclaration,
    /// Function definition: name, parameter list, body block
    Function,
    /// Braced block, opens a scope
    Block,
    /// `target = value`
    AssignmentStatement,
    /// `return value`
    ReturnStatement,
    /// `print items`
    PrintStatement,
    /// `if relation then statement [else statement]`
    IfStatement,
    /// `while relation do statement`
    WhileStatement,
    /// `name(arguments)`
    FunctionCall,
    /// `break`
    BreakStatement,
    /// Comparison of two operands
    Relation(RelationOp),
    /// Arithmetic with one (unary) or more operands
    Expression(Operator),
    /// Identifier, owns its name
    #[serde(rename = "IDENTIFIER_DATA")]
    Identifier(String),
    /// Integer literal
    #[serde(rename = "NUMBER_DATA")]
    Number(i64),
    /// String literal, owns its text until moved into the string pool
    #[serde(rename = "STRING_DATA")]
    String(String),
    /// Index of a literal moved into the string pool
    #[serde(rename = "STRING_LIST_REFERENCE")]
    StringRef(usize),
}

impl NodeKind {
    /// Label used in tree dumps
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::GlobalDeclaration => "GLOBAL_DECLARATION",
            Self::ArrayIndexing => "ARRAY_INDEXING",
            Self::VariableDeclaration => "VARIABLE_DECLARATION",
            Self::Function => "FUNCTION",
            Self::Block => "BLOCK",
            Self::AssignmentStatement => "ASSIGNMENT_STATEMENT",
            Self::ReturnStatement => "RETURN_STATEMENT",
            Self::PrintStatement => "PRINT_STATEMENT",
            Self::IfStatement => "IF_STATEMENT",
            Self::WhileStatement => "WHILE_STATEMENT",
            Self::FunctionCall => "FUNCTION_CALL",
            Self::BreakStatement => "BREAK_STATEMENT",
            Self::Relation(_) => "RELATION",
            Self::Expression(_) => "EXPRESSION",
            Self::Identifier(_) => "IDENTIFIER_DATA",
            Self::Number(_) => "NUMBER_DATA",
            Self::String(_) => "STRING_DATA",
            Self::StringRef(_) => "STRING_LIST_REFERENCE",
        }
    }

    /// Returns true for kinds that never have children
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_) | Self::Number(_) | Self::String(_) | Self::StringRef(_)
        )
    }

    /// Returns true for statements whose identifiers are use sites
    #[must_use]
    pub const fn is_resolution_context(&self) -> bool {
        matches!(
            self,
            Self::AssignmentStatement
                | Self::ReturnStatement
                | Self::PrintStatement
                | Self::IfStatement
                | Self::WhileStatement
                | Self::FunctionCall
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())?;
        match self {
            Self::Relation(op) => write!(formatter, "({op})"),
            Self::Expression(op) => write!(formatter, "({op})"),
            Self::Identifier(name) => write!(formatter, "({name})"),
            Self::Number(value) => write!(formatter, "({value})"),
            Self::String(text) => write!(formatter, "({text})"),
            Self::StringRef(index) => write!(formatter, "({index})"),
            _ => Ok(()),
        }
    }
}

/// Location of a node as child indices from the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the root node
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of the node at this path
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices, outermost first
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return formatter.write_str("<root>");
        }
        for (position, index) in self.0.iter().enumerate() {
            if position > 0 {
                formatter.write_str(".")?;
            }
            write!(formatter, "{index}")?;
        }
        Ok(())
    }
}

/// A syntax tree node
///
/// Children are owned by value, so the tree is strictly hierarchical and a
/// dropped node releases its whole subtree exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Kind and owned payload
    pub kind: NodeKind,
    /// Ordered children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// Symbol this identifier was bound to during name binding
    #[serde(skip)]
    pub symbol: Option<SymbolRef>,
}

impl Node {
    /// Creates a node owning `kind`'s payload and every child
    #[must_use]
    pub fn new(kind: NodeKind, children: Vec<Self>) -> Self {
        Self {
            kind,
            children,
            symbol: None,
        }
    }

    /// Creates a childless node
    #[must_use]
    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Creates a `LIST` node
    #[must_use]
    pub fn list(children: Vec<Self>) -> Self {
        Self::new(NodeKind::List, children)
    }

    /// Creates an `IDENTIFIER_DATA` node
    #[must_use]
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Identifier(name.into()))
    }

    /// Creates a `NUMBER_DATA` node
    #[must_use]
    pub fn number(value: i64) -> Self {
        Self::leaf(NodeKind::Number(value))
    }

    /// Creates a `STRING_DATA` node
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::String(text.into()))
    }

    /// Creates an `EXPRESSION` node
    #[must_use]
    pub fn expression(op: Operator, operands: Vec<Self>) -> Self {
        Self::new(NodeKind::Expression(op), operands)
    }

    /// Creates a `RELATION` node
    #[must_use]
    pub fn relation(op: RelationOp, left: Self, right: Self) -> Self {
        Self::new(NodeKind::Relation(op), vec![left, right])
    }

    /// Creates a `FUNCTION` node from its name, parameters and body
    #[must_use]
    pub fn function(name: impl Into<String>, parameters: Vec<Self>, body: Self) -> Self {
        Self::new(
            NodeKind::Function,
            vec![Self::identifier(name), Self::list(parameters), body],
        )
    }

    /// Appends `element` to this list and hands the list back
    ///
    /// Storage grows to the next power of two, so appending is amortized O(1).
    /// Lists are folded left to right while the parser reduces, e.g.
    /// `items.into_iter().fold(Node::list(vec![]), Node::append)`.
    ///
    /// # Panics
    ///
    /// Panics if this node is not a `LIST`; that is a bug in tree construction.
    #[must_use]
    pub fn append(mut self, element: Self) -> Self {
        self.push_child(element);
        self
    }

    /// In-place form of [`Node::append`]
    ///
    /// # Panics
    ///
    /// Panics if this node is not a `LIST`.
    pub fn push_child(&mut self, element: Self) -> &mut Self {
        assert!(
            self.kind == NodeKind::List,
            "append on a {} node, only LIST nodes grow",
            self.kind.label()
        );
        let wanted = (self.children.len() + 1).next_power_of_two();
        if wanted > self.children.capacity() {
            self.children.reserve_exact(wanted - self.children.len());
        }
        self.children.push(element);
        self
    }

    /// Releases this node and its subtree, children first
    ///
    /// Returns how many nodes were released.
    pub fn destroy(self) -> usize {
        let Self { kind, children, .. } = self;
        let released: usize = children.into_iter().map(Self::destroy).sum();
        drop(kind);
        released + 1
    }

    /// Number of nodes in this subtree, including this one
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }

    /// Returns true for `LIST` nodes
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.kind == NodeKind::List
    }

    /// Name carried by an `IDENTIFIER_DATA` node
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Value carried by a `NUMBER_DATA` node
    #[must_use]
    pub fn as_number(&self) -> Option<i64> {
        match self.kind {
            NodeKind::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the node at `path` below this one
    #[must_use]
    pub fn at_path(&self, path: &NodePath) -> Option<&Self> {
        path.indices()
            .iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Mutable form of [`Node::at_path`]
    pub fn at_path_mut(&mut self, path: &NodePath) -> Option<&mut Self> {
        path.indices()
            .iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Checks the subtree against the per-kind shape contract
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Malformed` for the first offending node in
    /// pre-order.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.validate_at(&NodePath::root())
    }

    fn validate_at(&self, path: &NodePath) -> Result<(), TreeError> {
        let malformed = |reason: String| TreeError::Malformed {
            kind: self.kind.label(),
            path: path.clone(),
            reason,
        };

        match &self.kind {
            kind if kind.is_leaf() && !self.children.is_empty() => {
                return Err(malformed(format!(
                    "expected no children, found {}",
                    self.children.len()
                )));
            }
            NodeKind::Function => {
                let shape_ok = self.children.len() == 3
                    && self.children[0].as_identifier().is_some()
                    && self.children[1].is_list()
                    && self.children[2].kind == NodeKind::Block;
                if !shape_ok {
                    return Err(malformed(
                        "expected identifier, parameter list and block".to_string(),
                    ));
                }
            }
            NodeKind::Expression(_) if self.children.is_empty() => {
                return Err(malformed("expected at least one operand".to_string()));
            }
            NodeKind::Relation(_) if self.children.len() != 2 => {
                return Err(malformed(format!(
                    "expected two operands, found {}",
                    self.children.len()
                )));
            }
            NodeKind::GlobalDeclaration if self.children.is_empty() => {
                return Err(malformed("expected a declarator".to_string()));
            }
            _ => {}
        }

        self.children
            .iter()
            .enumerate()
            .try_for_each(|(index, child)| child.validate_at(&path.child(index)))
    }
}
