//! Global collection
//!
//! One left-to-right walk over the top-level declarations. Functions get a
//! local table holding their parameters and a symbol in the global table;
//! global declarations get one symbol per declared name. Function bodies are
//! left for the binder, which only runs once every global name is known.

use crate::error::ResolveError;
use crate::symbol::{SymbolKind, SymbolTable};
use tracing::{debug, error, warn};
use vsl_tree::{Node, NodeKind, NodePath, TableId};

/// Table a function body is bound against
#[derive(Debug)]
pub(crate) enum Target {
    /// Local table of the function symbol with this global sequence number
    Function(usize),
    /// Parameters of a definition whose name is held by a global variable;
    /// released once its body is bound
    Detached(SymbolTable),
}

/// A function definition waiting to be bound
#[derive(Debug)]
pub(crate) struct PendingFunction {
    /// Index of the `FUNCTION` node among the root's children
    pub item: usize,
    pub target: Target,
}

/// Result of the collection pass
#[derive(Debug)]
pub(crate) struct Collection {
    pub global: SymbolTable,
    pub functions: Vec<PendingFunction>,
}

/// Collect every global name declared directly under `root`
pub(crate) fn collect_globals(root: &Node, diagnostics: &mut Vec<ResolveError>) -> Collection {
    let mut global = SymbolTable::new(TableId::Global);
    let mut functions = Vec::new();

    for (item, child) in root.children.iter().enumerate() {
        let path = NodePath::root().child(item);
        match child.kind {
            NodeKind::Function => {
                if let Some(target) = collect_function(&mut global, child, &path, diagnostics) {
                    functions.push(PendingFunction { item, target });
                }
            }
            NodeKind::GlobalDeclaration => {
                collect_declaration(&mut global, child, &path, diagnostics);
            }
            ref other => debug!(kind = other.label(), %path, "ignoring top-level node"),
        }
    }

    Collection { global, functions }
}

/// Register a function and its parameters
///
/// A repeated name keeps the first symbol. The later body is still bound:
/// against the first definition's table when that is a function, otherwise
/// against a detached table holding its own parameters.
fn collect_function(
    global: &mut SymbolTable,
    function: &Node,
    path: &NodePath,
    diagnostics: &mut Vec<ResolveError>,
) -> Option<Target> {
    let (Some(name), Some(parameters)) = (
        function.children.first().and_then(Node::as_identifier),
        function.children.get(1).filter(|node| node.is_list()),
    ) else {
        error!(%path, "function without a name and parameter list");
        diagnostics.push(ResolveError::MalformedDeclaration {
            what: "function",
            site: path.clone(),
        });
        return None;
    };

    let existing = global.lookup(name).map(|symbol| (symbol.sequence, symbol.kind));
    let sequence = existing.map_or_else(|| global.next_sequence(), |(sequence, _)| sequence);
    let local = collect_parameters(TableId::Function(sequence), name, parameters, path, diagnostics);

    let Some((existing, kind)) = existing else {
        return match global.insert_function(name, path.child(0), local) {
            Ok(sequence) => {
                debug!(function = name, sequence, "collected function");
                Some(Target::Function(sequence))
            }
            Err(redeclaration) => {
                warn!("{redeclaration}");
                diagnostics.push(redeclaration);
                None
            }
        };
    };

    let redeclaration = ResolveError::Redeclaration {
        name: name.to_owned(),
        kind: SymbolKind::Function,
        table: TableId::Global,
        existing,
        site: path.child(0),
    };
    warn!("{redeclaration}");
    diagnostics.push(redeclaration);

    if kind == SymbolKind::Function {
        Some(Target::Function(existing))
    } else {
        Some(Target::Detached(local))
    }
}

fn collect_parameters(
    table: TableId,
    function: &str,
    parameters: &Node,
    path: &NodePath,
    diagnostics: &mut Vec<ResolveError>,
) -> SymbolTable {
    let mut local = SymbolTable::new(table);
    let parameters_path = path.child(1);
    for (index, parameter) in parameters.children.iter().enumerate() {
        let site = parameters_path.child(index);
        let Some(name) = parameter.as_identifier() else {
            diagnostics.push(ResolveError::MalformedDeclaration {
                what: "parameter",
                site,
            });
            continue;
        };
        if let Err(redeclaration) = local.insert(name, SymbolKind::Parameter, site) {
            warn!(function, "{redeclaration}");
            diagnostics.push(redeclaration);
        }
    }
    local
}

fn collect_declaration(
    global: &mut SymbolTable,
    declaration: &Node,
    path: &NodePath,
    diagnostics: &mut Vec<ResolveError>,
) {
    let Some((declarator, declarator_path)) = find_declarator(declaration, path.clone()) else {
        error!(%path, "global declaration without identifiers");
        diagnostics.push(ResolveError::MalformedDeclaration {
            what: "global declaration",
            site: path.clone(),
        });
        return;
    };

    let declarator_kind = if declarator.kind == NodeKind::ArrayIndexing {
        SymbolKind::GlobalArray
    } else {
        SymbolKind::GlobalVar
    };

    for (index, child) in declarator.children.iter().enumerate() {
        let site = declarator_path.child(index);
        let (name, kind, site) = match &child.kind {
            NodeKind::Identifier(name) => (name, declarator_kind, site),
            // `var a, b[4]` puts array declarators next to plain names
            NodeKind::ArrayIndexing => match child.children.first() {
                Some(Node {
                    kind: NodeKind::Identifier(name),
                    ..
                }) => (name, SymbolKind::GlobalArray, site.child(0)),
                _ => continue,
            },
            _ => continue,
        };

        match global.insert(name, kind, site) {
            Ok(sequence) => debug!(name = name.as_str(), %kind, sequence, "collected global"),
            Err(redeclaration) => {
                warn!("{redeclaration}");
                diagnostics.push(redeclaration);
            }
        }
    }
}

/// First node, in pre-order, that is a non-empty list or whose first child is
/// an identifier
fn find_declarator(node: &Node, path: NodePath) -> Option<(&Node, NodePath)> {
    let declares = (node.is_list() && !node.children.is_empty())
        || node
            .children
            .first()
            .is_some_and(|first| first.as_identifier().is_some());
    if declares {
        return Some((node, path));
    }
    node.children
        .iter()
        .enumerate()
        .find_map(|(index, child)| find_declarator(child, path.child(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_declaration(declarator: Node) -> Node {
        Node::new(NodeKind::GlobalDeclaration, vec![declarator])
    }

    fn kinds(table: &SymbolTable) -> Vec<(&str, SymbolKind)> {
        table
            .symbols()
            .iter()
            .map(|symbol| (symbol.name.as_str(), symbol.kind))
            .collect()
    }

    #[test]
    fn test_collects_globals_and_arrays() {
        let root = Node::list(vec![
            global_declaration(Node::list(vec![Node::identifier("a"), Node::identifier("b")])),
            global_declaration(Node::new(
                NodeKind::ArrayIndexing,
                vec![Node::identifier("arr"), Node::number(10)],
            )),
        ]);
        let mut diagnostics = Vec::new();
        let collection = collect_globals(&root, &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&collection.global),
            [
                ("a", SymbolKind::GlobalVar),
                ("b", SymbolKind::GlobalVar),
                ("arr", SymbolKind::GlobalArray),
            ]
        );
        let arr = collection.global.lookup("arr").expect("arr collected");
        assert_eq!(arr.node, NodePath::from(vec![1, 0, 0]));
    }

    #[test]
    fn test_mixed_declarator_list() {
        let root = Node::list(vec![global_declaration(Node::list(vec![
            Node::identifier("n"),
            Node::new(
                NodeKind::ArrayIndexing,
                vec![Node::identifier("buf"), Node::number(4)],
            ),
        ]))]);
        let collection = collect_globals(&root, &mut Vec::new());
        assert_eq!(
            kinds(&collection.global),
            [("n", SymbolKind::GlobalVar), ("buf", SymbolKind::GlobalArray)]
        );
    }

    #[test]
    fn test_array_first_in_declarator_list() {
        let root = Node::list(vec![global_declaration(Node::list(vec![
            Node::new(
                NodeKind::ArrayIndexing,
                vec![Node::identifier("buf"), Node::number(4)],
            ),
            Node::identifier("n"),
        ]))]);
        let mut diagnostics = Vec::new();
        let collection = collect_globals(&root, &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&collection.global),
            [("buf", SymbolKind::GlobalArray), ("n", SymbolKind::GlobalVar)]
        );
        let buf = collection.global.lookup("buf").expect("buf collected");
        assert_eq!(buf.node, NodePath::from(vec![0, 0, 0, 0]));
        let n = collection.global.lookup("n").expect("n collected");
        assert_eq!(n.node, NodePath::from(vec![0, 0, 1]));
    }

    #[test]
    fn test_function_parameters() {
        let root = Node::list(vec![Node::function(
            "add",
            vec![Node::identifier("a"), Node::identifier("b")],
            Node::leaf(NodeKind::Block),
        )]);
        let collection = collect_globals(&root, &mut Vec::new());

        assert!(matches!(
            collection.functions.as_slice(),
            [PendingFunction {
                item: 0,
                target: Target::Function(0),
            }]
        ));
        let local = collection.global.function_table(0).expect("local table");
        assert_eq!(
            kinds(local),
            [("a", SymbolKind::Parameter), ("b", SymbolKind::Parameter)]
        );
    }

    #[test]
    fn test_duplicate_parameter_is_reported() {
        let root = Node::list(vec![Node::function(
            "f",
            vec![Node::identifier("a"), Node::identifier("a")],
            Node::leaf(NodeKind::Block),
        )]);
        let mut diagnostics = Vec::new();
        let collection = collect_globals(&root, &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0],
            ResolveError::Redeclaration { name, kind: SymbolKind::Parameter, .. } if name == "a"
        ));
        let local = collection.global.function_table(0).expect("local table");
        assert_eq!(local.len(), 1);
        assert_eq!(local.lookup("a").map(|symbol| &symbol.node), Some(&NodePath::from(vec![0, 1, 0])));
    }

    #[test]
    fn test_duplicate_function_shares_first_table() {
        let root = Node::list(vec![
            Node::function("f", vec![Node::identifier("a")], Node::leaf(NodeKind::Block)),
            Node::function("f", vec![Node::identifier("b")], Node::leaf(NodeKind::Block)),
        ]);
        let mut diagnostics = Vec::new();
        let collection = collect_globals(&root, &mut diagnostics);

        assert_eq!(collection.global.len(), 1);
        assert!(matches!(
            collection.functions.as_slice(),
            [
                PendingFunction { item: 0, target: Target::Function(0) },
                PendingFunction { item: 1, target: Target::Function(0) },
            ]
        ));
        assert_eq!(
            diagnostics,
            [ResolveError::Redeclaration {
                name: "f".to_owned(),
                kind: SymbolKind::Function,
                table: TableId::Global,
                existing: 0,
                site: NodePath::from(vec![1, 0]),
            }]
        );
        let local = collection.global.function_table(0).expect("local table");
        assert_eq!(kinds(local), [("a", SymbolKind::Parameter)]);
    }

    #[test]
    fn test_function_named_like_a_global_is_detached() {
        let root = Node::list(vec![
            global_declaration(Node::list(vec![Node::identifier("g")])),
            Node::function("g", vec![Node::identifier("p")], Node::leaf(NodeKind::Block)),
        ]);
        let mut diagnostics = Vec::new();
        let collection = collect_globals(&root, &mut diagnostics);

        assert_eq!(kinds(&collection.global), [("g", SymbolKind::GlobalVar)]);
        assert_eq!(diagnostics.len(), 1);
        let [PendingFunction { item: 1, target: Target::Detached(local) }] =
            collection.functions.as_slice()
        else {
            panic!("expected a detached table, got {:?}", collection.functions);
        };
        assert_eq!(local.id(), TableId::Function(0));
        assert_eq!(kinds(local), [("p", SymbolKind::Parameter)]);
    }

    #[test]
    fn test_malformed_function() {
        let root = Node::list(vec![Node::new(NodeKind::Function, Vec::new())]);
        let mut diagnostics = Vec::new();
        let collection = collect_globals(&root, &mut diagnostics);

        assert!(collection.global.is_empty());
        assert_eq!(
            diagnostics,
            [ResolveError::MalformedDeclaration {
                what: "function",
                site: NodePath::from(vec![0]),
            }]
        );
    }
}
