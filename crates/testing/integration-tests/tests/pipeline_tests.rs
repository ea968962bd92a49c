//! End-to-end tests: JSON tree in, tables and dumps out

use expect_test::expect;
use integration_tests::{compile_fixture, load_fixture, write_tree};
use vsl_driver::{Compilation, DriverConfig, TeardownReport};
use vsl_resolve::{ResolveError, SymbolKind, Unresolved};
use vsl_tree::{NodeKind, TableId};

#[test]
fn test_scopes_report() {
    let compilation = compile_fixture("scopes", DriverConfig::default()).expect("compiles");

    expect![[r#"
        0: GLOBAL_VAR(g)
        1: GLOBAL_ARRAY(arr)
        2: FUNCTION(main)
            0: PARAMETER(a)
            1: PARAMETER(b)
            2: LOCAL_VAR(x)
            3: LOCAL_VAR(x)
        3: FUNCTION(helper)
            0: PARAMETER(n)

        == STRING LIST ==
        0: "x is"
        1: "inner"

        == BOUND SYNTAX TREE ==
        LIST
         GLOBAL_DECLARATION
          LIST
           IDENTIFIER_DATA(g)
           ARRAY_INDEXING
            IDENTIFIER_DATA(arr)
            NUMBER_DATA(4)
         FUNCTION
          IDENTIFIER_DATA(main)
          LIST
           IDENTIFIER_DATA(a)
           IDENTIFIER_DATA(b)
          BLOCK
           LIST
            VARIABLE_DECLARATION
             LIST
              IDENTIFIER_DATA(x)
           LIST
            ASSIGNMENT_STATEMENT
             IDENTIFIER_DATA(x) -> LOCAL_VAR(2)
             EXPRESSION(+)
              EXPRESSION(<<)
               IDENTIFIER_DATA(a) -> PARAMETER(0)
               NUMBER_DATA(2)
              IDENTIFIER_DATA(g) -> GLOBAL_VAR(0)
            PRINT_STATEMENT
             LIST
              STRING_LIST_REFERENCE(0)
              IDENTIFIER_DATA(x) -> LOCAL_VAR(2)
            IF_STATEMENT
             RELATION(>)
              IDENTIFIER_DATA(x) -> LOCAL_VAR(2)
              NUMBER_DATA(0)
             BLOCK
              LIST
               VARIABLE_DECLARATION
                LIST
                 IDENTIFIER_DATA(x)
              LIST
               ASSIGNMENT_STATEMENT
                IDENTIFIER_DATA(x) -> LOCAL_VAR(3)
                FUNCTION_CALL
                 IDENTIFIER_DATA(helper) -> FUNCTION(3)
                 LIST
                  IDENTIFIER_DATA(x) -> LOCAL_VAR(3)
               PRINT_STATEMENT
                LIST
                 STRING_LIST_REFERENCE(1)
                 IDENTIFIER_DATA(x) -> LOCAL_VAR(3)
            RETURN_STATEMENT
             IDENTIFIER_DATA(y)
         FUNCTION
          IDENTIFIER_DATA(helper)
          LIST
           IDENTIFIER_DATA(n)
          BLOCK
           LIST
           LIST
            RETURN_STATEMENT
             EXPRESSION(-)
              EXPRESSION(>>)
               IDENTIFIER_DATA(n) -> PARAMETER(0)
               NUMBER_DATA(1)
              NUMBER_DATA(15)
    "#]]
    .assert_eq(&compilation.report());
}

#[test]
fn test_scopes_symbols_point_into_their_tables() {
    let compilation = compile_fixture("scopes", DriverConfig::default()).expect("compiles");
    let tables = compilation.tables().expect("tables created");

    let main = tables.function_table("main").expect("main has a table");
    assert_eq!(main.id(), TableId::Function(2));
    let helper = tables.function_table("helper").expect("helper has a table");
    assert_eq!(helper.id(), TableId::Function(3));

    let call = compilation
        .root()
        .at_path(&vec![1, 2, 1, 2, 1, 1, 0, 1, 0].into())
        .expect("call target exists");
    let callee = tables
        .symbol(call.symbol.expect("call target bound"))
        .expect("symbol exists");
    assert_eq!((callee.kind, callee.name.as_str()), (SymbolKind::Function, "helper"));
    assert_eq!(callee.table, TableId::Global);
}

#[test]
fn test_scopes_unresolved() {
    let compilation = compile_fixture("scopes", DriverConfig::default()).expect("compiles");
    assert_eq!(
        compilation.unresolved(),
        [Unresolved {
            name: "y".to_string(),
            site: vec![1, 2, 1, 3, 0].into(),
        }]
    );
    assert!(compilation.diagnostics().is_empty());
}

#[test]
fn test_redeclarations_keep_first() {
    let compilation = compile_fixture("redeclared", DriverConfig::default()).expect("compiles");

    expect![[r#"
        0: GLOBAL_VAR(g)
        1: FUNCTION(f)
            0: LOCAL_VAR(x)
    "#]]
    .assert_eq(&compilation.tables().expect("tables created").dump());

    let messages: Vec<String> = compilation
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        messages,
        [
            "GLOBAL_VAR 'g' at 1.0.0 is already declared in the global table as symbol 0",
            "FUNCTION 'f' at 3.0 is already declared in the global table as symbol 1",
            "LOCAL_VAR 'x' at 2.2.0.0.0.1 is already declared in the function#1 table as symbol 0",
        ]
    );
    assert!(matches!(
        compilation.diagnostics()[2],
        ResolveError::Redeclaration {
            table: TableId::Function(1),
            ..
        }
    ));
    assert!(compilation.unresolved().is_empty());
}

#[test]
fn test_teardown_releases_everything_once() {
    let config = DriverConfig {
        simplify: false,
        ..DriverConfig::default()
    };
    let original = load_fixture("scopes", config).expect("loads");
    let unsimplified = original.root().count();
    assert_eq!(original.destroy().nodes, unsimplified);

    let compilation = compile_fixture("scopes", DriverConfig::default()).expect("compiles");
    // `3 * 5` folds into a single literal
    assert_eq!(compilation.root().count(), unsimplified - 2);

    assert_eq!(
        compilation.destroy(),
        TeardownReport {
            nodes: unsimplified - 2,
            symbols: 9,
            tables: 3,
            frames: 3,
            strings: 2,
        }
    );
}

#[test]
fn test_string_literals_leave_the_tree() {
    let compilation = compile_fixture("scopes", DriverConfig::default()).expect("compiles");
    let tables = compilation.tables().expect("tables created");

    let reference = compilation
        .root()
        .at_path(&vec![1, 2, 1, 1, 0, 0].into())
        .expect("print item exists");
    let NodeKind::StringRef(index) = reference.kind else {
        panic!("expected a pool reference, found {}", reference.kind);
    };
    assert_eq!(tables.string(index), Some("\"x is\""));
    assert!(!compilation.report().contains("STRING_DATA"));
}

#[test]
fn test_output_follows_config() {
    let config = DriverConfig {
        graphviz: true,
        print_tree: true,
        ..DriverConfig::default()
    };
    let compilation = compile_fixture("redeclared", config).expect("compiles");
    let output = compilation.output();
    assert!(output.starts_with("digraph {\n  node0 [label=\"LIST\"];\n"));
    assert!(output.ends_with("}\n"));

    let config = DriverConfig {
        print_tables: true,
        ..DriverConfig::default()
    };
    let compilation = compile_fixture("redeclared", config).expect("compiles");
    assert_eq!(compilation.output(), compilation.report());

    let quiet = compile_fixture("redeclared", DriverConfig::default()).expect("compiles");
    assert_eq!(quiet.output(), "");
}

#[test]
fn test_loading_from_temporary_files() {
    let file = write_tree(r#"{ "kind": "LIST", "children": [] }"#).expect("temp tree");
    let mut compilation = Compilation::load(file.path(), DriverConfig::default()).expect("loads");
    compilation.run().expect("runs");
    assert!(compilation.tables().expect("tables created").global().is_empty());

    let broken = write_tree(r#"{ "kind": "FUNCTION" }"#).expect("temp tree");
    let error = Compilation::load(broken.path(), DriverConfig::default()).unwrap_err();
    assert!(error.to_string().starts_with("Failed to load"));
}
