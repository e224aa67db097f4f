// tests/aggregation_tests.rs

use adl_lang::aggregation::{AccessError, Node, initialize};
use adl_lang::evaluator::EvalError;
use adl_lang::path::{PathSegment, path};
use adl_lang::{Storage, parse};

fn tree(source: &str) -> Node {
    Node::Namespace(initialize(&parse(source).unwrap()).unwrap())
}

fn init_err(source: &str) -> EvalError {
    initialize(&parse(source).unwrap()).unwrap_err()
}

fn at<'a>(node: &'a Node, segments: &[PathSegment]) -> &'a Node {
    node.lookup(segments)
        .unwrap_or_else(|err| panic!("lookup failed: {}", err))
}

const PROGRAM: &str = "\
count 'events'
region 'central' x > 0 by regular(2, 0, 4) <- x {
    sum 'total' x
}
vary 'up': s := 2 'down': s := 0.5 {
    profile 'scaled' s * x
}
for j in jets {
    fraction 'passed' j > 1
}
";

// ============================================================================
// Shape
// ============================================================================

#[test]
fn test_top_level_names() {
    let root = tree(PROGRAM);
    let namespace = root.as_namespace().unwrap();
    let names: Vec<&str> = namespace.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["central", "down", "events", "passed", "up"]);
}

#[test]
fn test_storages_know_their_kind_and_name() {
    let root = tree(PROGRAM);

    let events = at(&root, &["events".into()]).as_storage().unwrap();
    assert!(matches!(events, Storage::Count(_)));
    assert_eq!(events.name(), &path(["events"]));

    let passed = at(&root, &["passed".into()]).as_storage().unwrap();
    assert_eq!(passed.kind(), "fraction");

    let scaled = at(&root, &["up".into(), "scaled".into()]);
    assert_eq!(scaled.as_storage().map(Storage::kind), Some("profile"));
    assert_eq!(scaled.name(), &path(["up", "scaled"]));
}

#[test]
fn test_region_axes_wrap_the_namespace() {
    let root = tree(PROGRAM);
    let central = at(&root, &["central".into()]).as_binning().unwrap();
    assert_eq!(central.numbins(), 2);
    assert_eq!(central.edges(), vec![0.0, 2.0, 4.0]);
    assert_eq!(central.expression.as_identifier(), Some("x"));

    let first = central.bin(0).unwrap();
    assert!(first.as_namespace().is_some());
    let total = at(first, &["total".into()]);
    assert_eq!(
        total.name(),
        &vec![
            PathSegment::Field("central".into()),
            PathSegment::Index(0),
            PathSegment::Field("total".into()),
        ]
    );

    let nanflow = at(&root, &["central".into(), "nanflow".into(), "total".into()]);
    assert_eq!(nanflow.name(), &path(["central", "nanflow", "total"]));
}

#[test]
fn test_first_axis_is_outermost() {
    let root = tree("count 'h' by regular(2, 0, 2) <- x regular(3, 0, 3) <- y");
    let outer = at(&root, &["h".into()]).as_binning().unwrap();
    assert_eq!(outer.numbins(), 2);
    assert_eq!(outer.expression.as_identifier(), Some("x"));

    let inner = outer.bin(0).and_then(Node::as_binning).unwrap();
    assert_eq!(inner.numbins(), 3);
    assert_eq!(inner.expression.as_identifier(), Some("y"));

    let leaf = at(&root, &["h".into(), 1i64.into(), 2i64.into()]);
    assert!(leaf.as_storage().is_some());
    assert_eq!(
        leaf.name(),
        &vec![
            PathSegment::Field("h".into()),
            PathSegment::Index(1),
            PathSegment::Index(2),
        ]
    );
}

#[test]
fn test_variable_binning() {
    let root = tree("count 'h' by variable(-1, 0, 2.5, 10) <- x");
    let h = at(&root, &["h".into()]).as_binning().unwrap();
    assert_eq!(h.numbins(), 3);
    assert_eq!(h.edges(), vec![-1.0, 0.0, 2.5, 10.0]);
}

#[test]
fn test_control_blocks_do_not_open_namespaces() {
    let root = tree("source 'data*' { count 'a' }\nfor x in xs { count 'b' }");
    assert!(at(&root, &["a".into()]).as_storage().is_some());
    assert!(at(&root, &["b".into()]).as_storage().is_some());
}

// ============================================================================
// Name uniqueness
// ============================================================================

#[test]
fn test_duplicate_names() {
    for source in [
        "count 'a'\ncount 'a'",
        "region 'a' { }\ncount 'a'",
        "count 'a'\nsource 'x' { count 'a' }",
        "vary 'a' 'a' { count 'n' }",
        "region 'r' { count 'n'; sum 'n' x }",
    ] {
        let err = init_err(source);
        assert!(
            matches!(err, EvalError::Type { .. }),
            "Failed for input: {} ({:?})",
            source,
            err
        );
    }
    assert_eq!(
        init_err("count 'a'\ncount 'a'").message(),
        "duplicate name 'a' in the same namespace"
    );
}

#[test]
fn test_same_name_in_different_namespaces() {
    let root = tree("count 'a'\nregion 'r' { count 'a' }\nvary 'up' 'down' { count 'a' }");
    assert!(at(&root, &["r".into(), "a".into()]).as_storage().is_some());
    assert!(at(&root, &["down".into(), "a".into()]).as_storage().is_some());
}

#[test]
fn test_duplicate_name_position() {
    let err = init_err("count 'a'\ncount 'a'");
    let span = err.span().unwrap();
    assert_eq!((span.line, span.column), (2, 6));
}

// ============================================================================
// Binning validation
// ============================================================================

#[test]
fn test_invalid_binnings() {
    let test_cases = vec![
        ("regular(0, 0, 1)", "numbins must be a literal positive integer"),
        ("regular(n, 0, 1)", "numbins must be a literal positive integer"),
        ("regular(2.0, 0, 1)", "numbins must be a literal positive integer"),
        ("regular(2, 1, 1)", "high must be greater than low"),
        ("regular(2, 'a', 1)", "low must be a literal number"),
        (
            "regular(2, 0)",
            "regular binning takes exactly 3 arguments: numbins, low, high",
        ),
        ("variable(1)", "variable binning needs at least 2 edges"),
        ("variable(0, 2, 1)", "edges must be strictly increasing"),
        ("variable(0, x)", "edges must be literal numbers"),
        ("linear(2, 0, 1)", "not a binning"),
    ];

    for (binning, expected) in test_cases {
        let source = format!("count 'h' by {} <- x", binning);
        let err = init_err(&source);
        assert!(matches!(err, EvalError::Type { .. }), "Failed for input: {}", source);
        assert_eq!(err.message(), expected, "Failed for input: {}", source);
    }
}

#[test]
fn test_negative_literal_bounds() {
    let root = tree("count 'h' by regular(4, -2, 2) <- x");
    let h = at(&root, &["h".into()]).as_binning().unwrap();
    assert_eq!(h.edges(), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_integer_lookup_clamps_to_flows() {
    let root = tree("count 'h' by regular(2, 0, 4) <- x");
    let under = at(&root, &["h".into(), (-1i64).into()]);
    assert_eq!(under.name(), &path(["h", "underflow"]));
    let over = at(&root, &["h".into(), 99i64.into()]);
    assert_eq!(over.name(), &path(["h", "overflow"]));
    let exact = at(&root, &["h".into(), 2i64.into()]);
    assert_eq!(exact.name(), &path(["h", "overflow"]));
}

#[test]
fn test_lookup_errors() {
    let root = tree("count 'h' by regular(2, 0, 4) <- x\nregion 'r' { count 'n' }");

    let err = root.lookup(&["nope".into()]).unwrap_err();
    assert_eq!(
        err,
        AccessError::NoSuchName {
            within: vec![],
            name: "nope".into()
        }
    );
    assert_eq!(err.to_string(), "no aggregation named 'nope' in the root");

    let err = root.lookup(&["h".into(), "middle".into()]).unwrap_err();
    assert!(matches!(err, AccessError::ImproperIndex { .. }));

    let err = root.lookup(&["r".into(), 0i64.into()]).unwrap_err();
    assert!(matches!(err, AccessError::ImproperIndex { .. }));

    let err = root
        .lookup(&["r".into(), "n".into(), 0i64.into()])
        .unwrap_err();
    assert!(matches!(err, AccessError::TooManyDimensions { .. }));
}

#[test]
fn test_empty_lookup_is_the_node_itself() {
    let root = tree("count 'a'");
    let same = root.lookup(&[]).unwrap();
    assert!(same.as_namespace().is_some());
}

// ============================================================================
// Structural copies
// ============================================================================

#[test]
fn test_zeros_like_renames_every_descendant() {
    let root = tree("region 'r' by regular(2, 0, 4) <- x { count 'n' }");
    let copy = at(&root, &["r".into()]).zeros_like(path(["copy"]));
    let leaf = at(&copy, &[1i64.into(), "n".into()]);
    assert_eq!(
        leaf.name(),
        &vec![
            PathSegment::Field("copy".into()),
            PathSegment::Index(1),
            PathSegment::Field("n".into()),
        ]
    );
}

#[test]
fn test_empty_tree_json() {
    let root = tree("count 'n'\nprofile 'p' x");
    assert_eq!(
        root.to_json(),
        serde_json::json!({
            "n": {"count": 0.0, "error": 0.0, "sumw2": 0.0},
            "p": {"profile": 0.0, "error": 0.0, "sumw": 0.0, "sumw2": 0.0},
        })
    );
}
