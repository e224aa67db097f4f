// tests/parser_tests.rs

use adl_lang::ast::{Callee, Expr, ExprKind, Literal, Statement, StatementKind, Statistic};
use adl_lang::lexer::LexError;
use adl_lang::parser::{ParseError, parse, parse_expression};

/// Render an expression as an s-expression, which makes precedence visible.
fn render(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Integer(n)) => n.to_string(),
        ExprKind::Literal(Literal::Float(n)) => format!("{:?}", n),
        ExprKind::Literal(Literal::String(s)) => format!("{:?}", s),
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::Call {
            function,
            arguments,
        } => {
            let mut parts = vec![match function {
                Callee::Special(special) => special.symbol().to_string(),
                Callee::Expr(function) => format!("call {}", render(function)),
            }];
            parts.extend(arguments.iter().map(render));
            format!("({})", parts.join(" "))
        }
        ExprKind::Inline(function) => {
            let parameters: Vec<&str> = function
                .parameters
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            format!("(fn {})", parameters.join(" "))
        }
    }
}

fn expr(source: &str) -> String {
    render(&parse_expression(source).unwrap())
}

fn statements(source: &str) -> Vec<Statement> {
    parse(source).unwrap().block
}

fn only(source: &str) -> StatementKind {
    let mut block = statements(source);
    assert_eq!(block.len(), 1, "expected one statement in {}", source);
    block.remove(0).kind
}

// ============================================================================
// Expression precedence
// ============================================================================

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(expr("1 + 2 * 3"), "(+ 1 (* 2 3))");
    assert_eq!(expr("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    assert_eq!(expr("a % b - c / d"), "(- (% a b) (/ c d))");
    assert_eq!(expr("a - b - c"), "(- (- a b) c)");
}

#[test]
fn test_power_binds_tighter_than_unary() {
    assert_eq!(expr("-x ** 2"), "(unary - (** x 2))");
    assert_eq!(expr("2 ** 3 ** 2"), "(** 2 (** 3 2))");
    assert_eq!(expr("2 ** -1"), "(** 2 -1)");
}

#[test]
fn test_negative_literals_fold() {
    assert_eq!(expr("-3"), "-3");
    assert_eq!(expr("-2.5"), "-2.5");
    assert_eq!(expr("+4"), "4");
    assert_eq!(expr("--x"), "(unary - (unary - x))");
}

#[test]
fn test_logical_precedence() {
    assert_eq!(expr("not a and b or c"), "(or (and (not a) b) c)");
    assert_eq!(expr("a or b and c"), "(or a (and b c))");
    assert_eq!(expr("not x < 1"), "(not (< x 1))");
}

#[test]
fn test_chained_comparison() {
    assert_eq!(expr("a < b <= c"), "(and (< a b) (<= b c))");
    assert_eq!(
        expr("0 < x < y != 4"),
        "(and (and (< 0 x) (< x y)) (!= y 4))"
    );
}

#[test]
fn test_postfix_chain() {
    assert_eq!(expr("x.pt[0](1)"), "(call ([] (. x pt) 0) 1)");
    assert_eq!(expr("jets.map(j -> j.pt)"), "(call (. jets map) (fn j))");
    assert_eq!(expr("f()"), "(call f)");
}

#[test]
fn test_trailing_comma_in_call() {
    assert_eq!(expr("f(1, 2,)"), "(call f 1 2)");
}

#[test]
fn test_inline_functions() {
    assert_eq!(expr("x -> x + 1"), "(fn x)");
    assert_eq!(expr("(a, b) -> a.pt > b.pt"), "(fn a b)");
    assert_eq!(expr("() -> 1"), "(fn )");

    let parsed = parse_expression("x -> { y := x * 2; y + 1 }").unwrap();
    let ExprKind::Inline(function) = parsed.kind else {
        panic!("expected an inline function");
    };
    assert_eq!(function.body.len(), 2);
    assert!(matches!(function.body[1].kind, StatementKind::Expression(_)));
}

#[test]
fn test_duplicate_inline_parameters() {
    let err = parse_expression("(a, a) -> a").unwrap_err();
    assert!(matches!(err, ParseError::InvalidParameters { .. }));
}

#[test]
fn test_duplicate_definition_parameters() {
    let err = parse("f(a, b, a) := a").unwrap_err();
    let ParseError::InvalidParameters { span } = &err else {
        panic!("expected invalid parameters, got {:?}", err);
    };
    assert_eq!((span.start, span.end), (8, 9));

    assert!(parse("f(a, b) := a").is_ok());
    assert!(parse("f(a, b) := a\ng(a, b) := b").is_ok());
}

#[test]
fn test_trailing_input_rejected() {
    let err = parse_expression("1 2").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_parent_span_encloses_children() {
    let parsed = parse_expression("a + b * c").unwrap();
    let ExprKind::Call { arguments, .. } = &parsed.kind else {
        panic!("expected a call");
    };
    for argument in arguments {
        assert!(parsed.span.encloses(&argument.span));
    }
    assert_eq!((parsed.span.start, parsed.span.end), (0, 9));
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_assignments_and_separators() {
    assert_eq!(statements("x := 1\ny := 2").len(), 2);
    assert_eq!(statements("x := 1; y := 2;").len(), 2);
    assert_eq!(statements("").len(), 0);
    assert_eq!(statements("# nothing here\n").len(), 0);
}

#[test]
fn test_missing_separator() {
    let err = parse("x := 1 y := 2").unwrap_err();
    let ParseError::MissingSeparator { span } = &err else {
        panic!("expected a missing separator, got {:?}", err);
    };
    assert_eq!(span.start, 7);
    assert_eq!(err.to_string(), "missing semicolon or newline");
}

#[test]
fn test_function_definitions() {
    let StatementKind::FunctionDefine { target, function } = only("f(x, y) := x + y") else {
        panic!("expected a function definition");
    };
    assert_eq!(target.name, "f");
    let names: Vec<&str> = function.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(function.body.len(), 1);

    let StatementKind::FunctionDefine { function, .. } =
        only("f(x) := {\n    y := x * 2\n    y + 1\n}")
    else {
        panic!("expected a function definition");
    };
    assert_eq!(function.body.len(), 2);
}

#[test]
fn test_function_body_must_end_with_expression() {
    let err = parse("f(x) := { y := x }").unwrap_err();
    assert!(matches!(err, ParseError::MissingResult { .. }));
}

#[test]
fn test_invalid_targets() {
    for source in ["1 := 2", "f(1) := 2", "x.y := 3", "f(x)(y) := 1"] {
        let err = parse(source).unwrap_err();
        assert!(
            matches!(err, ParseError::InvalidTarget { .. }),
            "Failed for input: {} ({:?})",
            source,
            err
        );
    }
}

#[test]
fn test_bare_expression_statement_rejected() {
    let err = parse("x + 1").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}

// ============================================================================
// Collectors
// ============================================================================

#[test]
fn test_count() {
    let StatementKind::Collect(collect) = only("count 'events'") else {
        panic!("expected a collector");
    };
    assert_eq!(collect.statistic, Statistic::Count);
    assert_eq!(collect.name.value, "events");
    assert!(collect.expression.is_none());
    assert!(collect.axes.is_empty());
    assert!(collect.weight.is_none());
}

#[test]
fn test_collector_with_axes_and_weight() {
    let StatementKind::Collect(collect) =
        only("profile 'p' y by regular(10, 0, 1) <- x variable(0, 1, 2) <- z weight w")
    else {
        panic!("expected a collector");
    };
    assert_eq!(collect.statistic, Statistic::Profile);
    assert_eq!(collect.expression.as_ref().map(render).as_deref(), Some("y"));
    assert_eq!(collect.axes.len(), 2);
    assert_eq!(render(&collect.axes[0].binning), "(call regular 10 0 1)");
    assert_eq!(render(&collect.axes[0].expression), "x");
    assert_eq!(render(&collect.axes[1].expression), "z");
    assert_eq!(collect.weight.as_ref().map(render).as_deref(), Some("w"));
}

#[test]
fn test_collector_names_must_be_quoted() {
    let err = parse("count events").unwrap_err();
    assert_eq!(
        err.to_string(),
        "illegal syntax: expected a quoted name, found identifier 'events'"
    );
}

#[test]
fn test_sum_requires_expression() {
    assert!(parse("sum 'total'").is_err());
    assert!(parse("sum 'total' x weight 2").is_ok());
}

// ============================================================================
// Blocks
// ============================================================================

#[test]
fn test_region() {
    let StatementKind::Region {
        name,
        predicate,
        axes,
        block,
    } = only("region 'central' abs(eta) < 2.5 { count 'n' }")
    else {
        panic!("expected a region");
    };
    assert_eq!(name.value, "central");
    assert_eq!(predicate.as_ref().map(render).as_deref(), Some("(< (call abs eta) 2.5)"));
    assert!(axes.is_empty());
    assert_eq!(block.len(), 1);

    let StatementKind::Region {
        predicate, axes, ..
    } = only("region 'all' by regular(2, 0, 4) <- x {\n    count 'n'\n}")
    else {
        panic!("expected a region");
    };
    assert!(predicate.is_none());
    assert_eq!(axes.len(), 1);
}

#[test]
fn test_vary() {
    let StatementKind::Vary { variations, block } =
        only("vary 'up': shift := 1.1 'down': shift := 0.9; scale := 2 'nominal' { count 'n' }")
    else {
        panic!("expected a vary block");
    };
    let names: Vec<&str> = variations.iter().map(|v| v.name.value.as_str()).collect();
    assert_eq!(names, vec!["up", "down", "nominal"]);
    assert_eq!(variations[0].assignments.len(), 1);
    assert_eq!(variations[1].assignments.len(), 2);
    assert!(variations[2].assignments.is_empty());
    assert_eq!(block.len(), 1);
}

#[test]
fn test_vary_needs_a_variation() {
    assert!(parse("vary { count 'n' }").is_err());
}

#[test]
fn test_for() {
    let StatementKind::For { loopvars, block } = only("for a in xs, b in ys { count 'n' }") else {
        panic!("expected a for loop");
    };
    let targets: Vec<&str> = loopvars.iter().map(|l| l.target.name.as_str()).collect();
    assert_eq!(targets, vec!["a", "b"]);
    assert_eq!(block.len(), 1);
}

#[test]
fn test_source() {
    let StatementKind::Source {
        patterns,
        inclusive,
        ..
    } = only("source 'data*', 'mc' { count 'n' }")
    else {
        panic!("expected a source block");
    };
    assert!(inclusive);
    assert_eq!(patterns.len(), 2);
    assert!(patterns[0].matches("data2018"));
    assert!(!patterns[0].matches("mc"));
    assert!(patterns[1].matches("mc"));
    assert!(!patterns[1].matches("mc2"));

    let StatementKind::Source { inclusive, .. } = only("not source 'mc' { count 'n' }") else {
        panic!("expected a source block");
    };
    assert!(!inclusive);
}

#[test]
fn test_nested_blocks() {
    let source = "\
region 'a' {
    region 'b' x > 0 {
        for j in jets {
            count 'jets'
        }
    }
}
";
    let block = statements(source);
    let inner = block[0].block().unwrap();
    let innermost = inner[0].block().unwrap();
    assert!(matches!(innermost[0].kind, StatementKind::For { .. }));
}

// ============================================================================
// Errors and positions
// ============================================================================

#[test]
fn test_lex_errors_are_wrapped() {
    let err = parse("x := $").unwrap_err();
    assert_eq!(
        err,
        ParseError::Lex(LexError::UnexpectedChar {
            ch: '$',
            position: 5
        })
    );
    assert!(err.span().is_none());
}

#[test]
fn test_statement_positions() {
    let block = statements("x := 1\n  y := 2");
    assert_eq!((block[1].span.line, block[1].span.column), (2, 2));
    assert_eq!((block[1].span.end_line, block[1].span.end_column), (2, 8));
}

#[test]
fn test_unexpected_token_position() {
    let err = parse("x := (1 + 2\ny := 3").unwrap_err();
    let span = err.span().unwrap();
    assert_eq!((span.line, span.column), (2, 0));
}
