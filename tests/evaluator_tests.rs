// tests/evaluator_tests.rs

use std::collections::BTreeMap;
use std::rc::Rc;

use adl_lang::evaluator::{EvalError, bind, evaluate};
use adl_lang::{Builtins, Scope, Value, parse, parse_expression};

fn root(data: &[(&str, Value)]) -> Scope<'static> {
    Scope::root(
        Rc::new(Builtins::standard()),
        data.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect::<Vec<_>>(),
    )
}

fn eval_with(source: &str, data: &[(&str, Value)]) -> Result<Value, EvalError> {
    let expr = parse_expression(source).unwrap();
    evaluate(&expr, &root(data))
}

fn eval(source: &str) -> Value {
    eval_with(source, &[]).unwrap()
}

fn eval_err(source: &str, data: &[(&str, Value)]) -> EvalError {
    eval_with(source, data).unwrap_err()
}

fn float(value: Value) -> f64 {
    match value {
        Value::Float(x) => x,
        other => panic!("expected a float, got {:?}", other),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

fn particle(fields: &[(&str, f64)]) -> Value {
    Value::record(
        fields
            .iter()
            .map(|(name, x)| (name.to_string(), Value::Float(*x)))
            .collect::<BTreeMap<_, _>>(),
    )
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_integer_arithmetic_stays_integer() {
    assert!(matches!(eval("1 + 2"), Value::Integer(3)));
    assert!(matches!(eval("7 - 10"), Value::Integer(-3)));
    assert!(matches!(eval("6 * 7"), Value::Integer(42)));
    assert!(matches!(eval("2 ** 10"), Value::Integer(1024)));
}

#[test]
fn test_mixed_arithmetic_is_float() {
    assert!(matches!(eval("1 + 2.0"), Value::Float(x) if x == 3.0));
    assert!(matches!(eval("2 ** -1"), Value::Float(x) if x == 0.5));
    assert!(close(float(eval("2.0 ** 0.5")), 2f64.sqrt()));
}

#[test]
fn test_division_is_always_float() {
    assert!(matches!(eval("7 / 2"), Value::Float(x) if x == 3.5));
    assert!(matches!(eval("4 / 2"), Value::Float(x) if x == 2.0));
}

#[test]
fn test_modulo_takes_sign_of_divisor() {
    assert_eq!(eval("-7 % 3"), Value::Integer(2));
    assert_eq!(eval("7 % -3"), Value::Integer(-2));
    assert_eq!(eval("7 % 3"), Value::Integer(1));
    assert!(close(float(eval("7.5 % 2")), 1.5));
    assert!(close(float(eval("-7.5 % 2")), 0.5));
}

#[test]
fn test_numeric_runtime_errors() {
    for source in ["1 / 0", "1 % 0", "0.0 ** -1", "9223372036854775807 + 1"] {
        let err = eval_err(source, &[]);
        assert!(
            matches!(err, EvalError::Runtime { .. }),
            "Failed for input: {} ({:?})",
            source,
            err
        );
    }
    assert_eq!(eval_err("1 / 0", &[]).message(), "division by zero");
}

#[test]
fn test_strings_are_not_numbers() {
    for source in ["'ab' + 'cd'", "'abc' < 'abd'", "'a' >= 'b'", "'a' * 2", "1 > 'a'"] {
        let err = eval_err(source, &[]);
        assert!(
            matches!(err, EvalError::Type { .. }),
            "Failed for input: {} ({:?})",
            source,
            err
        );
    }
    assert_eq!(eval_err("'ab' + 'cd'", &[]).message(), "value is not a number: \"ab\"");
    assert_eq!(eval("'ab' == 'ab'"), Value::Boolean(true));
}

// ============================================================================
// Comparison and logic
// ============================================================================

#[test]
fn test_comparisons() {
    assert_eq!(eval("1 < 2 < 3"), Value::Boolean(true));
    assert_eq!(eval("3 > 2 > 2"), Value::Boolean(false));
    assert_eq!(eval("1 == 1.0"), Value::Boolean(true));
    assert_eq!(eval("'a' == 1"), Value::Boolean(false));
    assert_eq!(eval("'a' != 1"), Value::Boolean(true));
    assert_eq!(eval("2 >= 2.0"), Value::Boolean(true));
}

#[test]
fn test_ordering_requires_numbers() {
    let err = eval_err("1 < 'a'", &[]);
    assert!(matches!(err, EvalError::Type { .. }));
    assert_eq!(err.message(), "value is not a number: \"a\"");
}

#[test]
fn test_logic() {
    assert_eq!(eval("1 < 2 and 'x' == 'x'"), Value::Boolean(true));
    assert_eq!(eval("1 > 2 or not 1 > 2"), Value::Boolean(true));

    let err = eval_err("not 1", &[]);
    assert_eq!(err.message(), "value is not a boolean: 1");
}

// ============================================================================
// Names and positions
// ============================================================================

#[test]
fn test_unknown_name() {
    let err = eval_err("y + 1", &[]);
    let EvalError::Name { name, span } = &err else {
        panic!("expected a name error, got {:?}", err);
    };
    assert_eq!(name, "y");
    assert_eq!(span.map(|s| (s.start, s.end)), Some((0, 1)));
    assert_eq!(err.message(), "no symbol named 'y' in this scope");
}

#[test]
fn test_errors_point_at_the_failing_call() {
    let err = eval_err("1 + 10 / (2 - 2)", &[]);
    let span = err.span().unwrap();
    assert_eq!((span.start, span.end), (4, 16));
}

// ============================================================================
// Lists
// ============================================================================

fn lists() -> Vec<(&'static str, Value)> {
    vec![
        ("xs", Value::from(vec![3i64, 1, 2])),
        ("ys", Value::from(vec![10i64, 20])),
        ("empty", Value::list(vec![])),
        ("nested", Value::from(vec![vec![1i64], vec![2, 3]])),
        ("k", Value::Integer(10)),
    ]
}

#[test]
fn test_map_and_filter() {
    let data = lists();
    assert_eq!(
        eval_with("xs.map(x -> x * 2)", &data).unwrap(),
        Value::from(vec![6i64, 2, 4])
    );
    assert_eq!(
        eval_with("xs.filter(x -> x > 1)", &data).unwrap(),
        Value::from(vec![3i64, 2])
    );
    assert_eq!(
        eval_with("xs.map(x -> x + k)", &data).unwrap(),
        Value::from(vec![13i64, 11, 12])
    );
}

#[test]
fn test_filter_requires_booleans() {
    let err = eval_err("xs.filter(x -> x)", &lists());
    assert!(matches!(err, EvalError::Type { .. }));
}

#[test]
fn test_min_and_max() {
    let data = lists();
    assert_eq!(eval_with("xs.min()", &data).unwrap(), Value::Integer(1));
    assert_eq!(eval_with("xs.max()", &data).unwrap(), Value::Integer(3));
    assert_eq!(
        eval_with("empty.min()", &data).unwrap(),
        Value::Float(f64::INFINITY)
    );
    assert_eq!(
        eval_with("empty.max()", &data).unwrap(),
        Value::Float(f64::NEG_INFINITY)
    );
}

#[test]
fn test_minby_and_maxby_return_a_list() {
    let data = lists();
    assert_eq!(
        eval_with("xs.minby(x -> -x)", &data).unwrap(),
        Value::from(vec![3i64])
    );
    assert_eq!(
        eval_with("xs.maxby(x -> -x)", &data).unwrap(),
        Value::from(vec![1i64])
    );
    assert_eq!(
        eval_with("empty.maxby(x -> x)", &data).unwrap(),
        Value::list(vec![])
    );
}

#[test]
fn test_combinatorics() {
    let data = lists();
    let pairs = eval_with("xs.pairs()", &data).unwrap();
    assert_eq!(pairs.as_sequence().map(<[Value]>::len), Some(6));
    let distincts = eval_with("xs.distincts()", &data).unwrap();
    assert_eq!(distincts.as_sequence().map(<[Value]>::len), Some(3));
    assert_eq!(
        distincts.as_sequence().unwrap()[0],
        Value::tuple(vec![Value::Integer(3), Value::Integer(1)])
    );

    let crossed = eval_with("xs.cross(ys)", &data).unwrap();
    let crossed = crossed.as_sequence().unwrap();
    assert_eq!(crossed.len(), 6);
    assert_eq!(
        crossed[1],
        Value::tuple(vec![Value::Integer(3), Value::Integer(20)])
    );

    let triples = eval_with("xs.cross(ys).cross(ys)", &data).unwrap();
    assert_eq!(
        triples.as_sequence().unwrap()[0],
        Value::tuple(vec![Value::Integer(3), Value::Integer(10), Value::Integer(10)])
    );
}

#[test]
fn test_flatten() {
    let data = lists();
    assert_eq!(
        eval_with("nested.flatten()", &data).unwrap(),
        Value::from(vec![1i64, 2, 3])
    );
}

#[test]
fn test_lists_do_not_add() {
    let data = lists();
    assert!(matches!(eval_err("xs + ys", &data), EvalError::Type { .. }));
    assert!(matches!(eval_err("xs < ys", &data), EvalError::Type { .. }));
}

#[test]
fn test_subscripts() {
    let data = lists();
    assert_eq!(eval_with("xs[0]", &data).unwrap(), Value::Integer(3));
    assert_eq!(eval_with("xs[-1]", &data).unwrap(), Value::Integer(2));
    assert!(matches!(
        eval_err("xs[3]", &data),
        EvalError::Runtime { .. }
    ));
}

#[test]
fn test_unknown_methods_and_arity() {
    let data = lists();
    assert_eq!(
        eval_err("xs.bogus", &data).message(),
        "lists do not have a method named 'bogus'"
    );
    assert_eq!(
        eval_err("xs.map()", &data).message(),
        "map takes 1 arguments (0 given)"
    );
}

// ============================================================================
// Records and Lorentz vectors
// ============================================================================

#[test]
fn test_record_fields() {
    let data = [(
        "r",
        Value::record(BTreeMap::from([("charge".to_string(), Value::Integer(-1))])),
    )];
    assert_eq!(eval_with("r.charge", &data).unwrap(), Value::Integer(-1));
    assert_eq!(eval_with("r['charge']", &data).unwrap(), Value::Integer(-1));
    assert_eq!(
        eval_err("r.missing", &data).message(),
        "record has no field named 'missing'"
    );
    assert_eq!(
        eval_err("k.pt", &[("k", Value::Integer(1))]).message(),
        "integer value has no attribute 'pt'"
    );
}

#[test]
fn test_cylindrical_members() {
    let data = [(
        "p",
        particle(&[("pt", 30.0), ("eta", 0.0), ("phi", 0.0), ("mass", 0.0)]),
    )];
    assert!(close(float(eval_with("p.pt", &data).unwrap()), 30.0));
    assert!(close(float(eval_with("p.px", &data).unwrap()), 30.0));
    assert!(close(float(eval_with("p.py", &data).unwrap()), 0.0));
    assert!(close(float(eval_with("p.energy", &data).unwrap()), 30.0));
}

#[test]
fn test_cartesian_members() {
    let data = [(
        "p",
        particle(&[("px", 3.0), ("py", 4.0), ("pz", 0.0), ("energy", 13.0)]),
    )];
    assert!(close(float(eval_with("p.pt", &data).unwrap()), 5.0));
    assert!(close(float(eval_with("p.mass", &data).unwrap()), 12.0));
    assert!(close(float(eval_with("p.eta", &data).unwrap()), 0.0));
}

#[test]
fn test_lorentz_methods() {
    let data = [
        (
            "a",
            particle(&[("pt", 10.0), ("eta", 0.0), ("phi", 0.0), ("mass", 0.0)]),
        ),
        (
            "b",
            particle(&[("pt", 10.0), ("eta", 0.3), ("phi", 0.4), ("mass", 0.0)]),
        ),
    ];
    assert!(close(float(eval_with("a.delta_r(b)", &data).unwrap()), 0.5));
    assert!(close(float(eval_with("b.delta_phi(a)", &data).unwrap()), 0.4));
    assert!(matches!(
        eval_err("a.delta_r(1)", &data),
        EvalError::Type { .. }
    ));
}

// ============================================================================
// Builtins
// ============================================================================

#[test]
fn test_math_builtins() {
    assert_eq!(eval("sqrt(16)"), Value::Float(4.0));
    assert_eq!(eval("hypot(3, 4)"), Value::Float(5.0));
    assert_eq!(eval("abs(-3)"), Value::Integer(3));
    assert_eq!(eval("factorial(5)"), Value::Integer(120));
    assert!(close(float(eval("log(100, 10)")), 2.0));
    assert!(close(float(eval("pi")), std::f64::consts::PI));
}

#[test]
fn test_round_half_even() {
    assert!(matches!(eval("round(2.5)"), Value::Integer(2)));
    assert!(matches!(eval("round(3.5)"), Value::Integer(4)));
    assert!(close(float(eval("round(1.25, 1)")), 1.2));
    assert!(close(float(eval("round(1.35, 1)")), 1.4));
}

#[test]
fn test_builtin_errors() {
    assert_eq!(
        eval_err("sqrt(-1)", &[]).message(),
        "math domain error in sqrt()"
    );
    assert_eq!(
        eval_err("sqrt()", &[]).message(),
        "sqrt takes 1 arguments (0 given)"
    );
    assert_eq!(
        eval_err("sqrt('a')", &[]).message(),
        "sqrt() requires a number, not string"
    );
    assert!(matches!(eval_err("3(1)", &[]), EvalError::Type { .. }));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_inline_call() {
    assert_eq!(eval("(x -> x + 1)(2)"), Value::Integer(3));
    assert_eq!(eval("((a, b) -> a * b)(3, 4)"), Value::Integer(12));
    assert_eq!(
        eval_err("(x -> x)(1, 2)", &[]).message(),
        "wrong number of arguments: expecting 1, encountered 2"
    );
}

#[test]
fn test_closures_capture_their_definition_scope() {
    let mut scope = root(&[]);
    for statement in &parse("a := 1\nf(x) := x + a\na := 10").unwrap().block {
        bind(statement, &mut scope).unwrap();
    }
    let call = parse_expression("f(1)").unwrap();
    assert_eq!(evaluate(&call, &scope).unwrap(), Value::Integer(2));
    let a = parse_expression("a").unwrap();
    assert_eq!(evaluate(&a, &scope).unwrap(), Value::Integer(10));
}

#[test]
fn test_block_function_bodies() {
    let mut scope = root(&[]);
    for statement in &parse("f(x) := { y := x * 2; y + 1 }").unwrap().block {
        bind(statement, &mut scope).unwrap();
    }
    let call = parse_expression("f(4)").unwrap();
    assert_eq!(evaluate(&call, &scope).unwrap(), Value::Integer(9));
}

#[test]
fn test_external_functions() {
    let data = [
        (
            "arity",
            Value::external(|arguments| Ok(Value::Integer(arguments.len() as i64))),
        ),
        (
            "fail",
            Value::external(|_| Err(EvalError::foreign("boom"))),
        ),
    ];
    assert_eq!(
        eval_with("arity(1, 2, 3)", &data).unwrap(),
        Value::Integer(3)
    );
    let err = eval_err("fail()", &data);
    assert_eq!(err.message(), "function raised boom");
    assert!(err.span().is_some());
}
