//! Math functions and constants of the root scope.

use std::collections::HashMap;
use std::f64::consts::{LN_2, PI};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{
    evaluator::EvalError,
    value::{Builtin, Function, Value},
};

fn number(value: &Value, function: &str) -> Result<f64, EvalError> {
    value.as_number().ok_or_else(|| {
        EvalError::type_error(format!(
            "{}() requires a number, not {}",
            function,
            value.type_name()
        ))
    })
}

fn integer(value: &Value, function: &str) -> Result<i64, EvalError> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(EvalError::type_error(format!(
            "{}() requires an integer, not {}",
            function,
            other.type_name()
        ))),
    }
}

fn domain_error(function: &str) -> EvalError {
    EvalError::runtime(format!("math domain error in {}()", function))
}

/// Apply `f`, treating a NaN produced from a non-NaN input as a domain error.
fn real(x: f64, function: &str, f: fn(f64) -> f64) -> Result<Value, EvalError> {
    let y = f(x);
    if y.is_nan() && !x.is_nan() {
        return Err(domain_error(function));
    }
    Ok(Value::Float(y))
}

fn logarithm(x: f64, function: &str, f: fn(f64) -> f64) -> Result<Value, EvalError> {
    if x <= 0.0 {
        return Err(domain_error(function));
    }
    real(x, function, f)
}

/// Float to integer, as `floor`/`ceil`/`round` return.
fn to_integer(x: f64, function: &str) -> Result<Value, EvalError> {
    if !x.is_finite() {
        return Err(EvalError::runtime(format!(
            "{}() cannot convert {} to an integer",
            function, x
        )));
    }
    if x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err(EvalError::runtime(format!("{}() result out of range", function)));
    }
    Ok(Value::Integer(x as i64))
}

macro_rules! unary {
    ($name:literal, $f:expr) => {
        Builtin {
            name: $name,
            min_arity: 1,
            max_arity: 1,
            call: |a| real(number(&a[0], $name)?, $name, $f),
        }
    };
}

macro_rules! logarithmic {
    ($name:literal, $f:expr) => {
        Builtin {
            name: $name,
            min_arity: 1,
            max_arity: 1,
            call: |a| logarithm(number(&a[0], $name)?, $name, $f),
        }
    };
}

macro_rules! binary {
    ($name:literal, $f:expr) => {
        Builtin {
            name: $name,
            min_arity: 2,
            max_arity: 2,
            call: |a| {
                let f: fn(f64, f64) -> f64 = $f;
                Ok(Value::Float(f(number(&a[0], $name)?, number(&a[1], $name)?)))
            },
        }
    };
}

macro_rules! predicate {
    ($name:literal, $f:expr) => {
        Builtin {
            name: $name,
            min_arity: 1,
            max_arity: 1,
            call: |a| {
                let f: fn(f64) -> bool = $f;
                Ok(Value::Boolean(f(number(&a[0], $name)?)))
            },
        }
    };
}

fn log(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "log")?;
    match arguments.get(1) {
        None => logarithm(x, "log", f64::ln),
        Some(base) => {
            let base = number(base, "log")?;
            if x <= 0.0 || base <= 0.0 || base == 1.0 {
                return Err(domain_error("log"));
            }
            Ok(Value::Float(x.ln() / base.ln()))
        }
    }
}

fn log1p(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "log1p")?;
    if x <= -1.0 {
        return Err(domain_error("log1p"));
    }
    Ok(Value::Float(libm::log1p(x)))
}

fn is_pole(x: f64) -> bool {
    x <= 0.0 && x.fract() == 0.0
}

fn gamma(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "gamma")?;
    if is_pole(x) {
        return Err(domain_error("gamma"));
    }
    Ok(Value::Float(libm::tgamma(x)))
}

fn lgamma(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "lgamma")?;
    if is_pole(x) {
        return Err(domain_error("lgamma"));
    }
    Ok(Value::Float(libm::lgamma(x)))
}

fn factorial(arguments: &[Value]) -> Result<Value, EvalError> {
    let n = integer(&arguments[0], "factorial")?;
    if n < 0 {
        return Err(EvalError::runtime(
            "factorial() not defined for negative values",
        ));
    }
    (2..=n)
        .try_fold(1i64, |acc, k| acc.checked_mul(k))
        .map(Value::Integer)
        .ok_or_else(|| EvalError::runtime(format!("factorial({}) overflows an integer", n)))
}

fn abs(arguments: &[Value]) -> Result<Value, EvalError> {
    match &arguments[0] {
        Value::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or_else(|| EvalError::runtime("integer overflow in abs()")),
        other => Ok(Value::Float(number(other, "abs")?.abs())),
    }
}

/// Round half to even. Without `ndigits` the result
/// is an integer.
fn round(arguments: &[Value]) -> Result<Value, EvalError> {
    let ndigits = match arguments.get(1) {
        Some(n) => Some(integer(n, "round")?),
        None => None,
    };
    if let Value::Integer(n) = &arguments[0]
        && ndigits.is_none_or(|d| d >= 0)
    {
        return Ok(Value::Integer(*n));
    }
    let x = number(&arguments[0], "round")?;

    match ndigits {
        None => match Decimal::from_f64_retain(x) {
            Some(decimal) => decimal
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_i64()
                .map(Value::Integer)
                .ok_or_else(|| EvalError::runtime("round() result out of range")),
            None => to_integer(x.round_ties_even(), "round"),
        },
        Some(digits) if digits >= 0 => {
            let rounded = Decimal::from_f64_retain(x)
                .filter(|_| digits <= 28)
                .map(|decimal| {
                    decimal.round_dp_with_strategy(
                        digits as u32,
                        RoundingStrategy::MidpointNearestEven,
                    )
                })
                .and_then(|decimal| decimal.to_f64());
            Ok(Value::Float(rounded.unwrap_or(x)))
        }
        Some(digits) => {
            let scale = 10f64.powi(i32::try_from(-digits).unwrap_or(i32::MAX));
            let rounded = (x / scale).round_ties_even() * scale;
            match &arguments[0] {
                Value::Integer(_) => to_integer(rounded, "round"),
                _ => Ok(Value::Float(rounded)),
            }
        }
    }
}

fn floor(arguments: &[Value]) -> Result<Value, EvalError> {
    match &arguments[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        other => to_integer(number(other, "floor")?.floor(), "floor"),
    }
}

fn ceil(arguments: &[Value]) -> Result<Value, EvalError> {
    match &arguments[0] {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        other => to_integer(number(other, "ceil")?.ceil(), "ceil"),
    }
}

fn sign(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "sign")?;
    Ok(Value::Integer(if x < 0.0 {
        -1
    } else if x > 0.0 {
        1
    } else {
        0
    }))
}

fn heaviside(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "heaviside")?;
    if x < 0.0 {
        return Ok(Value::Integer(0));
    }
    if x > 0.0 {
        return Ok(Value::Integer(1));
    }
    match arguments.get(1) {
        Some(middle) => {
            number(middle, "heaviside")?;
            Ok(middle.clone())
        }
        None => Ok(Value::Float(0.5)),
    }
}

fn logaddexp(x: f64, y: f64) -> f64 {
    if x == y {
        return x + LN_2;
    }
    let (hi, lo) = if x > y { (x, y) } else { (y, x) };
    hi + libm::log1p((lo - hi).exp())
}

fn logaddexp2(x: f64, y: f64) -> f64 {
    if x == y {
        return x + 1.0;
    }
    let (hi, lo) = if x > y { (x, y) } else { (y, x) };
    hi + libm::log1p((lo - hi).exp2()) / LN_2
}

fn ldexp(arguments: &[Value]) -> Result<Value, EvalError> {
    let x = number(&arguments[0], "ldexp")?;
    let exponent = integer(&arguments[1], "ldexp")?;
    let exponent = exponent.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    Ok(Value::Float(libm::ldexp(x, exponent)))
}

static BUILTINS: &[Builtin] = &[
    // basic math
    unary!("sqrt", f64::sqrt),
    unary!("exp", f64::exp),
    unary!("exp2", f64::exp2),
    Builtin {
        name: "log",
        min_arity: 1,
        max_arity: 2,
        call: log,
    },
    logarithmic!("log2", f64::log2),
    logarithmic!("log10", f64::log10),
    unary!("sin", f64::sin),
    unary!("cos", f64::cos),
    unary!("tan", f64::tan),
    unary!("arcsin", f64::asin),
    unary!("arccos", f64::acos),
    unary!("arctan", f64::atan),
    binary!("arctan2", f64::atan2),
    binary!("hypot", f64::hypot),
    unary!("rad2deg", |x| x * 180.0 / PI),
    unary!("deg2rad", |x| x * PI / 180.0),
    unary!("sinh", f64::sinh),
    unary!("cosh", f64::cosh),
    unary!("tanh", f64::tanh),
    unary!("arcsinh", f64::asinh),
    unary!("arccosh", f64::acosh),
    unary!("arctanh", f64::atanh),
    // special functions
    unary!("erf", libm::erf),
    unary!("erfc", libm::erfc),
    Builtin {
        name: "factorial",
        min_arity: 1,
        max_arity: 1,
        call: factorial,
    },
    Builtin {
        name: "gamma",
        min_arity: 1,
        max_arity: 1,
        call: gamma,
    },
    Builtin {
        name: "lgamma",
        min_arity: 1,
        max_arity: 1,
        call: lgamma,
    },
    // rounding and discontinuous
    Builtin {
        name: "abs",
        min_arity: 1,
        max_arity: 1,
        call: abs,
    },
    Builtin {
        name: "round",
        min_arity: 1,
        max_arity: 2,
        call: round,
    },
    Builtin {
        name: "floor",
        min_arity: 1,
        max_arity: 1,
        call: floor,
    },
    Builtin {
        name: "ceil",
        min_arity: 1,
        max_arity: 1,
        call: ceil,
    },
    Builtin {
        name: "sign",
        min_arity: 1,
        max_arity: 1,
        call: sign,
    },
    Builtin {
        name: "heaviside",
        min_arity: 1,
        max_arity: 2,
        call: heaviside,
    },
    // common combinations
    unary!("expm1", libm::expm1),
    Builtin {
        name: "log1p",
        min_arity: 1,
        max_arity: 1,
        call: log1p,
    },
    Builtin {
        name: "ldexp",
        min_arity: 2,
        max_arity: 2,
        call: ldexp,
    },
    binary!("logaddexp", logaddexp),
    binary!("logaddexp2", logaddexp2),
    // number type
    predicate!("isfinite", f64::is_finite),
    predicate!("isinf", f64::is_infinite),
    predicate!("isnan", f64::is_nan),
    // bit-level detail
    unary!("nextafter", |x| libm::nextafter(x, f64::INFINITY)),
    unary!("nextbefore", |x| libm::nextafter(x, f64::NEG_INFINITY)),
    binary!("nexttoward", libm::nextafter),
];

/// The root-scope bindings: every builtin function plus `pi`.
pub fn standard() -> HashMap<String, Value> {
    let mut symbols: HashMap<String, Value> = BUILTINS
        .iter()
        .map(|builtin| {
            (
                builtin.name.to_string(),
                Value::Function(Function::Builtin(builtin)),
            )
        })
        .collect();
    symbols.insert("pi".to_string(), Value::Float(PI));
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &[Value]) -> Result<Value, EvalError> {
        let symbols = standard();
        symbols[name].call(arguments)
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(call("round", &[Value::Float(2.5)]), Ok(Value::Integer(2)));
        assert_eq!(call("round", &[Value::Float(3.5)]), Ok(Value::Integer(4)));
        assert_eq!(call("round", &[Value::Float(-0.5)]), Ok(Value::Integer(0)));
        assert_eq!(
            call("round", &[Value::Float(2.675), Value::Integer(2)]),
            Ok(Value::Float(2.67))
        );
        assert_eq!(
            call("round", &[Value::Integer(1250), Value::Integer(-2)]),
            Ok(Value::Integer(1200))
        );
    }

    #[test]
    fn test_integer_results() {
        assert_eq!(call("floor", &[Value::Float(-1.5)]), Ok(Value::Integer(-2)));
        assert_eq!(call("ceil", &[Value::Float(1.2)]), Ok(Value::Integer(2)));
        assert_eq!(call("factorial", &[Value::Integer(5)]), Ok(Value::Integer(120)));
        assert_eq!(call("abs", &[Value::Integer(-3)]), Ok(Value::Integer(3)));
        assert_eq!(call("sign", &[Value::Float(-0.1)]), Ok(Value::Integer(-1)));
    }

    #[test]
    fn test_domain_errors() {
        assert!(matches!(
            call("factorial", &[Value::Integer(-1)]),
            Err(EvalError::Runtime { .. })
        ));
        assert!(matches!(
            call("sqrt", &[Value::Float(-1.0)]),
            Err(EvalError::Runtime { .. })
        ));
        assert!(matches!(
            call("log", &[Value::Integer(0)]),
            Err(EvalError::Runtime { .. })
        ));
        assert!(matches!(
            call("sqrt", &[Value::String("x".into())]),
            Err(EvalError::Type { .. })
        ));
        assert!(matches!(
            call("sqrt", &[]),
            Err(EvalError::Type { .. })
        ));
    }

    #[test]
    fn test_heaviside_middle() {
        assert_eq!(call("heaviside", &[Value::Integer(0)]), Ok(Value::Float(0.5)));
        assert_eq!(
            call("heaviside", &[Value::Integer(0), Value::Integer(7)]),
            Ok(Value::Integer(7))
        );
        assert_eq!(call("heaviside", &[Value::Float(-2.0)]), Ok(Value::Integer(0)));
    }

    #[test]
    fn test_special_functions() {
        let close = |value: Value, expected: f64| {
            (value.as_number().unwrap() - expected).abs() < 1e-12
        };
        assert!(close(call("gamma", &[Value::Integer(5)]).unwrap(), 24.0));
        assert!(close(call("erf", &[Value::Integer(0)]).unwrap(), 0.0));
        assert!(close(
            call("logaddexp", &[Value::Float(0.0), Value::Float(0.0)]).unwrap(),
            LN_2
        ));
        assert!(close(
            call("log", &[Value::Integer(8), Value::Integer(2)]).unwrap(),
            3.0
        ));
        let next = call("nextafter", &[Value::Float(1.0)]).unwrap();
        assert!(next.as_number().unwrap() > 1.0);
    }
}
