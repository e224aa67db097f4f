//! Operator and method dispatch.
//!
//! Every [`Special`] tag owns an ordered table of signatures. A signature's
//! `accepts` predicate looks at the evaluated arguments; the first signature
//! that accepts them is applied. A predicate may also reject its arguments
//! outright with a type error, which stops the search: requirement
//! predicates are therefore placed after the permissive ones.

use std::rc::Rc;

use crate::{
    ast::{Special, Span},
    evaluator::EvalError,
    kinematics::{LorentzMethod, LorentzVector, Member},
    value::{BoundMethod, Function, Value},
};

type Predicate = fn(&[Value]) -> Result<bool, EvalError>;
type Implementation = fn(&[Value]) -> Result<Value, EvalError>;

pub struct Signature {
    pub accepts: Predicate,
    pub apply: Implementation,
}

const fn sig(accepts: Predicate, apply: Implementation) -> Signature {
    Signature { accepts, apply }
}

/// A method produced by attribute access, applied when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    List(ListMethod),
    Lorentz(LorentzMethod),
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::List(method) => method.name(),
            Method::Lorentz(method) => method.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    Map,
    Filter,
    Flatten,
    Cross,
    Pairs,
    Distincts,
    Min,
    Max,
    MinBy,
    MaxBy,
}

impl ListMethod {
    pub fn from_name(name: &str) -> Option<ListMethod> {
        let method = match name {
            "map" => ListMethod::Map,
            "filter" => ListMethod::Filter,
            "flatten" => ListMethod::Flatten,
            "cross" => ListMethod::Cross,
            "pairs" => ListMethod::Pairs,
            "distincts" => ListMethod::Distincts,
            "min" => ListMethod::Min,
            "max" => ListMethod::Max,
            "minby" => ListMethod::MinBy,
            "maxby" => ListMethod::MaxBy,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(self) -> &'static str {
        match self {
            ListMethod::Map => "map",
            ListMethod::Filter => "filter",
            ListMethod::Flatten => "flatten",
            ListMethod::Cross => "cross",
            ListMethod::Pairs => "pairs",
            ListMethod::Distincts => "distincts",
            ListMethod::Min => "min",
            ListMethod::Max => "max",
            ListMethod::MinBy => "minby",
            ListMethod::MaxBy => "maxby",
        }
    }

    fn arity(self) -> usize {
        match self {
            ListMethod::Map
            | ListMethod::Filter
            | ListMethod::Cross
            | ListMethod::MinBy
            | ListMethod::MaxBy => 1,
            ListMethod::Flatten
            | ListMethod::Pairs
            | ListMethod::Distincts
            | ListMethod::Min
            | ListMethod::Max => 0,
        }
    }
}

/// Apply an operator tag to evaluated arguments.
pub fn apply(special: Special, arguments: &[Value], span: Span) -> Result<Value, EvalError> {
    for signature in table(special) {
        if (signature.accepts)(arguments).map_err(|err| err.or_at(span))? {
            return (signature.apply)(arguments).map_err(|err| err.or_at(span));
        }
    }
    let types: Vec<&str> = arguments.iter().map(Value::type_name).collect();
    Err(EvalError::type_error(format!(
        "'{}' does not apply to ({})",
        special.symbol(),
        types.join(", ")
    ))
    .or_at(span))
}

/// The ordered signatures of one tag.
pub fn table(special: Special) -> &'static [Signature] {
    match special {
        Special::Attribute => ATTRIBUTE,
        Special::Subscript => SUBSCRIPT,
        Special::Or => OR,
        Special::And => AND,
        Special::Not => NOT,
        Special::Equal => EQUAL,
        Special::NotEqual => NOT_EQUAL,
        Special::LessEqual => LESS_EQUAL,
        Special::Less => LESS,
        Special::GreaterEqual => GREATER_EQUAL,
        Special::Greater => GREATER,
        Special::Plus => PLUS,
        Special::Minus => MINUS,
        Special::Times => TIMES,
        Special::Divide => DIVIDE,
        Special::Modulo => MODULO,
        Special::UnaryPlus => UNARY_PLUS,
        Special::UnaryMinus => UNARY_MINUS,
        Special::Power => POWER,
    }
}

static ATTRIBUTE: &[Signature] = &[
    sig(is_list_receiver, list_attribute),
    sig(is_cartesian_receiver, lorentz_attribute),
    sig(is_cylindrical_receiver, lorentz_attribute),
    sig(is_record_receiver, record_field),
    sig(always, no_attribute),
];

static SUBSCRIPT: &[Signature] = &[
    sig(is_sequence_index, sequence_item),
    sig(is_record_key, record_item),
];

static OR: &[Signature] = &[sig(require_booleans, |a| Ok(Value::Boolean(truth(&a[0]) || truth(&a[1]))))];
static AND: &[Signature] = &[sig(require_booleans, |a| Ok(Value::Boolean(truth(&a[0]) && truth(&a[1]))))];
static NOT: &[Signature] = &[sig(require_booleans, |a| Ok(Value::Boolean(!truth(&a[0]))))];

static EQUAL: &[Signature] = &[sig(pair, |a| Ok(Value::Boolean(a[0] == a[1])))];
static NOT_EQUAL: &[Signature] = &[sig(pair, |a| Ok(Value::Boolean(a[0] != a[1])))];

static LESS_EQUAL: &[Signature] = &[sig(require_numbers, |a| Ok(Value::Boolean(num(&a[0]) <= num(&a[1]))))];
static LESS: &[Signature] = &[sig(require_numbers, |a| Ok(Value::Boolean(num(&a[0]) < num(&a[1]))))];
static GREATER_EQUAL: &[Signature] = &[sig(require_numbers, |a| Ok(Value::Boolean(num(&a[0]) >= num(&a[1]))))];
static GREATER: &[Signature] = &[sig(require_numbers, |a| Ok(Value::Boolean(num(&a[0]) > num(&a[1]))))];

static PLUS: &[Signature] = &[
    sig(integers, |a| checked(int(&a[0]).checked_add(int(&a[1])), "+")),
    sig(require_numbers, |a| Ok(Value::Float(num(&a[0]) + num(&a[1])))),
];
static MINUS: &[Signature] = &[
    sig(integers, |a| checked(int(&a[0]).checked_sub(int(&a[1])), "-")),
    sig(require_numbers, |a| Ok(Value::Float(num(&a[0]) - num(&a[1])))),
];
static TIMES: &[Signature] = &[
    sig(integers, |a| checked(int(&a[0]).checked_mul(int(&a[1])), "*")),
    sig(require_numbers, |a| Ok(Value::Float(num(&a[0]) * num(&a[1])))),
];
static DIVIDE: &[Signature] = &[sig(require_numbers, divide)];
static MODULO: &[Signature] = &[
    sig(integers, integer_modulo),
    sig(require_numbers, float_modulo),
];
static UNARY_PLUS: &[Signature] = &[
    sig(integers, |a| Ok(Value::Integer(int(&a[0])))),
    sig(require_numbers, |a| Ok(Value::Float(num(&a[0])))),
];
static UNARY_MINUS: &[Signature] = &[
    sig(integers, |a| checked(int(&a[0]).checked_neg(), "unary -")),
    sig(require_numbers, |a| Ok(Value::Float(-num(&a[0])))),
];
static POWER: &[Signature] = &[
    sig(integer_power_operands, integer_power),
    sig(require_numbers, float_power),
];

// Accessors, only called after a predicate has checked the type.

fn num(value: &Value) -> f64 {
    value.as_number().unwrap_or(f64::NAN)
}

fn int(value: &Value) -> i64 {
    match value {
        Value::Integer(n) => *n,
        _ => 0,
    }
}

fn truth(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

fn text(value: &Value) -> &str {
    match value {
        Value::String(s) => s,
        _ => "",
    }
}

fn checked(result: Option<i64>, operator: &str) -> Result<Value, EvalError> {
    result
        .map(Value::Integer)
        .ok_or_else(|| EvalError::runtime(format!("integer overflow in '{}'", operator)))
}

// Predicates

fn always(_: &[Value]) -> Result<bool, EvalError> {
    Ok(true)
}

fn pair(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(arguments.len() == 2)
}

fn integers(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(arguments.iter().all(|a| matches!(a, Value::Integer(_))))
}

fn require_numbers(arguments: &[Value]) -> Result<bool, EvalError> {
    match arguments.iter().find(|a| a.as_number().is_none()) {
        Some(bad) => Err(EvalError::type_error(format!(
            "value is not a number: {}",
            bad
        ))),
        None => Ok(true),
    }
}

fn require_booleans(arguments: &[Value]) -> Result<bool, EvalError> {
    match arguments.iter().find(|a| a.as_bool().is_none()) {
        Some(bad) => Err(EvalError::type_error(format!(
            "value is not a boolean: {}",
            bad
        ))),
        None => Ok(true),
    }
}

fn integer_power_operands(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(matches!(arguments, [Value::Integer(_), Value::Integer(e)] if *e >= 0))
}

fn attribute_name(arguments: &[Value]) -> &str {
    arguments.get(1).map_or("", text)
}

fn is_list_receiver(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(matches!(arguments.first(), Some(Value::List(_) | Value::Tuple(_))))
}

fn kinematic_receiver(arguments: &[Value], cartesian: bool) -> bool {
    let name = attribute_name(arguments);
    let is_member = Member::from_name(name).is_some() || LorentzMethod::from_name(name).is_some();
    is_member
        && matches!(
            arguments.first(),
            Some(Value::Record(record))
                if record.kinematics().is_some_and(|v| v.is_cartesian() == cartesian)
        )
}

fn is_cartesian_receiver(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(kinematic_receiver(arguments, true))
}

fn is_cylindrical_receiver(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(kinematic_receiver(arguments, false))
}

fn is_record_receiver(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(matches!(arguments.first(), Some(Value::Record(_))))
}

fn is_sequence_index(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(matches!(
        arguments,
        [Value::List(_) | Value::Tuple(_), Value::Integer(_)]
    ))
}

fn is_record_key(arguments: &[Value]) -> Result<bool, EvalError> {
    Ok(matches!(arguments, [Value::Record(_), Value::String(_)]))
}

// Attribute and subscript

fn bind(receiver: &Value, method: Method) -> Value {
    Value::Function(Function::Method(Rc::new(BoundMethod {
        receiver: receiver.clone(),
        method,
    })))
}

fn list_attribute(arguments: &[Value]) -> Result<Value, EvalError> {
    let name = attribute_name(arguments);
    match ListMethod::from_name(name) {
        Some(method) => Ok(bind(&arguments[0], Method::List(method))),
        None => Err(EvalError::type_error(format!(
            "lists do not have a method named '{}'",
            name
        ))),
    }
}

fn lorentz_attribute(arguments: &[Value]) -> Result<Value, EvalError> {
    let name = attribute_name(arguments);
    let vector = lorentz(&arguments[0])?;
    if let Some(member) = Member::from_name(name) {
        return Ok(Value::Float(vector.member(member)));
    }
    match LorentzMethod::from_name(name) {
        Some(method) => Ok(bind(&arguments[0], Method::Lorentz(method))),
        None => Err(EvalError::type_error(format!(
            "Lorentz vectors do not have a member named '{}'",
            name
        ))),
    }
}

fn record_field(arguments: &[Value]) -> Result<Value, EvalError> {
    let name = attribute_name(arguments);
    match &arguments[0] {
        Value::Record(record) => record
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::runtime(format!("record has no field named '{}'", name))),
        other => no_attribute(&[other.clone(), Value::String(name.to_string())]),
    }
}

fn no_attribute(arguments: &[Value]) -> Result<Value, EvalError> {
    let receiver = arguments.first().map_or("null", Value::type_name);
    Err(EvalError::type_error(format!(
        "{} value has no attribute '{}'",
        receiver,
        attribute_name(arguments)
    )))
}

fn sequence_item(arguments: &[Value]) -> Result<Value, EvalError> {
    let items = arguments[0].as_sequence().unwrap_or(&[]);
    let index = int(&arguments[1]);
    let resolved = if index < 0 {
        index.checked_add(items.len() as i64)
    } else {
        Some(index)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| {
            EvalError::runtime(format!(
                "index {} out of range for {} of length {}",
                index,
                arguments[0].type_name(),
                items.len()
            ))
        })
}

fn record_item(arguments: &[Value]) -> Result<Value, EvalError> {
    record_field(arguments)
}

// Arithmetic

fn divide(arguments: &[Value]) -> Result<Value, EvalError> {
    let denominator = num(&arguments[1]);
    if denominator == 0.0 {
        return Err(EvalError::runtime("division by zero"));
    }
    Ok(Value::Float(num(&arguments[0]) / denominator))
}

/// Remainder with the sign of the divisor.
fn integer_modulo(arguments: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = (int(&arguments[0]), int(&arguments[1]));
    if b == 0 {
        return Err(EvalError::runtime("modulo by zero"));
    }
    let r = a.wrapping_rem(b);
    Ok(Value::Integer(if r != 0 && (r < 0) != (b < 0) { r + b } else { r }))
}

fn float_modulo(arguments: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = (num(&arguments[0]), num(&arguments[1]));
    if b == 0.0 {
        return Err(EvalError::runtime("modulo by zero"));
    }
    let r = a % b;
    Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
}

fn integer_power(arguments: &[Value]) -> Result<Value, EvalError> {
    let (base, exponent) = (int(&arguments[0]), int(&arguments[1]));
    let result = u32::try_from(exponent)
        .ok()
        .and_then(|e| base.checked_pow(e));
    checked(result, "**")
}

fn float_power(arguments: &[Value]) -> Result<Value, EvalError> {
    let (base, exponent) = (num(&arguments[0]), num(&arguments[1]));
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::runtime(
            "0.0 cannot be raised to a negative power",
        ));
    }
    Ok(Value::Float(base.powf(exponent)))
}

// Bound methods

fn lorentz(value: &Value) -> Result<&LorentzVector, EvalError> {
    match value {
        Value::Record(record) => record.kinematics(),
        _ => None,
    }
    .ok_or_else(|| EvalError::type_error(format!("value is not a Lorentz vector: {}", value)))
}

fn expect_arity(method: Method, arguments: &[Value], arity: usize) -> Result<(), EvalError> {
    if arguments.len() != arity {
        return Err(EvalError::type_error(format!(
            "{} takes {} arguments ({} given)",
            method.name(),
            arity,
            arguments.len()
        )));
    }
    Ok(())
}

/// Call a method bound by attribute access.
pub fn call_method(bound: &BoundMethod, arguments: &[Value]) -> Result<Value, EvalError> {
    match bound.method {
        Method::Lorentz(method) => {
            expect_arity(bound.method, arguments, 1)?;
            let this = lorentz(&bound.receiver)?;
            let other = lorentz(&arguments[0])?;
            Ok(Value::Float(this.method(method, other)))
        }
        Method::List(method) => {
            expect_arity(bound.method, arguments, method.arity())?;
            let items = bound.receiver.as_sequence().unwrap_or(&[]);
            list_method(method, items, arguments)
        }
    }
}

fn improves(best: Option<(f64, &Value)>, x: f64, largest: bool) -> bool {
    best.is_none_or(|(current, _)| if largest { x > current } else { x < current })
}

/// Smallest (or largest) number of a list; infinite when the list is empty.
fn extreme(items: &[Value], largest: bool) -> Result<Value, EvalError> {
    let mut best: Option<(f64, &Value)> = None;
    for item in items {
        let x = item
            .as_number()
            .ok_or_else(|| EvalError::type_error(format!("value is not a number: {}", item)))?;
        if improves(best, x, largest) {
            best = Some((x, item));
        }
    }
    Ok(match best {
        Some((_, item)) => item.clone(),
        None if largest => Value::Float(f64::NEG_INFINITY),
        None => Value::Float(f64::INFINITY),
    })
}

/// Pick the item whose key is smallest (or largest), first one on ties.
fn extreme_by(items: &[Value], key: &Value, largest: bool) -> Result<Value, EvalError> {
    let mut best: Option<(f64, &Value)> = None;
    for item in items {
        let result = key.call(std::slice::from_ref(item))?;
        let score = result.as_number().ok_or_else(|| {
            EvalError::type_error(format!("key function returned a non-number: {}", result))
        })?;
        if improves(best, score, largest) {
            best = Some((score, item));
        }
    }
    Ok(Value::list(best.map(|(_, item)| item.clone()).into_iter().collect()))
}

fn list_method(method: ListMethod, items: &[Value], arguments: &[Value]) -> Result<Value, EvalError> {
    match method {
        ListMethod::Map => {
            let function = &arguments[0];
            let mapped = items
                .iter()
                .map(|item| function.call(std::slice::from_ref(item)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(mapped))
        }
        ListMethod::Filter => {
            let predicate = &arguments[0];
            let mut kept = Vec::new();
            for item in items {
                match predicate.call(std::slice::from_ref(item))? {
                    Value::Boolean(true) => kept.push(item.clone()),
                    Value::Boolean(false) => {}
                    other => {
                        return Err(EvalError::type_error(format!(
                            "filter function returned a non-boolean: {}",
                            other
                        )));
                    }
                }
            }
            Ok(Value::list(kept))
        }
        ListMethod::Flatten => {
            let mut flat = Vec::new();
            for item in items {
                let inner = item.as_sequence().ok_or_else(|| {
                    EvalError::type_error(format!("cannot flatten a non-list item: {}", item))
                })?;
                flat.extend(inner.iter().cloned());
            }
            Ok(Value::list(flat))
        }
        ListMethod::Cross => {
            let others = arguments[0].as_sequence().ok_or_else(|| {
                EvalError::type_error(format!(
                    "cross requires a list, not {}",
                    arguments[0].type_name()
                ))
            })?;
            let mut product = Vec::with_capacity(items.len() * others.len());
            for x in items {
                for y in others {
                    product.push(match x {
                        Value::Tuple(head) => {
                            let mut extended = head.as_ref().clone();
                            extended.push(y.clone());
                            Value::tuple(extended)
                        }
                        _ => Value::tuple(vec![x.clone(), y.clone()]),
                    });
                }
            }
            Ok(Value::list(product))
        }
        ListMethod::Pairs | ListMethod::Distincts => {
            let offset = usize::from(method == ListMethod::Distincts);
            let mut out = Vec::new();
            for i in 0..items.len() {
                for j in (i + offset)..items.len() {
                    out.push(Value::tuple(vec![items[i].clone(), items[j].clone()]));
                }
            }
            Ok(Value::list(out))
        }
        ListMethod::Min => extreme(items, false),
        ListMethod::Max => extreme(items, true),
        ListMethod::MinBy => extreme_by(items, &arguments[0], false),
        ListMethod::MaxBy => extreme_by(items, &arguments[0], true),
    }
}
