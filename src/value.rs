use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::{
    ast::FunctionBody,
    dispatch::{self, Method},
    evaluator::{self, EvalError},
    kinematics::LorentzVector,
    symbols::Frozen,
};

/// A runtime value of the ADL language.
///
/// Scalars are stored inline; lists, tuples and records are reference
/// counted so that binding them in a scope or capturing them in a closure
/// never copies their contents.
///
/// # Examples
///
/// ```
/// use adl_lang::Value;
///
/// let pts = Value::list(vec![Value::Float(35.0), Value::Float(12.5)]);
/// assert_eq!(pts.type_name(), "list");
/// assert_eq!(Value::Integer(2), Value::Float(2.0));
/// ```
#[derive(Clone)]
pub enum Value {
    Null,

    Boolean(bool),

    /// Integer number, preserved separately from floats
    Integer(i64),

    Float(f64),

    String(String),

    List(Rc<Vec<Value>>),

    /// Fixed-size group, produced by `pairs`, `distincts` and `cross`
    Tuple(Rc<Vec<Value>>),

    /// Named fields, such as one particle of an event
    Record(Rc<Record>),

    Function(Function),
}

/// A record with named fields.
///
/// Records with `px`/`py`/`pz` or `pt`/`eta`/`phi` fields plus `energy` or
/// `mass` are Lorentz vectors; their shape is classified once, here.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
    kinematics: Option<LorentzVector>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        let kinematics = LorentzVector::classify(&fields);
        Record { fields, kinematics }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn kinematics(&self) -> Option<&LorentzVector> {
        self.kinematics.as_ref()
    }
}

/// A builtin function of the root scope.
pub struct Builtin {
    pub name: &'static str,
    pub min_arity: usize,
    pub max_arity: usize,
    pub call: fn(&[Value]) -> Result<Value, EvalError>,
}

/// An inline or named ADL function together with its captured scope.
pub struct Closure {
    pub name: Option<String>,
    pub function: Rc<FunctionBody>,
    pub env: Rc<Frozen>,
}

/// A method looked up on a receiver, waiting for its arguments.
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Method,
}

pub type External = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// Any callable value.
#[derive(Clone)]
pub enum Function {
    Closure(Rc<Closure>),
    Builtin(&'static Builtin),
    /// A callable supplied by the embedding program
    External(External),
    Method(Rc<BoundMethod>),
}

impl Function {
    pub fn name(&self) -> String {
        match self {
            Function::Closure(closure) => closure
                .name
                .clone()
                .unwrap_or_else(|| "<inline>".to_string()),
            Function::Builtin(builtin) => builtin.name.to_string(),
            Function::External(_) => "<external>".to_string(),
            Function::Method(bound) => bound.method.name().to_string(),
        }
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, EvalError> {
        match self {
            Function::Closure(closure) => evaluator::call_closure(closure, arguments),
            Function::Builtin(builtin) => {
                let count = arguments.len();
                if count < builtin.min_arity || count > builtin.max_arity {
                    let expected = if builtin.min_arity == builtin.max_arity {
                        builtin.min_arity.to_string()
                    } else {
                        format!("{} to {}", builtin.min_arity, builtin.max_arity)
                    };
                    return Err(EvalError::type_error(format!(
                        "{} takes {} arguments ({} given)",
                        builtin.name, expected, count
                    )));
                }
                (builtin.call)(arguments)
            }
            Function::External(function) => function(arguments),
            Function::Method(bound) => dispatch::call_method(bound, arguments),
        }
    }

    fn same(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            (Function::Builtin(a), Function::Builtin(b)) => std::ptr::eq(*a, *b),
            (Function::External(a), Function::External(b)) => Rc::ptr_eq(a, b),
            (Function::Method(a), Function::Method(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn record(fields: BTreeMap<String, Value>) -> Self {
        Value::Record(Rc::new(Record::new(fields)))
    }

    /// Wrap a host function so ADL code can call it.
    pub fn external<F>(function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        Value::Function(Function::External(Rc::new(function)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
        }
    }

    /// Numeric value of integers and floats. Booleans are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Items of a list or tuple.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Invoke a function value with positional arguments.
    pub fn call(&self, arguments: &[Value]) -> Result<Value, EvalError> {
        match self {
            Value::Function(function) => function.call(arguments),
            other => Err(EvalError::type_error(format!(
                "{} value is not callable",
                other.type_name()
            ))),
        }
    }

    /// Convert JSON input into a runtime value.
    ///
    /// Objects become records, arrays become lists, and numbers become
    /// integers when they fit `i64`.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::list(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert into JSON. Non-finite floats become the strings `"nan"`,
    /// `"inf"` and `"-inf"`; functions become their description.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::from(*n),
            Value::Float(n) => float_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(record) => serde_json::Value::Object(
                record
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Function(function) => serde_json::Value::String(format!("{:?}", function)),
        }
    }
}

pub fn float_to_json(n: f64) -> serde_json::Value {
    match serde_json::Number::from_f64(n) {
        Some(number) => serde_json::Value::Number(number),
        None if n.is_nan() => serde_json::Value::String("nan".to_string()),
        None if n > 0.0 => serde_json::Value::String("inf".to_string()),
        None => serde_json::Value::String("-inf".to_string()),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                self.as_number() == other.as_number()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.fields == b.fields,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{:.1}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Record(record) => {
                write!(f, "{{")?;
                for (i, (name, value)) in record.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(function) => write!(f, "{:?}", function),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items.into_iter().map(Into::into).collect())
    }
}
