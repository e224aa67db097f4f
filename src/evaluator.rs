use std::fmt;
use std::rc::Rc;

use crate::{
    ast::{Callee, Expr, ExprKind, FunctionBody, Literal, Special, Span, Statement, StatementKind},
    dispatch,
    symbols::Scope,
    value::{Closure, Function, Value},
};

/// Errors that can occur while evaluating ADL code against a record.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Reference to a name that is not in scope
    Name { name: String, span: Option<Span> },

    /// Wrong arity, wrong operand type, unsupported method, name collision
    Type {
        message: String,
        span: Option<Span>,
    },

    /// Failure inside an operator, builtin or external function
    Runtime {
        message: String,
        span: Option<Span>,
    },

    /// A syntax tree the evaluator does not know how to handle
    Internal {
        message: String,
        span: Option<Span>,
    },
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type {
            message: message.into(),
            span: None,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        EvalError::Runtime {
            message: message.into(),
            span: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EvalError::Internal {
            message: message.into(),
            span: None,
        }
    }

    /// An error reported by a host function.
    pub fn foreign(message: impl fmt::Display) -> Self {
        EvalError::runtime(format!("function raised {}", message))
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            EvalError::Name { span, .. }
            | EvalError::Type { span, .. }
            | EvalError::Runtime { span, .. }
            | EvalError::Internal { span, .. } => *span,
        }
    }

    /// Attach `at` unless the error already knows where it happened.
    pub fn or_at(mut self, at: Span) -> Self {
        match &mut self {
            EvalError::Name { span, .. }
            | EvalError::Type { span, .. }
            | EvalError::Runtime { span, .. }
            | EvalError::Internal { span, .. } => {
                span.get_or_insert(at);
            }
        }
        self
    }

    pub fn message(&self) -> String {
        match self {
            EvalError::Name { name, .. } => format!("no symbol named '{}' in this scope", name),
            EvalError::Type { message, .. }
            | EvalError::Runtime { message, .. }
            | EvalError::Internal { message, .. } => message.clone(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Name { .. } => write!(f, "Name error: {}", self.message()),
            EvalError::Type { message, .. } => write!(f, "Type error: {}", message),
            EvalError::Runtime { message, .. } => write!(f, "Runtime error: {}", message),
            EvalError::Internal { message, .. } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for EvalError {}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(n) => Value::Integer(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

/// Reduce an expression to a value.
///
/// All arguments of a call are evaluated before the callee is resolved, so
/// `and`/`or` evaluate both operands.
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(literal_value(literal)),

        ExprKind::Identifier(name) => scope.get(name).cloned().ok_or_else(|| EvalError::Name {
            name: name.clone(),
            span: Some(expr.span),
        }),

        ExprKind::Inline(function) => Ok(closure(None, function, scope)),

        ExprKind::Call {
            function: Callee::Special(Special::Attribute),
            arguments,
        } => {
            let [receiver, name] = arguments.as_slice() else {
                return Err(EvalError::internal("attribute access takes two operands").or_at(expr.span));
            };
            let Some(name) = name.as_identifier() else {
                return Err(EvalError::internal("attribute name is not an identifier").or_at(name.span));
            };
            let receiver = evaluate(receiver, scope)?;
            dispatch::apply(
                Special::Attribute,
                &[receiver, Value::String(name.to_string())],
                expr.span,
            )
        }

        ExprKind::Call {
            function: Callee::Special(special),
            arguments,
        } => {
            let values = evaluate_all(arguments, scope)?;
            dispatch::apply(*special, &values, expr.span)
        }

        ExprKind::Call {
            function: Callee::Expr(function),
            arguments,
        } => {
            let values = evaluate_all(arguments, scope)?;
            let function = evaluate(function, scope)?;
            function.call(&values).map_err(|err| err.or_at(expr.span))
        }
    }
}

fn evaluate_all(arguments: &[Expr], scope: &Scope) -> Result<Vec<Value>, EvalError> {
    arguments.iter().map(|arg| evaluate(arg, scope)).collect()
}

fn closure(name: Option<String>, function: &Rc<FunctionBody>, scope: &Scope) -> Value {
    Value::Function(Function::Closure(Rc::new(Closure {
        name,
        function: function.clone(),
        env: scope.freeze(),
    })))
}

/// Execute a `Define` or `FunctionDefine` statement in `scope`.
pub fn bind(statement: &Statement, scope: &mut Scope) -> Result<(), EvalError> {
    match &statement.kind {
        StatementKind::Define(assignment) => {
            let value = evaluate(&assignment.expression, scope)?;
            scope.define(assignment.target.name.clone(), value);
            Ok(())
        }
        StatementKind::FunctionDefine { target, function } => {
            let value = closure(Some(target.name.clone()), function, scope);
            scope.define_function(target.name.clone(), value);
            Ok(())
        }
        _ => Err(EvalError::internal("only assignments may appear in a function body")
            .or_at(statement.span)),
    }
}

/// Call an ADL function: bind parameters in a child of the captured scope,
/// run the body's assignments and return its final expression.
pub fn call_closure(closure: &Closure, arguments: &[Value]) -> Result<Value, EvalError> {
    let parameters = &closure.function.parameters;
    if parameters.len() != arguments.len() {
        return Err(EvalError::type_error(format!(
            "wrong number of arguments: expecting {}, encountered {}",
            parameters.len(),
            arguments.len()
        )));
    }
    let mut scope = Scope::from_frozen(closure.env.clone());
    for (parameter, argument) in parameters.iter().zip(arguments) {
        scope.define(parameter.name.clone(), argument.clone());
    }

    let Some((last, body)) = closure.function.body.split_last() else {
        return Err(EvalError::internal("function has an empty body"));
    };
    for statement in body {
        bind(statement, &mut scope)?;
    }
    match &last.kind {
        StatementKind::Expression(expr) => evaluate(expr, &scope),
        _ => Err(EvalError::internal("function body does not end with an expression")
            .or_at(last.span)),
    }
}
