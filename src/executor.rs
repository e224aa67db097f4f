//! Per-record execution of statements against the aggregation tree.

use crate::{
    aggregation::{Namespace, Node},
    ast::{Name, Pattern, Statement, StatementKind},
    evaluator::{self, EvalError},
    symbols::Scope,
    value::Value,
};

/// Execute a block in order, stopping at the first error.
///
/// Accumulators filled before the error keep their weight.
pub fn execute_block(
    block: &[Statement],
    provenance: Option<&str>,
    scope: &mut Scope,
    cursor: &mut Namespace,
) -> Result<(), EvalError> {
    for statement in block {
        execute(statement, provenance, scope, cursor)?;
    }
    Ok(())
}

fn entry<'a>(cursor: &'a mut Namespace, name: &Name) -> Result<&'a mut Node, EvalError> {
    cursor.child_mut(&name.value).ok_or_else(|| {
        EvalError::internal(format!("aggregation '{}' was never initialized", name.value))
            .or_at(name.span)
    })
}

fn accepts(patterns: &[Pattern], provenance: Option<&str>, inclusive: bool) -> bool {
    match provenance {
        None => true,
        Some(tag) => patterns.iter().any(|pattern| pattern.matches(tag)) == inclusive,
    }
}

/// Execute one statement for the current record.
///
/// `scope` holds the record's bindings and `cursor` is the namespace the
/// statement's collectors live in.
pub fn execute(
    statement: &Statement,
    provenance: Option<&str>,
    scope: &mut Scope,
    cursor: &mut Namespace,
) -> Result<(), EvalError> {
    match &statement.kind {
        StatementKind::Define(_) | StatementKind::FunctionDefine { .. } => {
            evaluator::bind(statement, scope)
        }

        StatementKind::Collect(collect) => {
            let weight = match &collect.weight {
                None => 1.0,
                Some(expr) => {
                    let value = evaluator::evaluate(expr, scope)?;
                    value.as_number().ok_or_else(|| {
                        EvalError::type_error(format!("weight returned a non-number: {}", value))
                            .or_at(expr.span)
                    })?
                }
            };
            entry(cursor, &collect.name)?.fill(scope, weight)
        }

        StatementKind::For { loopvars, block } => {
            let mut sequences = Vec::with_capacity(loopvars.len());
            for loopvar in loopvars {
                let value = evaluator::evaluate(&loopvar.expression, scope)?;
                if value.as_sequence().is_none() {
                    return Err(EvalError::type_error(format!(
                        "loop variable '{}' must be iterable with a known length",
                        loopvar.target.name
                    ))
                    .or_at(loopvar.span));
                }
                sequences.push((&loopvar.target.name, value));
            }

            let lengths: Vec<usize> = sequences
                .iter()
                .filter_map(|(_, value)| value.as_sequence().map(<[_]>::len))
                .collect();
            let length = lengths.first().copied().unwrap_or(0);
            if lengths.iter().any(|n| *n != length) {
                return Err(EvalError::type_error(
                    "loop variables in the same for loop must all have the same length",
                )
                .or_at(statement.span));
            }

            for index in 0..length {
                let mut inner = scope.child();
                for (target, value) in &sequences {
                    if let Some(item) = value.as_sequence().and_then(|items| items.get(index)) {
                        inner.define(target.as_str(), item.clone());
                    }
                }
                execute_block(block, provenance, &mut inner, cursor)?;
            }
            Ok(())
        }

        StatementKind::Vary { variations, block } => {
            for variation in variations {
                let mut inner = scope.child();
                for assignment in &variation.assignments {
                    let value = evaluator::evaluate(&assignment.expression, scope)?;
                    inner.define(assignment.target.name.clone(), value);
                }
                let Node::Namespace(namespace) = entry(cursor, &variation.name)? else {
                    return Err(EvalError::internal("variation is not a namespace")
                        .or_at(variation.span));
                };
                execute_block(block, provenance, &mut inner, namespace)?;
            }
            Ok(())
        }

        StatementKind::Region {
            name,
            predicate,
            axes,
            block,
        } => {
            if let Some(predicate) = predicate {
                match evaluator::evaluate(predicate, scope)? {
                    Value::Boolean(true) => {}
                    Value::Boolean(false) => return Ok(()),
                    other => {
                        return Err(EvalError::type_error(format!(
                            "predicate returned a non-boolean: {}",
                            other
                        ))
                        .or_at(predicate.span));
                    }
                }
            }

            let node = axes
                .iter()
                .try_fold(entry(cursor, name)?, |node, _| match node {
                    Node::Binning(binning) => binning.which(scope),
                    _ => Err(EvalError::internal("region axis is not a binning").or_at(name.span)),
                })?;
            let Node::Namespace(namespace) = node else {
                return Err(EvalError::internal("region is not a namespace").or_at(name.span));
            };
            let mut inner = scope.child();
            execute_block(block, provenance, &mut inner, namespace)
        }

        StatementKind::Source {
            patterns,
            block,
            inclusive,
        } => {
            if accepts(patterns, provenance, *inclusive) {
                execute_block(block, provenance, scope, cursor)
            } else {
                Ok(())
            }
        }

        StatementKind::Expression(_) => Err(EvalError::internal(
            "cannot execute a bare expression; it is not a statement",
        )
        .or_at(statement.span)),
    }
}
