//! Histogram axes: map a number to one of a fixed set of children.

use std::rc::Rc;

use serde_json::json;

use crate::{
    aggregation::{AccessError, Node},
    ast::{Callee, Expr, ExprKind, Literal},
    evaluator::{self, EvalError},
    path::{Path, PathSegment},
    symbols::Scope,
    value::float_to_json,
};

/// Where a binning puts its bin edges.
#[derive(Debug, Clone, PartialEq)]
pub enum Bins {
    /// `numbins` equal bins over `[low, high)`
    Regular { numbins: usize, low: f64, high: f64 },
    /// Strictly increasing edges; bin `i` is `[edges[i], edges[i + 1])`
    Variable { edges: Vec<f64> },
}

/// The child a value is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Bin(usize),
    Underflow,
    Overflow,
    Nanflow,
}

impl Bins {
    pub fn numbins(&self) -> usize {
        match self {
            Bins::Regular { numbins, .. } => *numbins,
            Bins::Variable { edges } => edges.len().saturating_sub(1),
        }
    }

    /// Bin edges, `numbins + 1` of them.
    pub fn edges(&self) -> Vec<f64> {
        match self {
            Bins::Regular { numbins, low, high } => {
                let width = (high - low) / *numbins as f64;
                (0..=*numbins)
                    .map(|i| if i == *numbins { *high } else { low + i as f64 * width })
                    .collect()
            }
            Bins::Variable { edges } => edges.clone(),
        }
    }

    /// Route `x`: below the first edge to underflow, at or above the last to
    /// overflow, NaN to nanflow.
    pub fn select(&self, x: f64) -> Slot {
        match self {
            Bins::Regular { numbins, low, high } => {
                let index = *numbins as f64 * (x - low) / (high - low);
                if index < 0.0 {
                    Slot::Underflow
                } else if index >= *numbins as f64 {
                    Slot::Overflow
                } else if index.is_nan() {
                    Slot::Nanflow
                } else {
                    Slot::Bin(index.trunc() as usize)
                }
            }
            Bins::Variable { edges } => {
                let (Some(first), Some(last)) = (edges.first(), edges.last()) else {
                    return Slot::Nanflow;
                };
                if x < *first {
                    Slot::Underflow
                } else if x >= *last {
                    Slot::Overflow
                } else {
                    edges
                        .windows(2)
                        .position(|pair| pair[0] <= x && x < pair[1])
                        .map_or(Slot::Nanflow, Slot::Bin)
                }
            }
        }
    }
}

fn literal_number(expr: &Expr) -> Option<f64> {
    expr.as_literal().and_then(Literal::as_number)
}

fn binning_error(message: &str, at: &Expr) -> EvalError {
    EvalError::type_error(message).or_at(at.span)
}

impl Bins {
    /// Read a `regular(numbins, low, high)` or `variable(edge, ...)` call.
    /// Every argument must be a literal.
    pub fn from_call(call: &Expr) -> Result<Bins, EvalError> {
        let ExprKind::Call {
            function: Callee::Expr(function),
            arguments,
        } = &call.kind
        else {
            return Err(binning_error("not a binning", call));
        };

        match function.as_identifier() {
            Some("regular") => {
                let [numbins, low, high] = arguments.as_slice() else {
                    return Err(binning_error(
                        "regular binning takes exactly 3 arguments: numbins, low, high",
                        call,
                    ));
                };
                let numbins = match numbins.as_literal() {
                    Some(Literal::Integer(n)) if *n >= 1 => *n as usize,
                    _ => {
                        return Err(binning_error(
                            "numbins must be a literal positive integer",
                            numbins,
                        ));
                    }
                };
                let low_value = literal_number(low)
                    .ok_or_else(|| binning_error("low must be a literal number", low))?;
                let high_value = literal_number(high)
                    .ok_or_else(|| binning_error("high must be a literal number", high))?;
                if !(low_value < high_value) {
                    return Err(binning_error("high must be greater than low", high));
                }
                Ok(Bins::Regular {
                    numbins,
                    low: low_value,
                    high: high_value,
                })
            }
            Some("variable") => {
                let edges = arguments
                    .iter()
                    .map(|edge| {
                        literal_number(edge)
                            .ok_or_else(|| binning_error("edges must be literal numbers", edge))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if edges.len() < 2 {
                    return Err(binning_error(
                        "variable binning needs at least 2 edges",
                        call,
                    ));
                }
                if let Some(pair) = edges.windows(2).position(|pair| !(pair[0] < pair[1])) {
                    return Err(binning_error(
                        "edges must be strictly increasing",
                        &arguments[pair + 1],
                    ));
                }
                Ok(Bins::Variable { edges })
            }
            _ => Err(binning_error("not a binning", call)),
        }
    }
}

/// An axis of the aggregation tree.
///
/// Every bin and the three flow bins hold a structurally identical,
/// independently filled child.
#[derive(Debug, Clone)]
pub struct Binning {
    pub name: Path,
    pub bins: Bins,
    /// The expression whose value selects a bin
    pub expression: Rc<Expr>,
    values: Vec<Node>,
    underflow: Box<Node>,
    overflow: Box<Node>,
    nanflow: Box<Node>,
}

impl Binning {
    pub fn new(name: Path, bins: Bins, expression: Rc<Expr>, template: &Node) -> Self {
        let child = |segment: PathSegment| {
            let mut qualified = name.clone();
            qualified.push(segment);
            template.zeros_like(qualified)
        };
        let values = (0..bins.numbins()).map(|i| child(i.into())).collect();
        let underflow = Box::new(child("underflow".into()));
        let overflow = Box::new(child("overflow".into()));
        let nanflow = Box::new(child("nanflow".into()));
        Binning {
            name,
            bins,
            expression,
            values,
            underflow,
            overflow,
            nanflow,
        }
    }

    pub fn zeros_like(&self, name: Path) -> Binning {
        Binning::new(name, self.bins.clone(), self.expression.clone(), &self.nanflow)
    }

    pub fn numbins(&self) -> usize {
        self.bins.numbins()
    }

    pub fn edges(&self) -> Vec<f64> {
        self.bins.edges()
    }

    pub fn bin(&self, index: usize) -> Option<&Node> {
        self.values.get(index)
    }

    pub fn bins(&self) -> &[Node] {
        &self.values
    }

    pub fn underflow(&self) -> &Node {
        &self.underflow
    }

    pub fn overflow(&self) -> &Node {
        &self.overflow
    }

    pub fn nanflow(&self) -> &Node {
        &self.nanflow
    }

    pub fn slot(&self, slot: Slot) -> Option<&Node> {
        match slot {
            Slot::Bin(index) => self.values.get(index),
            Slot::Underflow => Some(&self.underflow),
            Slot::Overflow => Some(&self.overflow),
            Slot::Nanflow => Some(&self.nanflow),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut Node> {
        match slot {
            Slot::Bin(index) => self.values.get_mut(index),
            Slot::Underflow => Some(&mut self.underflow),
            Slot::Overflow => Some(&mut self.overflow),
            Slot::Nanflow => Some(&mut self.nanflow),
        }
    }

    /// Evaluate the axis expression and return the child it selects.
    pub fn which(&mut self, scope: &Scope) -> Result<&mut Node, EvalError> {
        let value = evaluator::evaluate(&self.expression, scope)?;
        let Some(x) = value.as_number() else {
            return Err(EvalError::type_error(format!(
                "expression returned a non-number: {}",
                value
            ))
            .or_at(self.expression.span));
        };
        let slot = self.bins.select(x);
        self.slot_mut(slot)
            .ok_or_else(|| EvalError::internal(format!("binning has no {:?}", slot)))
    }

    /// Child named by one path segment.
    ///
    /// Integers below zero select the underflow bin and integers at or past
    /// `numbins` the overflow bin.
    pub fn get(&self, segment: &PathSegment) -> Result<&Node, AccessError> {
        match segment {
            PathSegment::Index(index) if *index < 0 => Ok(&self.underflow),
            PathSegment::Index(index) => Ok(self
                .values
                .get(*index as usize)
                .unwrap_or(&self.overflow)),
            PathSegment::Field(name) => match name.as_str() {
                "underflow" => Ok(&self.underflow),
                "overflow" => Ok(&self.overflow),
                "nanflow" => Ok(&self.nanflow),
                _ => Err(AccessError::ImproperIndex {
                    within: self.name.clone(),
                    segment: segment.clone(),
                }),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "edges": self.edges().into_iter().map(float_to_json).collect::<Vec<_>>(),
            "bins": self.values.iter().map(Node::to_json).collect::<Vec<_>>(),
            "underflow": self.underflow.to_json(),
            "overflow": self.overflow.to_json(),
            "nanflow": self.nanflow.to_json(),
        })
    }
}
