//! # Aggregation tree
//!
//! The tree of statistics an ADL program fills. Its shape is fixed by
//! [`initialize`] before any record is seen; evaluating a record only ever
//! adds weight to the accumulators at its leaves.
//!
//! - **[namespace]** - named children of the root, a region or a variation
//! - **[binning]** - histogram axes with under/over/nan-flow bins
//! - **[storage]** - `count`, `sum`, `profile` and `fraction` accumulators
//!
//! Every node knows its qualified name, the [`Path`] from the root that
//! [`Node::lookup`] follows to find it again.

pub mod binning;
pub mod namespace;
pub mod storage;

use std::fmt;
use std::rc::Rc;

pub use binning::{Binning, Bins, Slot};
pub use namespace::Namespace;
pub use storage::{Count, Fraction, Profile, Storage, Sum, UncertaintyMethod};

use crate::{
    ast::{Axis, Collect, Statement, StatementKind, Statistic, Suite},
    evaluator::EvalError,
    path::{Path, PathSegment, format_path},
    symbols::Scope,
};

/// A node of the aggregation tree.
#[derive(Debug, Clone)]
pub enum Node {
    Namespace(Namespace),
    Binning(Binning),
    Storage(Storage),
}

/// A path that does not lead to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The namespace has no child of that name
    NoSuchName { within: Path, name: String },
    /// The segment cannot index this kind of node
    ImproperIndex { within: Path, segment: PathSegment },
    /// The path continues past a storage
    TooManyDimensions { within: Path, segment: PathSegment },
    /// The root namespace is not a node
    EmptyPath,
}

fn describe(path: &Path) -> String {
    if path.is_empty() {
        "the root".to_string()
    } else {
        format!("'{}'", format_path(path))
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::NoSuchName { within, name } => {
                write!(f, "no aggregation named '{}' in {}", name, describe(within))
            }
            AccessError::ImproperIndex { within, segment } => {
                write!(f, "improper index for {}: {}", describe(within), segment)
            }
            AccessError::TooManyDimensions { within, segment } => write!(
                f,
                "too many dimensions in index: {} is a storage, cannot select {}",
                describe(within),
                segment
            ),
            AccessError::EmptyPath => write!(f, "an aggregation path needs at least one segment"),
        }
    }
}

impl std::error::Error for AccessError {}

impl Node {
    pub fn name(&self) -> &Path {
        match self {
            Node::Namespace(namespace) => &namespace.name,
            Node::Binning(binning) => &binning.name,
            Node::Storage(storage) => storage.name(),
        }
    }

    /// An empty node with the same structure, renamed to `name`.
    pub fn zeros_like(&self, name: Path) -> Node {
        match self {
            Node::Namespace(namespace) => Node::Namespace(namespace.zeros_like(name)),
            Node::Binning(binning) => Node::Binning(binning.zeros_like(name)),
            Node::Storage(storage) => Node::Storage(storage.zeros_like(name)),
        }
    }

    pub fn get(&self, segment: &PathSegment) -> Result<&Node, AccessError> {
        match self {
            Node::Namespace(namespace) => namespace.get(segment),
            Node::Binning(binning) => binning.get(segment),
            Node::Storage(storage) => Err(AccessError::TooManyDimensions {
                within: storage.name().clone(),
                segment: segment.clone(),
            }),
        }
    }

    /// Follow `path` down from this node. The empty path is the node itself.
    pub fn lookup(&self, path: &[PathSegment]) -> Result<&Node, AccessError> {
        path.iter().try_fold(self, |node, segment| node.get(segment))
    }

    /// Add `weight` to the accumulator this record reaches, routing through
    /// binnings by their axis expressions.
    pub fn fill(&mut self, scope: &Scope, weight: f64) -> Result<(), EvalError> {
        match self {
            Node::Storage(storage) => storage.fill(scope, weight),
            Node::Binning(binning) => binning.which(scope)?.fill(scope, weight),
            Node::Namespace(namespace) => Err(EvalError::internal(format!(
                "cannot fill namespace {}",
                describe(&namespace.name)
            ))),
        }
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Node::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    pub fn as_binning(&self) -> Option<&Binning> {
        match self {
            Node::Binning(binning) => Some(binning),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&Storage> {
        match self {
            Node::Storage(storage) => Some(storage),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Namespace(namespace) => namespace.to_json(),
            Node::Binning(binning) => binning.to_json(),
            Node::Storage(storage) => storage.to_json(),
        }
    }
}

/// Build the empty aggregation tree a program fills.
///
/// Only the shape is computed here: no expression is evaluated. Names must
/// be unique within each namespace, and every binning must be a literal
/// `regular(...)` or `variable(...)` call.
pub fn initialize(suite: &Suite) -> Result<Namespace, EvalError> {
    let mut root = Namespace::new(Vec::new());
    initialize_block(&suite.block, &Vec::new(), &mut root)?;
    Ok(root)
}

fn initialize_block(block: &[Statement], name: &Path, into: &mut Namespace) -> Result<(), EvalError> {
    for statement in block {
        initialize_statement(statement, name, into)?;
    }
    Ok(())
}

fn qualified(name: &Path, key: &str) -> Path {
    let mut out = name.clone();
    out.push(PathSegment::Field(key.to_string()));
    out
}

/// Wrap `node` in one binning per axis, innermost (last) axis first.
fn wrap(name: &Path, axes: &[Axis], node: Node) -> Result<Node, EvalError> {
    axes.iter().rev().try_fold(node, |node, axis| {
        let bins = Bins::from_call(&axis.binning)?;
        let expression = Rc::new(axis.expression.clone());
        Ok(Node::Binning(Binning::new(name.clone(), bins, expression, &node)))
    })
}

fn storage(collect: &Collect, name: Path, statement: &Statement) -> Result<Storage, EvalError> {
    let expression = || {
        collect.expression.clone().map(Rc::new).ok_or_else(|| {
            EvalError::internal(format!("{} without an expression", collect.statistic.keyword()))
                .or_at(statement.span)
        })
    };
    Ok(match collect.statistic {
        Statistic::Count => Storage::Count(Count::new(name)),
        Statistic::Sum => Storage::Sum(Sum::new(name, expression()?)),
        Statistic::Profile => Storage::Profile(Profile::new(name, expression()?)),
        Statistic::Fraction => Storage::Fraction(Fraction::new(name, expression()?)),
    })
}

fn initialize_statement(statement: &Statement, name: &Path, into: &mut Namespace) -> Result<(), EvalError> {
    match &statement.kind {
        StatementKind::Collect(collect) => {
            let key = &collect.name.value;
            let name = qualified(name, key);
            let node = Node::Storage(storage(collect, name.clone(), statement)?);
            into.insert(key, wrap(&name, &collect.axes, node)?, collect.name.span)
        }

        StatementKind::Region {
            name: region,
            axes,
            block,
            ..
        } => {
            let key = &region.value;
            let name = qualified(name, key);
            let mut namespace = Namespace::new(name.clone());
            initialize_block(block, &name, &mut namespace)?;
            into.insert(key, wrap(&name, axes, Node::Namespace(namespace))?, region.span)
        }

        StatementKind::Vary { variations, block } => {
            let mut template = Namespace::new(name.clone());
            initialize_block(block, name, &mut template)?;
            for variation in variations {
                let key = &variation.name.value;
                let copy = template.zeros_like(qualified(name, key));
                into.insert(key, Node::Namespace(copy), variation.name.span)?;
            }
            Ok(())
        }

        StatementKind::For { block, .. } | StatementKind::Source { block, .. } => {
            initialize_block(block, name, into)
        }

        StatementKind::Define(_)
        | StatementKind::FunctionDefine { .. }
        | StatementKind::Expression(_) => Ok(()),
    }
}
