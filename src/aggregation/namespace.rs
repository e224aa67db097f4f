use std::collections::BTreeMap;

use crate::{
    aggregation::{AccessError, Node},
    ast::Span,
    evaluator::EvalError,
    path::{Path, PathSegment},
};

/// Named children of a region, a variation or the root.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub name: Path,
    values: BTreeMap<String, Node>,
}

impl Namespace {
    pub fn new(name: Path) -> Self {
        Namespace {
            name,
            values: BTreeMap::new(),
        }
    }

    /// An empty copy of this namespace's structure, renamed below `name`.
    pub fn zeros_like(&self, name: Path) -> Namespace {
        let values = self
            .values
            .iter()
            .map(|(key, node)| {
                let mut qualified = name.clone();
                qualified.push(PathSegment::Field(key.clone()));
                (key.clone(), node.zeros_like(qualified))
            })
            .collect();
        Namespace { name, values }
    }

    /// Add a child; a name may only be declared once per namespace.
    pub fn insert(&mut self, key: &str, node: Node, at: Span) -> Result<(), EvalError> {
        if self.values.contains_key(key) {
            return Err(EvalError::type_error(format!(
                "duplicate name '{}' in the same namespace",
                key
            ))
            .or_at(at));
        }
        self.values.insert(key.to_string(), node);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        self.values.get(key)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.values.get_mut(key)
    }

    pub fn get(&self, segment: &PathSegment) -> Result<&Node, AccessError> {
        match segment {
            PathSegment::Field(key) => self.values.get(key).ok_or_else(|| AccessError::NoSuchName {
                within: self.name.clone(),
                name: key.clone(),
            }),
            PathSegment::Index(_) => Err(AccessError::ImproperIndex {
                within: self.name.clone(),
                segment: segment.clone(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.values.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(key, node)| (key.clone(), node.to_json()))
                .collect(),
        )
    }
}
