//! Lexical scopes.
//!
//! A chain of scopes is rooted at the shared, immutable [`Builtins`]. Scopes
//! created while executing a record borrow their parent; closures capture a
//! [`Frozen`] snapshot that owns copies of every binding above the root.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::{builtins, value::Value};

/// The root scope: builtin functions and constants.
#[derive(Debug, Clone)]
pub struct Builtins {
    symbols: HashMap<String, Value>,
}

impl Builtins {
    /// The standard library of math functions and constants.
    pub fn standard() -> Self {
        Builtins {
            symbols: builtins::standard(),
        }
    }

    pub fn empty() -> Self {
        Builtins {
            symbols: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }
}

/// A flattened, immutable copy of a scope chain, minus the root.
#[derive(Debug)]
pub struct Frozen {
    symbols: HashMap<String, Value>,
    root: Rc<Builtins>,
}

impl Frozen {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name).or_else(|| self.root.get(name))
    }
}

#[derive(Debug)]
pub enum Link<'p> {
    Root(Rc<Builtins>),
    Scope(&'p Scope<'p>),
    Frozen(Rc<Frozen>),
}

#[derive(Debug)]
pub struct Scope<'p> {
    symbols: HashMap<String, Value>,
    /// Names bound by ADL function definitions in this scope
    functions: HashSet<String>,
    parent: Link<'p>,
}

impl Scope<'static> {
    /// A scope holding one record's input bindings below the builtins.
    pub fn root(builtins: Rc<Builtins>, data: impl IntoIterator<Item = (String, Value)>) -> Self {
        Scope {
            symbols: data.into_iter().collect(),
            functions: HashSet::new(),
            parent: Link::Root(builtins),
        }
    }

    /// A fresh scope whose parent is a closure's captured environment.
    pub fn from_frozen(frozen: Rc<Frozen>) -> Self {
        Scope {
            symbols: HashMap::new(),
            functions: HashSet::new(),
            parent: Link::Frozen(frozen),
        }
    }
}

impl<'p> Scope<'p> {
    pub fn child(&self) -> Scope<'_> {
        Scope {
            symbols: HashMap::new(),
            functions: HashSet::new(),
            parent: Link::Scope(self),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.symbols.get(name) {
            return Some(value);
        }
        match &self.parent {
            Link::Root(root) => root.get(name),
            Link::Scope(parent) => parent.get(name),
            Link::Frozen(frozen) => frozen.get(name),
        }
    }

    /// True when `name` is bound in this scope itself, not a parent.
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.functions.remove(&name);
        self.symbols.insert(name, value);
    }

    /// Bind an ADL-defined function, tagged so [`Scope::drop_functions`] removes it.
    pub fn define_function(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.functions.insert(name.clone());
        self.symbols.insert(name, value);
    }

    /// Remove the ADL-defined functions bound in this scope.
    pub fn drop_functions(&mut self) {
        for name in self.functions.drain() {
            self.symbols.remove(&name);
        }
    }

    /// Snapshot every binding visible from here, except the builtins.
    pub fn freeze(&self) -> Rc<Frozen> {
        if self.symbols.is_empty()
            && let Link::Frozen(frozen) = &self.parent
        {
            return frozen.clone();
        }
        let mut symbols = HashMap::new();
        let root = self.collect(&mut symbols);
        Rc::new(Frozen { symbols, root })
    }

    /// Copy bindings outermost first so inner scopes shadow outer ones.
    fn collect(&self, out: &mut HashMap<String, Value>) -> Rc<Builtins> {
        let root = match &self.parent {
            Link::Root(root) => root.clone(),
            Link::Scope(parent) => parent.collect(out),
            Link::Frozen(frozen) => {
                out.extend(frozen.symbols.iter().map(|(k, v)| (k.clone(), v.clone())));
                frozen.root.clone()
            }
        };
        out.extend(self.symbols.iter().map(|(k, v)| (k.clone(), v.clone())));
        root
    }

    pub fn into_symbols(self) -> HashMap<String, Value> {
        self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Scope<'static> {
        Scope::root(
            Rc::new(Builtins::empty()),
            [("x".to_string(), Value::Integer(1))],
        )
    }

    #[test]
    fn test_child_reads_through_to_parent() {
        let outer = root();
        let mut inner = outer.child();
        inner.define("y", Value::Integer(2));
        assert_eq!(inner.get("x"), Some(&Value::Integer(1)));
        assert_eq!(inner.get("y"), Some(&Value::Integer(2)));
        assert!(!inner.contains("x"));
    }

    #[test]
    fn test_freeze_is_a_snapshot() {
        let mut scope = root();
        let frozen = scope.freeze();
        scope.define("x", Value::Integer(5));
        assert_eq!(frozen.get("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_drop_functions_keeps_data() {
        let mut scope = root();
        scope.define_function("f", Value::Null);
        scope.define("g", Value::Null);
        scope.drop_functions();
        let symbols = scope.into_symbols();
        assert!(!symbols.contains_key("f"));
        assert!(symbols.contains_key("g"));
        assert!(symbols.contains_key("x"));
    }
}
