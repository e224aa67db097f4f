//! An ADL program ready to evaluate records.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::{
    aggregation::{self, AccessError, Namespace, Node},
    ast::Suite,
    error::AdlError,
    executor,
    parser,
    path::PathSegment,
    symbols::{Builtins, Scope},
    value::Value,
};

/// Symbols a record left behind, by name.
pub type Symbols = BTreeMap<String, Value>;

/// What [`Run::call`] returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// One list per symbol, one entry per record
    Batch(BTreeMap<String, Vec<Value>>),
    /// The symbols of the only record
    Single(Symbols),
}

/// How a set of columns is turned into records.
#[derive(Debug, Clone)]
enum Plan {
    /// No data columns at all
    Empty,
    /// The columns are one record
    Single(Vec<(String, Value)>),
    /// Equal-length sequences, one record per index
    Batch {
        sequences: Vec<(String, Value)>,
        functions: Vec<(String, Value)>,
        length: usize,
    },
}

impl Plan {
    fn new(columns: Vec<(String, Value)>) -> Plan {
        let (functions, data): (Vec<_>, Vec<_>) =
            columns.iter().cloned().partition(|(_, value)| value.is_function());
        if data.is_empty() {
            return Plan::Empty;
        }

        let lengths: Option<Vec<usize>> = data
            .iter()
            .map(|(_, value)| value.as_sequence().map(<[Value]>::len))
            .collect();
        match lengths {
            Some(lengths) if lengths.iter().all(|n| *n == lengths[0]) => Plan::Batch {
                length: lengths[0],
                sequences: data,
                functions,
            },
            Some(lengths) => {
                warn!(
                    ?lengths,
                    "column lengths disagree; evaluating the columns as one record"
                );
                Plan::Single(columns)
            }
            None => Plan::Single(columns),
        }
    }

    /// Bindings of record `index` of a batch.
    fn record(sequences: &[(String, Value)], functions: &[(String, Value)], index: usize) -> Vec<(String, Value)> {
        sequences
            .iter()
            .filter_map(|(name, column)| {
                let item = column.as_sequence()?.get(index)?;
                Some((name.clone(), item.clone()))
            })
            .chain(functions.iter().cloned())
            .collect()
    }
}

/// A parsed program and the aggregation tree it fills.
///
/// # Example
/// ```
/// use adl_lang::{Run, Value};
///
/// let mut run = Run::new("count 'events'").unwrap();
/// run.call(None, [("x", Value::from(vec![1i64, 2, 3]))]).unwrap();
/// let events = run.get(&["events".into()]).unwrap();
/// assert_eq!(events.as_storage().unwrap().value(), 3.0);
/// ```
pub struct Run {
    source: String,
    ast: Suite,
    builtins: Rc<Builtins>,
    aggregation: Namespace,
}

impl Run {
    /// Parse `source` and build its empty aggregation tree, with the standard
    /// math library in scope.
    pub fn new(source: &str) -> Result<Run, AdlError> {
        Run::with_builtins(source, Builtins::standard())
    }

    /// Like [`Run::new`] with a custom root scope.
    pub fn with_builtins(source: &str, builtins: Builtins) -> Result<Run, AdlError> {
        let ast = parser::parse(source).map_err(|err| AdlError::from_parse(err, source))?;
        let aggregation =
            aggregation::initialize(&ast).map_err(|err| AdlError::from_eval(err, source))?;
        debug!(entries = aggregation.len(), "initialized aggregation tree");
        Ok(Run {
            source: source.to_string(),
            ast,
            builtins: Rc::new(builtins),
            aggregation,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Suite {
        &self.ast
    }

    /// The root of the aggregation tree.
    pub fn aggregation(&self) -> &Namespace {
        &self.aggregation
    }

    /// Discard every accumulated statistic.
    pub fn clear(&mut self) {
        self.aggregation = self.aggregation.zeros_like(Vec::new());
        debug!(entries = self.aggregation.len(), "cleared aggregation tree");
    }

    /// Look up a node by its path from the root.
    pub fn get(&self, path: &[PathSegment]) -> Result<&Node, AccessError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(AccessError::EmptyPath);
        };
        self.aggregation.get(first)?.lookup(rest)
    }

    /// Evaluate one record.
    ///
    /// Returns every symbol the record defined at top level, plus its inputs.
    /// Functions defined by the program are left out; callables supplied in
    /// `data` are returned as given.
    pub fn single<K: Into<String>>(
        &mut self,
        provenance: Option<&str>,
        data: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Symbols, AdlError> {
        trace!(?provenance, "evaluating record");
        let data = data.into_iter().map(|(name, value)| (name.into(), value));
        let mut scope = Scope::root(self.builtins.clone(), data);
        executor::execute_block(&self.ast.block, provenance, &mut scope, &mut self.aggregation)
            .map_err(|err| AdlError::from_eval(err, &self.source))?;
        scope.drop_functions();
        Ok(scope.into_symbols().into_iter().collect())
    }

    /// Evaluate named data columns.
    ///
    /// Function values are passed to every record. If the remaining columns
    /// are sequences of one length, each index is a record and the result is
    /// a [`Output::Batch`] of non-function symbols in record order. Otherwise
    /// the columns are a single record. Without any data columns nothing is
    /// evaluated and the batch is empty.
    ///
    /// Records are evaluated in order and stop at the first error; statistics
    /// filled by earlier records are kept.
    pub fn call<K: Into<String>>(
        &mut self,
        provenance: Option<&str>,
        columns: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Output, AdlError> {
        let columns = columns.into_iter().map(|(name, value)| (name.into(), value)).collect();
        match Plan::new(columns) {
            Plan::Empty => Ok(Output::Batch(BTreeMap::new())),
            Plan::Single(data) => self.single(provenance, data).map(Output::Single),
            Plan::Batch {
                sequences,
                functions,
                length,
            } => {
                debug!(records = length, ?provenance, "evaluating batch");
                let mut out: BTreeMap<String, Vec<Value>> = BTreeMap::new();
                for index in 0..length {
                    let symbols = self.single(provenance, Plan::record(&sequences, &functions, index))?;
                    for (name, value) in symbols {
                        if !value.is_function() {
                            out.entry(name).or_default().push(value);
                        }
                    }
                }
                Ok(Output::Batch(out))
            }
        }
    }

    /// Evaluate records lazily, one per iteration.
    ///
    /// Columns are split into records as by [`Run::call`]; without data
    /// columns the iterator yields one empty result.
    pub fn iter<'r, K: Into<String>>(
        &'r mut self,
        provenance: Option<&'r str>,
        columns: impl IntoIterator<Item = (K, Value)>,
    ) -> Records<'r> {
        let columns = columns.into_iter().map(|(name, value)| (name.into(), value)).collect();
        Records {
            run: self,
            provenance,
            plan: Plan::new(columns),
            next: 0,
        }
    }
}

/// Iterator returned by [`Run::iter`].
pub struct Records<'r> {
    run: &'r mut Run,
    provenance: Option<&'r str>,
    plan: Plan,
    next: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<Symbols, AdlError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        self.next += 1;
        match &self.plan {
            Plan::Empty => (index == 0).then(|| Ok(Symbols::new())),
            Plan::Single(data) => (index == 0).then(|| self.run.single(self.provenance, data.clone())),
            Plan::Batch {
                sequences,
                functions,
                length,
            } => (index < *length).then(|| {
                self.run
                    .single(self.provenance, Plan::record(sequences, functions, index))
            }),
        }
    }
}
