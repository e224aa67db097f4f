pub mod aggregation;
pub mod ast;
pub mod builtins;
pub mod cli;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod kinematics;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod run;
pub mod symbols;
pub mod value;

pub use aggregation::{AccessError, Binning, Namespace, Node, Storage, UncertaintyMethod};
pub use ast::{Expr, Special, Statement, Suite, Token};
pub use error::{AdlError, ErrorKind};
pub use evaluator::{EvalError, evaluate};
pub use kinematics::LorentzVector;
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, Parser, parse, parse_expression};
pub use path::{Path, PathSegment};
pub use run::{Output, Records, Run, Symbols};
pub use symbols::{Builtins, Scope};
pub use value::{Function, Record, Value};
