//! A small configuration language with pattern matching, term rewriting and a
//! staged parameter search.
//!
//! ```text
//! text ──lexer──> tokens ──parser──> Obj / AssignmentList
//!                                       │
//!            Context (named objects) <──┤
//!                                       ├──> rewrite: Rule, RuleSet, saturation
//!                                       └──> search:  Dimension, grid, staged Search
//! ```
//!
//! ```
//! use ctxscript::{Bindings, parse_obj};
//!
//! let rule = parse_obj("(A(x=[v])) -> (B(y=${v}))").unwrap();
//! let fact = parse_obj(r#"A(x="1")"#).unwrap();
//! let out = rule.as_rule().unwrap().apply("copy", &[fact], &Bindings::new()).unwrap();
//! assert_eq!(out[0].to_string(), r#"B(y="1")"#);
//! ```

#[macro_use]
mod macros;
mod assignment;
mod context;
mod error;
mod lexer;
mod obj;
mod parameter;
mod parser;
pub mod rewrite;
pub mod search;

#[cfg(test)]
mod tests;

// --- Object model -----------------------------------------------------------

pub use assignment::{Assignment, AssignmentList};
pub use obj::{Array, Bindings, COMPOSE, Function, MATCH_KEY, Obj, Rule, Value, ValueKind};

// --- Text form --------------------------------------------------------------

pub use lexer::{Token, TokenKind, is_bare, quote, tokenize};
pub use parser::{parse_obj, parse_script};

// --- Parameters and names ---------------------------------------------------

pub use context::{Context, MAX_THREADS_ENV};
pub use parameter::{ParameterTable, Parameterizable, Parsable};

// --- Engines ----------------------------------------------------------------

pub use rewrite::{Combinator, RULE_KEY, RuleSet, Saturation, SaturationOptions};
pub use search::{Dimension, ParameterSearchable, Position, Search, SearchGrid};

pub use error::{ObjError, ParseError, RuleError, SearchError};
