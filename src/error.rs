//! Error types.
//!
//! Pattern-level failures (a match that does not apply, a reference that is
//! not yet resolvable) are ordinary data and never show up here. These enums
//! cover malformed input, broken invariants and aborted searches.

use thiserror::Error;

/// Errors produced while turning script text into `Obj` trees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The lexer emitted an error token.
    #[error("offset {offset}: {message}")]
    Lex { offset: usize, message: String },

    /// A token appeared where the grammar expected something else.
    #[error("offset {offset}: expected {expected}, found {found}")]
    Unexpected { offset: usize, expected: String, found: String },

    /// Input ended in the middle of a term.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },

    /// The parsed items violate an `AssignmentList` invariant.
    #[error("offset {offset}: {source}")]
    Assignment {
        offset: usize,
        #[source]
        source: ObjError,
    },
}

/// Invariant violations on the object model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjError {
    /// Named and unnamed assignments cannot share one list.
    #[error("cannot insert {inserted} assignment into a list of {existing} assignments")]
    MixedNaming { inserted: &'static str, existing: &'static str },

    /// A named list already holds this name.
    #[error("duplicate assignment name '{name}'")]
    DuplicateName { name: String },
}

/// Errors raised while building or applying rewrite rules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// A combinator was called with the wrong number of arguments.
    #[error("combinator {combinator} expects {expected} argument(s), got {found}")]
    Arity { combinator: &'static str, expected: &'static str, found: usize },

    /// The object is not a `(source) -> (target)` rule.
    #[error("'{name}' is not a rule")]
    NotARule { name: String },

    /// The object is not a `RuleSet(...)` function.
    #[error("'{name}' is not a rule set")]
    NotARuleSet { name: String },

    /// A `${name}` reference has no entry in the context.
    #[error("unknown reference '{name}'")]
    UnknownReference { name: String },
}

/// Reasons a staged search aborts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Grid enumeration produced no positions.
    #[error("the search grid is empty")]
    EmptyGrid,

    /// A dimension that cannot be enumerated was part of the grid.
    #[error("dimension '{name}' is not enumerated")]
    UnsupportedDimension { name: String },

    /// A dimension is attached to a stage the pipeline does not have.
    #[error("dimension '{name}' targets stage {stage} but the pipeline has {stage_count} stage(s)")]
    StageOutOfRange { name: String, stage: u32, stage_count: usize },

    /// The pipeline has no stages to run.
    #[error("the pipeline has no stages")]
    NoStages,

    /// `set_parameter` returned false.
    #[error("parameter '{name}' rejected value {value}")]
    ParameterRejected { name: String, value: String },

    /// `run_stage` returned false.
    #[error("stage {stage} failed at position {position}")]
    StageFailed { stage: usize, position: String },

    /// A dimension description in a script was malformed.
    #[error("invalid dimension: {message}")]
    InvalidDimension { message: String },
}
