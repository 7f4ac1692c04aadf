//! The parsed object model.
//!
//! Every node type supports the same four operations:
//!
//! - **serialize** (`Display`): canonical text that [`crate::parse_obj`] reads
//!   back into an equal tree.
//! - **match**: a structural pattern test producing [`Bindings`]. An empty map
//!   means *no match*; a successful match always carries the [`MATCH_KEY`]
//!   entry, even when no variable was bound.
//! - **resolve_values**: substitute `${name}` references from a binding map,
//!   in place. Returns false while any reference is left unresolved.
//! - **clone**: deep copy. Trees handed to the rule engine are never mutated;
//!   resolution always happens on a clone.

use crate::assignment::{AssignmentList, ident};
use crate::lexer::quote;
use std::collections::BTreeMap;
use std::fmt;

/// Result of a match attempt. Keys are variable names.
pub type Bindings = BTreeMap<String, Obj>;

/// Key inserted by every successful match, mapped to the matched object.
pub const MATCH_KEY: &str = "";

/// Name of the function node produced by the `o` composition operator.
pub const COMPOSE: &str = "o";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `"text"`
    StringLiteral,
    /// `[name]`: binds `name` to whatever it is matched against.
    PatternVariable,
    /// `${name}`: replaced from a binding map before use.
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub content: String,
    pub kind: ValueKind,
}

impl Value {
    pub fn literal(content: impl Into<String>) -> Self {
        Value { content: content.into(), kind: ValueKind::StringLiteral }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Value { content: name.into(), kind: ValueKind::PatternVariable }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Value { content: name.into(), kind: ValueKind::Reference }
    }

    fn match_into(&self, pattern: &Value, out: &mut Bindings) -> bool {
        match pattern.kind {
            ValueKind::PatternVariable => {
                out.insert(pattern.content.clone(), Obj::Value(self.clone()));
                true
            }
            ValueKind::StringLiteral => self.content == pattern.content,
            ValueKind::Reference => false,
        }
    }

    /// Rebind a reference to the value it names. Non-value targets cannot be
    /// stored in a `Value` slot and leave the reference unresolved.
    pub fn resolve_values(&mut self, context: &Bindings) -> bool {
        if self.kind != ValueKind::Reference {
            return true;
        }
        match context.get(&self.content) {
            Some(Obj::Value(resolved)) => {
                self.content = resolved.content.clone();
                self.kind = resolved.kind;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ValueKind::StringLiteral => f.write_str(&quote(&self.content)),
            ValueKind::PatternVariable => write!(f, "[{}]", ident(&self.content)),
            ValueKind::Reference => write!(f, "${{{}}}", ident(&self.content)),
        }
    }
}

/// Ordered list of values, matched position by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Array {
    pub items: Vec<Value>,
}

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Array { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn match_into(&self, pattern: &Array, out: &mut Bindings) -> bool {
        self.items.len() == pattern.items.len()
            && self.items.iter().zip(&pattern.items).all(|(candidate, p)| candidate.match_into(p, out))
    }

    pub fn resolve_values(&mut self, context: &Bindings) -> bool {
        let mut resolved = true;
        for item in &mut self.items {
            resolved &= item.resolve_values(context);
        }
        resolved
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.items.iter().map(Value::to_string).collect();
        write!(f, "({})", items.join(", "))
    }
}

/// `name(parameters) { internal }`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Function {
    pub name: String,
    pub parameters: AssignmentList,
    pub internal: Option<AssignmentList>,
}

impl Function {
    pub fn new(name: impl Into<String>, parameters: AssignmentList) -> Self {
        Function { name: name.into(), parameters, internal: None }
    }

    pub fn with_internal(mut self, internal: AssignmentList) -> Self {
        self.internal = Some(internal);
        self
    }

    /// `left o right`
    pub fn compose(left: Obj, right: Obj) -> Self {
        Function::new(COMPOSE, AssignmentList::positional([left, right]))
    }

    /// True for a node that serializes in infix `a o b` form.
    pub fn is_composition(&self) -> bool {
        self.name == COMPOSE
            && self.internal.is_none()
            && self.parameters.len() == 2
            && self.parameters.is_named() == Some(false)
    }

    /// Parameter value by name.
    pub fn param(&self, name: &str) -> Option<&Obj> {
        self.parameters.get(name)
    }

    fn match_into(&self, pattern: &Function, out: &mut Bindings) -> bool {
        if self.name != pattern.name {
            return false;
        }
        if !self.parameters.match_into(&pattern.parameters, out) {
            return false;
        }
        match (&self.internal, &pattern.internal) {
            (_, None) => true,
            (Some(candidate), Some(p)) => candidate.match_into(p, out),
            (None, Some(_)) => false,
        }
    }

    pub fn resolve_values(&mut self, context: &Bindings) -> bool {
        let mut resolved = self.parameters.resolve_values(context);
        if let Some(internal) = &mut self.internal {
            resolved &= internal.resolve_values(context);
        }
        resolved
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_composition() {
            let left = self.parameters.get_index(0).map(|a| a.value());
            let right = self.parameters.get_index(1).map(|a| a.value());
            if let (Some(left), Some(right)) = (left, right) {
                let right_nested = matches!(right, Obj::Function(r) if r.is_composition());
                if !right_nested {
                    return write!(f, "{left} o {right}");
                }
            }
        }
        // A name of `o` only survives the lexer when quoted.
        let name = if self.name == COMPOSE { quote(COMPOSE) } else { ident(&self.name) };
        write!(f, "{}({})", name, self.parameters)?;
        if let Some(internal) = &self.internal {
            write!(f, " {{\n{internal}\n}}")?;
        }
        Ok(())
    }
}

/// A rewrite rule: `(source) -> (target)`.
///
/// Application lives in [`crate::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub source: Function,
    pub target: Function,
}

impl Rule {
    pub fn new(source: Function, target: Function) -> Self {
        Rule { source, target }
    }

    fn match_into(&self, pattern: &Rule, out: &mut Bindings) -> bool {
        self.source.match_into(&pattern.source, out) && self.target.match_into(&pattern.target, out)
    }

    pub fn resolve_values(&mut self, context: &Bindings) -> bool {
        let source = self.source.resolve_values(context);
        let target = self.target.resolve_values(context);
        source && target
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> ({})", self.source, self.target)
    }
}

/// A node of a parsed ctx script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Obj {
    Function(Function),
    Value(Value),
    Array(Array),
    Rule(Rule),
    AssignmentList(AssignmentList),
}

impl Obj {
    pub fn literal(content: impl Into<String>) -> Self {
        Obj::Value(Value::literal(content))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Obj::Value(Value::variable(name))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Obj::Value(Value::reference(name))
    }

    pub fn function(name: impl Into<String>, parameters: AssignmentList) -> Self {
        Obj::Function(Function::new(name, parameters))
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Obj::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Obj::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Obj::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Obj::Rule(r) => Some(r),
            _ => None,
        }
    }

    /// The plain string of a literal value.
    pub fn match_value(&self) -> Option<&str> {
        match self {
            Obj::Value(Value { content, kind: ValueKind::StringLiteral }) => Some(content),
            _ => None,
        }
    }

    /// Test whether `self` is matched by `pattern`.
    ///
    /// Returns an empty map on failure. On success the map holds every bound
    /// pattern variable plus [`MATCH_KEY`] mapped to `self`.
    pub fn match_pattern(&self, pattern: &Obj) -> Bindings {
        let mut bindings = Bindings::new();
        if self.match_into(pattern, &mut bindings) {
            bindings.insert(MATCH_KEY.to_string(), self.clone());
            bindings
        } else {
            Bindings::new()
        }
    }

    pub(crate) fn match_into(&self, pattern: &Obj, out: &mut Bindings) -> bool {
        // A pattern variable captures any subtree, whatever its kind.
        if let Obj::Value(Value { content, kind: ValueKind::PatternVariable }) = pattern {
            out.insert(content.clone(), self.clone());
            return true;
        }
        match (self, pattern) {
            (Obj::Value(candidate), Obj::Value(p)) => candidate.match_into(p, out),
            (Obj::Array(candidate), Obj::Array(p)) => candidate.match_into(p, out),
            (Obj::Function(candidate), Obj::Function(p)) => candidate.match_into(p, out),
            (Obj::Rule(candidate), Obj::Rule(p)) => candidate.match_into(p, out),
            (Obj::AssignmentList(candidate), Obj::AssignmentList(p)) => candidate.match_into(p, out),
            _ => false,
        }
    }

    /// Substitute references found in `context`, in place.
    ///
    /// Must only be called on a tree this caller exclusively owns (usually a
    /// fresh clone of a pattern or template).
    pub fn resolve_values(&mut self, context: &Bindings) -> bool {
        match self {
            Obj::Value(value) if value.kind == ValueKind::Reference => match context.get(&value.content) {
                Some(resolved) => {
                    *self = resolved.clone();
                    true
                }
                None => false,
            },
            Obj::Value(_) => true,
            Obj::Array(array) => array.resolve_values(context),
            Obj::Function(function) => function.resolve_values(context),
            Obj::Rule(rule) => rule.resolve_values(context),
            Obj::AssignmentList(list) => list.resolve_values(context),
        }
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obj::Function(function) => write!(f, "{function}"),
            Obj::Value(value) => write!(f, "{value}"),
            Obj::Array(array) => write!(f, "{array}"),
            Obj::Rule(rule) => write!(f, "{rule}"),
            Obj::AssignmentList(list) => write!(f, "{{{list}}}"),
        }
    }
}

impl From<Function> for Obj {
    fn from(function: Function) -> Self {
        Obj::Function(function)
    }
}

impl From<Value> for Obj {
    fn from(value: Value) -> Self {
        Obj::Value(value)
    }
}

impl From<Array> for Obj {
    fn from(array: Array) -> Self {
        Obj::Array(array)
    }
}

impl From<Rule> for Obj {
    fn from(rule: Rule) -> Self {
        Obj::Rule(rule)
    }
}

impl From<AssignmentList> for Obj {
    fn from(list: AssignmentList) -> Self {
        Obj::AssignmentList(list)
    }
}
