//! Ordered key/value bindings used for function parameters, internal bodies
//! and whole scripts.

use crate::error::ObjError;
use crate::lexer::{is_bare, quote};
use crate::{Bindings, Obj};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One `name=value` (or bare `value`) entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Assignment {
    /// `name=value` or a positional `value`.
    Untyped { name: Option<String>, value: Obj },
    /// `(mod1, mod2) type name=value;`
    Typed { modifiers: Vec<String>, type_tag: String, name: String, value: Obj },
}

impl Assignment {
    pub fn named(name: impl Into<String>, value: Obj) -> Self {
        Assignment::Untyped { name: Some(name.into()), value }
    }

    pub fn positional(value: Obj) -> Self {
        Assignment::Untyped { name: None, value }
    }

    pub fn typed(modifiers: Vec<String>, type_tag: impl Into<String>, name: impl Into<String>, value: Obj) -> Self {
        Assignment::Typed { modifiers, type_tag: type_tag.into(), name: name.into(), value }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Assignment::Untyped { name, .. } => name.as_deref(),
            Assignment::Typed { name, .. } => Some(name),
        }
    }

    pub fn value(&self) -> &Obj {
        match self {
            Assignment::Untyped { value, .. } | Assignment::Typed { value, .. } => value,
        }
    }

    pub fn value_mut(&mut self) -> &mut Obj {
        match self {
            Assignment::Untyped { value, .. } | Assignment::Typed { value, .. } => value,
        }
    }

    /// The declared type tag, for typed assignments.
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Assignment::Typed { type_tag, .. } => Some(type_tag),
            Assignment::Untyped { .. } => None,
        }
    }

    pub fn is_named(&self) -> bool {
        self.name().is_some()
    }

    fn is_typed(&self) -> bool {
        matches!(self, Assignment::Typed { .. })
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignment::Untyped { name: Some(name), value } => write!(f, "{}={}", ident(name), value),
            Assignment::Untyped { name: None, value } => write!(f, "{value}"),
            Assignment::Typed { modifiers, type_tag, name, value } => {
                if !modifiers.is_empty() {
                    let mods: Vec<String> = modifiers.iter().map(|m| ident(m)).collect();
                    write!(f, "({}) ", mods.join(", "))?;
                }
                write!(f, "{} {}={};", ident(type_tag), ident(name), value)
            }
        }
    }
}

/// Render a name so the lexer reads it back as one string token.
pub(crate) fn ident(name: &str) -> String {
    if is_bare(name) { name.to_string() } else { quote(name) }
}

/// Ordered list of assignments.
///
/// Invariant: either every item has a name or none does. Named items are also
/// indexed by name, and names are unique.
#[derive(Debug, Clone, Default)]
pub struct AssignmentList {
    items: Vec<Assignment>,
    index: HashMap<String, usize>,
}

impl AssignmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a positional list from values.
    pub fn positional(values: impl IntoIterator<Item = Obj>) -> Self {
        let items: Vec<Assignment> = values.into_iter().map(Assignment::positional).collect();
        AssignmentList { items, index: HashMap::new() }
    }

    /// Build a named list from `(name, value)` pairs.
    pub fn named<N: Into<String>>(pairs: impl IntoIterator<Item = (N, Obj)>) -> Result<Self, ObjError> {
        let mut list = AssignmentList::new();
        for (name, value) in pairs {
            list.push(Assignment::named(name, value))?;
        }
        Ok(list)
    }

    /// Append an assignment, rejecting mixed naming and duplicate names.
    pub fn push(&mut self, assignment: Assignment) -> Result<(), ObjError> {
        if let Some(named) = self.is_named() {
            if named != assignment.is_named() {
                return Err(ObjError::MixedNaming {
                    inserted: naming_label(assignment.is_named()),
                    existing: naming_label(named),
                });
            }
        }
        if let Some(name) = assignment.name() {
            if self.index.contains_key(name) {
                return Err(ObjError::DuplicateName { name: name.to_string() });
            }
            self.index.insert(name.to_string(), self.items.len());
        }
        self.items.push(assignment);
        Ok(())
    }

    /// `Some(true)` for a named list, `Some(false)` for a positional one and
    /// `None` while the list is empty.
    pub fn is_named(&self) -> Option<bool> {
        self.items.first().map(Assignment::is_named)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Obj> {
        self.index.get(name).map(|&i| self.items[i].value())
    }

    pub fn get_assignment(&self, name: &str) -> Option<&Assignment> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn get_index(&self, idx: usize) -> Option<&Assignment> {
        self.items.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.items.iter()
    }

    /// Values in list order, ignoring names.
    pub fn values(&self) -> impl Iterator<Item = &Obj> {
        self.items.iter().map(Assignment::value)
    }

    /// Names in list order (empty for positional lists).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(Assignment::name)
    }

    /// Match `self` (the candidate) against `pattern`.
    ///
    /// The candidate may not be longer than the pattern. Named patterns look
    /// items up by name and require a named candidate; positional patterns
    /// compare by index against either kind of candidate.
    pub(crate) fn match_into(&self, pattern: &AssignmentList, out: &mut Bindings) -> bool {
        if self.len() > pattern.len() {
            return false;
        }
        match pattern.is_named() {
            Some(true) => {
                if self.is_named() == Some(false) {
                    return false;
                }
                pattern.items.iter().all(|item| {
                    let Some(name) = item.name() else { return false };
                    match self.get(name) {
                        Some(candidate) => candidate.match_into(item.value(), out),
                        None => false,
                    }
                })
            }
            _ => pattern.items.iter().enumerate().all(|(i, item)| match self.items.get(i) {
                Some(candidate) => candidate.value().match_into(item.value(), out),
                None => false,
            }),
        }
    }

    /// Resolve references in every value; true iff all of them resolved.
    pub fn resolve_values(&mut self, context: &Bindings) -> bool {
        let mut resolved = true;
        for item in &mut self.items {
            resolved &= item.value_mut().resolve_values(context);
        }
        resolved
    }
}

fn naming_label(named: bool) -> &'static str {
    if named { "named" } else { "unnamed" }
}

impl PartialEq for AssignmentList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for AssignmentList {}

impl Hash for AssignmentList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

impl fmt::Display for AssignmentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous: Option<&Assignment> = None;
        for item in &self.items {
            if let Some(prev) = previous {
                f.write_str(if prev.is_typed() { "\n" } else { ", " })?;
            }
            write!(f, "{item}")?;
            previous = Some(item);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AssignmentList {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
