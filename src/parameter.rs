//! Bridge between typed business objects and their textual `Obj` form.
//!
//! A type lists its parameters once in a [`ParameterTable`]: each entry maps a
//! parameter name to a getter/setter pair. The table is built lazily, once per
//! type, and drives both the generic "set by name" contract
//! ([`Parameterizable`]) and the `TypeName(param=value, ...)` rendering
//! ([`Parsable`]).

use crate::assignment::AssignmentList;
use crate::obj::{Function, Obj};
use std::fmt::Display;
use std::str::FromStr;

type Getter<T> = Box<dyn Fn(&T) -> Obj + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &Obj) -> bool + Send + Sync>;

struct ParameterEntry<T> {
    name: &'static str,
    get: Getter<T>,
    set: Setter<T>,
}

/// Name → (getter, setter) registry for one type.
pub struct ParameterTable<T> {
    entries: Vec<ParameterEntry<T>>,
}

impl<T> Default for ParameterTable<T> {
    fn default() -> Self {
        ParameterTable { entries: Vec::new() }
    }
}

impl<T> ParameterTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter with explicit conversion functions.
    pub fn with(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> Obj + Send + Sync + 'static,
        set: impl Fn(&mut T, &Obj) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.entries.push(ParameterEntry { name, get: Box::new(get), set: Box::new(set) });
        self
    }

    /// Register a field that converts through its string form.
    pub fn scalar<F>(self, name: &'static str, field: fn(&T) -> &F, field_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: Display + FromStr + 'static,
        T: 'static,
    {
        self.with(
            name,
            move |target| Obj::literal(field(target).to_string()),
            move |target, value| match value.match_value().and_then(|s| s.parse::<F>().ok()) {
                Some(parsed) => {
                    *field_mut(target) = parsed;
                    true
                }
                None => false,
            },
        )
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn get(&self, target: &T, name: &str) -> Option<Obj> {
        self.entries.iter().find(|e| e.name == name).map(|e| (e.get)(target))
    }

    /// False for unknown names and for values the setter refuses.
    pub fn set(&self, target: &mut T, name: &str, value: &Obj) -> bool {
        match self.entries.iter().find(|e| e.name == name) {
            Some(entry) => (entry.set)(target, value),
            None => false,
        }
    }
}

/// Generic get/set of named parameters.
pub trait Parameterizable {
    fn parameter_names(&self) -> Vec<&'static str>;
    fn get_parameter(&self, name: &str) -> Option<Obj>;
    fn set_parameter(&mut self, name: &str, value: &Obj) -> bool;
}

/// A type with a textual `TypeName(param=value, ...)` form.
pub trait Parsable: Sized + 'static {
    /// Function name used when rendering.
    fn type_name() -> &'static str;

    /// The type's parameter table; usually a `once_cell::sync::Lazy` static.
    fn parameter_table() -> &'static ParameterTable<Self>;

    fn to_obj(&self) -> Obj {
        let table = Self::parameter_table();
        let pairs = table.names().into_iter().filter_map(|name| table.get(self, name).map(|v| (name, v)));
        // Names in a table are unique, so the list cannot be rejected.
        let parameters = AssignmentList::named(pairs).unwrap_or_default();
        Obj::Function(Function::new(Self::type_name(), parameters))
    }

    /// Set every named parameter of `function`. Stops at the first one that is
    /// unknown or rejected and returns false.
    fn apply_obj(&mut self, function: &Function) -> bool {
        let table = Self::parameter_table();
        function.parameters.iter().all(|assignment| match assignment.name() {
            Some(name) => table.set(self, name, assignment.value()),
            None => false,
        })
    }
}

impl<T: Parsable> Parameterizable for T {
    fn parameter_names(&self) -> Vec<&'static str> {
        T::parameter_table().names()
    }

    fn get_parameter(&self, name: &str) -> Option<Obj> {
        T::parameter_table().get(self, name)
    }

    fn set_parameter(&mut self, name: &str, value: &Obj) -> bool {
        T::parameter_table().set(self, name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_obj;
    use once_cell::sync::Lazy;

    #[derive(Debug, Default, PartialEq)]
    struct Tree {
        depth: u32,
        criterion: String,
        rate: f64,
    }

    static TREE_PARAMETERS: Lazy<ParameterTable<Tree>> = Lazy::new(|| {
        parameters!(Tree { depth, criterion }).with(
            "rate",
            |t| Obj::literal(format!("{:.2}", t.rate)),
            |t, v| v.match_value().and_then(|s| s.parse().ok()).map(|r| t.rate = r).is_some(),
        )
    });

    impl Parsable for Tree {
        fn type_name() -> &'static str {
            "Tree"
        }

        fn parameter_table() -> &'static ParameterTable<Self> {
            &TREE_PARAMETERS
        }
    }

    #[test]
    fn set_and_get_by_name() {
        let mut tree = Tree::default();
        assert!(tree.set_parameter("depth", &Obj::literal("4")));
        assert!(!tree.set_parameter("depth", &Obj::literal("deep")));
        assert!(!tree.set_parameter("missing", &Obj::literal("1")));
        assert!(!tree.set_parameter("depth", &Obj::reference("d")));
        assert_eq!(tree.depth, 4);
        assert_eq!(tree.get_parameter("depth"), Some(Obj::literal("4")));
        assert_eq!(tree.parameter_names(), vec!["depth", "criterion", "rate"]);
    }

    #[test]
    fn to_obj_and_back() {
        let tree = Tree { depth: 3, criterion: "gini".into(), rate: 0.5 };
        let obj = tree.to_obj();
        assert_eq!(obj.to_string(), r#"Tree(depth="3", criterion="gini", rate="0.50")"#);

        let parsed = parse_obj(&obj.to_string()).unwrap();
        let mut copy = Tree::default();
        assert!(copy.apply_obj(parsed.as_function().unwrap()));
        assert_eq!(copy, tree);
    }

    #[test]
    fn apply_obj_rejects_positional_parameters() {
        let parsed = parse_obj(r#"Tree("3")"#).unwrap();
        assert!(!Tree::default().apply_obj(parsed.as_function().unwrap()));
    }
}
