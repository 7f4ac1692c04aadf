//! Named objects of a script and run-wide settings.

use crate::assignment::AssignmentList;
use crate::error::RuleError;
use crate::obj::{Bindings, Obj, Rule};
use crate::rewrite::RuleSet;
use indexmap::IndexMap;

/// Environment variable overriding the worker-thread count.
pub const MAX_THREADS_ENV: &str = "CTXSCRIPT_MAX_THREADS";

/// Name-resolution context.
///
/// Holds the named objects of a script (so `${name}` references can be
/// resolved and rules looked up) and the worker-thread budget used by the
/// search engine.
#[derive(Debug, Clone)]
pub struct Context {
    /// Upper bound on worker threads for one search stage. Always >= 1.
    pub max_threads: usize,
    objects: IndexMap<String, Obj>,
}

impl Default for Context {
    fn default() -> Self {
        let max_threads = if cfg!(test) {
            2
        } else {
            std::env::var(MAX_THREADS_ENV)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
                .unwrap_or(1)
        };
        Context { max_threads: max_threads.max(1), objects: IndexMap::new() }
    }
}

impl Context {
    /// Register every named top-level assignment of a parsed script.
    pub fn from_script(script: &AssignmentList) -> Self {
        let mut context = Context::default();
        for assignment in script {
            if let Some(name) = assignment.name() {
                context.register(name, assignment.value().clone());
            }
        }
        context
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads.max(1);
        self
    }

    /// Add or replace a named object.
    pub fn register(&mut self, name: impl Into<String>, obj: Obj) {
        self.objects.insert(name.into(), obj);
    }

    pub fn lookup(&self, name: &str) -> Option<&Obj> {
        self.objects.get(name)
    }

    /// All named objects as a binding map for `resolve_values`.
    pub fn bindings(&self) -> Bindings {
        self.objects.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// A resolved copy of `obj`, and whether every reference resolved.
    pub fn resolve(&self, obj: &Obj) -> (Obj, bool) {
        let mut copy = obj.clone();
        let complete = copy.resolve_values(&self.bindings());
        (copy, complete)
    }

    /// Plain string of `obj` after resolving references against the context.
    pub fn match_value(&self, obj: &Obj) -> Option<String> {
        let (resolved, _) = self.resolve(obj);
        resolved.match_value().map(str::to_string)
    }

    /// The rule registered as `name`.
    pub fn rule(&self, name: &str) -> Result<Rule, RuleError> {
        match self.lookup(name) {
            Some(Obj::Rule(rule)) => Ok(rule.clone()),
            Some(_) => Err(RuleError::NotARule { name: name.to_string() }),
            None => Err(RuleError::UnknownReference { name: name.to_string() }),
        }
    }

    /// The rule set registered as `name`.
    pub fn rule_set(&self, name: &str) -> Result<RuleSet, RuleError> {
        match self.lookup(name) {
            Some(Obj::Function(function)) => RuleSet::from_function(name, function, self),
            Some(_) => Err(RuleError::NotARuleSet { name: name.to_string() }),
            None => Err(RuleError::UnknownReference { name: name.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_script;

    #[test]
    fn resolves_script_references() {
        let script = parse_script("String base=\"x\";\nModel m=M(input=${base});").unwrap();
        let context = Context::from_script(&script);
        let (resolved, complete) = context.resolve(context.lookup("m").unwrap());
        assert!(complete);
        assert_eq!(resolved.to_string(), r#"M(input="x")"#);
        assert_eq!(context.match_value(&Obj::reference("base")), Some("x".to_string()));
    }

    #[test]
    fn rule_lookup_reports_kind_errors() {
        let script = parse_script("Rule r=(A([x])) -> (B(${x}));\nString s=\"v\";").unwrap();
        let context = Context::from_script(&script);
        assert!(context.rule("r").is_ok());
        assert_eq!(context.rule("s"), Err(RuleError::NotARule { name: "s".into() }));
        assert_eq!(context.rule("nope"), Err(RuleError::UnknownReference { name: "nope".into() }));
    }

    #[test]
    fn max_threads_is_never_zero() {
        assert_eq!(Context::default().with_max_threads(0).max_threads, 1);
        assert_eq!(Context::default().max_threads, 2);
    }
}
