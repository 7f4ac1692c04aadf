//! Named collections of rules.

use super::dedup::FactKey;
use super::metrics::{PassMetrics, SaturationMetrics};
use crate::context::Context;
use crate::error::RuleError;
use crate::obj::{Bindings, Function, Obj, Rule, ValueKind};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::time::Instant;

/// Function name of a rule set in scripts: `RuleSet(a=(..) -> (..), b=${r})`.
pub const RULE_SET: &str = "RuleSet";

/// Rules applied together, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub name: String,
    rules: IndexMap<String, Rule>,
}

/// Options for [`RuleSet::saturate`].
#[derive(Debug, Clone)]
pub struct SaturationOptions {
    /// Upper bound on passes; a safety net for rules without a depth bound.
    pub max_passes: usize,
}

impl Default for SaturationOptions {
    fn default() -> Self {
        SaturationOptions { max_passes: 16 }
    }
}

/// Output of [`RuleSet::saturate`].
#[derive(Debug, Clone)]
pub struct Saturation {
    /// Facts derived by the rules, in discovery order (sources excluded).
    pub derived: Vec<Obj>,
    pub metrics: SaturationMetrics,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        RuleSet { name: name.into(), rules: IndexMap::new() }
    }

    /// Add or replace a rule.
    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) {
        self.rules.insert(name.into(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Build a set from a `RuleSet(...)` function.
    ///
    /// Arguments are inline rules (named by their assignment name, or
    /// `<set>.<index>` when positional) or `${name}` references to rules in
    /// `context`.
    pub fn from_function(name: &str, function: &Function, context: &Context) -> Result<Self, RuleError> {
        if function.name != RULE_SET {
            return Err(RuleError::NotARuleSet { name: name.to_string() });
        }
        let mut set = RuleSet::new(name);
        for (idx, assignment) in function.parameters.iter().enumerate() {
            match assignment.value() {
                Obj::Rule(rule) => {
                    let rule_name = assignment.name().map(str::to_string).unwrap_or_else(|| format!("{name}.{idx}"));
                    set.insert(rule_name, rule.clone());
                }
                Obj::Value(value) if value.kind == ValueKind::Reference => {
                    let rule = context.rule(&value.content)?;
                    let rule_name = assignment.name().unwrap_or(&value.content).to_string();
                    set.insert(rule_name, rule);
                }
                other => return Err(RuleError::NotARule { name: other.to_string() }),
            }
        }
        Ok(set)
    }

    /// The rule set registered as `name` in `context`.
    pub fn from_context(name: &str, context: &Context) -> Result<Self, RuleError> {
        context.rule_set(name)
    }

    /// Apply every rule once to the same sources.
    ///
    /// Only rules that produced at least one output appear in the result.
    pub fn apply(&self, sources: &[Obj], extra: &Bindings) -> Result<IndexMap<String, Vec<Obj>>, RuleError> {
        let mut produced = IndexMap::new();
        for (name, rule) in &self.rules {
            let outputs = rule.apply(name, sources, extra)?;
            if !outputs.is_empty() {
                produced.insert(name.clone(), outputs);
            }
        }
        tracing::debug!(rule_set = %self.name, rules = self.rules.len(), fired = produced.len(), "rule set applied");
        Ok(produced)
    }

    /// Apply the rules repeatedly, feeding outputs back in as sources, until a
    /// pass derives nothing new or `options.max_passes` is reached.
    ///
    /// ```text
    /// facts ── apply ── outputs ── FactKey unseen? ──yes──> facts += output
    ///   ^                                          │
    ///   └──────────── next pass ───────────────────┘ (stop when none added)
    /// ```
    pub fn saturate(
        &self,
        sources: &[Obj],
        extra: &Bindings,
        options: &SaturationOptions,
    ) -> Result<Saturation, RuleError> {
        let start = Instant::now();
        let mut metrics = SaturationMetrics::default();
        let mut facts: Vec<Obj> = sources.to_vec();
        let mut seen: HashSet<FactKey> = facts.iter().map(FactKey::from_obj).collect();
        let mut derived = Vec::new();

        for pass in 0..options.max_passes {
            let pass_start = Instant::now();
            let outputs = self.apply(&facts, extra)?;
            let rules_fired = outputs.len();

            let mut produced = 0;
            for obj in outputs.into_values().flatten() {
                if seen.insert(FactKey::from_obj(&obj)) {
                    facts.push(obj.clone());
                    derived.push(obj);
                    produced += 1;
                }
            }
            metrics.passes.push(PassMetrics { duration: pass_start.elapsed(), produced, rules_fired });
            tracing::debug!(rule_set = %self.name, pass, produced, "saturation pass");

            if produced == 0 {
                metrics.reached_fixpoint = true;
                break;
            }
        }

        if !metrics.reached_fixpoint {
            tracing::warn!(rule_set = %self.name, max_passes = options.max_passes, "saturation stopped early");
        }
        metrics.total = start.elapsed();
        Ok(Saturation { derived, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_obj, parse_script};

    #[test]
    fn apply_reports_only_rules_that_fired() {
        let script = parse_script(
            "Rule copy=(A(x=[v])) -> (B(x=${v}));\n\
             Rule never=(Z(x=[v])) -> (B(x=${v}));\n\
             RuleSet all=RuleSet(copy=${copy}, never=${never});",
        )
        .unwrap();
        let context = Context::from_script(&script);
        let set = RuleSet::from_context("all", &context).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["copy", "never"]);

        let produced = set.apply(&[parse_obj(r#"A(x="1")"#).unwrap()], &Bindings::new()).unwrap();
        assert_eq!(produced.len(), 1);
        assert_eq!(produced["copy"][0].to_string(), r#"B(x="1")"#);
    }

    #[test]
    fn inline_rules_get_positional_names() {
        let function = parse_obj("RuleSet((A()) -> (B()))").unwrap();
        let set = RuleSet::from_function("s", function.as_function().unwrap(), &Context::default()).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["s.0"]);
    }

    #[test]
    fn rejects_non_rule_arguments() {
        let function = parse_obj(r#"RuleSet(a="x")"#).unwrap();
        let err = RuleSet::from_function("s", function.as_function().unwrap(), &Context::default()).unwrap_err();
        assert_eq!(err, RuleError::NotARule { name: "\"x\"".into() });
        let other = parse_obj("Other()").unwrap();
        assert!(matches!(
            RuleSet::from_function("s", other.as_function().unwrap(), &Context::default()),
            Err(RuleError::NotARuleSet { .. })
        ));
    }

    #[test]
    fn saturation_stops_at_depth_bound() {
        let mut set = RuleSet::new("grow");
        let rule = parse_obj("(Depth(n=[n<4])) -> (Depth(n=${n<4++}))").unwrap();
        set.insert("inc", rule.as_rule().cloned().unwrap());

        let result = set
            .saturate(&[parse_obj(r#"Depth(n="0")"#).unwrap()], &Bindings::new(), &SaturationOptions::default())
            .unwrap();
        let derived: Vec<String> = result.derived.iter().map(Obj::to_string).collect();
        assert_eq!(derived, vec![r#"Depth(n="1")"#, r#"Depth(n="2")"#, r#"Depth(n="3")"#, r#"Depth(n="4")"#]);
        assert!(result.metrics.reached_fixpoint);
        assert_eq!(result.metrics.passes.last().map(|p| p.produced), Some(0));
    }

    #[test]
    fn saturation_respects_max_passes() {
        let mut set = RuleSet::new("unbounded");
        let rule = parse_obj("(Depth(n=[n])) -> (Depth(n=${n++}))").unwrap();
        set.insert("inc", rule.as_rule().cloned().unwrap());

        let options = SaturationOptions { max_passes: 3 };
        let result = set.saturate(&[parse_obj(r#"Depth(n="0")"#).unwrap()], &Bindings::new(), &options).unwrap();
        assert_eq!(result.derived.len(), 3);
        assert!(!result.metrics.reached_fixpoint);
        assert_eq!(result.metrics.passes.len(), 3);
    }
}
