//! Pattern evaluation against a fact base.
//!
//! A pattern function whose name is one of the [`Combinator`]s is evaluated
//! logically; any other pattern is an *atom*, matched structurally against
//! each source object.
//!
//! Results are lists of binding sets. An empty list means the pattern failed.
//! Lists never contain the same binding set twice.

use crate::error::RuleError;
use crate::obj::{Bindings, MATCH_KEY, Obj};

/// Pattern functions with logical rather than structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Sequential conjunction; later arguments see earlier bindings.
    And,
    /// Union of the bindings each argument adds.
    Or,
    /// Negation as failure over exactly one argument.
    Not,
    /// Structural equality of two or more resolved arguments.
    Equals,
}

impl Combinator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "And" => Some(Combinator::And),
            "Or" => Some(Combinator::Or),
            "Not" => Some(Combinator::Not),
            "Equals" => Some(Combinator::Equals),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Combinator::And => "And",
            Combinator::Or => "Or",
            Combinator::Not => "Not",
            Combinator::Equals => "Equals",
        }
    }
}

/// Evaluate `pattern` against `sources`, extending `bindings`.
pub(crate) fn match_sources(pattern: &Obj, sources: &[Obj], bindings: &Bindings) -> Result<Vec<Bindings>, RuleError> {
    let combinator = pattern.as_function().and_then(|f| Combinator::from_name(&f.name).map(|c| (c, f)));
    let Some((combinator, function)) = combinator else {
        return Ok(match_atom(pattern, sources, bindings));
    };
    let args: Vec<&Obj> = function.parameters.values().collect();

    match combinator {
        Combinator::And => {
            let mut partials = vec![bindings.clone()];
            for arg in args {
                let mut extended = Vec::new();
                for partial in &partials {
                    let resolved = resolved_against(arg, partial);
                    for b in match_sources(&resolved, sources, partial)? {
                        push_unique(&mut extended, b);
                    }
                }
                if extended.is_empty() {
                    return Ok(Vec::new());
                }
                partials = extended;
            }
            Ok(partials)
        }
        Combinator::Or => {
            let mut results = Vec::new();
            for arg in args {
                let resolved = resolved_against(arg, bindings);
                for b in match_sources(&resolved, sources, bindings)? {
                    // Only disjuncts that contributed a binding count.
                    if &b != bindings {
                        push_unique(&mut results, b);
                    }
                }
            }
            Ok(results)
        }
        Combinator::Not => {
            if args.len() != 1 {
                return Err(RuleError::Arity { combinator: "Not", expected: "exactly 1", found: args.len() });
            }
            let resolved = resolved_against(args[0], bindings);
            if match_sources(&resolved, sources, bindings)?.is_empty() {
                Ok(vec![bindings.clone()])
            } else {
                Ok(Vec::new())
            }
        }
        Combinator::Equals => {
            if args.len() < 2 {
                return Err(RuleError::Arity { combinator: "Equals", expected: "at least 2", found: args.len() });
            }
            let resolved: Vec<Obj> = args.iter().map(|a| resolved_against(a, bindings)).collect();
            if resolved.windows(2).all(|w| w[0] == w[1]) { Ok(vec![bindings.clone()]) } else { Ok(Vec::new()) }
        }
    }
}

fn match_atom(pattern: &Obj, sources: &[Obj], bindings: &Bindings) -> Vec<Bindings> {
    let resolved = resolved_against(pattern, bindings);
    let mut results = Vec::new();
    for candidate in sources {
        let mut found = candidate.match_pattern(&resolved);
        if found.remove(MATCH_KEY).is_none() {
            continue;
        }
        let mut merged = bindings.clone();
        merged.extend(found);
        push_unique(&mut results, merged);
    }
    results
}

fn resolved_against(pattern: &Obj, bindings: &Bindings) -> Obj {
    let mut copy = pattern.clone();
    // Unresolved references are expected here; later steps may bind them.
    copy.resolve_values(bindings);
    copy
}

fn push_unique(into: &mut Vec<Bindings>, bindings: Bindings) {
    if !into.contains(&bindings) {
        into.push(bindings);
    }
}
