//! Application of a single rewrite rule.

use super::pattern::match_sources;
use crate::error::RuleError;
use crate::obj::{Bindings, Obj, Rule};
use std::cmp::Ordering;

/// Binding that names the rule producing an output.
pub const RULE_KEY: &str = "RULE";

/// Suffix of the derived counter binding (`n` → `n++` = n + 1).
const COUNTER_SUFFIX: &str = "++";

impl Rule {
    /// Apply the rule to `sources` and return one instantiated target per
    /// surviving binding set.
    ///
    /// `name` is bound as `RULE`; every entry of `extra` is bound as well.
    /// Neither the rule nor the sources are modified.
    pub fn apply(&self, name: &str, sources: &[Obj], extra: &Bindings) -> Result<Vec<Obj>, RuleError> {
        let source = Obj::Function(self.source.clone());
        let matches = match_sources(&source, sources, &Bindings::new())?;

        let mut outputs = Vec::with_capacity(matches.len());
        for bindings in matches {
            let Some(mut bindings) = with_counters(bindings) else {
                continue;
            };
            bindings.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            bindings.insert(RULE_KEY.to_string(), Obj::literal(name));

            let mut output = Obj::Function(self.target.clone());
            if !output.resolve_values(&bindings) {
                tracing::debug!(rule = name, output = %output, "target left references unresolved");
            }
            outputs.push(output);
        }

        tracing::trace!(rule = name, produced = outputs.len(), "rule applied");
        Ok(outputs)
    }
}

/// Add `key++` for every numeric binding and enforce `key<bound` limits.
///
/// Returns None when a binding whose key carries a `<bound` suffix holds a
/// number greater than or equal to that bound; the whole set is dropped.
fn with_counters(mut bindings: Bindings) -> Option<Bindings> {
    let mut counters = Vec::new();
    for (key, value) in &bindings {
        let Some(digits) = value.match_value().filter(|s| is_digits(s)).map(strip_zeros) else {
            continue;
        };
        let bound = key.split_once('<').map(|(_, b)| b.trim()).filter(|b| is_digits(b)).map(strip_zeros);
        if let Some(bound) = bound {
            if compare_digits(digits, bound) != Ordering::Less {
                tracing::debug!(key = %key, value = digits, bound, "binding set dropped by bound");
                return None;
            }
        }
        counters.push((format!("{key}{COUNTER_SUFFIX}"), Obj::literal(increment(digits))));
    }
    bindings.extend(counters);
    Some(bindings)
}

// Numbers stay digit strings so values of any length compare and count.

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn strip_zeros(s: &str) -> &str {
    let trimmed = s.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn increment(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for b in out.iter_mut().rev() {
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    format!("1{}", String::from_utf8_lossy(&out))
}
