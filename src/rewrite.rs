//! Rule-based term rewriting.
//!
//! A [`Rule`](crate::Rule) pairs a source pattern with a target template. The
//! pieces fit together like this:
//!
//! ```text
//! facts ──┐
//!         │  match_sources            (pattern.rs)
//! source ─┴─ And / Or / Not / Equals / structural atom
//!                  │
//!                  v
//!           binding sets ── counters + numeric bounds   (rule.rs)
//!                  │
//!                  v
//!           clone(target).resolve_values(bindings) ──> outputs
//!
//! RuleSet::apply     one pass over every rule            (rule_set.rs)
//! RuleSet::saturate  repeat until no new fact appears    (rule_set.rs,
//!                    keyed by FactKey, timed by metrics)  dedup.rs, metrics.rs)
//! ```
//!
//! Everything here is synchronous and never mutates its inputs: patterns and
//! templates are cloned before they are resolved.

#[path = "rewrite/dedup.rs"]
mod dedup;
#[path = "rewrite/metrics.rs"]
mod metrics;
#[path = "rewrite/pattern.rs"]
mod pattern;
#[path = "rewrite/rule.rs"]
mod rule;
#[path = "rewrite/rule_set.rs"]
mod rule_set;

pub use dedup::FactKey;
pub use metrics::{PassMetrics, SaturationMetrics};
pub use pattern::Combinator;
pub use rule::RULE_KEY;
pub use rule_set::{RuleSet, Saturation, SaturationOptions};
