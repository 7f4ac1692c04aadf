//! Saturation metrics.
//!
//! Timing is always collected; it costs one `Instant` per pass. Callers that
//! only want the facts can ignore the metrics entirely.

use std::time::Duration;

/// Totals for one [`RuleSet::saturate`](super::RuleSet::saturate) call.
#[derive(Debug, Default, Clone)]
pub struct SaturationMetrics {
    /// Total elapsed time.
    pub total: Duration,
    /// One entry per pass, in order.
    pub passes: Vec<PassMetrics>,
    /// False when `max_passes` stopped the loop before a fixpoint.
    pub reached_fixpoint: bool,
}

/// Timing and output counts for one pass.
#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    pub duration: Duration,
    /// Facts added to the fact base by this pass.
    pub produced: usize,
    /// Rules that produced at least one output, new or not.
    pub rules_fired: usize,
}
