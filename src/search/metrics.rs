//! Search metrics.

use std::time::Duration;

/// Totals for one [`Search::run`](super::Search::run) call.
#[derive(Debug, Default, Clone)]
pub struct SearchMetrics {
    pub total: Duration,
    /// One entry per stage, in execution order.
    pub stages: Vec<StageMetrics>,
    /// Scoring of instances that were not already scored inside the last stage.
    pub evaluation: Duration,
    /// Positions in the grid.
    pub positions: usize,
}

#[derive(Debug, Default, Clone)]
pub struct StageMetrics {
    pub stage: usize,
    pub duration: Duration,
    /// Distinct projections of the grid onto stages `0..=stage`.
    pub sub_positions: usize,
    /// Units handed to the worker pool.
    pub units: usize,
    /// Instances cloned for this stage.
    pub clones: usize,
}
