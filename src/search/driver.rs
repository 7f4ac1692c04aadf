//! Staged search over a pipeline.

use super::dimension::Dimension;
use super::grid::SearchGrid;
use super::metrics::{SearchMetrics, StageMetrics};
use super::pool::run_bounded;
use super::position::Position;
use crate::context::Context;
use crate::error::SearchError;
use crate::parameter::Parameterizable;
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Instant;

/// A multi-stage pipeline whose parameters can be searched.
///
/// Stages run in order on one instance; cloning an instance after stage `i`
/// must carry over everything stage `i` computed.
pub trait ParameterSearchable: Parameterizable + Clone + Send + Sync {
    fn stage_count(&self) -> usize;

    /// Run stage `stage` with the parameters currently set. False aborts the
    /// whole search.
    fn run_stage(&mut self, stage: usize) -> bool;

    /// Score the instance after its last stage. Higher is better.
    fn evaluate(&mut self) -> f64;

    /// When false, the positions that share a previous-stage instance run the
    /// last stage one after another on a single clone of it instead of one
    /// clone each.
    fn last_stage_requires_cloning(&self) -> bool {
        true
    }
}

/// One instance shared by several positions of the last stage.
pub struct SharedInstance<T>(Arc<Mutex<T>>);

impl<T> SharedInstance<T> {
    fn new(instance: T) -> Self {
        SharedInstance(Arc::new(Mutex::new(instance)))
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock()
    }
}

impl<T> Clone for SharedInstance<T> {
    fn clone(&self) -> Self {
        SharedInstance(Arc::clone(&self.0))
    }
}

/// Instance kept for an evaluated position.
pub enum Instance<T> {
    Owned(T),
    Shared(SharedInstance<T>),
}

impl<T: Clone> Instance<T> {
    /// A clone of the current state.
    pub fn snapshot(&self) -> T {
        match self {
            Instance::Owned(instance) => instance.clone(),
            Instance::Shared(shared) => shared.lock().clone(),
        }
    }
}

pub struct Evaluation<T> {
    pub instance: Instance<T>,
    pub score: f64,
}

/// Grid search that runs shared stage prefixes once.
///
/// ```text
/// stage 0:  fn0 ──clone──> (a=1)          ──clone──> (a=2)
/// stage 1:  (a=1) ─> (a=1,b=x) (a=1,b=y)   (a=2) ─> (a=2,b=x) (a=2,b=y)
/// evaluate: every full position, through the same worker pool
/// ```
///
/// Each stage projects the grid onto the dimensions of stages `0..=i`, so
/// positions that agree on those dimensions share the work. Results are
/// committed only when every stage succeeded.
pub struct Search<T> {
    dimensions: Vec<Dimension>,
    max_threads: usize,
    evaluations: IndexMap<Position, Evaluation<T>>,
    metrics: SearchMetrics,
}

/// Work for one sub-position of one stage.
enum Unit<'s, T> {
    Cloned { source: &'s T, position: Position },
    Shared { instance: SharedInstance<T>, position: Position },
}

struct StageOutput<T> {
    position: Position,
    instance: Instance<T>,
    /// Set when the last stage already scored the instance under its lock.
    score: Option<f64>,
}

impl<T: ParameterSearchable> Search<T> {
    pub fn new(dimensions: Vec<Dimension>, context: &Context) -> Self {
        Search {
            dimensions,
            max_threads: context.max_threads,
            evaluations: IndexMap::new(),
            metrics: SearchMetrics::default(),
        }
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads.max(1);
        self
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Every position of the grid, in enumeration order.
    pub fn get_next_positions(&self) -> Result<Vec<Position>, SearchError> {
        let grid = SearchGrid::construct(&self.dimensions, None)?;
        if grid.is_empty() {
            return Err(SearchError::EmptyGrid);
        }
        Ok(grid.into_positions())
    }

    /// Run every stage of `fn0` over the grid and score each full position.
    ///
    /// `fn0` itself is never modified. Any failure leaves no evaluations.
    pub fn run(&mut self, fn0: &T) -> Result<(), SearchError> {
        let start = Instant::now();
        self.evaluations.clear();
        self.metrics = SearchMetrics::default();

        let targets = self.get_next_positions()?;
        let stage_count = fn0.stage_count();
        self.check_stages(stage_count)?;
        tracing::info!(positions = targets.len(), stage_count, max_threads = self.max_threads, "search started");

        let mut metrics = SearchMetrics { positions: targets.len(), ..SearchMetrics::default() };
        let mut previous: Vec<(Position, T)> = Vec::new();
        let mut finals: Vec<StageOutput<T>> = Vec::new();

        for stage in 0..stage_count {
            let stage_start = Instant::now();
            let last = stage + 1 == stage_count;
            let sub_positions: IndexSet<Position> = targets.iter().map(|p| p.project(stage)).collect();

            let root = Position::new();
            let sources: Vec<(&Position, &T)> =
                if stage == 0 { vec![(&root, fn0)] } else { previous.iter().map(|(p, t)| (p, t)).collect() };
            let (units, clones) = schedule(&sources, &sub_positions, last);
            let unit_count = units.len();

            let results = run_bounded(self.max_threads, units, |unit| unit.execute(stage));
            let outputs: Vec<StageOutput<T>> = match results.into_iter().collect::<Result<Vec<_>, _>>() {
                Ok(outputs) => outputs,
                Err(err) => {
                    tracing::warn!(stage, error = %err, "search aborted");
                    return Err(err);
                }
            };

            metrics.stages.push(StageMetrics {
                stage,
                duration: stage_start.elapsed(),
                sub_positions: sub_positions.len(),
                units: unit_count,
                clones,
            });
            tracing::debug!(stage, sub_positions = sub_positions.len(), units = unit_count, clones, "stage complete");

            if last {
                finals = outputs;
            } else {
                previous = outputs.into_iter().filter_map(StageOutput::into_owned).collect();
            }
        }

        let eval_start = Instant::now();
        let scored = run_bounded(self.max_threads, finals, StageOutput::into_evaluation);
        metrics.evaluation = eval_start.elapsed();
        metrics.total = start.elapsed();

        self.evaluations = scored.into_iter().collect();
        self.metrics = metrics;
        tracing::info!(
            evaluated = self.evaluations.len(),
            best = %self.get_best_position().map(Position::to_string).unwrap_or_default(),
            "search finished"
        );
        Ok(())
    }

    fn check_stages(&self, stage_count: usize) -> Result<(), SearchError> {
        if stage_count == 0 {
            return Err(SearchError::NoStages);
        }
        for dimension in self.dimensions.iter().flat_map(|d| d.walk()) {
            if dimension.stage_index as usize >= stage_count {
                return Err(SearchError::StageOutOfRange {
                    name: dimension.reference_name.clone(),
                    stage: dimension.stage_index,
                    stage_count,
                });
            }
        }
        Ok(())
    }

    /// Highest-scoring position; the first one evaluated wins ties. NaN scores
    /// are never chosen.
    pub fn get_best_position(&self) -> Option<&Position> {
        let mut best: Option<(&Position, f64)> = None;
        for (position, evaluation) in &self.evaluations {
            if evaluation.score.is_nan() {
                continue;
            }
            match best {
                Some((_, score)) if evaluation.score <= score => {}
                _ => best = Some((position, evaluation.score)),
            }
        }
        best.map(|(position, _)| position)
    }

    pub fn get_position_evaluation(&self, position: &Position) -> Option<f64> {
        self.evaluations.get(position).map(|e| e.score)
    }

    /// A fresh copy of the instance evaluated at `position`, with the
    /// position's coordinates set again.
    pub fn get_position_fn(&self, position: &Position) -> Option<T> {
        let evaluation = self.evaluations.get(position)?;
        let mut instance = evaluation.instance.snapshot();
        if let Err(err) = position.apply_to(&mut instance) {
            tracing::warn!(%position, error = %err, "stored instance rejected its own coordinates");
            return None;
        }
        Some(instance)
    }

    /// Positions and scores in evaluation order.
    pub fn evaluations(&self) -> impl Iterator<Item = (&Position, f64)> {
        self.evaluations.iter().map(|(p, e)| (p, e.score))
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }
}

/// Pair each previous-stage instance with the sub-positions extending it.
fn schedule<'s, T: ParameterSearchable>(
    sources: &[(&Position, &'s T)],
    sub_positions: &IndexSet<Position>,
    last: bool,
) -> (Vec<Unit<'s, T>>, usize) {
    let mut units = Vec::new();
    let mut clones = 0;
    for &(prefix, instance) in sources {
        let children: Vec<&Position> = sub_positions.iter().filter(|p| prefix.is_sub_position_of(p)).collect();
        if children.is_empty() {
            continue;
        }
        if last && !instance.last_stage_requires_cloning() {
            let shared = SharedInstance::new(instance.clone());
            clones += 1;
            units.extend(
                children.into_iter().map(|p| Unit::Shared { instance: shared.clone(), position: p.clone() }),
            );
        } else {
            clones += children.len();
            units.extend(children.into_iter().map(|p| Unit::Cloned { source: instance, position: p.clone() }));
        }
    }
    (units, clones)
}

impl<T: ParameterSearchable> Unit<'_, T> {
    fn execute(self, stage: usize) -> Result<StageOutput<T>, SearchError> {
        match self {
            Unit::Cloned { source, position } => {
                let mut instance = source.clone();
                prepare(&mut instance, &position, stage)?;
                Ok(StageOutput { position, instance: Instance::Owned(instance), score: None })
            }
            Unit::Shared { instance, position } => {
                let score = {
                    let mut guard = instance.lock();
                    prepare(&mut *guard, &position, stage)?;
                    guard.evaluate()
                };
                Ok(StageOutput { position, instance: Instance::Shared(instance), score: Some(score) })
            }
        }
    }
}

fn prepare<T: ParameterSearchable>(instance: &mut T, position: &Position, stage: usize) -> Result<(), SearchError> {
    position.apply_to(instance)?;
    if !instance.run_stage(stage) {
        return Err(SearchError::StageFailed { stage, position: position.to_string() });
    }
    Ok(())
}

impl<T: ParameterSearchable> StageOutput<T> {
    fn into_owned(self) -> Option<(Position, T)> {
        match self.instance {
            Instance::Owned(instance) => Some((self.position, instance)),
            Instance::Shared(_) => None,
        }
    }

    fn into_evaluation(mut self) -> (Position, Evaluation<T>) {
        let score = match (self.score, &mut self.instance) {
            (Some(score), _) => score,
            (None, Instance::Owned(instance)) => instance.evaluate(),
            (None, Instance::Shared(shared)) => shared.lock().evaluate(),
        };
        (self.position, Evaluation { instance: self.instance, score })
    }
}
